use std::{collections::HashMap, str::FromStr};

use proc_macro2::TokenStream;
use proc_macro_error::abort_call_site;
use quote::quote;

use crate::{ColumnInfo, TableInfo};

pub fn generate(info: TableInfo) -> TokenStream {
    let primary_key_type = gen_primary_key_type_toks(&info.columns, &info.primary_keys);
    let struct_name = str_to_toks(&info.struct_name);
    let struct_name_str = &info.struct_name;
    let table_name_str = &info.table_name;
    let column_names: Vec<&String> = columns(&info).map(|v| &v.name).collect();
    let primary_keys = &info.primary_keys;
    let auto_increment = match columns(&info).find(|col| col.is_auto_increment) {
        Some(col) => {
            let name = &col.name;
            quote! { Some(#name) }
        }
        None => quote! { None },
    };
    let relations: Vec<&String> = info
        .columns
        .iter()
        .filter(|col| col.relation.is_some())
        .map(|col| &col.name)
        .collect();
    let info_toks = gen_table_info(&info);
    let fields_toks = gen_fields(&info);
    let from_row_toks = gen_from_row(&info);
    let key_to_values_toks = gen_key_to_values(&info);
    let load_relation_toks = gen_load_relation(&info);

    quote! {
        #[uow::async_trait]
        impl uow::Entity for #struct_name {
            type PrimaryKey = #primary_key_type;

            const NAME: &'static str = #struct_name_str;

            const TABLE_NAME: &'static str = #table_name_str;

            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];

            const PRIMARY_KEYS: &'static [&'static str] = &[#(#primary_keys),*];

            const AUTO_INCREMENT: Option<&'static str> = #auto_increment;

            const RELATIONS: &'static [&'static str] = &[#(#relations),*];

            const INFO: uow::TableInfo = #info_toks;

            const FIELDS: &'static [uow::Field<Self>] = #fields_toks;

            #from_row_toks

            #key_to_values_toks

            #load_relation_toks
        }
    }
}

/// Column fields, relation fields are skipped
fn columns(info: &TableInfo) -> impl Iterator<Item = &ColumnInfo> {
    info.columns.iter().filter(|col| col.relation.is_none())
}

fn gen_table_info(info: &TableInfo) -> TokenStream {
    let table_name_str = &info.table_name;
    let columns_toks = columns(info)
        .map(|col| {
            let name = &col.name;
            let (ty_toks, is_not_null) = gen_column_type_and_is_not_null(col);
            let is_primary_key = info.primary_keys.contains(name);
            let is_auto_increment = col.is_auto_increment;
            let default = if let Some(def) = &col.default {
                quote! { Some(#def) }
            } else {
                quote! { None }
            };
            let is_unique = col.is_unique;

            quote! {
                uow::ColumnInfo {
                    name: #name,
                    ty: #ty_toks,
                    is_primary_key: #is_primary_key,
                    is_not_null: #is_not_null,
                    is_auto_increment: #is_auto_increment,
                    default: #default,
                    is_unique: #is_unique,
                }
            }
        })
        .collect::<Vec<_>>();
    let index_toks = info
        .indexes
        .iter()
        .map(|index| {
            let index_name = format!("{}_index_{}", info.table_name, index.join("_"));
            let keys_toks = index
                .iter()
                .map(|column_name| {
                    quote! {
                        uow::IndexKeyInfo {
                            column_name: #column_name,
                        }
                    }
                })
                .collect::<Vec<_>>();

            quote! {
                uow::IndexInfo {
                    name: #index_name,
                    keys: &[#(#keys_toks),*],
                }
            }
        })
        .collect::<Vec<_>>();

    quote! {
        uow::TableInfo {
            name: #table_name_str,
            columns: &[#(#columns_toks),*],
            indexes: &[#(#index_toks),*],
        }
    }
}

/// Getter/setter table, one entry per column
fn gen_fields(info: &TableInfo) -> TokenStream {
    let field_toks = columns(info)
        .map(|col| {
            let name_str = &col.name;
            let name = str_to_toks(&col.name);
            let ty = str_to_toks(&col.ty);

            quote! {
                uow::Field {
                    name: #name_str,
                    get: |entity: &Self| uow::ToValue::to_value(&entity.#name),
                    set: |entity: &mut Self, value: &uow::Value| -> uow::error::Result<()> {
                        entity.#name = <#ty as uow::FromValue>::from_value(value)?;
                        Ok(())
                    },
                }
            }
        })
        .collect::<Vec<_>>();

    quote! {
        &[#(#field_toks),*]
    }
}

fn gen_from_row(info: &TableInfo) -> TokenStream {
    let field_toks: Vec<TokenStream> = info
        .columns
        .iter()
        .map(|col| {
            let name = str_to_toks(&col.name);

            if col.relation.is_some() {
                // Relation field, filled by `load_relation`
                quote! {
                    #name: Default::default(),
                }
            } else {
                let name_str = &col.name;
                let ty = str_to_toks(&col.ty);
                quote! {
                    #name: row.get::<#ty>(#name_str)?,
                }
            }
        })
        .collect();

    quote! {
        fn from_row(row: &uow::Row) -> uow::error::Result<Self> {
            Ok(Self {
                #(#field_toks)*
            })
        }
    }
}

fn gen_key_to_values(info: &TableInfo) -> TokenStream {
    let value_toks = match info.primary_keys.len() {
        1 => vec![quote! { uow::ToValue::to_value(key) }],
        n => (0..n)
            .map(|index| {
                let index = syn::Index::from(index);
                quote! { uow::ToValue::to_value(&key.#index) }
            })
            .collect(),
    };

    quote! {
        fn key_to_values(key: &Self::PrimaryKey) -> Vec<uow::Value> {
            vec![#(#value_toks),*]
        }
    }
}

fn gen_load_relation(info: &TableInfo) -> TokenStream {
    let arm_toks = info
        .columns
        .iter()
        .filter_map(|col| col.relation.as_ref().map(|relation| (col, relation)))
        .map(|(col, relation)| {
            let name_str = &col.name;
            let name = str_to_toks(&col.name);
            let relation_struct = str_to_toks(&relation.ty);
            let self_field = str_to_toks(&relation.self_col);
            let ref_col = &relation.ref_col;
            let assign_toks = if relation.is_vec {
                quote! { self.#name = list; }
            } else {
                quote! { self.#name = list.into_iter().next(); }
            };

            quote! {
                #name_str => {
                    let value = uow::ToValue::to_value(&self.#self_field);
                    let list = uow::fetch_related::<#relation_struct>(conn, #ref_col, value).await?;
                    #assign_toks
                    Ok(())
                }
            }
        })
        .collect::<Vec<_>>();

    quote! {
        async fn load_relation(&mut self, conn: &uow::Connection, relation: &str) -> uow::error::Result<()> {
            let _ = conn;
            match relation {
                #(#arm_toks)*
                _ => Err(uow::error::argument!(
                    "Unknown relation `{}` on {}",
                    relation,
                    <Self as uow::Entity>::NAME
                )),
            }
        }
    }
}

fn str_to_toks(s: &str) -> TokenStream {
    match TokenStream::from_str(s) {
        Ok(toks) => toks,
        Err(e) => abort_call_site!("Invalid tokens `{}`: {}", s, e),
    }
}

fn gen_primary_key_type_toks(columns: &[ColumnInfo], primary_keys: &[String]) -> TokenStream {
    // Generate type map for lookup
    let column_type_map = columns
        .iter()
        .fold(HashMap::<&str, &str>::new(), |mut map, info| {
            map.insert(info.name.as_str(), info.ty.as_str());
            map
        });

    // Generate primary key type array
    let primary_key_types = primary_keys
        .iter()
        .map(|k| match column_type_map.get(k.as_str()) {
            Some(ty) => *ty,
            None => abort_call_site!("Primary key `{}` not found", k),
        })
        .collect::<Vec<&str>>();

    match primary_key_types.len() {
        // Has only one primary key, type is key's type
        1 => {
            let ty = str_to_toks(primary_key_types[0]);
            quote! {#ty}
        }

        // More than one primary key, type is tuple
        _ => {
            let types = primary_key_types
                .iter()
                .map(|ty| str_to_toks(ty))
                .collect::<Vec<_>>();
            quote! {(#(#types),*)}
        }
    }
}

fn gen_column_type_and_is_not_null(col: &ColumnInfo) -> (TokenStream, bool) {
    let length = col.length.unwrap_or(65535);

    match col.sql_ty.replace(' ', "").as_str() {
        "bool" => (quote! { uow::ColumnType::Bool }, true),
        "i8" => (quote! { uow::ColumnType::I8 }, true),
        "u8" => (quote! { uow::ColumnType::U8 }, true),
        "i16" => (quote! { uow::ColumnType::I16 }, true),
        "u16" => (quote! { uow::ColumnType::U16 }, true),
        "i32" => (quote! { uow::ColumnType::I32 }, true),
        "u32" => (quote! { uow::ColumnType::U32 }, true),
        "i64" => (quote! { uow::ColumnType::I64 }, true),
        "u64" => (quote! { uow::ColumnType::U64 }, true),
        "f32" => (quote! { uow::ColumnType::F32 }, true),
        "f64" => (quote! { uow::ColumnType::F64 }, true),
        "String" => (quote! { uow::ColumnType::Str(#length) }, true),
        "Vec<u8>" => (quote! { uow::ColumnType::Bytes(#length) }, true),
        "Option<bool>" => (quote! { uow::ColumnType::Bool }, false),
        "Option<i8>" => (quote! { uow::ColumnType::I8 }, false),
        "Option<u8>" => (quote! { uow::ColumnType::U8 }, false),
        "Option<i16>" => (quote! { uow::ColumnType::I16 }, false),
        "Option<u16>" => (quote! { uow::ColumnType::U16 }, false),
        "Option<i32>" => (quote! { uow::ColumnType::I32 }, false),
        "Option<u32>" => (quote! { uow::ColumnType::U32 }, false),
        "Option<i64>" => (quote! { uow::ColumnType::I64 }, false),
        "Option<u64>" => (quote! { uow::ColumnType::U64 }, false),
        "Option<f32>" => (quote! { uow::ColumnType::F32 }, false),
        "Option<f64>" => (quote! { uow::ColumnType::F64 }, false),
        "Option<String>" => (quote! { uow::ColumnType::Str(#length) }, false),
        "Option<Vec<u8>>" => (quote! { uow::ColumnType::Bytes(#length) }, false),
        _ => abort_call_site!("Unsupported column type '{}', name: '{}'", col.ty, col.name),
    }
}
