use proc_macro_error::abort;
use quote::ToTokens;
use syn::{
    punctuated::Punctuated, Attribute, BinOp, Data, DeriveInput, Expr, ExprLit, Field, Lit, Token,
};

const ARG_HELP: &str = r#"Syntax is uow(primary_key | auto_increment | unique | table_name = "NAME" | relation = SELF_COLUMN > REFER_COLUMN | sql_type = RUST_TYPE | length = NUMBER | default = (NUMBER | STR) | index = [col1, col2, ...], ...)"#;

#[derive(Debug, Clone)]
pub struct RelationInfo {
    pub ty: String, // Related entity type
    pub is_vec: bool,
    pub self_col: String,
    pub ref_col: String,
}

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: String,
    /// Rust type the sql column type is derived from, `ty` unless `sql_type` is set
    pub sql_ty: String,
    pub length: Option<usize>,
    pub is_auto_increment: bool,
    pub default: Option<String>, // Sql literal
    pub is_unique: bool,
    pub relation: Option<RelationInfo>,
}

#[derive(Debug)]
pub struct TableInfo {
    pub struct_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_keys: Vec<String>,
    pub indexes: Vec<Vec<String>>,
}

pub fn parse(input: DeriveInput) -> TableInfo {
    let st = match &input.data {
        Data::Struct(st) => st,
        _ => abort!(input, "Entity must be a struct"),
    };

    let struct_name = input.ident.to_string();
    let mut table_name = struct_name.clone();
    let mut indexes = Vec::<Vec<String>>::new();

    for (key, value) in uow_args(&input.attrs) {
        match (key_name(&key).as_str(), value) {
            ("table_name", Some(v)) => table_name = lit_str(&v),
            ("index", Some(v)) => {
                let cols = path_list(&v);
                if cols.is_empty() {
                    abort!(v, "Empty index columns");
                }
                indexes.push(cols);
            }
            _ => abort!(key, "Unknown entity attribute"; help = ARG_HELP),
        }
    }

    let mut columns = Vec::<ColumnInfo>::new();
    let mut primary_keys = Vec::<String>::new();
    for field in &st.fields {
        let (column, is_primary_key) = parse_column(field);
        if is_primary_key {
            primary_keys.push(column.name.clone());
        }
        columns.push(column);
    }
    if primary_keys.is_empty() {
        abort!(input.ident, "Entity `{}` has no primary key", struct_name; help = "Mark a field with #[uow(primary_key)]");
    }

    // Relations and indexes must point at plain columns
    let is_column = |name: &str| columns.iter().any(|c| c.relation.is_none() && c.name == name);
    for relation in columns.iter().filter_map(|c| c.relation.as_ref()) {
        if !is_column(&relation.self_col) {
            abort!(input.ident, "Relation column `{}` not found in `{}`", relation.self_col, struct_name);
        }
    }
    for name in indexes.iter().flatten() {
        if !is_column(name) {
            abort!(input.ident, "Index column `{}` not found in `{}`", name, struct_name);
        }
    }

    TableInfo {
        struct_name,
        table_name,
        columns,
        primary_keys,
        indexes,
    }
}

/// Column of one field, and whether it is part of the primary key
fn parse_column(field: &Field) -> (ColumnInfo, bool) {
    let name = match &field.ident {
        Some(ident) => ident.to_string(),
        None => abort!(field, "Entity fields must be named"),
    };
    let ty = field.ty.to_token_stream().to_string();

    let mut column = ColumnInfo {
        name,
        sql_ty: ty.clone(),
        ty,
        length: None,
        is_auto_increment: false,
        default: None,
        is_unique: false,
        relation: None,
    };
    let mut is_primary_key = false;

    for (key, value) in uow_args(&field.attrs) {
        match (key_name(&key).as_str(), value) {
            ("primary_key", None) => is_primary_key = true,
            ("auto_increment", None) => column.is_auto_increment = true,
            ("unique", None) => column.is_unique = true,
            ("length", Some(v)) => column.length = Some(lit_usize(&v)),
            ("sql_type", Some(v)) => column.sql_ty = path_ident(&v),
            ("default", Some(v)) => column.default = Some(sql_literal(&v)),
            ("relation", Some(v)) => column.relation = Some(parse_relation(field, &column.ty, &v)),
            _ => abort!(key, "Unknown field attribute"; help = ARG_HELP),
        }
    }

    (column, is_primary_key)
}

/// `key` and `key = value` arguments of every `#[uow(..)]`, attributes of
/// other derives are skipped
fn uow_args(attrs: &[Attribute]) -> Vec<(Expr, Option<Expr>)> {
    let mut args = vec![];

    for attr in attrs.iter().filter(|attr| attr.path.is_ident("uow")) {
        let list = match attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated) {
            Ok(list) => list,
            Err(e) => abort!(attr, "Invalid uow attribute: {}", e; help = ARG_HELP),
        };

        for expr in list {
            match expr {
                Expr::Assign(assign) => args.push((*assign.left, Some(*assign.right))),
                Expr::Path(_) => args.push((expr, None)),
                _ => abort!(expr, "Expect `key` or `key = value`"; help = ARG_HELP),
            }
        }
    }

    args
}

/// `Option<T>` loads one related row, `Vec<T>` every related row
fn parse_relation(field: &Field, ty: &str, expr: &Expr) -> RelationInfo {
    let (self_col, ref_col) = match expr {
        Expr::Binary(bin) if matches!(bin.op, BinOp::Gt(_)) => {
            (path_ident(&bin.left), path_ident(&bin.right))
        }
        _ => abort!(expr, "Expect `SELF_COLUMN > REFER_COLUMN`"),
    };

    let ty = ty.replace(' ', "");
    let wrapped = |prefix: &str| {
        ty.strip_prefix(prefix)
            .and_then(|t| t.strip_suffix('>'))
            .map(String::from)
    };
    let (inner, is_vec) = match (wrapped("Option<"), wrapped("Vec<")) {
        (Some(inner), _) => (inner, false),
        (None, Some(inner)) => (inner, true),
        (None, None) => abort!(field.ty, "Relation field must be `Vec<T>` or `Option<T>`"),
    };

    RelationInfo {
        ty: inner,
        is_vec,
        self_col,
        ref_col,
    }
}

fn key_name(expr: &Expr) -> String {
    expr.to_token_stream().to_string()
}

fn lit(expr: &Expr) -> &Lit {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => lit,
        _ => abort!(expr, "Expect literal"),
    }
}

fn lit_str(expr: &Expr) -> String {
    match lit(expr) {
        Lit::Str(s) => s.value(),
        _ => abort!(expr, "Expect string"),
    }
}

fn lit_usize(expr: &Expr) -> usize {
    match lit(expr) {
        Lit::Int(n) => match n.base10_parse::<usize>() {
            Ok(n) => n,
            Err(e) => abort!(expr, "Invalid length: {}", e),
        },
        _ => abort!(expr, "Expect integer"),
    }
}

/// `1` => `1`, `1.5` => `1.5`, `"it's"` => `'it''s'`
fn sql_literal(expr: &Expr) -> String {
    match lit(expr) {
        Lit::Int(n) => n.to_string(),
        Lit::Float(n) => n.to_string(),
        Lit::Str(s) => format!("'{}'", s.value().replace('\'', "''")),
        _ => abort!(expr, "Expect number or string"),
    }
}

/// Last segment of a path, `std::string::String` => `String`
fn path_ident(expr: &Expr) -> String {
    if let Expr::Path(p) = expr {
        if let Some(seg) = p.path.segments.last() {
            return seg.ident.to_string();
        }
    }

    abort!(expr, "Expect path")
}

fn path_list(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Array(arr) => arr.elems.iter().map(path_ident).collect(),
        _ => abort!(expr, "Expect `[col, ...]`"),
    }
}
