mod generator;
mod parser;

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::{parse_macro_input, DeriveInput};

use parser::{ColumnInfo, TableInfo};

/// Derive `uow::Entity`
///
/// Struct attributes: `#[uow(table_name = "name", index = [col1, col2])]`.
/// Field attributes: `primary_key`, `auto_increment`, `unique`,
/// `length = N`, `default = literal`, `sql_type = RUST_TYPE` and
/// `relation = SELF_COLUMN > REFER_COLUMN` on `Vec<T>`/`Option<T>` fields.
#[proc_macro_derive(Entity, attributes(uow))]
#[proc_macro_error]
pub fn derive_entity(item: TokenStream) -> TokenStream {
    let input: DeriveInput = parse_macro_input!(item);
    let info = parser::parse(input);
    let stream = generator::generate(info);

    stream.into()
}
