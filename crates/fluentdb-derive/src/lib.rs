//! Derive macros for fluentdb
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod model;
mod syn_types;

/// Derive `fluentdb::Model` and `fluentdb::Entity` for a struct.
///
/// # Example
///
/// ```ignore
/// use fluentdb::{MetaData, Model};
///
/// #[derive(Debug, Default, Model)]
/// struct User {
///     #[orm(model = "table:users")]
///     meta: MetaData,
///     #[orm(model = "type:serial,primary")]
///     id: i64,
///     #[orm(column = "display_name")]
///     name: String,
///     #[orm(model = "rel:Post")]
///     posts: Vec<Post>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(model = "...")]` - Tag mini-language, `;`-separated `key:value` groups.
///   Known keys: `type`, `ref`, `cascade`, `rel`, `name`, `table`.
///
/// Fields tagged `rel:` hold nested models (`T`, `Option<T>` or `Vec<T>`) and
/// are never read from or written to a row. The struct must implement
/// `Default`.
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
