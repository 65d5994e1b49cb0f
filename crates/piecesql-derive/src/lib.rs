//! Derive macros for piecesql
//!
//! Provides `#[derive(BackedEnum)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod backed_enum;

/// Derive `BackedEnum` (and `From<T> for Value`) for a unit-only enum.
///
/// # Example
///
/// ```ignore
/// use piecesql::BackedEnum;
///
/// #[derive(BackedEnum)]
/// enum Status {
///     Active,
///     #[piece(rename = "on_hold")]
///     Paused,
/// }
///
/// #[derive(BackedEnum)]
/// #[piece(int)]
/// enum Priority {
///     Low = 1,
///     High = 10,
/// }
/// ```
///
/// # Attributes
///
/// - `#[piece(int)]` - Back variants by their integer discriminant
/// - `#[piece(rename_all = "...")]` - Case convention for string-backed variants
///   (`snake_case` by default; also `lowercase`, `UPPERCASE`, `kebab-case`,
///   `SCREAMING_SNAKE_CASE`, `camelCase`, `PascalCase`)
/// - `#[piece(rename = "...")]` - Explicit string for one variant
#[proc_macro_derive(BackedEnum, attributes(piece))]
pub fn derive_backed_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    backed_enum::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
