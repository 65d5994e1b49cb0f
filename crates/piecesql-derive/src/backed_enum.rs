//! `#[derive(BackedEnum)]`: back a unit enum by a string or an integer.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, Meta, Result};

#[derive(Default)]
struct EnumAttrs {
    int: bool,
    rename_all: Option<String>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let variants = match &input.data {
        Data::Enum(e) => &e.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "BackedEnum can only be derived for enums",
            ));
        }
    };

    let attrs = parse_enum_attrs(&input.attrs)?;
    if attrs.int && attrs.rename_all.is_some() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "rename_all has no effect on integer-backed enums",
        ));
    }

    let mut arms = Vec::new();
    for variant in variants {
        if !matches!(&variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "BackedEnum variants must be unit variants (no fields)",
            ));
        }

        let variant_ident = &variant.ident;
        let rename = parse_rename(&variant.attrs)?;
        if attrs.int {
            if rename.is_some() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "rename is not allowed on integer-backed enums",
                ));
            }
            arms.push(quote! {
                #name::#variant_ident => ::piecesql::BackedValue::Int(#name::#variant_ident as i64),
            });
        } else {
            let text = match rename {
                Some(text) => text,
                None => apply_case(&variant_ident.to_string(), attrs.rename_all.as_deref())
                    .map_err(|msg| syn::Error::new_spanned(&input.ident, msg))?,
            };
            arms.push(quote! {
                #name::#variant_ident => ::piecesql::BackedValue::Text(::std::string::String::from(#text)),
            });
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::piecesql::value::BackedEnum for #name #ty_generics #where_clause {
            fn backing_value(&self) -> ::piecesql::BackedValue {
                match self {
                    #(#arms)*
                }
            }
        }

        impl #impl_generics ::std::convert::From<#name #ty_generics> for ::piecesql::Value #where_clause {
            fn from(value: #name #ty_generics) -> Self {
                ::piecesql::Value::from_enum(&value)
            }
        }
    };

    Ok(expanded)
}

fn apply_case(ident: &str, rename_all: Option<&str>) -> std::result::Result<String, String> {
    let text = match rename_all.unwrap_or("snake_case") {
        "snake_case" => ident.to_snake_case(),
        "lowercase" => ident.to_lowercase(),
        "UPPERCASE" => ident.to_uppercase(),
        "kebab-case" => ident.to_kebab_case(),
        "SCREAMING_SNAKE_CASE" => ident.to_shouty_snake_case(),
        "camelCase" => ident.to_lower_camel_case(),
        "PascalCase" => ident.to_upper_camel_case(),
        other => return Err(format!("unknown rename_all convention: {other:?}")),
    };
    Ok(text)
}

fn piece_metas(attrs: &[Attribute]) -> Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("piece") {
            continue;
        }
        let nested = attr.parse_args_with(
            syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated,
        )?;
        metas.extend(nested);
    }
    Ok(metas)
}

fn string_value(meta: &syn::MetaNameValue) -> Result<String> {
    match &meta.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Parse enum-level `#[piece(int)]` / `#[piece(rename_all = "...")]`.
fn parse_enum_attrs(attrs: &[Attribute]) -> Result<EnumAttrs> {
    let mut out = EnumAttrs::default();
    for meta in piece_metas(attrs)? {
        match &meta {
            Meta::Path(path) if path.is_ident("int") => out.int = true,
            Meta::NameValue(nv) if nv.path.is_ident("rename_all") => {
                out.rename_all = Some(string_value(nv)?);
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unknown piece attribute (expected `int` or `rename_all = \"...\"`)",
                ));
            }
        }
    }
    Ok(out)
}

/// Parse `#[piece(rename = "...")]` from a variant's attributes.
fn parse_rename(attrs: &[Attribute]) -> Result<Option<String>> {
    for meta in piece_metas(attrs)? {
        match &meta {
            Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                return Ok(Some(string_value(nv)?));
            }
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unknown piece attribute (expected `rename = \"...\"`)",
                ));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_case_is_snake() {
        assert_eq!(apply_case("OnHold", None).unwrap(), "on_hold");
        assert_eq!(apply_case("OnHold", Some("kebab-case")).unwrap(), "on-hold");
        assert_eq!(apply_case("OnHold", Some("UPPERCASE")).unwrap(), "ONHOLD");
        assert!(apply_case("OnHold", Some("Title Case")).is_err());
    }

    #[test]
    fn rejects_non_enums() {
        let input: DeriveInput = syn::parse_quote! {
            struct NotAnEnum { a: i32 }
        };
        assert!(expand(input).is_err());
    }

    #[test]
    fn rejects_rename_on_int_enums() {
        let input: DeriveInput = syn::parse_quote! {
            #[piece(int)]
            enum Priority {
                #[piece(rename = "low")]
                Low = 1,
            }
        };
        assert!(expand(input).is_err());
    }

    #[test]
    fn expands_string_backed_enum() {
        let input: DeriveInput = syn::parse_quote! {
            enum Status {
                Active,
                #[piece(rename = "on_hold")]
                Paused,
            }
        };
        let tokens = expand(input).unwrap().to_string();
        assert!(tokens.contains("\"active\""));
        assert!(tokens.contains("\"on_hold\""));
    }
}
