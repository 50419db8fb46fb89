//! Derive macro for sqlscope schema declarations.
//!
//! `#[derive(Table)]` turns a struct with named fields into a
//! `sqlscope_core::Schema`: one column per field, kinds taken from the field
//! types, and constraints taken from `#[column(...)]` attributes.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, Meta, Type,
};

/// Derives `sqlscope_core::Schema` for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to `snake_case` of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Part of the primary key
/// - `#[column(autoincrement)]` - Auto-increment primary key (at most one,
///   never combined with other key columns)
/// - `#[column(references = "table.column")]` - Foreign key
/// - `#[column(cascade)]` - `ON DELETE CASCADE`, requires `references`
/// - `#[column(index)]` / `#[column(unique)]` - Plain or unique index
/// - `#[column(name = "column_name")]` - SQL column name (optional, defaults
///   to the field name)
///
/// Nullability comes from the field type: `Option<T>` columns are nullable.
///
/// # Generated Items
///
/// - `impl Schema` with the column list and row marshalling
/// - One `#[track_caller]` accessor per field returning a qualified column
///   expression, e.g. `Person::name()`
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Table derive does not support generic structs",
        ));
    }

    let column_infos = column_infos(named_fields(input)?)?;
    check_keys(&column_infos)?;

    let descriptors: Vec<TokenStream2> = column_infos.iter().map(descriptor).collect();
    let to_values: Vec<TokenStream2> = column_infos.iter().map(to_value).collect();
    let from_values: Vec<TokenStream2> = column_infos.iter().map(from_value).collect();
    let accessors: Vec<TokenStream2> = column_infos.iter().map(accessor).collect();

    let expanded = quote! {
        impl ::sqlscope_core::schema::Schema for #struct_name {
            const TABLE: &'static str = #table_name;
            const COLUMNS: &'static [::sqlscope_core::schema::ColumnDescriptor] = &[
                #(#descriptors),*
            ];

            fn to_values(&self) -> ::std::vec::Vec<::sqlscope_core::SqlValue> {
                ::std::vec![#(#to_values),*]
            }

            fn from_values(
                values: ::std::vec::Vec<::sqlscope_core::SqlValue>,
            ) -> ::sqlscope_core::Result<Self> {
                let mut values = values.into_iter();
                ::std::result::Result::Ok(Self {
                    #(#from_values),*
                })
            }
        }

        #[allow(dead_code)]
        impl #struct_name {
            #(#accessors)*
        }
    };

    Ok(expanded)
}

fn named_fields(input: &DeriveInput) -> syn::Result<&Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs with named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            "Table derive only supports structs",
        )),
    }
}

fn column_infos(fields: &Punctuated<Field, Comma>) -> syn::Result<Vec<ColumnInfo>> {
    fields
        .iter()
        .map(|field| {
            let Some(field_name) = &field.ident else {
                return Err(syn::Error::new_spanned(field, "expected a named field"));
            };
            let attrs = parse_column_attrs(&field.attrs)?;
            Ok(ColumnInfo {
                field_name: field_name.clone(),
                field_type: field.ty.clone(),
                column_name: attrs
                    .name
                    .unwrap_or_else(|| field_name.unraw().to_string()),
                attrs: attrs.flags,
            })
        })
        .collect()
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    attrs: ColumnFlags,
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
enum IndexFlag {
    #[default]
    None,
    Index,
    Unique,
}

#[derive(Default)]
struct ColumnFlags {
    primary_key: bool,
    autoincrement: Option<Span>,
    references: Option<(String, String)>,
    cascade: bool,
    index: IndexFlag,
}

struct ColumnAttrs {
    name: Option<String>,
    flags: ColumnFlags,
}

fn to_value(info: &ColumnInfo) -> TokenStream2 {
    let field_name = &info.field_name;
    quote! {
        ::sqlscope_core::ToSqlValue::to_sql_value(
            ::std::clone::Clone::clone(&self.#field_name)
        )
    }
}

fn from_value(info: &ColumnInfo) -> TokenStream2 {
    let field_name = &info.field_name;
    let column_name = &info.column_name;
    quote! {
        #field_name: ::sqlscope_core::__private::take(&mut values, #column_name)?
    }
}

fn accessor(info: &ColumnInfo) -> TokenStream2 {
    let method_name = &info.field_name;
    let column_name = &info.column_name;
    quote! {
        /// Returns this column qualified by its table.
        #[track_caller]
        #[must_use]
        pub fn #method_name() -> ::sqlscope_core::Expr {
            ::sqlscope_core::builder::column::<Self>(#column_name)
        }
    }
}

fn descriptor(info: &ColumnInfo) -> TokenStream2 {
    let column_name = &info.column_name;
    let field_type = &info.field_type;
    let flags = &info.attrs;

    let mut tokens = quote! {
        ::sqlscope_core::schema::ColumnDescriptor::new(
            #column_name,
            <#field_type as ::sqlscope_core::schema::SqlKind>::KIND,
        )
    };
    if flags.autoincrement.is_some() {
        tokens.extend(quote!(.autoincrement()));
    } else if flags.primary_key {
        tokens.extend(quote!(.primary_key()));
    }
    if let Some((table, column)) = &flags.references {
        tokens.extend(quote!(.references(#table, #column)));
    }
    if flags.cascade {
        tokens.extend(quote!(.cascade()));
    }
    match flags.index {
        IndexFlag::Unique => tokens.extend(quote!(.unique_index())),
        IndexFlag::Index => tokens.extend(quote!(.index())),
        IndexFlag::None => {}
    }
    tokens
}

/// Rejects key layouts the engine cannot express.
fn check_keys(columns: &[ColumnInfo]) -> syn::Result<()> {
    let mut autoincrement = columns.iter().filter_map(|c| c.attrs.autoincrement);
    let Some(first) = autoincrement.next() else {
        return Ok(());
    };
    if let Some(second) = autoincrement.next() {
        return Err(syn::Error::new(
            second,
            "a table can have at most one autoincrement primary key",
        ));
    }
    if columns
        .iter()
        .any(|c| c.attrs.primary_key && c.attrs.autoincrement.is_none())
    {
        return Err(syn::Error::new(
            first,
            "an autoincrement key cannot be part of a composite primary key",
        ));
    }
    Ok(())
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown table attribute, expected `name`"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs {
        name: None,
        flags: ColumnFlags::default(),
    };
    let mut cascade_span = None;

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                let flags = &mut result.flags;
                if meta.path.is_ident("primary_key") {
                    flags.primary_key = true;
                } else if meta.path.is_ident("autoincrement") {
                    flags.autoincrement = Some(meta.path.require_ident()?.span());
                } else if meta.path.is_ident("cascade") {
                    flags.cascade = true;
                    cascade_span = Some(meta.path.require_ident()?.span());
                } else if meta.path.is_ident("index") {
                    // `unique` already implies an index
                    if flags.index == IndexFlag::None {
                        flags.index = IndexFlag::Index;
                    }
                } else if meta.path.is_ident("unique") {
                    flags.index = IndexFlag::Unique;
                } else if meta.path.is_ident("references") {
                    let value: LitStr = meta.value()?.parse()?;
                    flags.references = Some(parse_reference(&value)?);
                } else if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(meta.error(
                        "unknown column attribute, expected one of `primary_key`, \
                         `autoincrement`, `references`, `cascade`, `index`, `unique`, `name`",
                    ));
                }
                Ok(())
            })?;
        }
    }

    if let Some(span) = cascade_span {
        if result.flags.references.is_none() {
            return Err(syn::Error::new(
                span,
                "`cascade` requires `references = \"table.column\"`",
            ));
        }
    }

    Ok(result)
}

/// Splits `"table.column"`.
fn parse_reference(value: &LitStr) -> syn::Result<(String, String)> {
    let text = value.value();
    match text.split_once('.') {
        Some((table, column)) if is_identifier(table) && is_identifier(column) => {
            Ok((table.to_string(), column.to_string()))
        }
        _ => Err(syn::Error::new(
            value.span(),
            format!("malformed reference `{text}`, expected `table.column`"),
        )),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(input: TokenStream2) -> syn::Result<TokenStream2> {
        derive_table_impl(&syn::parse2(input)?)
    }

    #[test]
    fn test_snake_case_table_name() {
        assert_eq!(to_snake_case("Person"), "person");
        assert_eq!(to_snake_case("PetOwner"), "pet_owner");
    }

    #[test]
    fn test_reference_parsing() {
        let ok = LitStr::new("person.name", Span::call_site());
        assert_eq!(
            parse_reference(&ok).unwrap(),
            (String::from("person"), String::from("name"))
        );
        for bad in ["person", "person.", ".name", "a.b.c"] {
            assert!(parse_reference(&LitStr::new(bad, Span::call_site())).is_err());
        }
    }

    #[test]
    fn test_cascade_requires_reference() {
        let err = derive(quote! {
            struct Dog {
                #[column(primary_key)]
                name: String,
                #[column(cascade)]
                owner: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("requires `references"));
    }

    #[test]
    fn test_two_autoincrement_keys_rejected() {
        let err = derive(quote! {
            struct Event {
                #[column(autoincrement)]
                id: i64,
                #[column(autoincrement)]
                other: i64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("at most one autoincrement"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let err = derive(quote! {
            struct Event {
                #[column(primary)]
                id: i64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("unknown column attribute"));
    }

    #[test]
    fn test_generated_descriptor_chain() {
        let tokens = derive(quote! {
            #[table(name = "dog")]
            struct Dog {
                #[column(primary_key)]
                name: String,
                #[column(references = "person.name", cascade, index)]
                owner: String,
            }
        })
        .unwrap()
        .to_string()
        .replace(char::is_whitespace, "");
        assert!(tokens.contains("constTABLE:&'staticstr=\"dog\""));
        assert!(tokens.contains(".references(\"person\",\"name\").cascade().index()"));
    }

    #[test]
    fn test_unique_wins_over_index() {
        let tokens = derive(quote! {
            struct Person {
                #[column(primary_key)]
                name: String,
                #[column(unique, index)]
                email: String,
            }
        })
        .unwrap()
        .to_string()
        .replace(char::is_whitespace, "");
        assert!(tokens.contains(".unique_index()"));
        assert!(!tokens.contains(".index()"));
    }
}
