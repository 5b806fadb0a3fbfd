//! Procedural macros for the pipelayer project.
//!
//! `#[derive(Record)]` turns a struct with named fields into a typed record shape: it
//! implements `pipelayer::record::Record` and generates a `<Type>Fields` companion with one
//! associated function per field, each returning a `pipelayer::property::Property`.
//!
//! ```ignore
//! #[derive(Record)]
//! #[record(collection = "orders")]
//! pub struct Order {
//!     #[record(id)]
//!     pub id: String,
//!     #[record(value = "cust_id")]
//!     pub customer: String,
//!     #[record(name = "qty")]
//!     pub quantity: i32,
//! }
//!
//! assert_eq!(Order::collection_name(), "orders");
//! // OrderFields::id() -> "_id", OrderFields::customer() -> "cust_id", OrderFields::quantity() -> "qty"
//! ```

#[allow(unused_extern_crates)]
extern crate self as pipelayer_macros;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

/// Derives `Record` and the `<Type>Fields` property companion.
///
/// Container attributes:
///
/// * `#[record(collection = "...")]` - The collection name. Defaults to the type name with its
///   first letter lower-cased.
///
/// Field attributes:
///
/// * `#[record(id)]` - Marks the identity property, which always resolves to `_id`
/// * `#[record(value = "...")]` - Wire name override, preferred over `name`
/// * `#[record(name = "...")]` - Wire name override
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldOptions {
    identity: bool,
    value: Option<LitStr>,
    name: Option<LitStr>,
}

fn expand_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let vis = &input.vis;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let collection = collection_name(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    let companion = format_ident!("{}Fields", ident);
    let accessors = fields
        .iter()
        .map(|field| {
            let Some(field_ident) = &field.ident else {
                return Err(syn::Error::new(field.span(), "expected a named field"));
            };
            let options = field_options(field)?;
            let declared = syn::ext::IdentExt::unraw(field_ident).to_string();

            let constructor = if options.identity {
                quote! { ::pipelayer::property::Property::identity(#declared) }
            } else {
                quote! { ::pipelayer::property::Property::new(#declared) }
            };
            let value = options.value.map(|value| quote! { .with_value(#value) });
            let name = options.name.map(|name| quote! { .with_name(#name) });
            let doc = format!("The `{declared}` property of [`{ident}`].");

            Ok(quote! {
                #[doc = #doc]
                pub fn #field_ident() -> ::pipelayer::property::Property {
                    #constructor #value #name
                }
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let companion_doc = format!("Property references for the fields of [`{ident}`].");

    Ok(quote! {
        impl #impl_generics ::pipelayer::record::Record for #ident #ty_generics #where_clause {
            fn collection_name() -> &'static str {
                #collection
            }
        }

        #[doc = #companion_doc]
        #[derive(Debug, Clone, Copy)]
        #vis struct #companion;

        impl #companion {
            #(#accessors)*
        }
    })
}

fn collection_name(input: &DeriveInput) -> syn::Result<String> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `collection`"))
            }
        })?;
    }

    Ok(collection.unwrap_or_else(|| default_collection_name(&input.ident.to_string())))
}

fn default_collection_name(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                options.identity = true;
                Ok(())
            } else if meta.path.is_ident("value") {
                options.value = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `id`, `value` or `name`"))
            }
        })?;
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collection_lower_cases_the_first_letter() {
        assert_eq!(default_collection_name("OrderLine"), "orderLine");
        assert_eq!(default_collection_name("sales"), "sales");
    }
}
