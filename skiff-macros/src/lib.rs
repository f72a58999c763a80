mod decode_fields;
mod decode_record;

use decode_fields::{FieldMetadata, decode_field, fields_body, from_row_body, values_body};
use decode_record::decode_record;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use skiff_core::ModelError;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

fn decode_struct(input: &DeriveInput) -> syn::Result<Vec<FieldMetadata>> {
    match &input.data {
        Data::Struct(data) if matches!(data.fields, Fields::Named(..)) => {
            data.fields.iter().map(decode_field).collect()
        }
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            ModelError::NotAStruct {
                type_name: input.ident.to_string(),
            },
        )),
    }
}

fn fields_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = decode_struct(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields_body = fields_body(&fields);
    let values_body = values_body(&fields);
    let from_row_body = from_row_body(&fields);
    Ok(quote! {
        impl #impl_generics ::skiff::Fields for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::skiff::FieldDef> {
                #fields_body
            }
            fn values(&self) -> ::std::vec::Vec<::skiff::Value> {
                #values_body
            }
            fn from_row(row: &::skiff::RowLabeled) -> ::skiff::Result<Self> {
                #from_row_body
            }
        }
    })
}

fn record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = fields_impl(input)?;
    let record = decode_record(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let table_name = &record.name;
    let optional = |v: &Option<String>| match v {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let meta = optional(&record.meta);
    let view = optional(&record.view);
    Ok(quote! {
        #fields
        impl #impl_generics ::skiff::Record for #name #ty_generics #where_clause {
            fn table_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#table_name)
            }
            fn meta() -> ::std::option::Option<&'static str> {
                #meta
            }
            fn view() -> ::std::option::Option<&'static str> {
                #view
            }
        }
    })
}

/// Describes the fields of a struct embedded in records with `#[skiff(flatten)]`.
#[proc_macro_derive(Fields, attributes(skiff))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    fields_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Maps a struct with named fields to a table, implements both `Fields` and `Record`.
///
/// Struct attributes: `#[skiff(name = "..", meta = "..", view = "..")]`.
/// Field attributes: `#[skiff(tag = "..")]`, `#[skiff(flatten)]` and `#[skiff(skip)]`.
#[proc_macro_derive(Record, attributes(skiff))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
