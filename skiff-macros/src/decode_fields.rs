use proc_macro2::TokenStream;
use quote::quote;
use skiff_core::Tag;
use syn::{Field, Ident, LitStr, Type, spanned::Spanned};

pub(crate) enum FieldKind {
    Column,
    /// Mapped by `#[skiff(flatten)]`, the field type describes its own fields.
    Flatten,
    /// Not mapped, filled with `Default::default()` when reading rows.
    Skip,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) column_name: String,
    pub(crate) tag: String,
    pub(crate) kind: FieldKind,
}

pub(crate) fn decode_field(field: &Field) -> syn::Result<FieldMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new(field.span(), "Expected a named field"));
    };
    let name = ident.to_string().trim_start_matches("r#").to_string();
    let mut tag = String::new();
    let mut kind = FieldKind::Column;
    for attr in field.attrs.iter().filter(|v| v.path().is_ident("skiff")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                tag = meta.value()?.parse::<LitStr>()?.value();
            } else if meta.path.is_ident("flatten") {
                kind = FieldKind::Flatten;
            } else if meta.path.is_ident("skip") {
                kind = FieldKind::Skip;
            } else {
                return Err(meta.error("Unknown field attribute, expected `tag`, `flatten` or `skip`"));
            }
            Ok(())
        })?;
    }
    if matches!(kind, FieldKind::Column) && (name.starts_with('_') || tag.trim() == "-") {
        kind = FieldKind::Skip;
    }
    let mut column_name = name.clone();
    if matches!(kind, FieldKind::Column) {
        let parsed = Tag::parse(&tag).map_err(|e| syn::Error::new(field.span(), format!("{e:#}")))?;
        if let Some(args) = parsed.get("name")
            && let [renamed] = args
        {
            column_name = renamed.clone();
        }
    }
    Ok(FieldMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        column_name,
        tag,
        kind,
    })
}

/// Body of `Fields::fields`.
pub(crate) fn fields_body(fields: &[FieldMetadata]) -> TokenStream {
    let defs = fields.iter().filter_map(|f| {
        let ty = &f.ty;
        let name = &f.name;
        let tag = &f.tag;
        match f.kind {
            FieldKind::Column => Some(quote!(::skiff::FieldDef::column::<#ty>(#name, #tag))),
            FieldKind::Flatten => Some(quote!(::skiff::FieldDef::embedded::<#ty>())),
            FieldKind::Skip => None,
        }
    });
    quote!(vec![#(#defs),*])
}

/// Body of `Fields::values`.
pub(crate) fn values_body(fields: &[FieldMetadata]) -> TokenStream {
    let pushes = fields.iter().filter_map(|f| {
        let ident = &f.ident;
        match f.kind {
            FieldKind::Column => Some(quote! {
                values.push(::skiff::AsValue::as_value(::std::clone::Clone::clone(&self.#ident)));
            }),
            FieldKind::Flatten => Some(quote! {
                values.extend(::skiff::Fields::values(&self.#ident));
            }),
            FieldKind::Skip => None,
        }
    });
    quote! {
        let mut values = ::std::vec::Vec::new();
        #(#pushes)*
        values
    }
}

/// Body of `Fields::from_row`.
pub(crate) fn from_row_body(fields: &[FieldMetadata]) -> TokenStream {
    let assignments = fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let column = &f.column_name;
        match f.kind {
            FieldKind::Column => quote!(#ident: row.get::<#ty>(#column)?),
            FieldKind::Flatten => quote!(#ident: <#ty as ::skiff::Fields>::from_row(row)?),
            FieldKind::Skip => quote!(#ident: ::std::default::Default::default()),
        }
    });
    quote! {
        Ok(Self {
            #(#assignments,)*
        })
    }
}
