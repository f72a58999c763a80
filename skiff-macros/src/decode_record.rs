use convert_case::{Case, Casing};
use syn::{DeriveInput, LitStr};

pub(crate) struct RecordMetadata {
    pub(crate) name: String,
    pub(crate) meta: Option<String>,
    pub(crate) view: Option<String>,
}

pub(crate) fn decode_record(input: &DeriveInput) -> syn::Result<RecordMetadata> {
    let mut result = RecordMetadata {
        name: input.ident.to_string().to_case(Case::Snake),
        meta: None,
        view: None,
    };
    for attr in input.attrs.iter().filter(|v| v.path().is_ident("skiff")) {
        attr.parse_nested_meta(|meta| {
            let value = meta.value()?.parse::<LitStr>()?.value();
            if meta.path.is_ident("name") {
                result.name = value;
            } else if meta.path.is_ident("meta") {
                result.meta = Some(value);
            } else if meta.path.is_ident("view") {
                result.view = Some(value);
            } else {
                return Err(meta.error("Unknown record attribute, expected `name`, `meta` or `view`"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}
