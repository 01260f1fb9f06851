//! Field-level `#[orm(...)]` attribute parsing and tag validation.

use syn::{LitStr, Result};

/// Keys understood by the tag mini-language.
const TAG_KEYS: &[&str] = &["type", "ref", "cascade", "rel", "name", "table"];

/// Parsed `#[orm(column = "...", model = "...")]`.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub column: Option<String>,
    pub tag: String,
    /// Whether the tag carries a `rel:` group.
    pub is_relation: bool,
}

pub(super) fn parse_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("column name must not be empty"));
                }
                out.column = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("model") {
                let value: LitStr = meta.value()?.parse()?;
                out.is_relation = validate_tag(&value)?;
                out.tag = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown orm attribute, expected `column` or `model`"))
            }
        })?;
    }

    Ok(out)
}

/// Check every `;`-separated group for a known key and the `key:value`
/// shape. Returns whether a `rel` group is present.
fn validate_tag(lit: &LitStr) -> Result<bool> {
    let mut is_relation = false;

    for group in lit.value().split(';').map(str::trim).filter(|g| !g.is_empty()) {
        let Some((key, value)) = group.split_once(':') else {
            return Err(syn::Error::new(
                lit.span(),
                format!("tag group `{group}` must be written as `key:value`"),
            ));
        };
        let key = key.trim();
        if !TAG_KEYS.contains(&key) {
            return Err(syn::Error::new(
                lit.span(),
                format!(
                    "unknown tag key `{key}`, expected one of: {}",
                    TAG_KEYS.join(", ")
                ),
            ));
        }
        if value.split(',').all(|v| v.trim().is_empty()) {
            return Err(syn::Error::new(
                lit.span(),
                format!("tag key `{key}` needs a value"),
            ));
        }
        if key == "rel" {
            is_relation = true;
        }
    }

    Ok(is_relation)
}
