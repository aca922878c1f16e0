//! Attribute parsing utilities

use syn::{Attribute, Expr, ExprLit, Field, Lit, Meta};

/// Column-name sentinel that excludes a field.
const EXCLUDE_SENTINEL: &str = "-";

/// How a field's column is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    Default,
    Named(String),
    Excluded,
}

/// Parsed rowmap attributes of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAttributes {
    pub column: ColumnSpec,
    /// `Some(None)` for `#[embedded]`, `Some(Some(prefix))` for `#[embedded = "prefix"]`
    pub embedded: Option<Option<String>>,
}

fn string_value(attr: &Attribute) -> syn::Result<String> {
    let meta = attr.meta.require_name_value()?;
    match &meta.value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Extract rowmap attributes from a field
pub fn parse_field_attributes(field: &Field) -> syn::Result<FieldAttributes> {
    let mut column = ColumnSpec::Default;
    let mut embedded = None;
    let mut skipped = false;

    for attr in &field.attrs {
        if attr.path().is_ident("column_name") {
            if column != ColumnSpec::Default {
                return Err(syn::Error::new_spanned(attr, "duplicate `column_name` attribute"));
            }
            let value = string_value(attr)?;
            column = if value == EXCLUDE_SENTINEL {
                ColumnSpec::Excluded
            } else if value.is_empty() {
                return Err(syn::Error::new_spanned(attr, "`column_name` must not be empty"));
            } else {
                ColumnSpec::Named(value)
            };
        } else if attr.path().is_ident("skip") {
            attr.meta.require_path_only()?;
            skipped = true;
        } else if attr.path().is_ident("embedded") {
            if embedded.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate `embedded` attribute"));
            }
            embedded = Some(match &attr.meta {
                Meta::Path(_) => None,
                Meta::NameValue(_) => {
                    let prefix = string_value(attr)?;
                    if prefix.is_empty() {
                        None
                    } else {
                        Some(prefix)
                    }
                }
                Meta::List(list) => {
                    return Err(syn::Error::new_spanned(
                        list,
                        "expected `#[embedded]` or `#[embedded = \"prefix\"]`",
                    ));
                }
            });
        }
    }

    if skipped {
        column = ColumnSpec::Excluded;
    }
    if let (Some(_), ColumnSpec::Named(_)) = (&embedded, &column) {
        return Err(syn::Error::new_spanned(
            field,
            "embedded records take their prefix from `#[embedded = \"...\"]`, not `column_name`",
        ));
    }

    Ok(FieldAttributes { column, embedded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn field(tokens: syn::FieldsNamed) -> Field {
        tokens.named.into_iter().next().unwrap()
    }

    #[test]
    fn test_plain_field() {
        let f = field(parse_quote!({ pub id: i64 }));
        let attrs = parse_field_attributes(&f).unwrap();
        assert_eq!(attrs.column, ColumnSpec::Default);
        assert_eq!(attrs.embedded, None);
    }

    #[test]
    fn test_column_name_and_exclusion() {
        let f = field(parse_quote!({ #[column_name = "full_name"] pub name: String }));
        assert_eq!(
            parse_field_attributes(&f).unwrap().column,
            ColumnSpec::Named("full_name".to_string())
        );

        let f = field(parse_quote!({ #[column_name = "-"] pub secret: String }));
        assert_eq!(parse_field_attributes(&f).unwrap().column, ColumnSpec::Excluded);

        let f = field(parse_quote!({ #[skip] pub cache: String }));
        assert_eq!(parse_field_attributes(&f).unwrap().column, ColumnSpec::Excluded);
    }

    #[test]
    fn test_embedded_forms() {
        let f = field(parse_quote!({ #[embedded] pub address: Address }));
        assert_eq!(parse_field_attributes(&f).unwrap().embedded, Some(None));

        let f = field(parse_quote!({ #[embedded = "addr"] pub address: Address }));
        assert_eq!(
            parse_field_attributes(&f).unwrap().embedded,
            Some(Some("addr".to_string()))
        );

        let f = field(parse_quote!({ #[embedded(addr)] pub address: Address }));
        assert!(parse_field_attributes(&f).is_err());
    }

    #[test]
    fn test_rejected_combinations() {
        let f = field(parse_quote!({ #[embedded] #[column_name = "x"] pub address: Address }));
        assert!(parse_field_attributes(&f).is_err());

        let f = field(parse_quote!({ #[column_name = 5] pub id: i64 }));
        assert!(parse_field_attributes(&f).is_err());

        let f = field(parse_quote!({ #[column_name = ""] pub id: i64 }));
        assert!(parse_field_attributes(&f).is_err());
    }
}
