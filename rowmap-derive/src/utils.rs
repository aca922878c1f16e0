//! Utility functions for code generation

use syn::{Type, Visibility};

/// Pointer-like wrappers an embedded record may sit behind.
const INDIRECT_WRAPPERS: &[&str] = &["Box", "Arc", "Rc", "Option"];

/// Whether `ty` reaches its record through a pointer or an `Option`.
pub fn is_indirect(ty: &Type) -> bool {
    match ty {
        Type::Reference(_) | Type::Ptr(_) => true,
        Type::Paren(inner) => is_indirect(&inner.elem),
        Type::Group(inner) => is_indirect(&inner.elem),
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| INDIRECT_WRAPPERS.contains(&segment.ident.to_string().as_str())),
        _ => false,
    }
}

/// Whether a field is externally visible.
pub fn is_exported(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// Field name as written, without a raw-identifier prefix.
pub fn field_name(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}
