//! Type helper utilities for syn type analysis.

/// Extract the inner type T from `Wrapper<T>` when the last path segment is
/// `wrapper` with exactly one type argument.
fn single_arg<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Extract the inner type T from Option<T>, or return None if not an Option type.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_arg(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_arg(ty, "Vec")
}
