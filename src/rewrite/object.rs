//! Turns the object half of a split call into the argument of the free
//! function call.

/// Normalize the receiver text.
///
/// - dot access keeps the receiver as is;
/// - arrow access dereferences it, since the free functions take the pointee;
/// - arrow access with an empty function half is an implicit `this` call
///   whose call-site text ended up in the object half, so `*this` is appended
///   to it.
pub fn normalize_object_text(object_text: &str, function_text: &str, is_arrow_access: bool) -> String {
    if !is_arrow_access {
        return object_text.to_string();
    }
    if function_text.trim().is_empty() {
        return format!("{object_text}*this");
    }
    format!("*{object_text}")
}
