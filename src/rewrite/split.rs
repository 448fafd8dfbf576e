//! Call splitting.
//!
//! The splitter works on the *call head*: the literal call text without the
//! closing parenthesis of its (empty) argument list. `Op.cast<T>()` has the
//! head `Op.cast<T>(`, which splits into `Op` and `cast<T>(`.
//!
//! The rightmost `.`/`->` is assumed to introduce the cast method. When the
//! text after it does not start with the method name, as in
//! `v.cast<decltype(a.b)>()`, the split moves to the rightmost
//! `.cast<`/`.template cast<`. Template arguments that mention the method name
//! after a separator (`v.cast<decltype(a.cast)>()`) still split at the wrong
//! place unless the detector supplies a [`SplitHint`].

use super::SplitHint;

/// The two halves of a call head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    pub object_text: String,
    pub function_text: String,
}

/// Strip the closing parenthesis of the argument list.
///
/// Text that does not end in `)` is assumed to be a head already.
pub fn call_head(text: &str) -> &str {
    let trimmed = text.trim_end();
    trimmed.strip_suffix(')').unwrap_or(trimmed)
}

fn separator(is_arrow_access: bool) -> &'static str {
    if is_arrow_access { "->" } else { "." }
}

/// `StringRef::rsplit` semantics: a missing separator leaves everything in
/// the left half.
fn rsplit_or_whole<'a>(text: &'a str, sep: &str) -> (&'a str, &'a str) {
    text.rsplit_once(sep).unwrap_or((text, ""))
}

/// Split a call head into object and function halves.
///
/// Variadic `isa` packs (`v.isa<A, Bs...>(`) contain dots of their own, so
/// they are split at the rightmost `.isa`/`->isa` instead of the last
/// separator, and the function half keeps the whole pack.
pub fn split_call(head: &str, is_arrow_access: bool, member_name: &str) -> SplitResult {
    let sep = separator(is_arrow_access);

    if head.contains("...") && head.contains("isa") {
        let isa_sep = format!("{sep}isa");
        if let Some((object, rest)) = head.rsplit_once(isa_sep.as_str()) {
            return SplitResult {
                object_text: object.to_string(),
                function_text: format!("isa{rest}"),
            };
        }
    }

    let (object, function) = match head.rsplit_once(sep) {
        Some((_, function)) if !names_member(function, member_name) => {
            member_split(head, sep, member_name).unwrap_or_else(|| rsplit_or_whole(head, sep))
        }
        _ => rsplit_or_whole(head, sep),
    };
    SplitResult {
        object_text: object.to_string(),
        function_text: function.to_string(),
    }
}

fn names_member(function: &str, member_name: &str) -> bool {
    let function = function.trim_start();
    let function = function.strip_prefix("template ").unwrap_or(function);
    function.trim_start().starts_with(member_name)
}

/// Split before the rightmost `{sep}{member}<` or `{sep}template {member}<`.
fn member_split<'a>(head: &'a str, sep: &str, member_name: &str) -> Option<(&'a str, &'a str)> {
    if member_name.is_empty() {
        return None;
    }
    let plain = format!("{sep}{member_name}<");
    let disambiguated = format!("{sep}template {member_name}<");
    let at = [plain, disambiguated]
        .iter()
        .filter_map(|needle| head.rfind(needle.as_str()))
        .max()?;
    Some((&head[..at], &head[at + sep.len()..]))
}

/// Split using detector-provided offsets.
///
/// Returns `None` when the offsets do not fit the head, in which case the
/// caller falls back to [`split_call`].
pub(crate) fn split_with_hint(head: &str, hint: SplitHint) -> Option<SplitResult> {
    if hint.object_end > hint.function_start {
        return None;
    }
    let object = head.get(..hint.object_end)?;
    let function = head.get(hint.function_start..)?;
    Some(SplitResult {
        object_text: object.to_string(),
        function_text: function.to_string(),
    })
}
