//! Normalization of the function half of a split call.
//!
//! The function half is the method name plus everything after it up to and
//! including the opening parenthesis: `template dyn_cast_or_null<T>(`. The
//! normalizer only touches the name at the front; template arguments and the
//! parenthesis pass through untouched.

/// The single free-function name both tolerant cast spellings end up as.
pub const CANONICAL_NULLABLE_CAST: &str = "dyn_cast_if_present";

/// Nullable cast spelling used by the ordinary families.
pub const LEGACY_NULLABLE_CAST: &str = "dyn_cast_or_null";

/// `PointerUnion::dyn_cast` tolerated null receivers, unlike the free
/// `dyn_cast`, so the generic-pointer family renames it.
const GENERIC_POINTER_CAST: &str = "dyn_cast";

pub const DEFAULT_NAMESPACE: &str = "llvm::";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNormalizer {
    namespace: String,
}

impl Default for FunctionNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl FunctionNormalizer {
    /// `namespace` is injected verbatim in front of the function name and
    /// should end in `::`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Normalize `function_text` for a receiver of the given family kind.
    ///
    /// An empty function half means the detector could not isolate the
    /// method name (the implicit `this` case); only the namespace prefix is
    /// returned and the object half carries the call-site text.
    pub fn normalize(&self, function_text: &str, is_generic_pointer_family: bool) -> String {
        let text = function_text.trim_start();
        let text = text.strip_prefix("template ").unwrap_or(text).trim();
        let text = self.strip_namespace(text);

        // Before the generic-pointer rule: `dyn_cast_or_null` also starts with
        // `dyn_cast` and must not become `dyn_cast_if_present_or_null`.
        if let Some(rest) = text.strip_prefix(LEGACY_NULLABLE_CAST) {
            return self.qualify(&format!("{CANONICAL_NULLABLE_CAST}{rest}"));
        }

        if is_generic_pointer_family
            && !text.starts_with(CANONICAL_NULLABLE_CAST)
            && let Some(rest) = text.strip_prefix(GENERIC_POINTER_CAST)
        {
            return self.qualify(&format!("{CANONICAL_NULLABLE_CAST}{rest}"));
        }

        if text.is_empty() {
            return self.namespace.clone();
        }

        self.qualify(text)
    }

    fn strip_namespace<'a>(&self, text: &'a str) -> &'a str {
        if self.namespace.is_empty() {
            return text;
        }
        text.strip_prefix(self.namespace.as_str()).unwrap_or(text)
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }
}
