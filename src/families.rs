//! Compiled-in table of type families whose method casts are deprecated.

/// Method names the detectors look for.
pub const TRACKED_METHODS: &[&str] = &["cast", "dyn_cast", "isa", "dyn_cast_or_null"];

pub fn is_tracked_method(name: &str) -> bool {
    TRACKED_METHODS.contains(&name)
}

/// A tracked type family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    /// Fully qualified name, with a leading `::`.
    pub qualified_name: &'static str,
    /// Whether `dyn_cast` on this family becomes `dyn_cast_if_present`.
    pub requires_generic_pointer_renaming: bool,
}

impl Family {
    const fn ordinary(qualified_name: &'static str) -> Self {
        Self {
            qualified_name,
            requires_generic_pointer_renaming: false,
        }
    }

    const fn generic_pointer(qualified_name: &'static str) -> Self {
        Self {
            qualified_name,
            requires_generic_pointer_renaming: true,
        }
    }

    fn segments(&self) -> impl Iterator<Item = &'static str> {
        self.qualified_name.trim_start_matches("::").split("::")
    }
}

const BUILTIN_FAMILIES: &[Family] = &[
    Family::ordinary("::mlir::Attribute"),
    Family::ordinary("::mlir::Op"),
    Family::ordinary("::mlir::Type"),
    Family::ordinary("::mlir::Value"),
    Family::ordinary("::mlir::OpFoldResult"),
    Family::generic_pointer("::llvm::PointerUnion"),
];

/// Immutable family table handed to detectors and the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTable {
    families: Vec<Family>,
}

impl Default for FamilyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FamilyTable {
    /// The families that support the free-function casts.
    pub fn builtin() -> Self {
        Self::from_families(BUILTIN_FAMILIES.to_vec())
    }

    pub fn from_families(families: Vec<Family>) -> Self {
        Self { families }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Family> {
        self.families.iter()
    }

    /// Look up a family by qualified name; the leading `::` is optional.
    pub fn get(&self, name: &str) -> Option<&Family> {
        let wanted = name.trim().trim_start_matches("::");
        self.families
            .iter()
            .find(|f| f.qualified_name.trim_start_matches("::") == wanted)
    }

    /// Classify a type as written in source (`const mlir::Value &`,
    /// `PointerUnion<A *, B *>`, `::mlir::Op<FooOp>`).
    ///
    /// The written name matches a family when its `::` segments are a suffix
    /// of the family's qualified name, so unqualified spellings brought in by
    /// `using` declarations are recognized.
    pub fn classify_type(&self, written: &str) -> Option<&Family> {
        let base = base_type_name(written)?;
        let written_segments: Vec<&str> = base.split("::").map(str::trim).collect();

        self.families.iter().find(|family| {
            let family_segments: Vec<&str> = family.segments().collect();
            family_segments.ends_with(&written_segments)
        })
    }
}

/// Strip cv-qualifiers, elaborated-type keywords, references, pointers and
/// template arguments from a written type.
fn base_type_name(written: &str) -> Option<&str> {
    let mut text = written.trim();
    if let Some(open) = text.find('<') {
        text = &text[..open];
    }
    let text = text.trim_end_matches(|c: char| c == '&' || c == '*' || c.is_whitespace());

    let mut rest = text;
    loop {
        let before = rest;
        for keyword in ["const ", "volatile ", "class ", "struct ", "typename "] {
            if let Some(stripped) = rest.strip_prefix(keyword) {
                rest = stripped.trim_start();
            }
        }
        if rest == before {
            break;
        }
    }

    let rest = rest
        .trim_end_matches(" const")
        .trim_end()
        .trim_start_matches("::");
    if rest.is_empty() || rest == "auto" {
        return None;
    }
    Some(rest)
}
