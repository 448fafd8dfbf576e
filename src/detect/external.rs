//! Matches produced by an out-of-process detector.
//!
//! An AST matcher with full type information can do a better job at
//! classifying receivers than [`super::MemberCallDetector`]. It hands its
//! results over as a JSON array:
//!
//! ```json
//! [
//!   {
//!     "file": "lib/Dialect/Foo.cpp",
//!     "start_byte": 120,
//!     "end_byte": 141,
//!     "member_name": "dyn_cast",
//!     "is_arrow_access": false,
//!     "family": "::llvm::PointerUnion"
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CastMigrateError, CastResult};
use crate::families::FamilyTable;
use crate::rewrite::MatchedCall;

/// One record of the external match file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMatch {
    pub file: PathBuf,
    pub start_byte: usize,
    pub end_byte: usize,
    pub member_name: String,
    pub is_arrow_access: bool,
    /// Qualified family name, e.g. `::mlir::Value`.
    pub family: String,
}

impl ExternalMatch {
    /// Convert into a [`MatchedCall`], checking the range against `source`
    /// and the family against `families`.
    pub fn to_matched_call(&self, source: &str, families: &FamilyTable) -> CastResult<MatchedCall> {
        let family = families
            .get(&self.family)
            .ok_or_else(|| CastMigrateError::UnknownFamily(self.family.clone()))?;

        if self.start_byte > self.end_byte || source.get(self.start_byte..self.end_byte).is_none() {
            return Err(CastMigrateError::matches(format!(
                "{}: range {}..{} is not valid for a {} byte file",
                self.file.display(),
                self.start_byte,
                self.end_byte,
                source.len()
            )));
        }

        Ok(MatchedCall::new(
            self.start_byte..self.end_byte,
            self.member_name.clone(),
            self.is_arrow_access,
            family.requires_generic_pointer_renaming,
        )
        .with_receiver_type(family.qualified_name))
    }
}

pub fn parse_matches(json: &str) -> CastResult<Vec<ExternalMatch>> {
    serde_json::from_str(json).map_err(|err| CastMigrateError::matches(err.to_string()))
}

pub fn load_matches(path: &Path) -> CastResult<Vec<ExternalMatch>> {
    let raw = std::fs::read_to_string(path)?;
    parse_matches(&raw)
}

/// Group matches by file, in path order.
pub fn group_by_file(matches: Vec<ExternalMatch>) -> BTreeMap<PathBuf, Vec<ExternalMatch>> {
    let mut grouped: BTreeMap<PathBuf, Vec<ExternalMatch>> = BTreeMap::new();
    for m in matches {
        grouped.entry(m.file.clone()).or_default().push(m);
    }
    grouped
}
