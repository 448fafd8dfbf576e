//! Helpers for honoring clang-tidy style `NOLINT` comments.
//!
//! Supported forms, each optionally followed by a check list such as
//! `(functional-casts, misc-*)`:
//!
//! - `// NOLINT` suppresses its own line;
//! - `// NOLINTNEXTLINE` suppresses the following line;
//! - `// NOLINTBEGIN` ... `// NOLINTEND` suppresses every line in between.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CheckFilter {
    All,
    Only(Vec<String>),
}

impl CheckFilter {
    fn parse(after_keyword: &str) -> Self {
        let Some(list) = after_keyword.strip_prefix('(') else {
            return CheckFilter::All;
        };
        let Some(close) = list.find(')') else {
            return CheckFilter::All;
        };
        let names: Vec<String> = list[..close]
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            CheckFilter::All
        } else {
            CheckFilter::Only(names)
        }
    }

    fn matches(&self, check: &str) -> bool {
        match self {
            CheckFilter::All => true,
            CheckFilter::Only(names) => names.iter().any(|pattern| glob_matches(pattern, check)),
        }
    }
}

fn glob_matches(pattern: &str, check: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => check.starts_with(prefix),
        None => pattern == check,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    ThisLine,
    NextLine,
    Begin,
    End,
}

fn parse_directive(line: &str) -> Option<(Directive, CheckFilter)> {
    let comment_start = match (line.find("//"), line.find("/*")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return None,
    };
    let comment = &line[comment_start..];
    let at = comment.find("NOLINT")?;
    let rest = &comment[at + "NOLINT".len()..];

    let (directive, after) = if let Some(after) = rest.strip_prefix("NEXTLINE") {
        (Directive::NextLine, after)
    } else if let Some(after) = rest.strip_prefix("BEGIN") {
        (Directive::Begin, after)
    } else if let Some(after) = rest.strip_prefix("END") {
        (Directive::End, after)
    } else {
        (Directive::ThisLine, rest)
    };

    Some((directive, CheckFilter::parse(after)))
}

/// Per-file index of suppressed lines.
#[derive(Debug, Default)]
pub struct SuppressionIndex {
    lines: HashMap<usize, Vec<CheckFilter>>,
    regions: Vec<(usize, usize, CheckFilter)>,
}

impl SuppressionIndex {
    pub fn new(source: &str) -> Self {
        let mut index = SuppressionIndex::default();
        let mut open: Vec<(usize, CheckFilter)> = Vec::new();
        let mut last_row = 0usize;

        for (idx, line) in source.lines().enumerate() {
            let row = idx + 1;
            last_row = row;
            let Some((directive, filter)) = parse_directive(line) else {
                continue;
            };
            match directive {
                Directive::ThisLine => index.lines.entry(row).or_default().push(filter),
                Directive::NextLine => index.lines.entry(row + 1).or_default().push(filter),
                Directive::Begin => open.push((row, filter)),
                Directive::End => {
                    let pos = open
                        .iter()
                        .rposition(|(_, f)| *f == filter)
                        .or_else(|| open.len().checked_sub(1));
                    if let Some(pos) = pos {
                        let (start, begin_filter) = open.remove(pos);
                        index.regions.push((start, row, begin_filter));
                    }
                }
            }
        }

        for (start, filter) in open {
            index.regions.push((start, last_row, filter));
        }

        index
    }

    /// Whether `check` is suppressed on the 1-based `row`.
    pub fn is_suppressed(&self, row: usize, check: &str) -> bool {
        if self
            .lines
            .get(&row)
            .is_some_and(|filters| filters.iter().any(|f| f.matches(check)))
        {
            return true;
        }
        self.regions
            .iter()
            .any(|(start, end, filter)| (*start..=*end).contains(&row) && filter.matches(check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &str = "functional-casts";

    #[test]
    fn nolint_on_same_line() {
        let src = "a();\nv.cast<T>(); // NOLINT\n";
        let index = SuppressionIndex::new(src);
        assert!(index.is_suppressed(2, CHECK));
        assert!(!index.is_suppressed(1, CHECK));
    }

    #[test]
    fn nolint_next_line() {
        let src = "// NOLINTNEXTLINE(functional-casts)\nv.cast<T>();\nw.cast<T>();\n";
        let index = SuppressionIndex::new(src);
        assert!(index.is_suppressed(2, CHECK));
        assert!(!index.is_suppressed(3, CHECK));
    }

    #[test]
    fn check_list_filters_by_name_and_glob() {
        let src = "x(); // NOLINT(readability-*)\ny(); // NOLINT(functional-*)\nz(); // NOLINT(*)\n";
        let index = SuppressionIndex::new(src);
        assert!(!index.is_suppressed(1, CHECK));
        assert!(index.is_suppressed(2, CHECK));
        assert!(index.is_suppressed(3, CHECK));
    }

    #[test]
    fn begin_end_region() {
        let src = "a();\n// NOLINTBEGIN\nb();\nc();\n// NOLINTEND\nd();\n";
        let index = SuppressionIndex::new(src);
        assert!(!index.is_suppressed(1, CHECK));
        assert!(index.is_suppressed(3, CHECK));
        assert!(index.is_suppressed(4, CHECK));
        assert!(!index.is_suppressed(6, CHECK));
    }

    #[test]
    fn unterminated_region_runs_to_end_of_file() {
        let src = "a();\n/* NOLINTBEGIN(functional-casts) */\nb();\nc();";
        let index = SuppressionIndex::new(src);
        assert!(index.is_suppressed(4, CHECK));
        assert!(!index.is_suppressed(1, CHECK));
    }

    #[test]
    fn directive_outside_comment_is_ignored() {
        let src = "const char *s = \"NOLINT\";\n";
        let index = SuppressionIndex::new(src);
        assert!(!index.is_suppressed(1, CHECK));
    }
}
