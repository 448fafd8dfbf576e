//! Detection of deprecated method-style cast calls.
//!
//! Detectors produce [`MatchedCall`]s; everything downstream only sees those.
//! The built-in [`MemberCallDetector`] works on a tree-sitter C++ tree and has
//! no type information, so receiver families are resolved from declarations
//! written in the same file (see [`receiver`]). Matches from an out-of-process
//! detector with real type information can be fed in through [`external`].

pub mod external;
pub mod receiver;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

use crate::families::{FamilyTable, is_tracked_method};
use crate::rewrite::{MatchedCall, SplitHint};

use self::receiver::{MemberScope, ReceiverResolver};

/// Narrow capability interface between detection and rewriting.
pub trait CallSiteDetector {
    fn match_call_sites(&self, source: &str, tree: &Tree) -> Vec<MatchedCall>;
}

/// What to do with a tracked call whose receiver cannot be tied to a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedReceivers {
    /// Rewrite it as an ordinary-family call.
    #[default]
    AssumeOrdinary,
    /// Leave it alone.
    Skip,
}

impl UnresolvedReceivers {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedReceivers::AssumeOrdinary => "assume-ordinary",
            UnresolvedReceivers::Skip => "skip",
        }
    }
}

/// Tree-sitter based detector for `recv.cast<T>()`, `recv->isa<T>()` and
/// implicit-`this` `dyn_cast<T>()` calls inside member functions.
#[derive(Debug, Clone, Default)]
pub struct MemberCallDetector {
    families: FamilyTable,
    unresolved: UnresolvedReceivers,
}

impl MemberCallDetector {
    pub fn new(families: FamilyTable, unresolved: UnresolvedReceivers) -> Self {
        Self {
            families,
            unresolved,
        }
    }

    fn match_call(
        &self,
        node: Node,
        source: &str,
        resolver: &ReceiverResolver<'_>,
    ) -> Option<MatchedCall> {
        let function = node.child_by_field_name("function")?;
        let arguments = node.child_by_field_name("arguments")?;
        if arguments.named_child_count() != 0 {
            return None;
        }

        match function.kind() {
            "field_expression" => self.match_member_call(node, function, source, resolver),
            "template_function" => self.match_implicit_this_call(node, function, source, resolver),
            _ => None,
        }
    }

    fn match_member_call(
        &self,
        call: Node,
        function: Node,
        source: &str,
        resolver: &ReceiverResolver<'_>,
    ) -> Option<MatchedCall> {
        let receiver = function.child_by_field_name("argument")?;
        let operator = access_operator(function)?;
        let method = method_name(function.child_by_field_name("field")?)?;
        let member = slice(source, method);
        if !is_tracked_method(member) {
            return None;
        }

        let candidates = resolver.receiver_types(receiver);
        let classified = self.classify(&candidates)?;

        let start = call.start_byte();
        let hint = SplitHint {
            object_end: receiver.end_byte() - start,
            function_start: operator.end_byte() - start,
        };
        let matched = MatchedCall::new(
            call.start_byte()..call.end_byte(),
            member,
            operator.kind() == "->",
            classified.generic,
        )
        .with_split_hint(hint);
        Some(classified.annotate(matched))
    }

    fn match_implicit_this_call(
        &self,
        call: Node,
        function: Node,
        source: &str,
        resolver: &ReceiverResolver<'_>,
    ) -> Option<MatchedCall> {
        let name = function.child_by_field_name("name")?;
        let member = slice(source, name);
        if !is_tracked_method(member) {
            return None;
        }

        // A zero-argument `cast<T>()` only makes sense as a member call.
        let MemberScope::Member { bases } = resolver.member_scope(call) else {
            return None;
        };
        let classified = self.classify(&bases)?;

        let matched = MatchedCall::new(
            call.start_byte()..call.end_byte(),
            member,
            true,
            classified.generic,
        );
        Some(classified.annotate(matched))
    }

    /// Pick the first candidate type that belongs to a family, falling back
    /// to the unresolved-receiver policy.
    fn classify(&self, candidates: &[String]) -> Option<ClassifiedReceiver> {
        let resolved = candidates.iter().find_map(|ty| {
            self.families.classify_type(ty).map(|family| ClassifiedReceiver {
                generic: family.requires_generic_pointer_renaming,
                written_type: Some(ty.clone()),
                assumed: false,
            })
        });
        if resolved.is_some() {
            return resolved;
        }

        match self.unresolved {
            UnresolvedReceivers::AssumeOrdinary => Some(ClassifiedReceiver {
                generic: false,
                written_type: candidates.first().cloned(),
                assumed: true,
            }),
            UnresolvedReceivers::Skip => None,
        }
    }
}

struct ClassifiedReceiver {
    generic: bool,
    written_type: Option<String>,
    assumed: bool,
}

impl ClassifiedReceiver {
    fn annotate(self, mut matched: MatchedCall) -> MatchedCall {
        if let Some(ty) = self.written_type {
            matched = matched.with_receiver_type(ty);
        }
        if self.assumed {
            matched = matched.assuming_ordinary_family();
        }
        matched
    }
}

impl CallSiteDetector for MemberCallDetector {
    fn match_call_sites(&self, source: &str, tree: &Tree) -> Vec<MatchedCall> {
        let root = tree.root_node();
        let resolver = ReceiverResolver::new(root, source);
        let mut out = Vec::new();

        walk(root, &mut |node| {
            if node.kind() != "call_expression" {
                return;
            }
            if let Some(matched) = self.match_call(node, source, &resolver) {
                tracing::debug!(
                    member = %matched.member_name,
                    start = matched.full_range.start,
                    receiver = ?matched.receiver_type,
                    "matched method cast"
                );
                out.push(matched);
            }
        });

        out
    }
}

fn access_operator(field_expression: Node) -> Option<Node> {
    let mut cursor = field_expression.walk();
    let found = field_expression
        .children(&mut cursor)
        .find(|child| matches!(child.kind(), "." | "->"));
    found
}

/// Name node of the called method, looking through `template` disambiguation.
fn method_name(field: Node) -> Option<Node> {
    match field.kind() {
        "template_method" => field.child_by_field_name("name"),
        "dependent_name" | "dependent_field_identifier" => {
            let mut cursor = field.walk();
            let template = field
                .named_children(&mut cursor)
                .find(|child| child.kind() == "template_method");
            template.and_then(|t| t.child_by_field_name("name"))
        }
        _ => None,
    }
}

pub(crate) fn walk<'tree>(node: Node<'tree>, f: &mut impl FnMut(Node<'tree>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

pub(crate) fn slice<'a>(source: &'a str, node: Node) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}
