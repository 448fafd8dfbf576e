//! Best-effort receiver type lookup without a type checker.
//!
//! Declarations and class definitions are indexed once per file. A receiver
//! identifier resolves to the type of the nearest declaration of that name
//! that precedes it; `this` resolves to the base classes of the enclosing
//! class. `auto` declarations initialized from another variable take that
//! variable's type, and `using`/`typedef` aliases declared in the file are
//! expanded.

use tree_sitter::Node;

use super::{slice, walk};

const DECLARATION_KINDS: &[&str] = &[
    "declaration",
    "parameter_declaration",
    "optional_parameter_declaration",
    "field_declaration",
];

/// Bound on `auto` and alias chains.
const MAX_RESOLUTION_DEPTH: usize = 8;

#[derive(Debug, Clone)]
struct DeclaredName {
    name: String,
    start_byte: usize,
    written_type: String,
    /// Identifier the declaration is initialized from, as in `auto b = a;`.
    initializer: Option<String>,
}

#[derive(Debug, Clone)]
struct TypeAlias {
    name: String,
    aliased: String,
}

#[derive(Debug, Clone)]
struct ClassInfo {
    name: String,
    bases: Vec<String>,
}

/// Whether a node sits inside a member function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberScope {
    /// Not inside a member function.
    Free,
    /// Inside a member function of a class with these written bases. The
    /// list is empty when the class definition is not in this file.
    Member { bases: Vec<String> },
}

pub struct ReceiverResolver<'src> {
    source: &'src str,
    declarations: Vec<DeclaredName>,
    classes: Vec<ClassInfo>,
    aliases: Vec<TypeAlias>,
}

impl<'src> ReceiverResolver<'src> {
    pub fn new(root: Node, source: &'src str) -> Self {
        let mut declarations = Vec::new();
        let mut classes = Vec::new();
        let mut aliases = Vec::new();

        walk(root, &mut |node| {
            let kind = node.kind();
            if DECLARATION_KINDS.contains(&kind) {
                collect_declaration(node, source, &mut declarations);
            } else if matches!(kind, "alias_declaration" | "type_definition") {
                collect_alias(node, source, &mut aliases);
            } else if matches!(kind, "class_specifier" | "struct_specifier")
                && node.child_by_field_name("body").is_some()
                && let Some(name) = node.child_by_field_name("name")
            {
                classes.push(ClassInfo {
                    name: last_segment(slice(source, name)).to_string(),
                    bases: class_bases(node, source),
                });
            }
        });

        Self {
            source,
            declarations,
            classes,
            aliases,
        }
    }

    /// Candidate written types for a receiver expression, most likely first.
    /// Alias expansions follow the type they expand.
    pub fn receiver_types(&self, receiver: Node) -> Vec<String> {
        let mut candidates = Vec::new();
        for ty in self.written_receiver_types(receiver) {
            let expansions = self.expand_aliases(&ty);
            candidates.push(ty);
            candidates.extend(expansions);
        }
        candidates
    }

    fn written_receiver_types(&self, receiver: Node) -> Vec<String> {
        match receiver.kind() {
            "identifier" => self
                .declared_type(slice(self.source, receiver), receiver.start_byte())
                .into_iter()
                .collect(),
            "this" => match self.member_scope(receiver) {
                MemberScope::Member { bases } => bases,
                MemberScope::Free => Vec::new(),
            },
            "parenthesized_expression" => receiver
                .named_child(0)
                .map(|inner| self.written_receiver_types(inner))
                .unwrap_or_default(),
            "pointer_expression" => receiver
                .child_by_field_name("argument")
                .map(|inner| self.written_receiver_types(inner))
                .unwrap_or_default(),
            "field_expression" => receiver
                .child_by_field_name("field")
                .filter(|field| field.kind() == "field_identifier")
                .and_then(|field| self.declared_type(slice(self.source, field), field.start_byte()))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Written type of the nearest declaration of `name` before `use_byte`,
    /// or of any declaration of it (class members may be declared later).
    /// Deduced types are replaced by the type of the initializing variable.
    fn declared_type(&self, name: &str, use_byte: usize) -> Option<String> {
        let mut decl = self.declaration(name, use_byte)?;
        for _ in 0..MAX_RESOLUTION_DEPTH {
            if !is_deduced(&decl.written_type) {
                break;
            }
            let Some(next) = decl
                .initializer
                .as_deref()
                .and_then(|init| self.declaration(init, decl.start_byte))
            else {
                break;
            };
            decl = next;
        }
        Some(decl.written_type.clone())
    }

    fn declaration(&self, name: &str, use_byte: usize) -> Option<&DeclaredName> {
        let preceding = self
            .declarations
            .iter()
            .filter(|d| d.name == name && d.start_byte < use_byte)
            .max_by_key(|d| d.start_byte);

        preceding.or_else(|| self.declarations.iter().find(|d| d.name == name))
    }

    /// Types `ty` names through the file's aliases, outermost first.
    fn expand_aliases(&self, ty: &str) -> Vec<String> {
        let mut expansions: Vec<String> = Vec::new();
        let mut current = ty;
        for _ in 0..MAX_RESOLUTION_DEPTH {
            let name = last_segment(strip_declarator_noise(current));
            let Some(alias) = self.aliases.iter().find(|a| a.name == name) else {
                break;
            };
            if expansions.contains(&alias.aliased) {
                break;
            }
            expansions.push(alias.aliased.clone());
            current = &alias.aliased;
        }
        expansions
    }

    /// Determine whether `node` is inside a member function and, if so, the
    /// bases of its class.
    pub fn member_scope(&self, node: Node) -> MemberScope {
        let Some(function) = ancestor(node, &["function_definition"]) else {
            return MemberScope::Free;
        };

        if let Some(class) = ancestor(function, &["class_specifier", "struct_specifier"]) {
            return MemberScope::Member {
                bases: class_bases(class, self.source),
            };
        }

        let Some(class_name) = out_of_line_class(function, self.source) else {
            return MemberScope::Free;
        };
        let bases = self
            .classes
            .iter()
            .find(|c| c.name == class_name)
            .map(|c| c.bases.clone())
            .unwrap_or_default();
        MemberScope::Member { bases }
    }
}

fn collect_declaration(node: Node, source: &str, out: &mut Vec<DeclaredName>) {
    let Some(ty) = node.child_by_field_name("type") else {
        return;
    };
    let written_type = slice(source, ty).to_string();

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if let Some(name) = declarator_name(declarator) {
            out.push(DeclaredName {
                name: slice(source, name).to_string(),
                start_byte: name.start_byte(),
                written_type: written_type.clone(),
                initializer: initializer_name(declarator, source),
            });
        }
    }
}

/// `using PU = llvm::PointerUnion<A *, B *>;` and
/// `typedef llvm::PointerUnion<A *, B *> PU;`.
fn collect_alias(node: Node, source: &str, out: &mut Vec<TypeAlias>) {
    let Some(ty) = node.child_by_field_name("type") else {
        return;
    };
    let aliased = slice(source, ty).trim().to_string();

    if node.kind() == "alias_declaration" {
        if let Some(name) = node.child_by_field_name("name") {
            out.push(TypeAlias {
                name: slice(source, name).to_string(),
                aliased,
            });
        }
        return;
    }

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        if let Some(name) = declarator_name(declarator) {
            out.push(TypeAlias {
                name: slice(source, name).to_string(),
                aliased: aliased.clone(),
            });
        }
    }
}

/// Identifier on the right of `x = y` or inside `x(y)` / `x{y}`.
fn initializer_name(declarator: Node, source: &str) -> Option<String> {
    if declarator.kind() != "init_declarator" {
        return None;
    }
    let mut value = declarator.child_by_field_name("value")?;
    if matches!(value.kind(), "argument_list" | "initializer_list") {
        if value.named_child_count() != 1 {
            return None;
        }
        value = value.named_child(0)?;
    }
    (value.kind() == "identifier").then(|| slice(source, value).to_string())
}

fn is_deduced(written_type: &str) -> bool {
    matches!(written_type.trim(), "auto" | "decltype(auto)")
}

/// `const Foo &` -> `Foo`.
fn strip_declarator_noise(ty: &str) -> &str {
    let ty = ty.trim();
    let ty = ty.strip_prefix("const ").unwrap_or(ty);
    ty.trim_end_matches(['&', '*', ' '])
}

/// Unwrap `*p`, `&r`, `a[3]` and `x = init` down to the declared identifier.
fn declarator_name(mut node: Node) -> Option<Node> {
    loop {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" => return Some(node),
            "init_declarator" | "pointer_declarator" | "array_declarator" => {
                node = node.child_by_field_name("declarator")?;
            }
            "reference_declarator" => node = node.named_child(0)?,
            _ => return None,
        }
    }
}

fn class_bases(class: Node, source: &str) -> Vec<String> {
    let mut cursor = class.walk();
    let Some(clause) = class
        .children(&mut cursor)
        .find(|child| child.kind() == "base_class_clause")
    else {
        return Vec::new();
    };

    let mut cursor = clause.walk();
    clause
        .named_children(&mut cursor)
        .filter(|base| !matches!(base.kind(), "access_specifier" | "comment" | "virtual"))
        .map(|base| slice(source, base).to_string())
        .collect()
}

/// Class name of an out-of-line member definition such as
/// `LogicalResult FooOp::verify() { ... }`.
fn out_of_line_class(function: Node, source: &str) -> Option<String> {
    let mut declarator = function.child_by_field_name("declarator")?;
    while declarator.kind() != "function_declarator" {
        declarator = match declarator.kind() {
            "reference_declarator" => declarator.named_child(0)?,
            _ => declarator.child_by_field_name("declarator")?,
        };
    }

    let name = declarator.child_by_field_name("declarator")?;
    if name.kind() != "qualified_identifier" {
        return None;
    }
    let scope = name.child_by_field_name("scope")?;
    Some(last_segment(slice(source, scope)).to_string())
}

fn ancestor<'tree>(node: Node<'tree>, kinds: &[&str]) -> Option<Node<'tree>> {
    let mut cur = node.parent();
    while let Some(parent) = cur {
        if kinds.contains(&parent.kind()) {
            return Some(parent);
        }
        cur = parent.parent();
    }
    None
}

/// `mlir::detail::FooOp<T>` -> `FooOp`.
fn last_segment(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name).trim();
    name.rsplit("::").next().unwrap_or(name).trim()
}
