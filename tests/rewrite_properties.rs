//! End-to-end properties of the call rewriter, independent of any detector.

use cast_migrate::diagnostics::Applicability;
use cast_migrate::rewrite::{
    CastRewriter, DEPRECATION_MESSAGE, FunctionNormalizer, MatchedCall, SplitHint,
};

const VALUE: Option<&str> = Some("::mlir::Value");
const POINTER_UNION: Option<&str> = Some("::llvm::PointerUnion");

fn rewrite(text: &str, member: &str, arrow: bool, family: Option<&str>) -> String {
    CastRewriter::default()
        .rewrite_text(text, member, arrow, family)
        .replacement
}

#[test]
fn dot_access_on_ordinary_family() {
    assert_eq!(
        rewrite("Op.dyn_cast<Foo>()", "dyn_cast", false, Some("::mlir::Op")),
        "llvm::dyn_cast<Foo>(Op)"
    );
}

#[test]
fn arrow_access_dereferences_the_receiver() {
    assert_eq!(
        rewrite("Ptr->cast<Bar>()", "cast", true, Some("::mlir::Type")),
        "llvm::cast<Bar>(*Ptr)"
    );
    assert_eq!(
        rewrite("getOp()->getResult(0)->isa<T>()", "isa", true, VALUE),
        "llvm::isa<T>(*getOp()->getResult(0))"
    );
}

#[test]
fn degenerate_in_class_call() {
    assert_eq!(
        rewrite("isa<FooOp>()", "isa", true, Some("::mlir::Op")),
        "llvm::isa<FooOp>(*this)"
    );
}

#[test]
fn variadic_isa_pack() {
    assert_eq!(
        rewrite("Val.isa<A, B, C...>()", "isa", false, VALUE),
        "llvm::isa<A, B, C...>(Val)"
    );
    assert_eq!(
        rewrite("p->isa<Ts...>()", "isa", true, VALUE),
        "llvm::isa<Ts...>(*p)"
    );
}

#[test]
fn template_disambiguator_is_dropped() {
    assert_eq!(
        rewrite("v.template cast<T>()", "cast", false, VALUE),
        "llvm::cast<T>(v)"
    );
}

#[test]
fn legacy_nullable_cast_is_unified_for_every_family() {
    assert_eq!(
        rewrite("a.dyn_cast_or_null<T>()", "dyn_cast_or_null", false, VALUE),
        "llvm::dyn_cast_if_present<T>(a)"
    );
    assert_eq!(
        rewrite("pu.dyn_cast_or_null<T *>()", "dyn_cast_or_null", false, POINTER_UNION),
        "llvm::dyn_cast_if_present<T *>(pu)"
    );
}

#[test]
fn generic_pointer_dyn_cast_is_renamed_only_for_pointer_union() {
    assert_eq!(
        rewrite("pu.dyn_cast<T *>()", "dyn_cast", false, POINTER_UNION),
        "llvm::dyn_cast_if_present<T *>(pu)"
    );
    assert_eq!(
        rewrite("v.dyn_cast<T>()", "dyn_cast", false, VALUE),
        "llvm::dyn_cast<T>(v)"
    );
    assert_eq!(
        rewrite("pu.cast<T *>()", "cast", false, POINTER_UNION),
        "llvm::cast<T *>(pu)"
    );
}

#[test]
fn canonical_spelling_is_idempotent() {
    let normalizer = FunctionNormalizer::default();
    for generic in [false, true] {
        let once = normalizer.normalize("dyn_cast_if_present<T>(", generic);
        assert_eq!(once, "llvm::dyn_cast_if_present<T>(");
        assert_eq!(normalizer.normalize(&once, generic), once);
    }
}

#[test]
fn custom_namespace_is_injected() {
    let rewriter = CastRewriter::new(
        cast_migrate::families::FamilyTable::builtin(),
        FunctionNormalizer::new("::llvm::"),
    );
    let fix = rewriter.rewrite_text("x.cast<T>()", "cast", false, VALUE);
    assert_eq!(fix.replacement, "::llvm::cast<T>(x)");
}

#[test]
fn patch_covers_the_whole_call_with_fixed_message() {
    let source = "  auto y = x->cast<T>();\n";
    let call = MatchedCall::new(11..23, "cast", true, false);
    let text = call.source_text(source).expect("range fits");
    assert_eq!(text, "x->cast<T>()");

    let fix = CastRewriter::default().rewrite(&call, text);
    assert_eq!(fix.range, 11..23);
    assert_eq!(fix.replacement, "llvm::cast<T>(*x)");
    assert_eq!(fix.message, DEPRECATION_MESSAGE);
    assert_eq!(fix.applicability, Applicability::MachineApplicable);
}

#[test]
fn dot_access_without_function_half_is_maybe_incorrect() {
    let fix = CastRewriter::default().rewrite_text("cast<T>()", "cast", false, VALUE);
    assert_eq!(fix.replacement, "llvm::cast<T>()");
    assert_eq!(fix.applicability, Applicability::MaybeIncorrect);
}

#[test]
fn split_hint_beats_heuristic() {
    let text = "v.cast<decltype(a.cast)>()";
    let heuristic = CastRewriter::default().rewrite_text(text, "cast", false, VALUE);
    assert_ne!(heuristic.replacement, "llvm::cast<decltype(a.cast)>(v)");

    let call = MatchedCall::new(0..text.len(), "cast", false, false).with_split_hint(SplitHint {
        object_end: 1,
        function_start: 2,
    });
    let fix = CastRewriter::default().rewrite(&call, text);
    assert_eq!(fix.replacement, "llvm::cast<decltype(a.cast)>(v)");
}

#[test]
fn separators_in_template_arguments_without_a_hint() {
    assert_eq!(
        rewrite("v.cast<decltype(a.b)>()", "cast", false, VALUE),
        "llvm::cast<decltype(a.b)>(v)"
    );
    assert_eq!(
        rewrite("disabled.cast<Ts...>()", "cast", false, VALUE),
        "llvm::cast<Ts...>(disabled)"
    );
}

const REWRITE_CASES: &[(&str, &str, bool, Option<&str>)] = &[
    ("Op.dyn_cast<Foo>()", "dyn_cast", false, Some("::mlir::Op")),
    ("Ptr->cast<Bar>()", "cast", true, Some("::mlir::Type")),
    ("isa<FooOp>()", "isa", true, Some("::mlir::Op")),
    ("Val.isa<A, B, C...>()", "isa", false, VALUE),
    ("p->isa<Ts...>()", "isa", true, VALUE),
    ("v.template cast<T>()", "cast", false, VALUE),
    ("a.dyn_cast_or_null<T>()", "dyn_cast_or_null", false, VALUE),
    ("pu.dyn_cast<T *>()", "dyn_cast", false, POINTER_UNION),
    ("pu.dyn_cast_or_null<T *>()", "dyn_cast_or_null", false, POINTER_UNION),
    ("pu.isa<A *>()", "isa", false, POINTER_UNION),
    ("v.cast<decltype(a.b)>()", "cast", false, VALUE),
];

fn rewritten_cases() -> Vec<(String, bool)> {
    REWRITE_CASES
        .iter()
        .map(|&(text, member, arrow, family)| {
            (rewrite(text, member, arrow, family), family == POINTER_UNION)
        })
        .collect()
}

#[test]
fn function_half_of_every_replacement_is_already_normalized() {
    let normalizer = FunctionNormalizer::default();
    for (replacement, generic) in rewritten_cases() {
        let end = replacement.find(">(").expect("replacement has a template call") + 2;
        let function = &replacement[..end];
        assert_eq!(normalizer.normalize(function, generic), function, "{replacement}");
    }
}

#[test]
fn replacements_are_not_reported_again() {
    let body: String = rewritten_cases()
        .iter()
        .enumerate()
        .map(|(i, (replacement, _))| format!("    auto r{i} = {replacement};\n"))
        .collect();
    let source = format!(
        "class FooOp : public mlir::Op<FooOp> {{\n  bool check(mlir::Op Op, mlir::Type *Ptr, mlir::Value Val, mlir::Value *p,\n             mlir::Value v, mlir::Value a, llvm::PointerUnion<T *, A *> pu) {{\n{body}    return true;\n  }}\n}};\n"
    );

    let diags = cast_migrate::create_default_engine()
        .lint_source(&source)
        .expect("linting should succeed");
    assert!(diags.is_empty(), "{source}\n{diags:#?}");
}
