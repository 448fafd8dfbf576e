use cast_migrate::create_default_engine;
use cast_migrate::diagnostics::Diagnostic;
use insta::assert_snapshot;

fn format_diags(diags: &[Diagnostic]) -> String {
    let mut lines: Vec<String> = diags
        .iter()
        .map(|d| {
            format!(
                "{}:{}: {}: {}: {}",
                d.span.start.row,
                d.span.start.column,
                d.level.as_str(),
                d.lint.name,
                d.suggestion
                    .as_ref()
                    .map(|s| s.replacement.as_str())
                    .unwrap_or("<no fix>")
            )
        })
        .collect();
    lines.sort();
    lines.join("\n")
}

fn lint(src: &str) -> String {
    let diags = create_default_engine()
        .lint_source(src)
        .expect("linting should succeed");
    format_diags(&diags)
}

#[test]
fn dot_arrow_and_legacy_spellings() {
    assert_snapshot!(lint(include_str!("fixtures/casts/basic.cpp")), @r###"
    6:14: warning: functional-casts: llvm::cast<FooOp>(value)
    7:16: warning: functional-casts: llvm::isa<IntegerType>(*ty)
    8:15: warning: functional-casts: llvm::dyn_cast_if_present<StringAttr>(op->getAttr("x"))
    "###);
}

#[test]
fn pointer_union_renames_dyn_cast() {
    assert_snapshot!(lint(include_str!("fixtures/casts/pointer_union.cpp")), @r###"
    2:15: warning: functional-casts: llvm::dyn_cast_if_present<Foo *>(pu)
    3:16: warning: functional-casts: llvm::isa<Bar *>(pu)
    4:15: warning: functional-casts: llvm::dyn_cast<mlir::Attribute>(ofr)
    5:18: warning: functional-casts: llvm::dyn_cast_if_present<Bar *>(pu)
    "###);
}

#[test]
fn member_functions_use_this() {
    assert_snapshot!(lint(include_str!("fixtures/casts/op_class.cpp")), @r###"
    3:28: warning: functional-casts: llvm::isa<SimpleOp>(*this)
    8:14: warning: functional-casts: llvm::dyn_cast<BarOp>(*this)
    "###);
}

#[test]
fn nested_casts_are_reported_separately() {
    assert_snapshot!(lint(include_str!("fixtures/casts/nested.cpp")), @r###"
    2:12: warning: functional-casts: llvm::cast<A>(v)
    2:12: warning: functional-casts: llvm::cast<B>(v.cast<A>())
    "###);
}

#[test]
fn nolint_comments_suppress() {
    assert_snapshot!(
        lint(include_str!("fixtures/casts/suppressed.cpp")),
        @"8:12: warning: functional-casts: llvm::dyn_cast<D>(t)"
    );
}

#[test]
fn free_function_casts_are_left_alone() {
    assert_snapshot!(lint(include_str!("fixtures/casts/negative.cpp")), @"");
}

#[test]
fn auto_copies_keep_the_pointer_union_family() {
    assert_snapshot!(
        lint(include_str!("fixtures/casts/auto_union.cpp")),
        @"3:13: warning: functional-casts: llvm::dyn_cast_if_present<A *>(pu)"
    );
}

#[test]
fn using_and_typedef_aliases_keep_the_pointer_union_family() {
    assert_snapshot!(lint(include_str!("fixtures/casts/alias_union.cpp")), @r###"
    5:13: warning: functional-casts: llvm::dyn_cast_if_present<B *>(q)
    6:13: warning: functional-casts: llvm::dyn_cast_if_present<A *>(c)
    "###);
}
