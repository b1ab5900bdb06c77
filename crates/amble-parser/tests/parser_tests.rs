//! Parser tests.
//!
//! Covers: programs and statements, declarations, functions and arrow
//! functions, expression precedence, postfix chains, loops, and `cut`.

use amble_parser::{ParseResult, Parser};
use amble_lexer::Lexer;
use amble_types::ast::*;
use amble_types::SourceFile;
use pretty_assertions::assert_eq;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.amb", source);
    let lex = Lexer::new(&sf).lex();
    Parser::new(lex.tokens, &sf).parse()
}

/// Parse source and return the program, panicking if there are errors.
fn parse_ok(source: &str) -> Program {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.program.expect("no program returned")
}

/// The expression of a single-statement program.
fn expr(source: &str) -> Expr {
    let program = parse_ok(source);
    assert_eq!(program.body.stmts.len(), 1, "expected one statement");
    match &program.body.stmts[0].kind {
        StmtKind::Expr(e) => e.clone(),
        other => panic!("expected expression statement, got {other:?}"),
    }
}

/// Render an expression as a fully parenthesized string for precedence checks.
fn sexp(e: &Expr) -> String {
    match &e.kind {
        ExprKind::Number(n) => n.to_string(),
        ExprKind::String(s) => format!("{s:?}"),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Null => "null".into(),
        ExprKind::Undefined => "undefined".into(),
        ExprKind::Identifier(id) => id.name.to_string(),
        ExprKind::Array(items) => format!(
            "[{}]",
            items.iter().map(sexp).collect::<Vec<_>>().join(" ")
        ),
        ExprKind::Assign { target, value } => format!("(= {} {})", target.name, sexp(value)),
        ExprKind::Unary { op, operand } => format!("({} {})", op.as_str(), sexp(operand)),
        ExprKind::Binary { left, op, right } => {
            format!("({} {} {})", op.as_str(), sexp(left), sexp(right))
        }
        ExprKind::Logical { left, op, right } => {
            format!("({} {} {})", op.as_str(), sexp(left), sexp(right))
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => format!("(? {} {} {})", sexp(test), sexp(consequent), sexp(alternate)),
        ExprKind::Call { callee, args } => {
            let mut parts = vec![sexp(callee)];
            parts.extend(args.iter().map(sexp));
            format!("(call {})", parts.join(" "))
        }
        ExprKind::Member { object, property } => match property {
            MemberProperty::Computed(index) => format!("(index {} {})", sexp(object), sexp(index)),
            MemberProperty::Named(name) => format!("(. {} {})", sexp(object), name.name),
        },
        ExprKind::Function(f) => format!(
            "(fn {} ({}))",
            f.display_name(),
            f.params
                .iter()
                .map(|p| p.name.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        ),
    }
}

fn sexp_of(source: &str) -> String {
    sexp(&expr(source))
}

// ─────────────────────────────────────────────────────────────────────
// Programs & statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_program() {
    let program = parse_ok("");
    assert!(program.body.stmts.is_empty());
    let program = parse_ok(";;  // nothing\n");
    assert!(program.body.stmts.is_empty());
}

#[test]
fn test_statement_sequence() {
    let program = parse_ok("let a = amb(1, 2); a = amb(4, 5); a;");
    let kinds: Vec<&str> = program
        .body
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::VariableDecl { .. } => "decl",
            StmtKind::Expr(_) => "expr",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["decl", "expr", "expr"]);
}

#[test]
fn test_semicolon_optional_at_line_end_and_before_brace() {
    let program = parse_ok("const x = 1\nconst y = 2\nfunction f() { return x }");
    assert_eq!(program.body.stmts.len(), 3);
}

#[test]
fn test_let_and_const() {
    let program = parse_ok("let x = 1; const y = x;");
    match &program.body.stmts[0].kind {
        StmtKind::VariableDecl { kind, name, .. } => {
            assert_eq!(*kind, DeclKind::Let);
            assert_eq!(&*name.name, "x");
        }
        other => panic!("unexpected {other:?}"),
    }
    match &program.body.stmts[1].kind {
        StmtKind::VariableDecl { kind, init, .. } => {
            assert!(kind.is_const());
            assert_eq!(sexp(init), "x");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_function_declaration() {
    let program = parse_ok("function add(a, b) { return a + b; }");
    let StmtKind::FunctionDecl(f) = &program.body.stmts[0].kind else {
        panic!("expected function declaration");
    };
    assert_eq!(f.display_name(), "add");
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.body.stmts.len(), 1);
    let StmtKind::Return(value) = &f.body.stmts[0].kind else {
        panic!("expected return");
    };
    assert_eq!(sexp(value), "(+ a b)");
}

#[test]
fn test_bare_return_yields_undefined() {
    let program = parse_ok("function f() { return; }");
    let StmtKind::FunctionDecl(f) = &program.body.stmts[0].kind else {
        panic!("expected function declaration");
    };
    let StmtKind::Return(value) = &f.body.stmts[0].kind else {
        panic!("expected return");
    };
    assert_eq!(value.kind, ExprKind::Undefined);
}

#[test]
fn test_if_else_chain() {
    let program = parse_ok("if (a) { 1; } else if (b) { 2; } else { 3; }");
    let StmtKind::If { alternate, .. } = &program.body.stmts[0].kind else {
        panic!("expected if");
    };
    let Some(ElseBranch::ElseIf(inner)) = alternate else {
        panic!("expected else-if");
    };
    let StmtKind::If { alternate, .. } = &inner.kind else {
        panic!("expected nested if");
    };
    assert!(matches!(alternate, Some(ElseBranch::Block(_))));
}

#[test]
fn test_if_without_else() {
    let program = parse_ok("if (x > 1) { x; }");
    let StmtKind::If { test, alternate, .. } = &program.body.stmts[0].kind else {
        panic!("expected if");
    };
    assert_eq!(sexp(test), "(> x 1)");
    assert!(alternate.is_none());
}

#[test]
fn test_nested_block_statement() {
    let program = parse_ok("{ const x = 1; { x; } }");
    let StmtKind::Block(block) = &program.body.stmts[0].kind else {
        panic!("expected block");
    };
    assert_eq!(block.stmts.len(), 2);
    assert_eq!(block.declarations().count(), 1);
}

#[test]
fn test_while_loop() {
    let program = parse_ok("let i = 0; while (i < 3) { i = i + 1; if (i === 2) { break; } }");
    let StmtKind::While { test, body } = &program.body.stmts[1].kind else {
        panic!("expected while");
    };
    assert_eq!(sexp(test), "(< i 3)");
    assert_eq!(body.stmts.len(), 2);
}

#[test]
fn test_for_loop_parts() {
    let program = parse_ok("for (let i = 0; i < 10; i = i + 1) { continue; }");
    let StmtKind::For(for_loop) = &program.body.stmts[0].kind else {
        panic!("expected for");
    };
    let names: Vec<&str> = for_loop.loop_variables().map(|i| &*i.name).collect();
    assert_eq!(names, ["i"]);
    assert_eq!(for_loop.test.as_ref().map(sexp).as_deref(), Some("(< i 10)"));
    assert_eq!(
        for_loop.update.as_ref().map(sexp).as_deref(),
        Some("(= i (+ i 1))")
    );
}

#[test]
fn test_for_loop_with_empty_parts() {
    let program = parse_ok("for (;;) { break; }");
    let StmtKind::For(for_loop) = &program.body.stmts[0].kind else {
        panic!("expected for");
    };
    assert!(for_loop.init.is_none());
    assert!(for_loop.test.is_none());
    assert!(for_loop.update.is_none());
}

#[test]
fn test_cut_statement() {
    let program = parse_ok("const f = amb(1, 2, 3); cut; f + amb(4, 5, 6);");
    assert_eq!(program.body.stmts.len(), 3);
    assert_eq!(program.body.stmts[1].kind, StmtKind::Cut);
}

#[test]
fn test_verbose_directive() {
    let program = parse_ok("\"enable verbose\";\n1;");
    assert_eq!(program.directive(), Some("enable verbose"));
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_literals() {
    assert_eq!(sexp_of("42;"), "42");
    assert_eq!(sexp_of("'hi';"), "\"hi\"");
    assert_eq!(sexp_of("true;"), "true");
    assert_eq!(sexp_of("null;"), "null");
    assert_eq!(sexp_of("undefined;"), "undefined");
    assert_eq!(sexp_of("[1, 'a', [2]];"), "[1 \"a\" [2]]");
    assert_eq!(sexp_of("[];"), "[]");
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(sexp_of("1 + 2 * 3;"), "(+ 1 (* 2 3))");
    assert_eq!(sexp_of("(1 + 2) * 3;"), "(* (+ 1 2) 3)");
    assert_eq!(sexp_of("10 - 4 - 3;"), "(- (- 10 4) 3)");
    assert_eq!(sexp_of("a % 3 === 0;"), "(=== (% a 3) 0)");
}

#[test]
fn test_comparison_and_logical_precedence() {
    assert_eq!(
        sexp_of("a < b && c >= d || !e;"),
        "(|| (&& (< a b) (>= c d)) (! e))"
    );
    assert_eq!(sexp_of("a !== b === c;"), "(=== (!== a b) c)");
}

#[test]
fn test_unary_operators_nest() {
    assert_eq!(sexp_of("- -x;"), "(- (- x))");
    assert_eq!(sexp_of("!!true;"), "(! (! true))");
    assert_eq!(sexp_of("-a * b;"), "(* (- a) b)");
}

#[test]
fn test_conditional_is_right_associative() {
    assert_eq!(sexp_of("a ? b : c ? d : e;"), "(? a b (? c d e))");
    assert_eq!(
        sexp_of("amb(false, true) ? 4 - 10 : 6;"),
        "(? (call amb false true) (- 4 10) 6)"
    );
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(sexp_of("a = b = 3;"), "(= a (= b 3))");
}

#[test]
fn test_calls_and_members() {
    assert_eq!(sexp_of("f(1)(2);"), "(call (call f 1) 2)");
    assert_eq!(sexp_of("xs[0][1];"), "(index (index xs 0) 1)");
    assert_eq!(sexp_of("p.x;"), "(. p x)");
    assert_eq!(sexp_of("amb();"), "(call amb)");
    assert_eq!(sexp_of("list(1, 2,);"), "(call list 1 2)");
}

#[test]
fn test_function_expressions() {
    assert_eq!(sexp_of("(function (x) { return x; });"), "(fn anonymous (x))");
    assert_eq!(sexp_of("(function named() { return 1; });"), "(fn named ())");
}

#[test]
fn test_arrow_functions() {
    assert_eq!(sexp_of("x => x + 1;"), "(fn anonymous (x))");
    assert_eq!(sexp_of("(a, b) => a;"), "(fn anonymous (a b))");
    assert_eq!(sexp_of("() => { return 1; };"), "(fn anonymous ())");
}

#[test]
fn test_arrow_expression_body_is_a_return() {
    let e = expr("x => amb(x, 1);");
    let ExprKind::Function(f) = &e.kind else {
        panic!("expected function");
    };
    let StmtKind::Return(value) = &f.body.stmts[0].kind else {
        panic!("expected return");
    };
    assert_eq!(sexp(value), "(call amb x 1)");
}

#[test]
fn test_arrow_as_argument() {
    assert_eq!(
        sexp_of("map(x => x * 2, xs);"),
        "(call map (fn anonymous (x)) xs)"
    );
}

#[test]
fn test_parenthesized_identifier_is_not_arrow() {
    assert_eq!(sexp_of("(x);"), "x");
    assert_eq!(sexp_of("(x) + 1;"), "(+ x 1)");
}

#[test]
fn test_spans_cover_expressions() {
    let e = expr("1 +\n  2;");
    assert_eq!(e.span.start_line, 1);
    assert_eq!(e.span.end_line, 2);
}
