//! AST node types for the Amble language.
//!
//! Every node carries a [`Span`] for error reporting. Expression and
//! statement nodes are reference-counted handles: the evaluator keeps
//! suspended searches alive across driver steps, so it holds on to
//! subtrees by cloning the handle rather than borrowing from the program.

use crate::Span;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: a statement sequence evaluated in its own frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Block,
    pub span: Span,
}

impl Program {
    /// Returns the first statement if it is a bare string literal
    /// (a directive such as `"enable verbose";`).
    pub fn directive(&self) -> Option<&str> {
        let first = self.body.stmts.first()?;
        match &first.kind {
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::String(s) => Some(&**s),
                _ => None,
            },
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: Rc<str>,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<Rc<str>>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A `{ ... }` statement sequence. Also the body of functions and programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Rc<[Stmt]>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self {
            stmts: stmts.into(),
            span,
        }
    }

    /// Names declared directly in this block, in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &Ident> {
        self.stmts.iter().filter_map(|s| s.declared_name())
    }
}

/// A statement handle. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt(Rc<StmtNode>);

#[derive(Debug, PartialEq)]
pub struct StmtNode {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self(Rc::new(StmtNode { kind, span }))
    }

    /// The name this statement introduces into its enclosing block, if any.
    pub fn declared_name(&self) -> Option<&Ident> {
        match &self.kind {
            StmtKind::VariableDecl { name, .. } => Some(name),
            StmtKind::FunctionDecl(function) => function.name.as_ref(),
            _ => None,
        }
    }
}

impl Deref for Stmt {
    type Target = StmtNode;

    fn deref(&self) -> &StmtNode {
        &self.0
    }
}

/// The kind of statement.
#[derive(Debug, PartialEq)]
pub enum StmtKind {
    /// `expr;`
    Expr(Expr),
    /// `let x = e;` / `const x = e;`
    VariableDecl {
        kind: DeclKind,
        name: Ident,
        init: Expr,
    },
    /// `function name(params) { body }`
    FunctionDecl(Rc<Function>),
    /// `return e;` (a bare `return;` carries an `undefined` literal)
    Return(Expr),
    /// `if (test) { ... } [else ...]`
    If {
        test: Expr,
        consequent: Block,
        alternate: Option<ElseBranch>,
    },
    /// `{ ... }`
    Block(Block),
    /// `while (test) { ... }`
    While { test: Expr, body: Block },
    /// `for (init; test; update) { ... }`
    For(Rc<ForLoop>),
    Break,
    Continue,
    /// Commits the enclosing statement sequence to the choices made so far.
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
}

impl DeclKind {
    pub fn is_const(self) -> bool {
        matches!(self, DeclKind::Const)
    }
}

/// The else branch of an if statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else if (...) { ... }`, always an `If` statement.
    ElseIf(Stmt),
    /// `else { ... }`
    Block(Block),
}

/// `for (init; test; update) body`
#[derive(Debug, PartialEq)]
pub struct ForLoop {
    /// A `let` declaration or an expression statement.
    pub init: Option<Stmt>,
    /// A missing test behaves as `true`.
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Block,
}

impl ForLoop {
    /// Variables the loop declares in its own frame.
    pub fn loop_variables(&self) -> impl Iterator<Item = &Ident> {
        self.init.iter().filter_map(|s| s.declared_name())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function declaration, function expression or arrow function.
///
/// Arrow functions with an expression body are desugared to a block holding
/// a single `return`.
#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

impl Function {
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map(|n| &*n.name).unwrap_or("anonymous")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression handle. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr(Rc<ExprNode>);

#[derive(Debug, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self(Rc::new(ExprNode { kind, span }))
    }

    /// The identifier name if this expression is a bare identifier.
    pub fn as_identifier(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

impl Deref for Expr {
    type Target = ExprNode;

    fn deref(&self) -> &ExprNode {
        &self.0
    }
}

/// The kind of expression.
#[derive(Debug, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    /// `[e1, e2, ...]`
    Array(Rc<[Expr]>),

    // ── Names ──
    Identifier(Ident),
    /// `x = e`
    Assign { target: Ident, value: Expr },

    // ── Operators ──
    Unary { op: UnaryOp, operand: Expr },
    Binary { left: Expr, op: BinOp, right: Expr },
    /// `a && b`, `a || b`
    Logical {
        left: Expr,
        op: LogicalOp,
        right: Expr,
    },
    /// `test ? consequent : alternate`
    Conditional {
        test: Expr,
        consequent: Expr,
        alternate: Expr,
    },

    // ── Calls & Access ──
    /// `callee(args...)`
    Call { callee: Expr, args: Rc<[Expr]> },
    /// `object[index]` or `object.name`
    Member {
        object: Expr,
        property: MemberProperty,
    },

    // ── Functions ──
    Function(Rc<Function>),
}

#[derive(Debug, PartialEq)]
pub enum MemberProperty {
    /// `object[expr]`
    Computed(Expr),
    /// `object.name`
    Named(Ident),
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Equality
    StrictEq,
    StrictNotEq,
    // Comparison
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::StrictEq => "===",
            BinOp::StrictNotEq => "!==",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
