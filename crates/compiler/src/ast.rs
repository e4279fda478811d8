//! AST for Delta programs.
//!
//! Every node lives in a [`bumpalo::Bump`] arena scoped to one
//! compilation: names are `&'a str` slices and child lists are `&'a [_]`
//! slices allocated in the same arena, so the whole tree dies at once and
//! no node is freed individually. Parent -> child links are plain
//! non-owning references valid for the arena's lifetime.
//!
//! Sum types model every `is-a`: [`Expr`], [`Term`], [`Statement`] and
//! [`IfChain`] are matched exhaustively by the emitter and the debug
//! printer, so a missing case is a compile error, not a runtime surprise.

use crate::types::DataType;

/// An expression is either a prefix term or a binary operation.
#[derive(Debug)]
pub enum Expr<'a> {
    Term(&'a Term<'a>),
    Binary(&'a Binary<'a>),
}

impl<'a> Expr<'a> {
    /// Source line of the leftmost token of this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Term(term) => term.line(),
            Expr::Binary(binary) => binary.line,
        }
    }
}

/// Binary operators, in precedence groups 2 (`* /`), 1 (`+ -`), 0 (rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Equals,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Less
                | BinaryOp::LessEquals
                | BinaryOp::Greater
                | BinaryOp::GreaterEquals
                | BinaryOp::Equals
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::LessEquals => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEquals => ">=",
            BinaryOp::Equals => "==",
        }
    }
}

#[derive(Debug)]
pub struct Binary<'a> {
    pub op: BinaryOp,
    pub lhs: &'a Expr<'a>,
    pub rhs: &'a Expr<'a>,
    pub line: usize,
}

/// Prefix terms of the expression grammar.
#[derive(Debug)]
pub enum Term<'a> {
    IntLiteral {
        value: &'a str,
        line: usize,
    },
    FloatLiteral {
        value: &'a str,
        line: usize,
    },
    DoubleLiteral {
        value: &'a str,
        line: usize,
    },
    StringLiteral {
        value: &'a str,
        line: usize,
    },
    Identifier {
        name: &'a str,
        line: usize,
    },
    Paren {
        expr: &'a Expr<'a>,
    },
    Call {
        name: &'a str,
        args: &'a [&'a Expr<'a>],
        line: usize,
    },
    Cast {
        target: DataType,
        expr: &'a Expr<'a>,
        line: usize,
    },
    AddressOf {
        name: &'a str,
        line: usize,
    },
    Deref {
        expr: &'a Expr<'a>,
        line: usize,
    },
    ArrayAccess {
        array: &'a Expr<'a>,
        index: &'a Expr<'a>,
        line: usize,
    },
}

impl<'a> Term<'a> {
    pub fn line(&self) -> usize {
        match self {
            Term::IntLiteral { line, .. }
            | Term::FloatLiteral { line, .. }
            | Term::DoubleLiteral { line, .. }
            | Term::StringLiteral { line, .. }
            | Term::Identifier { line, .. }
            | Term::Call { line, .. }
            | Term::Cast { line, .. }
            | Term::AddressOf { line, .. }
            | Term::Deref { line, .. }
            | Term::ArrayAccess { line, .. } => *line,
            Term::Paren { expr } => expr.line(),
        }
    }
}

/// A braced list of statements.
#[derive(Debug)]
pub struct Scope<'a> {
    pub statements: &'a [&'a Statement<'a>],
}

#[derive(Debug)]
pub enum Statement<'a> {
    Exit {
        expr: &'a Expr<'a>,
        line: usize,
    },
    Let {
        name: &'a str,
        ty: DataType,
        is_const: bool,
        expr: &'a Expr<'a>,
        line: usize,
    },
    Assign {
        name: &'a str,
        expr: &'a Expr<'a>,
        line: usize,
    },
    If(&'a IfStatement<'a>),
    While {
        cond: &'a Expr<'a>,
        body: &'a Scope<'a>,
        line: usize,
    },
    Return {
        expr: Option<&'a Expr<'a>>,
        line: usize,
    },
    Scope(&'a Scope<'a>),
    Expression(&'a Expr<'a>),
    /// `*p = v;` - the target is the pointer expression itself.
    PointerAssign {
        ptr: &'a Expr<'a>,
        value: &'a Expr<'a>,
        line: usize,
    },
    /// `a[i] = v;`
    ArrayAssign {
        array: &'a Expr<'a>,
        index: &'a Expr<'a>,
        value: &'a Expr<'a>,
        line: usize,
    },
}

impl<'a> Statement<'a> {
    pub fn line(&self) -> usize {
        match self {
            Statement::Exit { line, .. }
            | Statement::Let { line, .. }
            | Statement::Assign { line, .. }
            | Statement::While { line, .. }
            | Statement::Return { line, .. }
            | Statement::PointerAssign { line, .. }
            | Statement::ArrayAssign { line, .. } => *line,
            Statement::If(if_stmt) => if_stmt.line,
            Statement::Expression(expr) => expr.line(),
            Statement::Scope(scope) => scope
                .statements
                .first()
                .map(|s| s.line())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug)]
pub struct IfStatement<'a> {
    pub cond: &'a Expr<'a>,
    pub scope: &'a Scope<'a>,
    pub chain: Option<&'a IfChain<'a>>,
    pub line: usize,
}

/// The `elif`/`else` tail of an `if` statement.
#[derive(Debug)]
pub enum IfChain<'a> {
    Elif {
        cond: &'a Expr<'a>,
        scope: &'a Scope<'a>,
        chain: Option<&'a IfChain<'a>>,
        line: usize,
    },
    Else {
        scope: &'a Scope<'a>,
    },
}

#[derive(Debug)]
pub struct Parameter<'a> {
    pub name: &'a str,
    pub ty: DataType,
    pub line: usize,
}

#[derive(Debug)]
pub struct FunctionDecl<'a> {
    pub name: &'a str,
    pub params: &'a [Parameter<'a>],
    pub return_type: DataType,
    pub body: &'a Scope<'a>,
    pub line: usize,
}

/// `external TYPE name(TYPE, ..., ...?);` - a function provided by the
/// link step, declared but never defined here.
#[derive(Debug)]
pub struct ExternDecl<'a> {
    pub name: &'a str,
    pub params: &'a [DataType],
    pub return_type: DataType,
    pub is_variadic: bool,
    pub line: usize,
}

/// A whole translation unit after preprocessing.
#[derive(Debug, Default)]
pub struct Program<'a> {
    pub externs: Vec<&'a ExternDecl<'a>>,
    pub functions: Vec<&'a FunctionDecl<'a>>,
    pub statements: Vec<&'a Statement<'a>>,
}

impl<'a> Program<'a> {
    pub fn find_function(&self, name: &str) -> Option<&'a FunctionDecl<'a>> {
        self.functions.iter().copied().find(|f| f.name == name)
    }
}
