//! Abstract Syntax Tree definitions for Plume
//!
//! The tree is built once by the parser and only read afterwards.

use crate::types::Type;
use crate::utils::Span;

/// A complete program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(VariableDecl),
    Function(FunctionDecl),
}

impl Decl {
    pub fn name(&self) -> &Ident {
        match self {
            Decl::Variable(var) => &var.name,
            Decl::Function(func) => &func.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Variable(var) => var.span,
            Decl::Function(func) => func.span,
        }
    }
}

/// `name : Type`, used for program variables, parameters and locals
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: Ident,
    pub ty: Type,
    pub span: Span,
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub ret_type: Type,
    pub params: Vec<VariableDecl>,
    pub locals: Vec<VariableDecl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunctionDecl {
    /// Parameters followed by locals; they share one scope
    pub fn scope_decls(&self) -> impl Iterator<Item = &VariableDecl> {
        self.params.iter().chain(self.locals.iter())
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// label := expr
    Assign {
        target: Ident,
        value: Expr,
        span: Span,
    },
    /// if cond then ... end if
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        span: Span,
    },
    /// if cond then ... else ... end if
    IfElse {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
        span: Span,
    },
    /// while cond do ... end while
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    /// print expr (print_line is a Print of "\n")
    Print {
        value: Expr,
        span: Span,
    },
    /// return [expr]
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// Call of a void function in statement position
    VoidCall {
        callee: Ident,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::IfElse { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::VoidCall { span, .. } => *span,
        }
    }
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Variable reference
    Label(Ident),
    /// (not e) / (- e)
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    /// (l op r)
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    /// Call of a non-void function
    Call {
        callee: Ident,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span(),
            Expr::Label(ident) => ident.span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Call { span, .. } => *span,
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64, Span),
    Bool(bool, Span),
    /// Content without the surrounding quotes
    Str(String, Span),
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::Int(_, s) => *s,
            Literal::Bool(_, s) => *s,
            Literal::Str(_, s) => *s,
        }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn from_symbol(symbol: &str) -> Option<BinOp> {
        let op = match symbol {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Mod,
            "<" => BinOp::Lt,
            ">" => BinOp::Gt,
            "<=" => BinOp::Le,
            ">=" => BinOp::Ge,
            "==" => BinOp::Eq,
            "and" => BinOp::And,
            "or" => BinOp::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Logical not
    Not,
    /// Negation (-)
    Neg,
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Not => "not",
            UnOp::Neg => "-",
        }
    }
}
