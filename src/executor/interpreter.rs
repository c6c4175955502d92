//! Tree-walking interpreter
//!
//! Runs a program that has already passed semantic analysis. Type errors the
//! analyzer should have caught surface as `Error::Internal`; the only
//! user-facing runtime failures are division by zero and reads of
//! uninitialized variables.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, trace};

use crate::executor::{Frame, Value};
use crate::frontend::ast::{BinOp, Decl, Expr, FunctionDecl, Ident, Literal, Program, Stmt, UnOp};
use crate::utils::{Error, Result};

/// Default cap on active calls
pub const MAX_CALL_DEPTH: usize = 20_000;

/// Outcome of executing a statement or statement sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fall through to the next statement
    Normal,
    /// A `return` was executed; unwind to the call boundary
    Return(Option<Value>),
}

/// Interpreter state for one run
pub struct Executor<'a> {
    program: &'a Program,
    functions: HashMap<&'a str, &'a FunctionDecl>,
    out: &'a mut dyn Write,
    /// Active calls
    depth: usize,
    max_depth: usize,
}

impl<'a> Executor<'a> {
    pub fn new(program: &'a Program, out: &'a mut dyn Write) -> Self {
        let functions = program
            .decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Function(func) => Some((func.name.name.as_str(), func)),
                Decl::Variable(_) => None,
            })
            .collect();

        Self { program, functions, out, depth: 0, max_depth: MAX_CALL_DEPTH }
    }

    /// Override the call depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Execute the program body
    pub fn run(&mut self) -> Result<()> {
        let program = self.program;
        let mut frame = Frame::new();
        for decl in &program.decls {
            if let Decl::Variable(var) = decl {
                frame.declare(&var.name.name, Value::initial(var.ty));
            }
        }
        debug!(
            "executing {} statements with {} program variables",
            program.stmts.len(),
            frame.len()
        );

        match self.exec_block(&program.stmts, &mut frame)? {
            Flow::Normal => {}
            Flow::Return(_) => {
                return Err(Error::internal("return statement escaped the program body"))
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Execute statements in order, stopping at the first `return`
    fn exec_block(&mut self, stmts: &[Stmt], frame: &mut Frame) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt, frame)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, frame: &mut Frame) -> Result<Flow> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let value = self.eval(value, frame)?;
                frame.assign(&target.name, value);
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then_body, .. } => {
                if self.eval_condition(cond, frame)? {
                    self.exec_block(then_body, frame)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::IfElse { cond, then_body, else_body, .. } => {
                if self.eval_condition(cond, frame)? {
                    self.exec_block(then_body, frame)
                } else {
                    self.exec_block(else_body, frame)
                }
            }
            Stmt::While { cond, body, .. } => {
                while self.eval_condition(cond, frame)? {
                    if let Flow::Return(value) = self.exec_block(body, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Print { value, .. } => {
                let value = self.eval(value, frame)?;
                write!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.eval(expr, frame)?),
                    None => None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::VoidCall { callee, args, .. } => {
                match self.call(callee, args, frame)? {
                    None => Ok(Flow::Normal),
                    Some(_) => Err(Error::internal(format!(
                        "void function {}() produced a value",
                        callee.name
                    ))),
                }
            }
        }
    }

    fn eval_condition(&mut self, cond: &Expr, frame: &Frame) -> Result<bool> {
        match self.eval(cond, frame)? {
            Value::Boolean(b) => Ok(b),
            other => Err(Error::internal(format!(
                "condition evaluated to {} instead of Boolean",
                other.ty()
            ))),
        }
    }

    /// Evaluate an expression in the given frame
    pub fn eval(&mut self, expr: &Expr, frame: &Frame) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Int(n, _) => Value::Integer(*n),
                Literal::Bool(b, _) => Value::Boolean(*b),
                Literal::Str(s, _) => Value::String(s.clone()),
            }),
            Expr::Label(ident) => frame.read(ident),
            Expr::Unary { op, expr, .. } => {
                let value = self.eval(expr, frame)?;
                match (op, value) {
                    (UnOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
                    (UnOp::Neg, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
                    (op, value) => Err(Error::internal(format!(
                        "operand of '{}' has type {}",
                        op.symbol(),
                        value.ty()
                    ))),
                }
            }
            Expr::Binary { left, op, right, .. } => {
                let lhs = self.eval(left, frame)?;
                let rhs = self.eval(right, frame)?;
                binary(*op, lhs, rhs, right)
            }
            Expr::Call { callee, args, .. } => match self.call(callee, args, frame)? {
                Some(value) => Ok(value),
                None => Err(Error::internal(format!(
                    "void function {}() used as a value",
                    callee.name
                ))),
            },
        }
    }

    /// Call a function: arguments are evaluated in the caller's frame, the
    /// body runs in a fresh one. Returns `None` for void functions.
    fn call(&mut self, callee: &Ident, args: &[Expr], caller: &Frame) -> Result<Option<Value>> {
        let func = match self.functions.get(callee.name.as_str()) {
            Some(func) => *func,
            None => return Err(Error::internal(format!("{}() is not declared", callee.name))),
        };
        if func.params.len() != args.len() {
            return Err(Error::internal(format!(
                "{}() takes {} arguments but {} were given",
                callee.name,
                func.params.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, caller)?);
        }

        if self.depth >= self.max_depth {
            return Err(Error::execution(
                format!("maximum call depth of {} exceeded", self.max_depth),
                callee.span,
            ));
        }

        let mut frame = Frame::new();
        for local in &func.locals {
            frame.declare(&local.name.name, None);
        }
        for (param, value) in func.params.iter().zip(values) {
            frame.declare(&param.name.name, Some(value));
        }

        self.depth += 1;
        trace!("{:indent$}enter {}() with {} bindings", "", callee.name, frame.len(), indent = self.depth);
        let flow = self.exec_block(&func.body, &mut frame);
        trace!("{:indent$}leave {}()", "", callee.name, indent = self.depth);
        self.depth -= 1;

        match (flow?, func.ret_type.is_void()) {
            (Flow::Normal, true) | (Flow::Return(None), true) => Ok(None),
            (Flow::Return(Some(value)), false) => Ok(Some(value)),
            (Flow::Normal, false) => Err(Error::internal(format!(
                "{}() finished without returning a value",
                callee.name
            ))),
            (Flow::Return(None), false) => Err(Error::internal(format!(
                "{}() returned without a value",
                callee.name
            ))),
            (Flow::Return(Some(_)), true) => Err(Error::internal(format!(
                "void function {}() returned a value",
                callee.name
            ))),
        }
    }
}

/// Apply a binary operator to two evaluated operands. `right` locates
/// division by zero.
fn binary(op: BinOp, lhs: Value, rhs: Value, right: &Expr) -> Result<Value> {
    use Value::{Boolean, Integer};

    let value = match (op, lhs, rhs) {
        (BinOp::Add, Integer(a), Integer(b)) => Integer(a.wrapping_add(b)),
        (BinOp::Sub, Integer(a), Integer(b)) => Integer(a.wrapping_sub(b)),
        (BinOp::Mul, Integer(a), Integer(b)) => Integer(a.wrapping_mul(b)),
        (BinOp::Div | BinOp::Mod, Integer(_), Integer(0)) => {
            return Err(Error::execution("division by zero", right.span()))
        }
        (BinOp::Div, Integer(a), Integer(b)) => Integer(a.wrapping_div(b)),
        (BinOp::Mod, Integer(a), Integer(b)) => Integer(a.wrapping_rem(b)),
        (BinOp::Lt, Integer(a), Integer(b)) => Boolean(a < b),
        (BinOp::Gt, Integer(a), Integer(b)) => Boolean(a > b),
        (BinOp::Le, Integer(a), Integer(b)) => Boolean(a <= b),
        (BinOp::Ge, Integer(a), Integer(b)) => Boolean(a >= b),
        (BinOp::And, Boolean(a), Boolean(b)) => Boolean(a && b),
        (BinOp::Or, Boolean(a), Boolean(b)) => Boolean(a || b),
        (BinOp::Eq, a, b) if a.ty() == b.ty() => Boolean(a == b),
        (op, a, b) => {
            return Err(Error::internal(format!(
                "operands of '{}' have types {} and {}",
                op.symbol(),
                a.ty(),
                b.ty()
            )))
        }
    };
    Ok(value)
}
