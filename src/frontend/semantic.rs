//! Semantic Analysis for Plume
//!
//! Performs:
//! - Label uniqueness checks (program scope and per-function scope)
//! - Type checking of every statement and expression
//! - The terminal-return rule for non-void functions
//!
//! The analyzer only reads the AST. Once it accepts a program the executor
//! may rely on every expression having the type computed here.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::frontend::ast::*;
use crate::types::Type;
use crate::utils::{Error, Result, Span};

// ==================== Symbol Table ====================

/// Signature of a declared function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub ret: Type,
    pub span: Span,
}

/// Name → declared type for one body being checked
pub type Env = HashMap<String, Type>;

/// The body a statement belongs to
#[derive(Debug, Clone, Copy)]
enum Context<'a> {
    Program,
    Function { name: &'a str, ret: Type },
}

// ==================== Semantic Analyzer ====================

/// Semantic analyzer
#[derive(Debug, Default)]
pub struct SemanticAnalyzer {
    functions: HashMap<String, FunctionSig>,
    globals: Env,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a program
    pub fn analyze(&mut self, program: &Program) -> Result<()> {
        // Pass 1: Collect all top-level definitions
        self.collect_definitions(program)?;

        // Pass 2: Check every function, then the program body
        for decl in &program.decls {
            if let Decl::Function(func) = decl {
                self.check_function(func)?;
            }
        }

        let globals = &self.globals;
        self.check_block(&program.stmts, globals, Context::Program)?;

        debug!(
            "semantic analysis passed ({} functions, {} program variables)",
            self.functions.len(),
            self.globals.len()
        );
        Ok(())
    }

    /// Signature of a function seen during collection
    #[cfg(test)]
    fn function(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }

    fn collect_definitions(&mut self, program: &Program) -> Result<()> {
        let mut labels = HashSet::new();
        for decl in &program.decls {
            let name = decl.name();
            if !labels.insert(name.name.as_str()) {
                return Err(Error::semantic(
                    format!("duplicate label '{}' in program", name.name),
                    decl.span(),
                ));
            }

            match decl {
                Decl::Variable(var) => {
                    self.globals.insert(var.name.name.clone(), var.ty);
                }
                Decl::Function(func) => {
                    let sig = FunctionSig {
                        params: func.params.iter().map(|p| p.ty).collect(),
                        ret: func.ret_type,
                        span: func.span,
                    };
                    self.functions.insert(func.name.name.clone(), sig);
                }
            }
        }
        Ok(())
    }

    /// Build the function's local environment and check its body.
    ///
    /// Params and locals share one flat namespace that also contains every
    /// program function name; program variables are not part of it.
    fn check_function(&self, func: &FunctionDecl) -> Result<()> {
        debug!("checking function {}()", func.name.name);

        let mut labels: HashSet<&str> = self.functions.keys().map(String::as_str).collect();
        let mut env = Env::new();
        env.insert(func.name.name.clone(), func.ret_type);

        for decl in func.scope_decls() {
            if !labels.insert(decl.name.name.as_str()) {
                return Err(Error::semantic(
                    format!(
                        "duplicate label '{}' in function {}",
                        decl.name.name, func.name.name
                    ),
                    decl.span,
                ));
            }
            env.insert(decl.name.name.clone(), decl.ty);
        }

        let ctx = Context::Function { name: &func.name.name, ret: func.ret_type };
        self.check_block(&func.body, &env, ctx)?;

        if !func.ret_type.is_void() {
            self.check_terminal_return(&func.body, func)?;
        }
        Ok(())
    }

    /// The last statement must be a value return, or an if/else whose
    /// branches both end that way. Loops and one-armed ifs never qualify.
    fn check_terminal_return(&self, stmts: &[Stmt], func: &FunctionDecl) -> Result<()> {
        match stmts.last() {
            Some(Stmt::Return { value: Some(_), .. }) => Ok(()),
            Some(Stmt::Return { value: None, span }) => Err(Error::semantic(
                format!("must return a value from {}()", func.name.name),
                *span,
            )),
            Some(Stmt::IfElse { then_body, else_body, .. }) => {
                self.check_terminal_return(then_body, func)?;
                self.check_terminal_return(else_body, func)
            }
            Some(other) => Err(Error::semantic(
                format!(
                    "expected a return-terminating statement at the end of {}()",
                    func.name.name
                ),
                other.span(),
            )),
            None => Err(Error::semantic(
                format!("missing return at the end of {}()", func.name.name),
                func.span,
            )),
        }
    }

    fn check_block(&self, stmts: &[Stmt], env: &Env, ctx: Context<'_>) -> Result<()> {
        for stmt in stmts {
            self.check_stmt(stmt, env, ctx)?;
        }
        Ok(())
    }

    fn check_stmt(&self, stmt: &Stmt, env: &Env, ctx: Context<'_>) -> Result<()> {
        match stmt {
            Stmt::Assign { target, value, span } => {
                let target_ty = *env.get(&target.name).ok_or_else(|| {
                    Error::semantic(
                        format!("cannot assign to undeclared variable {}", target.name),
                        target.span,
                    )
                })?;
                let value_ty = self.check_expr(value, env)?;
                if target_ty != value_ty {
                    return Err(Error::semantic(
                        format!(
                            "cannot assign a value of type {} to {} of type {}",
                            value_ty, target.name, target_ty
                        ),
                        *span,
                    ));
                }
                Ok(())
            }
            Stmt::If { cond, then_body, .. } => {
                self.check_condition(cond, env)?;
                self.check_block(then_body, env, ctx)
            }
            Stmt::IfElse { cond, then_body, else_body, .. } => {
                self.check_condition(cond, env)?;
                self.check_block(then_body, env, ctx)?;
                self.check_block(else_body, env, ctx)
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition(cond, env)?;
                self.check_block(body, env, ctx)
            }
            Stmt::Print { value, .. } => {
                self.check_expr(value, env)?;
                Ok(())
            }
            Stmt::Return { value, span } => self.check_return(value.as_ref(), *span, env, ctx),
            Stmt::VoidCall { callee, args, span } => {
                let sig = self.lookup_function(callee)?;
                if !sig.ret.is_void() {
                    return Err(Error::semantic(
                        format!("non-void function {}() called as a statement", callee.name),
                        *span,
                    ));
                }
                self.check_args(callee, sig, args, env, *span)
            }
        }
    }

    fn check_return(
        &self,
        value: Option<&Expr>,
        span: Span,
        env: &Env,
        ctx: Context<'_>,
    ) -> Result<()> {
        let (name, ret) = match ctx {
            Context::Program => {
                return Err(Error::semantic(
                    "return statements can only be used inside a function body",
                    span,
                ))
            }
            Context::Function { name, ret } => (name, ret),
        };

        match value {
            Some(expr) if ret.is_void() => Err(Error::semantic(
                format!("cannot return a value from void function {}()", name),
                expr.span(),
            )),
            Some(expr) => {
                let ty = self.check_expr(expr, env)?;
                if ty != ret {
                    return Err(Error::semantic(
                        format!("{}() returns {} but was declared to return {}", name, ty, ret),
                        expr.span(),
                    ));
                }
                Ok(())
            }
            None if !ret.is_void() => Err(Error::semantic(
                format!("must return a value from {}()", name),
                span,
            )),
            None => Ok(()),
        }
    }

    fn check_condition(&self, cond: &Expr, env: &Env) -> Result<()> {
        let ty = self.check_expr(cond, env)?;
        if ty != Type::Boolean {
            return Err(Error::semantic(
                format!("condition must be Boolean, found {}", ty),
                cond.span(),
            ));
        }
        Ok(())
    }

    fn lookup_function(&self, callee: &Ident) -> Result<&FunctionSig> {
        self.functions.get(&callee.name).ok_or_else(|| {
            Error::semantic(format!("{}() is not declared", callee.name), callee.span)
        })
    }

    fn check_args(
        &self,
        callee: &Ident,
        sig: &FunctionSig,
        args: &[Expr],
        env: &Env,
        span: Span,
    ) -> Result<()> {
        if sig.params.len() != args.len() {
            return Err(Error::semantic(
                format!(
                    "{}() takes {} arguments but {} were given",
                    callee.name,
                    sig.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        for (i, (arg, param_ty)) in args.iter().zip(&sig.params).enumerate() {
            let arg_ty = self.check_expr(arg, env)?;
            if arg_ty != *param_ty {
                return Err(Error::semantic(
                    format!(
                        "argument {} of {}() has type {} but the parameter is {}",
                        i + 1,
                        callee.name,
                        arg_ty,
                        param_ty
                    ),
                    arg.span(),
                ));
            }
        }
        Ok(())
    }

    /// Type of an expression; never `Void`
    pub fn check_expr(&self, expr: &Expr, env: &Env) -> Result<Type> {
        match expr {
            Expr::Literal(Literal::Int(..)) => Ok(Type::Integer),
            Expr::Literal(Literal::Bool(..)) => Ok(Type::Boolean),
            Expr::Literal(Literal::Str(..)) => Ok(Type::String),
            Expr::Label(ident) => match env.get(&ident.name) {
                Some(ty) if ty.is_void() => Err(Error::semantic(
                    format!("void function {}() used as a value", ident.name),
                    ident.span,
                )),
                Some(ty) => Ok(*ty),
                None => Err(Error::semantic(
                    format!("{} is not declared", ident.name),
                    ident.span,
                )),
            },
            Expr::Unary { op, expr: operand, .. } => {
                let expected = match op {
                    UnOp::Not => Type::Boolean,
                    UnOp::Neg => Type::Integer,
                };
                self.expect_operand(operand, expected, op.symbol(), env)?;
                Ok(expected)
            }
            Expr::Binary { left, op, right, span } => match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                    self.expect_operand(left, Type::Integer, op.symbol(), env)?;
                    self.expect_operand(right, Type::Integer, op.symbol(), env)?;
                    Ok(Type::Integer)
                }
                BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                    self.expect_operand(left, Type::Integer, op.symbol(), env)?;
                    self.expect_operand(right, Type::Integer, op.symbol(), env)?;
                    Ok(Type::Boolean)
                }
                BinOp::And | BinOp::Or => {
                    self.expect_operand(left, Type::Boolean, op.symbol(), env)?;
                    self.expect_operand(right, Type::Boolean, op.symbol(), env)?;
                    Ok(Type::Boolean)
                }
                BinOp::Eq => {
                    let left_ty = self.check_expr(left, env)?;
                    let right_ty = self.check_expr(right, env)?;
                    if left_ty != right_ty {
                        return Err(Error::semantic(
                            format!(
                                "operands of == must have the same type, found {} and {}",
                                left_ty, right_ty
                            ),
                            *span,
                        ));
                    }
                    Ok(Type::Boolean)
                }
            },
            Expr::Call { callee, args, span } => {
                let sig = self.lookup_function(callee)?;
                if sig.ret.is_void() {
                    return Err(Error::semantic(
                        format!("void function {}() used in an expression", callee.name),
                        *span,
                    ));
                }
                self.check_args(callee, sig, args, env, *span)?;
                Ok(sig.ret)
            }
        }
    }

    fn expect_operand(&self, operand: &Expr, expected: Type, op: &str, env: &Env) -> Result<()> {
        let ty = self.check_expr(operand, env)?;
        if ty != expected {
            return Err(Error::semantic(
                format!("operand of '{}' must be {}, found {}", op, expected, ty),
                operand.span(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn analyze(source: &str) -> Result<()> {
        let tokens = Lexer::new(source).tokenize()?;
        let program = Parser::new(tokens).parse_program()?;
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program)
    }

    fn semantic_err(source: &str) -> String {
        match analyze(source) {
            Err(Error::Semantic { message, .. }) => message,
            other => panic!("expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_program() {
        assert!(analyze("program x : Integer; begin x := (+ 2 3); print x; end;").is_ok());
    }

    #[test]
    fn test_recursive_function() {
        let result = analyze(
            "program
             fact(n : Integer) : Integer is begin
                 if (== n 0) then return 1; end if;
                 return (* n fact((- n 1)));
             end;
             begin print fact(5); end;",
        );
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_duplicate_program_label() {
        assert_eq!(
            semantic_err("program x : Integer; x : Boolean; begin end;"),
            "duplicate label 'x' in program"
        );
        assert_eq!(
            semantic_err("program f() : void is begin end; f : Integer; begin end;"),
            "duplicate label 'f' in program"
        );
    }

    #[test]
    fn test_duplicate_function_labels() {
        assert_eq!(
            semantic_err("program f(a : Integer) : void is a : Boolean; begin end; begin end;"),
            "duplicate label 'a' in function f"
        );
        // params may not reuse any program function name
        assert_eq!(
            semantic_err(
                "program g() : void is begin end;
                         f(g : Integer) : void is begin end;
                 begin end;"
            ),
            "duplicate label 'g' in function f"
        );
    }

    #[test]
    fn test_locals_may_reuse_program_variables() {
        let result = analyze(
            "program x : Integer;
                     f(x : Boolean) : void is begin print x; end;
                     g(x : String) : void is begin print x; end;
             begin f(true); end;",
        );
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_functions_do_not_see_program_variables() {
        assert_eq!(
            semantic_err("program x : Integer; f() : void is begin print x; end; begin end;"),
            "x is not declared"
        );
    }

    #[test]
    fn test_undeclared_callee() {
        assert_eq!(semantic_err("program begin g(1, 2); end;"), "g() is not declared");
        assert_eq!(semantic_err("program begin print g(); end;"), "g() is not declared");
    }

    #[test]
    fn test_void_and_non_void_calls() {
        assert_eq!(
            semantic_err("program f() : void is begin end; begin print f(); end;"),
            "void function f() used in an expression"
        );
        assert_eq!(
            semantic_err("program f() : Integer is begin return 1; end; begin f(); end;"),
            "non-void function f() called as a statement"
        );
    }

    #[test]
    fn test_arity_and_argument_types() {
        let decl = "program f(a : Integer, b : Boolean) : void is begin end;";
        assert_eq!(
            semantic_err(&format!("{} begin f(1); end;", decl)),
            "f() takes 2 arguments but 1 were given"
        );
        assert_eq!(
            semantic_err(&format!("{} begin f(1, 2); end;", decl)),
            "argument 2 of f() has type Integer but the parameter is Boolean"
        );
        assert!(analyze(&format!("{} begin f(1, true); end;", decl)).is_ok());
    }

    #[test]
    fn test_terminal_return_rule() {
        // an if without else never satisfies the rule
        assert!(semantic_err(
            "program f() : Integer is begin if (== 1 1) then return 1; end if; end;
             begin print f(); end;"
        )
        .starts_with("expected a return-terminating statement"));

        // nor does a loop, even an infinite one
        assert!(semantic_err(
            "program f() : Integer is begin while true do return 1; end while; end;
             begin end;"
        )
        .starts_with("expected a return-terminating statement"));

        assert_eq!(
            semantic_err("program f() : Integer is begin end; begin end;"),
            "missing return at the end of f()"
        );

        // if/else with both branches returning is accepted
        assert!(analyze(
            "program f(b : Boolean) : Integer is begin
                 if b then return 1; else if (not b) then return 2; else return 3; end if; end if;
             end;
             begin print f(true); end;"
        )
        .is_ok());

        // one branch falling through is rejected
        assert!(analyze(
            "program f(b : Boolean) : Integer is begin
                 if b then return 1; else print 2; end if;
             end;
             begin end;"
        )
        .is_err());
    }

    #[test]
    fn test_return_placement() {
        assert_eq!(
            semantic_err("program begin return; end;"),
            "return statements can only be used inside a function body"
        );
        assert_eq!(
            semantic_err("program f() : void is begin return 1; end; begin end;"),
            "cannot return a value from void function f()"
        );
        assert_eq!(
            semantic_err("program f() : Integer is begin return; end; begin end;"),
            "must return a value from f()"
        );
        assert_eq!(
            semantic_err("program f() : Integer is begin return true; end; begin end;"),
            "f() returns Boolean but was declared to return Integer"
        );
        assert!(analyze("program f() : void is begin return; end; begin f(); end;").is_ok());
    }

    #[test]
    fn test_operator_types() {
        assert!(analyze("program b : Boolean; begin b := (and (< 1 2) (not false)); end;").is_ok());
        assert_eq!(
            semantic_err("program begin print (+ 1 true); end;"),
            "operand of '+' must be Integer, found Boolean"
        );
        assert_eq!(
            semantic_err("program begin print (or 1 true); end;"),
            "operand of 'or' must be Boolean, found Integer"
        );
        assert_eq!(
            semantic_err("program begin print (- \"s\"); end;"),
            "operand of '-' must be Integer, found String"
        );
        assert_eq!(
            semantic_err("program begin print (== 1 \"1\"); end;"),
            "operands of == must have the same type, found Integer and String"
        );
        assert!(analyze("program begin print (== \"a\" \"a\"); end;").is_ok());
    }

    #[test]
    fn test_assignment_types() {
        assert_eq!(
            semantic_err("program x : Integer; begin x := \"five\"; end;"),
            "cannot assign a value of type String to x of type Integer"
        );
        assert_eq!(
            semantic_err("program begin y := 1; end;"),
            "cannot assign to undeclared variable y"
        );
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        assert_eq!(
            semantic_err("program begin if 1 then end if; end;"),
            "condition must be Boolean, found Integer"
        );
        assert_eq!(
            semantic_err("program begin while \"x\" do end while; end;"),
            "condition must be Boolean, found String"
        );
    }

    #[test]
    fn test_void_function_name_is_not_a_value() {
        assert_eq!(
            semantic_err("program f() : void is begin print f; end; begin end;"),
            "void function f() used as a value"
        );
    }

    #[test]
    fn test_collected_signatures() {
        let tokens = Lexer::new("program f(a : Integer) : String is begin return \"x\"; end; begin end;")
            .tokenize()
            .unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program).unwrap();

        let sig = analyzer.function("f").unwrap();
        assert_eq!(sig.params, vec![Type::Integer]);
        assert_eq!(sig.ret, Type::String);
    }
}
