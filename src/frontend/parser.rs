//! Parser for Plume
//!
//! Recursive descent over the token stream with at most two tokens of
//! lookahead and no backtracking. Expressions are fully parenthesised in
//! prefix/infix form, so no precedence climbing is needed; a parenthesised
//! single expression is just a grouping.

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::token::Token;
use crate::types::Type;
use crate::utils::{Error, Result};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser from pre-tokenized input
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> Result<&Token> {
        self.tokens.get(self.pos).ok_or_else(Error::unexpected_eof)
    }

    /// Token `offset` positions ahead of the current one
    fn nth(&self, offset: usize) -> Result<&Token> {
        self.tokens.get(self.pos + offset).ok_or_else(Error::unexpected_eof)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self.current()?.clone();
        self.pos += 1;
        Ok(token)
    }

    /// Check the current token without consuming it; false at end of input
    fn check(&self, text: &str) -> bool {
        self.tokens.get(self.pos).map_or(false, |t| t.is(text))
    }

    fn check_next(&self, text: &str) -> bool {
        self.tokens.get(self.pos + 1).map_or(false, |t| t.is(text))
    }

    fn expect(&mut self, text: &str) -> Result<Token> {
        let token = self.advance()?;
        if token.is(text) {
            Ok(token)
        } else {
            Err(Error::parse(
                format!("expected '{}', found {}", text, token),
                token.span,
            ))
        }
    }

    fn consume(&mut self, text: &str) -> bool {
        if self.check(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.expect("program")?.span;

        let mut decls = Vec::new();
        while !self.check("begin") {
            decls.push(self.parse_decl()?);
        }
        self.expect("begin")?;

        let stmts = self.parse_stmts()?;
        self.expect("end")?;
        self.expect(";")?;

        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(Error::parse(
                format!("unexpected tokens after end of program, found {}", extra),
                extra.span,
            ));
        }

        debug!("parsed {} declarations and {} statements", decls.len(), stmts.len());
        Ok(Program { decls, stmts, span: start })
    }

    /// Parse a top-level declaration
    fn parse_decl(&mut self) -> Result<Decl> {
        let second = self.nth(1)?;
        if second.is(":") {
            let var = self.parse_var_decl()?;
            self.expect(";")?;
            Ok(Decl::Variable(var))
        } else if second.is("(") {
            Ok(Decl::Function(self.parse_function()?))
        } else {
            let token = self.current()?;
            Err(Error::parse(
                format!("declaration expected, found {}", token),
                token.span,
            ))
        }
    }

    fn parse_label(&mut self) -> Result<Ident> {
        let token = self.advance()?;
        if token.is_label() {
            Ok(Ident { name: token.text, span: token.span })
        } else {
            Err(Error::parse(
                format!("label expected, found {}", token),
                token.span,
            ))
        }
    }

    /// label ":" type
    fn parse_var_decl(&mut self) -> Result<VariableDecl> {
        let name = self.parse_label()?;
        self.expect(":")?;

        let token = self.advance()?;
        let ty = Type::from_name(&token.text).ok_or_else(|| {
            Error::parse(format!("invalid type {}", token), token.span)
        })?;

        Ok(VariableDecl { span: name.span, name, ty })
    }

    /// Parse a function definition
    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let name = self.parse_label()?;

        self.expect("(")?;
        let mut params = Vec::new();
        if !self.check(")") {
            loop {
                params.push(self.parse_var_decl()?);
                if !self.consume(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        self.expect(":")?;

        let token = self.advance()?;
        let ret_type = Type::from_return_name(&token.text).ok_or_else(|| {
            Error::parse(format!("invalid return type {}", token), token.span)
        })?;

        self.expect("is")?;

        let mut locals = Vec::new();
        while !self.check("begin") {
            locals.push(self.parse_var_decl()?);
            self.expect(";")?;
        }
        self.expect("begin")?;

        let body = self.parse_stmts()?;
        self.expect("end")?;
        self.expect(";")?;

        Ok(FunctionDecl {
            span: name.span,
            name,
            ret_type,
            params,
            locals,
            body,
        })
    }

    /// Statements up to (not including) `end` or `else`
    fn parse_stmts(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check("end") && !self.check("else") {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let span = self.current()?.span;

        if self.consume("while") {
            let cond = self.parse_expr()?;
            self.expect("do")?;
            let body = self.parse_stmts()?;
            self.expect("end")?;
            self.expect("while")?;
            self.expect(";")?;
            return Ok(Stmt::While { cond, body, span });
        }

        if self.consume("if") {
            let cond = self.parse_expr()?;
            self.expect("then")?;
            let then_body = self.parse_stmts()?;
            let else_body = if self.consume("else") {
                Some(self.parse_stmts()?)
            } else {
                None
            };
            self.expect("end")?;
            self.expect("if")?;
            self.expect(";")?;
            return Ok(match else_body {
                Some(else_body) => Stmt::IfElse { cond, then_body, else_body, span },
                None => Stmt::If { cond, then_body, span },
            });
        }

        if self.consume("print") {
            let value = self.parse_expr()?;
            self.expect(";")?;
            return Ok(Stmt::Print { value, span });
        }

        if self.consume("print_line") {
            self.expect(";")?;
            let value = Expr::Literal(Literal::Str("\n".to_string(), span));
            return Ok(Stmt::Print { value, span });
        }

        if self.consume("return") {
            let value = if self.check(";") {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(";")?;
            return Ok(Stmt::Return { value, span });
        }

        if self.nth(1)?.is("(") {
            let callee = self.parse_label()?;
            let args = self.parse_args()?;
            self.expect(";")?;
            return Ok(Stmt::VoidCall { callee, args, span });
        }

        let target = self.parse_label()?;
        if !self.consume(":=") {
            let token = self.current()?;
            return Err(Error::parse(
                format!("unknown syntax, found {}", token),
                token.span,
            ));
        }
        let value = self.parse_expr()?;
        self.expect(";")?;
        Ok(Stmt::Assign { target, value, span })
    }

    /// "(" (expr ("," expr)*)? ")"
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.check(")") {
            loop {
                args.push(self.parse_expr()?);
                if !self.consume(",") {
                    break;
                }
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let span = self.current()?.span;

        if self.consume("(") {
            if self.consume("not") {
                let expr = self.parse_expr()?;
                self.expect(")")?;
                return Ok(Expr::Unary { op: UnOp::Not, expr: Box::new(expr), span });
            }

            // prefix form: (op a b), with (- a) as negation
            let prefix = BinOp::from_symbol(&self.current()?.text);
            if let Some(op) = prefix {
                self.advance()?;
                let left = self.parse_expr()?;
                if op == BinOp::Sub && self.consume(")") {
                    return Ok(Expr::Unary { op: UnOp::Neg, expr: Box::new(left), span });
                }
                let right = self.parse_expr()?;
                self.expect(")")?;
                return Ok(Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                    span,
                });
            }

            // infix form (a op b), or a grouped (a)
            let left = self.parse_expr()?;
            if self.consume(")") {
                return Ok(left);
            }
            let token = self.advance()?;
            let op = BinOp::from_symbol(&token.text).ok_or_else(|| {
                Error::parse(format!("binary operator expected, found {}", token), token.span)
            })?;
            let right = self.parse_expr()?;
            self.expect(")")?;
            return Ok(Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            });
        }

        if self.check_next("(") {
            let callee = self.parse_label()?;
            let args = self.parse_args()?;
            return Ok(Expr::Call { callee, args, span });
        }

        let token = self.advance()?;
        if token.is_int_literal() {
            let value = token.text.parse::<i64>().map_err(|_| {
                Error::parse(format!("integer literal out of range: {}", token.text), token.span)
            })?;
            return Ok(Expr::Literal(Literal::Int(value, span)));
        }
        if token.is("true") || token.is("false") {
            return Ok(Expr::Literal(Literal::Bool(token.is("true"), span)));
        }
        if token.is_string_literal() {
            let content = token.text[1..token.text.len() - 1].to_string();
            return Ok(Expr::Literal(Literal::Str(content, span)));
        }
        if token.is_label() {
            return Ok(Expr::Label(Ident { name: token.text, span }));
        }

        Err(Error::parse(
            format!("literal or label expected, found {}", token),
            token.span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse_program()
    }

    fn parse_err(source: &str) -> String {
        match parse(source) {
            Err(Error::Parse { message, .. }) => message,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        let program = parse("program begin end;").unwrap();
        assert!(program.decls.is_empty());
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn test_assignment_tree() {
        let program = parse("program x : Integer; begin x := (+ 2 3); end;").unwrap();
        assert_eq!(
            program.decls,
            vec![Decl::Variable(VariableDecl {
                name: Ident { name: "x".to_string(), span: Span::new(1, 9) },
                ty: Type::Integer,
                span: Span::new(1, 9),
            })]
        );
        assert_eq!(
            program.stmts,
            vec![Stmt::Assign {
                target: Ident { name: "x".to_string(), span: Span::new(1, 28) },
                value: Expr::Binary {
                    left: Box::new(Expr::Literal(Literal::Int(2, Span::new(1, 36)))),
                    op: BinOp::Add,
                    right: Box::new(Expr::Literal(Literal::Int(3, Span::new(1, 38)))),
                    span: Span::new(1, 33),
                },
                span: Span::new(1, 28),
            }]
        );
    }

    #[test]
    fn test_function_decl() {
        let program = parse(
            "program
             add(a : Integer, b : Integer) : Integer is
                 sum : Integer;
             begin
                 sum := (+ a b);
                 return sum;
             end;
             begin end;",
        )
        .unwrap();

        let func = match &program.decls[0] {
            Decl::Function(func) => func,
            other => panic!("expected function, got {:?}", other),
        };
        assert_eq!(func.name.name, "add");
        assert_eq!(func.ret_type, Type::Integer);
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.locals.len(), 1);
        assert_eq!(func.body.len(), 2);
    }

    #[test]
    fn test_void_function_without_params() {
        let program = parse("program hello() : void is begin print \"hi\"; end; begin hello(); end;")
            .unwrap();
        assert!(matches!(&program.decls[0], Decl::Function(f) if f.ret_type == Type::Void));
        assert!(matches!(&program.stmts[0], Stmt::VoidCall { callee, args, .. }
            if callee.name == "hello" && args.is_empty()));
    }

    #[test]
    fn test_if_else_and_while() {
        let program = parse(
            "program begin
                 if (< 1 2) then print 1; else print 2; end if;
                 if true then end if;
                 while false do print 3; end while;
             end;",
        )
        .unwrap();
        assert!(matches!(program.stmts[0], Stmt::IfElse { .. }));
        assert!(matches!(program.stmts[1], Stmt::If { .. }));
        assert!(matches!(program.stmts[2], Stmt::While { .. }));
    }

    #[test]
    fn test_print_line_desugars() {
        let program = parse("program begin print_line; end;").unwrap();
        assert_eq!(
            program.stmts,
            vec![Stmt::Print {
                value: Expr::Literal(Literal::Str("\n".to_string(), Span::new(1, 15))),
                span: Span::new(1, 15),
            }]
        );
    }

    #[test]
    fn test_string_quotes_stripped() {
        let program = parse("program begin print \"a b\"; end;").unwrap();
        assert!(matches!(&program.stmts[0], Stmt::Print {
            value: Expr::Literal(Literal::Str(s, _)), ..
        } if s == "a b"));
    }

    #[test]
    fn test_unary_and_call_exprs() {
        // `(f(...) == 3)` is a binary wrapped in a unary not
        let program = parse("program begin print (not (f(1, (- 2)) == 3)); end;").unwrap();
        match &program.stmts[0] {
            Stmt::Print { value: Expr::Unary { op: UnOp::Not, expr, .. }, .. } => {
                assert!(matches!(**expr, Expr::Binary { op: BinOp::Eq, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_prefix_and_infix_agree() {
        let expr = |source: &str| match parse(source).unwrap().stmts.remove(0) {
            Stmt::Print { value, .. } => value,
            other => panic!("unexpected {:?}", other),
        };
        let prefix = expr("program begin print (and (< 1 2) true); end;");
        let infix = expr("program begin print ((1 < 2) and true); end;");
        assert!(matches!(prefix, Expr::Binary { op: BinOp::And, .. }));
        assert!(matches!(infix, Expr::Binary { op: BinOp::And, .. }));
    }

    #[test]
    fn test_grouped_expressions() {
        let program = parse("program begin print (f()); print ((x)); print (* n (fact((- n 1)))); end;").unwrap();
        assert!(matches!(program.stmts[0], Stmt::Print { value: Expr::Call { .. }, .. }));
        match &program.stmts[1] {
            Stmt::Print { value: Expr::Label(ident), .. } => assert_eq!(ident.name, "x"),
            other => panic!("unexpected {:?}", other),
        }
        match &program.stmts[2] {
            Stmt::Print { value: Expr::Binary { op: BinOp::Mul, right, .. }, .. } => {
                assert!(matches!(**right, Expr::Call { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_minus_is_negation_or_subtraction() {
        let program = parse("program begin print (- 4); print (- 4 1); end;").unwrap();
        assert!(matches!(
            program.stmts[0],
            Stmt::Print { value: Expr::Unary { op: UnOp::Neg, .. }, .. }
        ));
        assert!(matches!(
            program.stmts[1],
            Stmt::Print { value: Expr::Binary { op: BinOp::Sub, .. }, .. }
        ));
    }

    #[test]
    fn test_return_forms() {
        let program = parse(
            "program f() : void is begin return; end;
                     g() : Integer is begin return 1; end;
             begin end;",
        )
        .unwrap();
        let bodies: Vec<_> = program
            .decls
            .iter()
            .map(|d| match d {
                Decl::Function(f) => f.body[0].clone(),
                Decl::Variable(_) => unreachable!(),
            })
            .collect();
        assert!(matches!(bodies[0], Stmt::Return { value: None, .. }));
        assert!(matches!(bodies[1], Stmt::Return { value: Some(_), .. }));
    }

    #[test]
    fn test_unknown_syntax() {
        assert!(parse_err("program begin x 1; end;").starts_with("unknown syntax"));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse("program begin print 1;").unwrap_err();
        assert_eq!(err, Error::unexpected_eof());
        assert_eq!(parse("program x").unwrap_err(), Error::unexpected_eof());
    }

    #[test]
    fn test_keyword_is_not_a_label() {
        assert!(parse_err("program begin : Integer; end;").starts_with("label expected"));
        assert!(parse_err("program while : Integer; begin end;").starts_with("label expected"));
        assert!(parse_err("program begin print := 1; end;").starts_with("literal or label expected"));
    }

    #[test]
    fn test_declaration_expected() {
        assert!(parse_err("program x y; begin end;").starts_with("declaration expected"));
    }

    #[test]
    fn test_invalid_types() {
        assert!(parse_err("program x : void; begin end;").starts_with("invalid type"));
        assert!(parse_err("program f() : Float is begin end; begin end;")
            .starts_with("invalid return type"));
    }

    #[test]
    fn test_bad_binary_operator() {
        assert!(parse_err("program begin print (1 2 3); end;").starts_with("binary operator expected"));
    }

    #[test]
    fn test_trailing_tokens() {
        assert!(parse_err("program begin end; print").starts_with("unexpected tokens"));
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(parse_err("program begin print 99999999999999999999; end;")
            .starts_with("integer literal out of range"));
    }

    #[test]
    fn test_deterministic() {
        let source = "program f(n : Integer) : Integer is begin return (* n 2); end; begin print f(4); end;";
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }
}
