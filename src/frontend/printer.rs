//! Source printer - render an AST back into canonical Plume source
//!
//! Binary expressions come out in infix form, declarations and statements one
//! per line with four spaces per nesting level.

use crate::frontend::ast::*;

const INDENT: &str = "    ";

/// Render a whole program
pub fn print_program(program: &Program) -> String {
    let mut printer = SourcePrinter::new();
    printer.print_program(program);
    printer.output
}

/// Render a single expression
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

struct SourcePrinter {
    output: String,
    indent: usize,
}

impl SourcePrinter {
    fn new() -> Self {
        Self { output: String::new(), indent: 0 }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn print_program(&mut self, program: &Program) {
        self.line("program");
        self.indent += 1;
        for decl in &program.decls {
            match decl {
                Decl::Variable(var) => self.line(&format!("{};", var_decl(var))),
                Decl::Function(func) => self.print_function(func),
            }
        }
        self.indent -= 1;

        self.line("begin");
        self.print_block(&program.stmts);
        self.line("end;");
    }

    fn print_function(&mut self, func: &FunctionDecl) {
        let params: Vec<String> = func.params.iter().map(var_decl).collect();
        self.line(&format!(
            "{}({}) : {} is",
            func.name.name,
            params.join(", "),
            func.ret_type
        ));

        self.indent += 1;
        for local in &func.locals {
            self.line(&format!("{};", var_decl(local)));
        }
        self.indent -= 1;

        self.line("begin");
        self.print_block(&func.body);
        self.line("end;");
    }

    fn print_block(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        for stmt in stmts {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                self.line(&format!("{} := {};", target.name, print_expr(value)))
            }
            Stmt::If { cond, then_body, .. } => {
                self.line(&format!("if {} then", print_expr(cond)));
                self.print_block(then_body);
                self.line("end if;");
            }
            Stmt::IfElse { cond, then_body, else_body, .. } => {
                self.line(&format!("if {} then", print_expr(cond)));
                self.print_block(then_body);
                self.line("else");
                self.print_block(else_body);
                self.line("end if;");
            }
            Stmt::While { cond, body, .. } => {
                self.line(&format!("while {} do", print_expr(cond)));
                self.print_block(body);
                self.line("end while;");
            }
            Stmt::Print { value: Expr::Literal(Literal::Str(s, _)), .. } if s == "\n" => {
                self.line("print_line;")
            }
            Stmt::Print { value, .. } => self.line(&format!("print {};", print_expr(value))),
            Stmt::Return { value: Some(value), .. } => {
                self.line(&format!("return {};", print_expr(value)))
            }
            Stmt::Return { value: None, .. } => self.line("return;"),
            Stmt::VoidCall { callee, args, .. } => {
                self.line(&format!("{}({});", callee.name, print_args(args)))
            }
        }
    }
}

fn var_decl(var: &VariableDecl) -> String {
    format!("{} : {}", var.name.name, var.ty)
}

fn print_args(args: &[Expr]) -> String {
    args.iter().map(print_expr).collect::<Vec<_>>().join(", ")
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(Literal::Int(n, _)) => out.push_str(&n.to_string()),
        Expr::Literal(Literal::Bool(b, _)) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Literal(Literal::Str(s, _)) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Expr::Label(ident) => out.push_str(&ident.name),
        Expr::Unary { op, expr, .. } => {
            out.push('(');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, expr);
            out.push(')');
        }
        Expr::Binary { left, op, right, .. } => {
            out.push('(');
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, right);
            out.push(')');
        }
        Expr::Call { callee, args, .. } => {
            out.push_str(&callee.name);
            out.push('(');
            out.push_str(&print_args(args));
            out.push(')');
        }
    }
}
