//! Hand-written recursive descent over the token sequence, one cursor, no
//! backtracking. Mirrors the grammar:
//!
//! ```text
//! Program          = OuterStatement*
//! OuterStatement   = FunctionDefinition
//! FunctionScope    = FunctionScopeStmt*
//! FunctionScopeStmt= Expression ';' | Assignment ';' | VariableDeclaration
//!                  | Block | If | While | Return
//! Block            = '{' FunctionScope '}'
//! If               = 'if' '(' Comparison ')' FunctionScopeStmt ('else' FunctionScopeStmt)?
//! While            = 'while' '(' Comparison ')' FunctionScopeStmt
//! Comparison       = Expression CompOp Expression
//! FunctionDef      = 'func' Id '(' Params ')' Block
//! Params           = (Id (',' Id)*)?
//! Return           = 'return' Expression ';'
//! VariableDecl     = 'var' Id ('=' Expression)? ';'
//! Expression       = Term ([+-] Term)*
//! Term             = Factor ([*/] Factor)*
//! Factor           = ('+'|'-') Factor | '(' Expression ')' | Number | Variable | Call
//! Assignment       = Id '=' Expression
//! Call             = Id '(' Args ')'
//! Args             = (Expression (',' Expression)*)?
//! ```

use svmc_lex::{BinOpKind, Keyword, ParenKind, Token, TokenKind, UnOpKind};
use svmc_util::{CompileError, CompileResult, Origin};

use crate::ast::{Block, Comparison, Expr, ExprKind, FunctionDefinition, Program, Stmt, StmtKind, Variable};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    pub fn parse_program(mut self) -> CompileResult<Program> {
        let mut functions = Vec::new();
        while !self.at_eof() {
            functions.push(self.parse_function_definition()?);
        }
        Ok(Program { functions })
    }

    // -- cursor plumbing ---------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_origin(&self) -> Origin {
        self.current().origin
    }

    fn at_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = *self.current();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        tok
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let origin = self.current_origin();
        match &self.current().kind {
            TokenKind::Eof => CompileError::syntax(origin, format!("expected {expected} but got EOF")),
            other => CompileError::syntax(origin, format!("expected {expected} but got {other:?}")),
        }
    }

    fn expect_semicolon(&mut self) -> CompileResult<()> {
        if matches!(self.current().kind, TokenKind::Semicolon) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    fn expect_paren(&mut self, kind: ParenKind, open: bool) -> CompileResult<Origin> {
        if let TokenKind::Parenthesis { kind: k, open: o } = self.current().kind {
            if k == kind && o == open {
                let origin = self.current_origin();
                self.advance();
                return Ok(origin);
            }
        }
        let desc = match (kind, open) {
            (ParenKind::Round, true) => "'('",
            (ParenKind::Round, false) => "')'",
            (ParenKind::Curly, true) => "'{'",
            (ParenKind::Curly, false) => "'}'",
        };
        Err(self.unexpected(desc))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> CompileResult<Origin> {
        if let TokenKind::Keyword(k) = self.current().kind {
            if k == keyword {
                let origin = self.current_origin();
                self.advance();
                return Ok(origin);
            }
        }
        Err(self.unexpected(&format!("keyword {keyword:?}")))
    }

    fn expect_id(&mut self) -> CompileResult<Variable> {
        if let TokenKind::Id(name) = self.current().kind {
            let origin = self.current_origin();
            self.advance();
            return Ok(Variable { name, origin });
        }
        Err(self.unexpected("an identifier"))
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.current().kind, TokenKind::Keyword(k) if k == keyword)
    }

    fn at_paren(&self, kind: ParenKind, open: bool) -> bool {
        matches!(self.current().kind, TokenKind::Parenthesis { kind: k, open: o } if k == kind && o == open)
    }

    // -- grammar productions ------------------------------------------------

    fn parse_function_definition(&mut self) -> CompileResult<FunctionDefinition> {
        let origin = self.expect_keyword(Keyword::Func)?;
        let name_var = self.expect_id()?;
        self.expect_paren(ParenKind::Round, true)?;
        let params = self.parse_params()?;
        self.expect_paren(ParenKind::Round, false)?;
        let body = self.parse_block()?;
        Ok(FunctionDefinition { name: name_var.name, params, body, origin })
    }

    fn parse_params(&mut self) -> CompileResult<Vec<Variable>> {
        let mut params = Vec::new();
        if self.at_paren(ParenKind::Round, false) {
            return Ok(params);
        }
        params.push(self.expect_id()?);
        while matches!(self.current().kind, TokenKind::Comma) {
            self.advance();
            params.push(self.expect_id()?);
        }
        Ok(params)
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        let origin = self.expect_paren(ParenKind::Curly, true)?;
        let mut statements = Vec::new();
        while !self.at_paren(ParenKind::Curly, false) {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.parse_function_scope_stmt()?);
        }
        self.expect_paren(ParenKind::Curly, false)?;
        Ok(Block { statements, origin })
    }

    /// Parses a single `FunctionScopeStmt`, wrapping it in a `Block` if it
    /// is not already one (every `if`/`while` body must introduce a scope).
    fn parse_body_as_block(&mut self) -> CompileResult<Block> {
        if self.at_paren(ParenKind::Curly, true) {
            return self.parse_block();
        }
        let origin = self.current_origin();
        let stmt = self.parse_function_scope_stmt()?;
        Ok(Block { statements: vec![stmt], origin })
    }

    fn parse_function_scope_stmt(&mut self) -> CompileResult<Stmt> {
        let origin = self.current_origin();
        if self.at_paren(ParenKind::Curly, true) {
            let block = self.parse_block()?;
            return Ok(Stmt { kind: StmtKind::Block(block), origin });
        }
        if self.at_keyword(Keyword::If) {
            return self.parse_if(origin);
        }
        if self.at_keyword(Keyword::While) {
            return self.parse_while(origin);
        }
        if self.at_keyword(Keyword::Var) {
            return self.parse_variable_declaration(origin);
        }
        if self.at_keyword(Keyword::Return) {
            return self.parse_return(origin);
        }
        // Two-token lookahead: `Id '='` is an assignment, else an expression.
        if let TokenKind::Id(name) = self.current().kind {
            if matches!(self.peek_kind(1), TokenKind::Assign) {
                self.advance(); // Id
                self.advance(); // '='
                let value = self.parse_expression()?;
                self.expect_semicolon()?;
                return Ok(Stmt {
                    kind: StmtKind::Assignment {
                        target: Variable { name, origin },
                        value,
                    },
                    origin,
                });
            }
        }
        let expr = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Stmt { kind: StmtKind::Expr(expr), origin })
    }

    fn parse_if(&mut self, origin: Origin) -> CompileResult<Stmt> {
        self.expect_keyword(Keyword::If)?;
        self.expect_paren(ParenKind::Round, true)?;
        let cond = self.parse_comparison()?;
        self.expect_paren(ParenKind::Round, false)?;
        let then_body = self.parse_body_as_block()?;
        if self.at_keyword(Keyword::Else) {
            self.advance();
            let else_body = self.parse_body_as_block()?;
            return Ok(Stmt {
                kind: StmtKind::IfElse { cond, then_body, else_body },
                origin,
            });
        }
        Ok(Stmt { kind: StmtKind::If { cond, body: then_body }, origin })
    }

    fn parse_while(&mut self, origin: Origin) -> CompileResult<Stmt> {
        self.expect_keyword(Keyword::While)?;
        self.expect_paren(ParenKind::Round, true)?;
        let cond = self.parse_comparison()?;
        self.expect_paren(ParenKind::Round, false)?;
        let body = self.parse_body_as_block()?;
        Ok(Stmt { kind: StmtKind::While { cond, body }, origin })
    }

    fn parse_variable_declaration(&mut self, origin: Origin) -> CompileResult<Stmt> {
        self.expect_keyword(Keyword::Var)?;
        let target = self.expect_id()?;
        let initializer = if matches!(self.current().kind, TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        Ok(Stmt {
            kind: StmtKind::VariableDeclaration { target, initializer },
            origin,
        })
    }

    fn parse_return(&mut self, origin: Origin) -> CompileResult<Stmt> {
        self.expect_keyword(Keyword::Return)?;
        let value = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Stmt { kind: StmtKind::Return(value), origin })
    }

    fn parse_comparison(&mut self) -> CompileResult<Comparison> {
        let origin = self.current_origin();
        let left = self.parse_expression()?;
        let op = if let TokenKind::CompOp(op) = self.current().kind {
            self.advance();
            op
        } else {
            return Err(self.unexpected("a comparison operator"));
        };
        let right = self.parse_expression()?;
        Ok(Comparison { op, left, right, origin })
    }

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::BinOp(op @ (BinOpKind::Add | BinOpKind::Sub)) => op,
                _ => break,
            };
            let origin = self.current_origin();
            self.advance();
            let right = self.parse_term()?;
            left = Expr::bin_op(op, left, right, origin);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::BinOp(op @ (BinOpKind::Mul | BinOpKind::Div)) => op,
                _ => break,
            };
            let origin = self.current_origin();
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::bin_op(op, left, right, origin);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> CompileResult<Expr> {
        let origin = self.current_origin();
        match self.current().kind {
            TokenKind::UnOp(op) => {
                self.advance();
                let operand = self.parse_factor()?;
                Ok(Expr::un_op(op, operand, origin))
            }
            TokenKind::Parenthesis { kind: ParenKind::Round, open: true } => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_paren(ParenKind::Round, false)?;
                Ok(inner)
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::number(value, origin))
            }
            TokenKind::Id(name) => {
                self.advance();
                if self.at_paren(ParenKind::Round, true) {
                    let args = self.parse_call_args()?;
                    Ok(Expr { kind: ExprKind::Call(name, args), origin })
                } else {
                    Ok(Expr { kind: ExprKind::Variable(name), origin })
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_call_args(&mut self) -> CompileResult<Vec<Expr>> {
        self.expect_paren(ParenKind::Round, true)?;
        let mut args = Vec::new();
        if !self.at_paren(ParenKind::Round, false) {
            args.push(self.parse_expression()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        self.expect_paren(ParenKind::Round, false)?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StmtKind;
    use svmc_util::Interner;

    fn parse(src: &str) -> Program {
        let mut interner = Interner::new();
        let tokens = svmc_lex::Lexer::new(src).tokenize(&mut interner).unwrap();
        Parser::new(tokens).parse_program().unwrap()
    }

    #[test]
    fn fib_function_parses_with_two_calls_and_an_if_without_else() {
        let program = parse(
            "func fib(n) { if (n <= 2) return 1; return fib(n - 1) + fib(n - 2); } func main() { print(fib(7)); }",
        );
        assert_eq!(program.functions.len(), 2);
        let fib = &program.functions[0];
        assert_eq!(fib.params.len(), 1);
        assert_eq!(fib.body.statements.len(), 2);
        assert!(matches!(fib.body.statements[0].kind, StmtKind::If { .. }));
        assert!(matches!(fib.body.statements[1].kind, StmtKind::Return(_)));
    }

    #[test]
    fn if_body_without_braces_is_wrapped_in_a_block() {
        let program = parse("func main() { if (1 < 2) return 1; }");
        let StmtKind::If { body, .. } = &program.functions[0].body.statements[0].kind else {
            panic!("expected if statement");
        };
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn while_loop_with_assignment_body() {
        let program = parse("func main() { var x = 0; while (x < 3) { x = x + 1; } print(x); }");
        let stmts = &program.functions[0].body.statements;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0].kind, StmtKind::VariableDeclaration { .. }));
        assert!(matches!(stmts[1].kind, StmtKind::While { .. }));
        let StmtKind::While { body, .. } = &stmts[1].kind else { unreachable!() };
        assert!(matches!(body.statements[0].kind, StmtKind::Assignment { .. }));
    }

    #[test]
    fn nested_block_shadows_an_outer_variable() {
        let program = parse("func f() { var x = 1; { var x = 2; } return x; }");
        let stmts = &program.functions[0].body.statements;
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[1].kind, StmtKind::Block(_)));
    }

    #[test]
    fn if_else_parses_both_branches() {
        let program = parse("func main() { if (1 < 2) { return 1; } else { return 2; } }");
        assert!(matches!(
            program.functions[0].body.statements[0].kind,
            StmtKind::IfElse { .. }
        ));
    }

    #[test]
    fn expression_precedence_is_additive_below_multiplicative() {
        let program = parse("func main() { return 1 + 2 * 3; }");
        let StmtKind::Return(expr) = &program.functions[0].body.statements[0].kind else {
            panic!("expected return");
        };
        let ExprKind::BinOp(BinOpKind::Add, left, right) = &expr.kind else {
            panic!("expected top-level addition");
        };
        assert!(matches!(left.kind, ExprKind::Number(n) if n == 1.0));
        assert!(matches!(right.kind, ExprKind::BinOp(BinOpKind::Mul, _, _)));
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let mut interner = Interner::new();
        let tokens = svmc_lex::Lexer::new("func main() { var x = 1 }")
            .tokenize(&mut interner)
            .unwrap();
        let err = Parser::new(tokens).parse_program().unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }
}
