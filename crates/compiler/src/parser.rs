//! Recursive-descent parser for Delta.
//!
//! Statements and declarations are parsed by lookahead dispatch;
//! expressions use precedence climbing over the operator table exported
//! by [`crate::tokens::binary_precedence`]. Every node is allocated from
//! a caller-supplied arena that outlives the returned [`Program`].
//!
//! Disambiguation rules:
//! - `(TYPE) expr` is a cast; any other `(` starts a parenthesized
//!   expression.
//! - `ident (` is a call; a bare `ident` is a variable reference.
//! - `ident ++;` / `ident --;` desugar to `ident = ident + 1;` or `ident = ident - 1;`.
//! - `expr [ idx ]` in term position is an array access; followed by `=`
//!   at statement level it becomes an array assignment.
//! - `* expr = rhs;` is a pointer assignment whose target is the pointer
//!   expression itself.

use crate::ast::{
    Binary, BinaryOp, Expr, ExternDecl, FunctionDecl, IfChain, IfStatement, Parameter, Program,
    Scope, Statement, Term,
};
use crate::error::CompileError;
use crate::tokens::{Token, TokenKind, binary_precedence};
use crate::types::DataType;
use bumpalo::Bump;

pub struct Parser<'a> {
    arena: &'a Bump,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, arena: &'a Bump) -> Self {
        Parser {
            arena,
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Program<'a>, CompileError> {
        let mut program = Program::default();
        while !self.at_end() {
            if self.check(TokenKind::External) {
                program.externs.push(self.parse_extern()?);
            } else if self.check(TokenKind::Fn) {
                program.functions.push(self.parse_function()?);
            } else {
                program.statements.push(self.parse_statement()?);
            }
        }
        Ok(program)
    }

    // ---------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------

    /// `external TYPE name(TYPE, ..., ...?);`
    fn parse_extern(&mut self) -> Result<&'a ExternDecl<'a>, CompileError> {
        let kw = self.expect(TokenKind::External, "'external'")?;
        let ty_tok = self.expect(TokenKind::DataType, "a return type")?;
        let return_type = self.data_type(&ty_tok)?;
        let name_tok = self.expect(TokenKind::Identifier, "a function name")?;
        self.expect(TokenKind::OpenParen, "'('")?;

        let mut params = Vec::new();
        let mut is_variadic = false;
        if !self.check(TokenKind::CloseParen) {
            loop {
                if self.try_consume(TokenKind::Ellipsis).is_some() {
                    // '...' must be the last parameter
                    is_variadic = true;
                    break;
                }
                let ty_tok = self.expect(TokenKind::DataType, "a parameter type or '...'")?;
                params.push(self.data_type(&ty_tok)?);
                if self.try_consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::CloseParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;

        Ok(self.arena.alloc(ExternDecl {
            name: self.arena.alloc_str(name_tok.text()),
            params: self.arena.alloc_slice_fill_iter(params),
            return_type,
            is_variadic,
            line: kw.line,
        }))
    }

    /// `fn name(param: TYPE, ...) -> TYPE { ... }` - the return type
    /// defaults to `void` when the arrow is absent.
    fn parse_function(&mut self) -> Result<&'a FunctionDecl<'a>, CompileError> {
        let kw = self.expect(TokenKind::Fn, "'fn'")?;
        let name_tok = self.expect(TokenKind::Identifier, "a function name")?;
        self.expect(TokenKind::OpenParen, "'('")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                let param_name = self.expect(TokenKind::Identifier, "a parameter name")?;
                self.expect(TokenKind::Colon, "':'")?;
                let ty_tok = self.expect(TokenKind::DataType, "a parameter type")?;
                params.push(Parameter {
                    name: self.arena.alloc_str(param_name.text()),
                    ty: self.data_type(&ty_tok)?,
                    line: param_name.line,
                });
                if self.try_consume(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;

        let return_type = if self.try_consume(TokenKind::Arrow).is_some() {
            let ty_tok = self.expect(TokenKind::DataType, "a return type")?;
            self.data_type(&ty_tok)?
        } else {
            DataType::Void
        };

        let body = self.parse_scope()?;

        Ok(self.arena.alloc(FunctionDecl {
            name: self.arena.alloc_str(name_tok.text()),
            params: self.arena.alloc_slice_fill_iter(params),
            return_type,
            body,
            line: kw.line,
        }))
    }

    // ---------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------

    fn parse_scope(&mut self) -> Result<&'a Scope<'a>, CompileError> {
        self.expect(TokenKind::OpenCurly, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::CloseCurly) && !self.at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::CloseCurly, "'}'")?;
        Ok(self.arena.alloc(Scope {
            statements: self.arena.alloc_slice_fill_iter(statements),
        }))
    }

    fn parse_statement(&mut self) -> Result<&'a Statement<'a>, CompileError> {
        let Some(token) = self.peek(0).cloned() else {
            return Err(CompileError::parse("a statement", self.error_line()));
        };

        let statement = match token.kind {
            TokenKind::Exit => {
                self.consume();
                self.expect(TokenKind::OpenParen, "'('")?;
                let expr = self.parse_expression(0)?;
                self.expect(TokenKind::CloseParen, "')'")?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Statement::Exit {
                    expr,
                    line: token.line,
                }
            }
            TokenKind::While => {
                self.consume();
                self.expect(TokenKind::OpenParen, "'('")?;
                let cond = self.parse_expression(0)?;
                self.expect(TokenKind::CloseParen, "')'")?;
                let body = self.parse_scope()?;
                Statement::While {
                    cond,
                    body,
                    line: token.line,
                }
            }
            TokenKind::Return => {
                self.consume();
                let expr = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(TokenKind::Semicolon, "';'")?;
                Statement::Return {
                    expr,
                    line: token.line,
                }
            }
            TokenKind::Let => return self.parse_let(),
            TokenKind::If => return Ok(self.arena.alloc(Statement::If(self.parse_if()?))),
            TokenKind::OpenCurly => Statement::Scope(self.parse_scope()?),
            TokenKind::Identifier if self.check_at(1, TokenKind::Equals) => {
                let name_tok = self.consume();
                self.consume(); // '='
                let expr = self.parse_expression(0)?;
                self.expect(TokenKind::Semicolon, "';'")?;
                Statement::Assign {
                    name: self.arena.alloc_str(name_tok.text()),
                    expr,
                    line: name_tok.line,
                }
            }
            TokenKind::Identifier
                if (self.check_at(1, TokenKind::Plus) && self.check_at(2, TokenKind::Plus))
                    || (self.check_at(1, TokenKind::Minus)
                        && self.check_at(2, TokenKind::Minus)) =>
            {
                return self.parse_increment();
            }
            _ => return self.parse_expression_statement(),
        };

        Ok(self.arena.alloc(statement))
    }

    /// `let ('const')? name: TYPE = expr;`
    fn parse_let(&mut self) -> Result<&'a Statement<'a>, CompileError> {
        let kw = self.expect(TokenKind::Let, "'let'")?;
        let is_const = self.try_consume(TokenKind::Const).is_some();
        let name_tok = self.expect(TokenKind::Identifier, "a variable name")?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty_tok = self.expect(TokenKind::DataType, "a type")?;
        let ty = self.data_type(&ty_tok)?;
        self.expect(TokenKind::Equals, "'='")?;
        let expr = self.parse_expression(0)?;
        self.expect(TokenKind::Semicolon, "';'")?;

        Ok(self.arena.alloc(Statement::Let {
            name: self.arena.alloc_str(name_tok.text()),
            ty,
            is_const,
            expr,
            line: kw.line,
        }))
    }

    /// `ident++;` / `ident--;` desugar to `ident = ident + 1;` or `ident = ident - 1;` at parse
    /// time; the emitter never sees them.
    fn parse_increment(&mut self) -> Result<&'a Statement<'a>, CompileError> {
        let name_tok = self.consume();
        let op_tok = self.consume();
        self.consume();
        self.expect(TokenKind::Semicolon, "';'")?;

        let name: &'a str = self.arena.alloc_str(name_tok.text());
        let op = if op_tok.kind == TokenKind::Plus {
            BinaryOp::Add
        } else {
            BinaryOp::Sub
        };

        let lhs = self.term_expr(Term::Identifier {
            name,
            line: name_tok.line,
        });
        let rhs = self.term_expr(Term::IntLiteral {
            value: "1",
            line: name_tok.line,
        });
        let expr: &'a Expr<'a> = self.arena.alloc(Expr::Binary(self.arena.alloc(Binary {
            op,
            lhs,
            rhs,
            line: name_tok.line,
        })));

        Ok(self.arena.alloc(Statement::Assign {
            name,
            expr,
            line: name_tok.line,
        }))
    }

    fn parse_if(&mut self) -> Result<&'a IfStatement<'a>, CompileError> {
        let kw = self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::OpenParen, "'('")?;
        let cond = self.parse_expression(0)?;
        self.expect(TokenKind::CloseParen, "')'")?;
        let scope = self.parse_scope()?;
        let chain = self.parse_if_chain()?;
        Ok(self.arena.alloc(IfStatement {
            cond,
            scope,
            chain,
            line: kw.line,
        }))
    }

    fn parse_if_chain(&mut self) -> Result<Option<&'a IfChain<'a>>, CompileError> {
        if let Some(kw) = self.try_consume(TokenKind::Elif) {
            self.expect(TokenKind::OpenParen, "'('")?;
            let cond = self.parse_expression(0)?;
            self.expect(TokenKind::CloseParen, "')'")?;
            let scope = self.parse_scope()?;
            let chain = self.parse_if_chain()?;
            return Ok(Some(self.arena.alloc(IfChain::Elif {
                cond,
                scope,
                chain,
                line: kw.line,
            })));
        }
        if self.try_consume(TokenKind::Else).is_some() {
            let scope = self.parse_scope()?;
            return Ok(Some(self.arena.alloc(IfChain::Else { scope })));
        }
        Ok(None)
    }

    /// Leading-expression statements: an expression statement, a pointer
    /// assignment `*p = v;` or an array assignment `a[i] = v;`.
    fn parse_expression_statement(&mut self) -> Result<&'a Statement<'a>, CompileError> {
        let expr = self.parse_expression(0)?;

        if self.try_consume(TokenKind::Semicolon).is_some() {
            return Ok(self.arena.alloc(Statement::Expression(expr)));
        }

        if let Some(eq) = self.try_consume(TokenKind::Equals) {
            let value = self.parse_expression(0)?;
            self.expect(TokenKind::Semicolon, "';'")?;
            let statement = match expr {
                Expr::Term(Term::Deref { expr: ptr, line }) => Statement::PointerAssign {
                    ptr,
                    value,
                    line: *line,
                },
                Expr::Term(Term::ArrayAccess { array, index, line }) => Statement::ArrayAssign {
                    array,
                    index,
                    value,
                    line: *line,
                },
                _ => {
                    return Err(CompileError::parse(
                        "a pointer dereference or array element before '='",
                        eq.line,
                    ));
                }
            };
            return Ok(self.arena.alloc(statement));
        }

        Err(CompileError::parse("';' or '='", self.error_line()))
    }

    // ---------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------

    /// Precedence climbing: parse a prefix term, then fold binary
    /// operators of precedence ≥ `min_prec`, left-associatively.
    fn parse_expression(&mut self, min_prec: u8) -> Result<&'a Expr<'a>, CompileError> {
        let mut lhs = self.parse_term()?;

        loop {
            let Some(token) = self.peek(0) else { break };
            let Some(prec) = binary_precedence(token.kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let op_tok = self.consume();
            let rhs = self.parse_expression(prec + 1)?;
            let op = match op_tok.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEquals => BinaryOp::GreaterEquals,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEquals => BinaryOp::LessEquals,
                TokenKind::DoubleEquals => BinaryOp::Equals,
                _ => {
                    return Err(CompileError::internal(format!(
                        "token {:?} has a precedence but no operator",
                        op_tok.kind
                    )));
                }
            };
            lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(Binary {
                op,
                lhs,
                rhs,
                line: op_tok.line,
            })));
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<&'a Expr<'a>, CompileError> {
        let Some(token) = self.peek(0).cloned() else {
            return Err(CompileError::parse("an expression", self.error_line()));
        };

        let expr = match token.kind {
            TokenKind::IntLiteral => {
                self.consume();
                self.term_expr(Term::IntLiteral {
                    value: self.arena.alloc_str(token.text()),
                    line: token.line,
                })
            }
            TokenKind::FloatLiteral => {
                self.consume();
                self.term_expr(Term::FloatLiteral {
                    value: self.arena.alloc_str(token.text()),
                    line: token.line,
                })
            }
            TokenKind::DoubleLiteral => {
                self.consume();
                self.term_expr(Term::DoubleLiteral {
                    value: self.arena.alloc_str(token.text()),
                    line: token.line,
                })
            }
            TokenKind::StringLiteral => {
                self.consume();
                self.term_expr(Term::StringLiteral {
                    value: self.arena.alloc_str(token.text()),
                    line: token.line,
                })
            }
            // `(TYPE) expr` is a cast; the cast reaches to the end of the
            // expression, so `(int) a + b` casts the whole sum.
            TokenKind::OpenParen
                if self.check_at(1, TokenKind::DataType)
                    && self.check_at(2, TokenKind::CloseParen) =>
            {
                self.consume();
                let ty_tok = self.consume();
                self.consume();
                let target = self.data_type(&ty_tok)?;
                let expr = self.parse_expression(0)?;
                self.term_expr(Term::Cast {
                    target,
                    expr,
                    line: token.line,
                })
            }
            TokenKind::OpenParen => {
                self.consume();
                let inner = self.parse_expression(0)?;
                self.expect(TokenKind::CloseParen, "')'")?;
                self.term_expr(Term::Paren { expr: inner })
            }
            TokenKind::Identifier if self.check_at(1, TokenKind::OpenParen) => {
                let name_tok = self.consume();
                self.consume(); // '('
                let mut args = Vec::new();
                if !self.check(TokenKind::CloseParen) {
                    loop {
                        args.push(self.parse_expression(0)?);
                        if self.try_consume(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::CloseParen, "')'")?;
                self.term_expr(Term::Call {
                    name: self.arena.alloc_str(name_tok.text()),
                    args: self.arena.alloc_slice_fill_iter(args),
                    line: name_tok.line,
                })
            }
            TokenKind::Identifier => {
                self.consume();
                self.term_expr(Term::Identifier {
                    name: self.arena.alloc_str(token.text()),
                    line: token.line,
                })
            }
            TokenKind::Ampersand => {
                self.consume();
                let name_tok = self.expect(TokenKind::Identifier, "an identifier after '&'")?;
                self.term_expr(Term::AddressOf {
                    name: self.arena.alloc_str(name_tok.text()),
                    line: token.line,
                })
            }
            TokenKind::Star => {
                self.consume();
                let inner = self.parse_expression(0)?;
                self.term_expr(Term::Deref {
                    expr: inner,
                    line: token.line,
                })
            }
            _ => return Err(CompileError::parse("an expression", token.line)),
        };

        // Postfix array access: `expr[idx]`, possibly chained.
        let mut expr = expr;
        while let Some(open) = self.try_consume(TokenKind::OpenSquare) {
            let index = self.parse_expression(0)?;
            self.expect(TokenKind::CloseSquare, "']'")?;
            expr = self.term_expr(Term::ArrayAccess {
                array: expr,
                index,
                line: open.line,
            });
        }

        Ok(expr)
    }

    // ---------------------------------------------------------------
    // Token plumbing
    // ---------------------------------------------------------------

    fn term_expr(&self, term: Term<'a>) -> &'a Expr<'a> {
        self.arena.alloc(Expr::Term(self.arena.alloc(term)))
    }

    fn data_type(&self, token: &Token) -> Result<DataType, CompileError> {
        DataType::from_name(token.text()).ok_or_else(|| {
            CompileError::internal(format!("invalid data type token '{}'", token.text()))
        })
    }

    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.position + ahead)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.check_at(0, kind)
    }

    fn check_at(&self, ahead: usize, kind: TokenKind) -> bool {
        self.peek(ahead).is_some_and(|t| t.kind == kind)
    }

    fn consume(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        self.position += 1;
        token
    }

    fn try_consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.consume())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            Err(CompileError::parse(what, self.error_line()))
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Line for an error at the current position: the current token's
    /// line, or the last token's when input ended early.
    fn error_line(&self) -> usize {
        self.peek(0)
            .map(|t| t.line)
            .or_else(|| self.tokens.last().map(|t| t.line))
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_in<'a>(source: &str, arena: &'a Bump) -> Program<'a> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens, arena).parse().unwrap()
    }

    fn parse_err(source: &str) -> CompileError {
        let arena = Bump::new();
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens, &arena).parse().unwrap_err()
    }

    fn single_expr<'a>(program: &Program<'a>) -> &'a Expr<'a> {
        match *program.statements[0] {
            Statement::Let { expr, .. } => expr,
            ref other => panic!("expected let statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_shapes_the_tree() {
        let arena = Bump::new();
        let program = parse_in("let x: int = 1 + 2 * 3;", &arena);
        let Expr::Binary(add) = single_expr(&program) else {
            panic!("expected binary expression");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expr::Binary(mul) = add.rhs else {
            panic!("multiplication should nest under addition");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        let arena = Bump::new();
        let program = parse_in("let x: int = 10 - 4 - 3;", &arena);
        let Expr::Binary(outer) = single_expr(&program) else {
            panic!("expected binary expression");
        };
        assert_eq!(outer.op, BinaryOp::Sub);
        let Expr::Binary(inner) = outer.lhs else {
            panic!("left operand should be the nested subtraction");
        };
        assert_eq!(inner.op, BinaryOp::Sub);
    }

    #[test]
    fn test_comparison_binds_loosest() {
        let arena = Bump::new();
        let program = parse_in("let x: int = 1 + 2 > 3 * 4;", &arena);
        let Expr::Binary(cmp) = single_expr(&program) else {
            panic!("expected binary expression");
        };
        assert_eq!(cmp.op, BinaryOp::Greater);
    }

    #[test]
    fn test_cast_versus_paren() {
        let arena = Bump::new();
        let program = parse_in("let a: long = (long) x; let b: int = (x);", &arena);
        assert!(matches!(
            single_expr(&program),
            Expr::Term(Term::Cast {
                target: DataType::Int64,
                ..
            })
        ));
        let Statement::Let { expr, .. } = program.statements[1] else {
            panic!("expected let");
        };
        assert!(matches!(expr, Expr::Term(Term::Paren { .. })));
    }

    #[test]
    fn test_call_versus_variable() {
        let arena = Bump::new();
        let program = parse_in("let a: int = f(1, 2); let b: int = f;", &arena);
        match single_expr(&program) {
            Expr::Term(Term::Call { name, args, .. }) => {
                assert_eq!(*name, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
        let Statement::Let { expr, .. } = program.statements[1] else {
            panic!("expected let");
        };
        assert!(matches!(expr, Expr::Term(Term::Identifier { .. })));
    }

    #[test]
    fn test_let_const_flag() {
        let arena = Bump::new();
        let program = parse_in("let const k: int = 3;", &arena);
        let Statement::Let {
            name,
            ty,
            is_const,
            ..
        } = program.statements[0]
        else {
            panic!("expected let");
        };
        assert_eq!(*name, "k");
        assert_eq!(*ty, DataType::Int32);
        assert!(*is_const);
    }

    #[test]
    fn test_increment_desugars_to_assign() {
        let arena = Bump::new();
        let program = parse_in("i++; j--;", &arena);
        let Statement::Assign { name, expr, .. } = program.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(*name, "i");
        let Expr::Binary(binary) = expr else {
            panic!("expected desugared binary expression");
        };
        assert_eq!(binary.op, BinaryOp::Add);
        assert!(matches!(
            binary.rhs,
            Expr::Term(Term::IntLiteral { value: "1", .. })
        ));

        let Statement::Assign { expr, .. } = program.statements[1] else {
            panic!("expected assignment");
        };
        let Expr::Binary(binary) = expr else {
            panic!("expected desugared binary expression");
        };
        assert_eq!(binary.op, BinaryOp::Sub);
    }

    #[test]
    fn test_pointer_and_array_assign() {
        let arena = Bump::new();
        let program = parse_in("*p = 42; buf[i + 1] = 0;", &arena);
        let Statement::PointerAssign { ptr, .. } = program.statements[0] else {
            panic!("expected pointer assignment, got {:?}", program.statements[0]);
        };
        assert!(matches!(ptr, Expr::Term(Term::Identifier { .. })));
        assert!(matches!(
            program.statements[1],
            Statement::ArrayAssign { .. }
        ));
    }

    #[test]
    fn test_address_of_and_deref_terms() {
        let arena = Bump::new();
        let program = parse_in("let p: int* = &x; let v: int = *p;", &arena);
        assert!(matches!(
            single_expr(&program),
            Expr::Term(Term::AddressOf { name: "x", .. })
        ));
        let Statement::Let { expr, .. } = program.statements[1] else {
            panic!("expected let");
        };
        assert!(matches!(expr, Expr::Term(Term::Deref { .. })));
    }

    #[test]
    fn test_if_elif_else_chain() {
        let arena = Bump::new();
        let program = parse_in("if (a) { x = 1; } elif (b) { x = 2; } else { x = 3; }", &arena);
        let Statement::If(if_stmt) = program.statements[0] else {
            panic!("expected if statement");
        };
        let Some(IfChain::Elif { chain, .. }) = if_stmt.chain else {
            panic!("expected elif arm");
        };
        assert!(matches!(chain, Some(IfChain::Else { .. })));
    }

    #[test]
    fn test_function_declaration() {
        let arena = Bump::new();
        let program = parse_in("fn add(a: int, b: int) -> int { return a + b; }", &arena);
        let func = program.functions[0];
        assert_eq!(func.name, "add");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].name, "b");
        assert_eq!(func.return_type, DataType::Int32);
        assert_eq!(func.body.statements.len(), 1);
    }

    #[test]
    fn test_function_defaults_to_void() {
        let arena = Bump::new();
        let program = parse_in("fn noop() {}", &arena);
        assert_eq!(program.functions[0].return_type, DataType::Void);
    }

    #[test]
    fn test_extern_declaration() {
        let arena = Bump::new();
        let program = parse_in("external int printline(int8*, ...);", &arena);
        let ext = program.externs[0];
        assert_eq!(ext.name, "printline");
        assert_eq!(ext.params, &[DataType::Int8Ptr]);
        assert_eq!(ext.return_type, DataType::Int32);
        assert!(ext.is_variadic);
    }

    #[test]
    fn test_return_without_value() {
        let arena = Bump::new();
        let program = parse_in("fn f() { return; }", &arena);
        assert!(matches!(
            program.functions[0].body.statements[0],
            Statement::Return { expr: None, .. }
        ));
    }

    #[test]
    fn test_missing_semicolon_reports_line() {
        let err = parse_err("let x: int = 1\nlet y: int = 2;");
        assert_eq!(err, CompileError::parse("';'", 2));
    }

    #[test]
    fn test_bad_assignment_target() {
        let err = parse_err("1 + 2 = 3;");
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn test_exit_statement() {
        let arena = Bump::new();
        let program = parse_in("exit(0);", &arena);
        assert!(matches!(program.statements[0], Statement::Exit { .. }));
    }
}
