use crate::error::{Result, WeltError};
use crate::lexer::{Token, TokenKind};
use crate::parser::ast::*;

/*
   Invariant:
   (1) A parsing function is only called if the cursor stands on a valid
     first token according to the associated grammar rule.

   (2) If a parsing function returns Ok(...), the cursor stands on the
     first token `after` the associated grammar rule.

   Newline tokens separate statements; they are skipped between statements
   and end an expression implicitly (a newline is never an operator).
*/
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        if !matches!(tokens.last().map(|token| &token.kind), Some(TokenKind::Eof)) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenKind::Eof, line));
        }

        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn line(&self) -> u32 {
        self.peek().line
    }

    fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn advance_if(&mut self, kind: &TokenKind) -> Result<()> {
        if self.kind() == kind {
            self.advance();
            Ok(())
        } else {
            Err(WeltError::expected(
                kind.to_string(),
                self.kind().to_string(),
                self.line(),
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    // <ERWACHE><stmt>*
    pub fn parse(&mut self) -> Result<Program> {
        self.skip_newlines();

        if !matches!(self.kind(), TokenKind::Erwache) {
            return Err(WeltError::syntax("program must begin with ERWACHE", 0));
        }
        self.advance();

        let statements = self.parse_block(&[])?;

        Ok(program(statements))
    }

    // <stmt>* until EOF or one of `stops`
    fn parse_block(&mut self, stops: &[TokenKind]) -> Result<Vec<Statement>> {
        let mut stmts = vec![];

        loop {
            self.skip_newlines();

            if self.at_end() || stops.iter().any(|stop| self.kind() == stop) {
                return Ok(stmts);
            }

            stmts.push(self.parse_statement()?);
        }
    }

    // <halt> | <assign> | <print> | <read> | <if> | <while>
    fn parse_statement(&mut self) -> Result<Statement> {
        match self.kind() {
            TokenKind::Verneinung => {
                let line = self.line();
                self.advance();
                Ok(halt(line))
            }
            TokenKind::Ding => self.parse_assign(),
            TokenKind::Vorstellung => self.parse_print(),
            TokenKind::Wille => self.parse_read(),
            TokenKind::Wenn => self.parse_if(),
            TokenKind::Solange => self.parse_while(),
            TokenKind::Illegal(message) => Err(WeltError::syntax(message.clone(), self.line())),
            kind => Err(WeltError::syntax(
                format!("unexpected token `{}`", kind),
                self.line(),
            )),
        }
    }

    // <DING><slot><=><expr>
    fn parse_assign(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // advance over `DING`

        let slot = self.parse_slot_index()?;

        self.advance_if(&TokenKind::Assign)?;

        let expr = self.parse_expression()?;

        Ok(assign(slot, expr, line))
    }

    // <VORSTELLUNG><expr>
    fn parse_print(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // advance over `VORSTELLUNG`

        let expr = self.parse_expression()?;

        Ok(print_stmt(expr, line))
    }

    // <WILLE><slot>
    fn parse_read(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // advance over `WILLE`

        let slot = self.parse_slot_index()?;

        Ok(read_stmt(slot, line))
    }

    // <WENN><condition><DANN><block>(<SONST><block>)?<ENDE>
    fn parse_if(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // advance over `WENN`

        let cond = self.parse_condition()?;

        self.advance_if(&TokenKind::Dann)?;

        let then_body = self.parse_block(&[TokenKind::Ende, TokenKind::Sonst])?;

        let else_body = if matches!(self.kind(), TokenKind::Sonst) {
            self.advance();
            self.parse_block(&[TokenKind::Ende])?
        } else {
            vec![]
        };

        self.expect_block_end("WENN")?;

        Ok(if_stmt(cond, then_body, else_body, line))
    }

    // <SOLANGE><condition><block><ENDE>
    fn parse_while(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // advance over `SOLANGE`

        let cond = self.parse_condition()?;

        let body = self.parse_block(&[TokenKind::Ende])?;

        self.expect_block_end("SOLANGE")?;

        Ok(while_stmt(cond, body, line))
    }

    fn expect_block_end(&mut self, construct: &str) -> Result<()> {
        if matches!(self.kind(), TokenKind::Ende) {
            self.advance();
            Ok(())
        } else {
            Err(WeltError::syntax(
                format!("expected ENDE to close {} block", construct),
                self.line(),
            ))
        }
    }

    // <expr><cmp_op><expr>
    fn parse_condition(&mut self) -> Result<Condition> {
        let left = self.parse_expression()?;

        let op = match self.kind() {
            TokenKind::Assign => CmpOp::Eq,
            TokenKind::Neq => CmpOp::Neq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Ge => CmpOp::Ge,
            kind => {
                return Err(WeltError::expected(
                    "comparison operator",
                    kind.to_string(),
                    self.line(),
                ));
            }
        };
        self.advance();

        let right = self.parse_expression()?;

        Ok(condition(left, op, right))
    }

    // <term>((<+>|<->)<term>)*
    fn parse_expression(&mut self) -> Result<Expression> {
        let mut expr = self.parse_term()?;

        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(expr),
            };
            self.advance();

            let right = self.parse_term()?;
            expr = binary(expr, op, right);
        }
    }

    // <factor>((<*>|</>|<MOD>)<factor>)*
    fn parse_term(&mut self) -> Result<Expression> {
        let mut expr = self.parse_factor()?;

        loop {
            let op = match self.kind() {
                TokenKind::Asterisk => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Mod => BinOp::Mod,
                _ => return Ok(expr),
            };
            self.advance();

            let right = self.parse_factor()?;
            expr = binary(expr, op, right);
        }
    }

    // <int> | <string> | <DING><slot>
    fn parse_factor(&mut self) -> Result<Expression> {
        match self.kind().clone() {
            TokenKind::Int(digits) => {
                let line = self.line();
                self.advance();
                digits
                    .parse::<f64>()
                    .map(number)
                    .map_err(|_| WeltError::syntax(format!("invalid number `{}`", digits), line))
            }
            TokenKind::Text(s) => {
                self.advance();
                Ok(text(s))
            }
            TokenKind::Ding => {
                self.advance();
                let index = self.parse_slot_index()?;
                Ok(slot(index))
            }
            TokenKind::Illegal(message) => Err(WeltError::syntax(message, self.line())),
            kind => Err(WeltError::expected(
                "start of an expression",
                kind.to_string(),
                self.line(),
            )),
        }
    }

    // <int> naming a slot; whether it is in 0..=7 is a runtime concern,
    // so out-of-range indices parse successfully here.
    fn parse_slot_index(&mut self) -> Result<usize> {
        match self.kind().clone() {
            TokenKind::Int(digits) => {
                let line = self.line();
                self.advance();
                digits
                    .parse::<usize>()
                    .map_err(|_| WeltError::syntax(format!("invalid slot number `{}`", digits), line))
            }
            kind => Err(WeltError::expected(
                "slot number",
                kind.to_string(),
                self.line(),
            )),
        }
    }
}
