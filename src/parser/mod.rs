//! Recursive descent parser: token stream -> [`Node`] tree.
//!
//! Single-token lookahead with an index into the full token vector (the
//! lexer already ran to completion, so there's no reason to stream). Binary
//! operators are handled by a chain of precedence functions, loosest to
//! tightest, mirroring the table in spec section 4.3.

use crate::ast::{BinOp, Node, NodeKind, StrPart};
use crate::cursor::Cursor;
use crate::error::AuraError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parse a full token stream into a single [`Node`]; multiple top-level
/// statements are wrapped in `Seq`, a lone statement is returned unwrapped.
pub fn parse(tokens: Vec<Token>) -> Result<Node, AuraError> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn here(&self) -> Cursor {
        self.peek()
            .map(|t| t.at)
            .or_else(|| self.tokens.last().map(|t| t.at))
            .unwrap_or_default()
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, AuraError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => Ok(self.advance().unwrap()),
            Some(tok) => Err(AuraError::parse(
                format!("expected {kind:?}, found {:?}", tok.kind),
                Some(tok.at),
            )),
            None => Err(AuraError::parse(
                format!("expected {kind:?}, found end of input"),
                None,
            )),
        }
    }

    fn expect_id(&mut self) -> Result<(String, Cursor), AuraError> {
        match self.peek() {
            Some(Token { kind: TokenKind::Id(name), at }) => {
                let (name, at) = (name.clone(), *at);
                self.advance();
                Ok((name, at))
            }
            Some(tok) => Err(AuraError::parse(
                format!("expected identifier, found {:?}", tok.kind),
                Some(tok.at),
            )),
            None => Err(AuraError::parse("expected identifier, found end of input", None)),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if k == word)
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Cursor, AuraError> {
        if self.is_keyword(word) {
            Ok(self.advance().unwrap().at)
        } else {
            Err(AuraError::parse(
                format!("expected '{word}', found {:?}", self.peek_kind()),
                self.peek().map(|t| t.at),
            ))
        }
    }

    fn skip_eos(&mut self) {
        while matches!(self.peek_kind(), Some(TokenKind::Eos)) {
            self.advance();
        }
    }

    fn expect_eos(&mut self) -> Result<(), AuraError> {
        if self.at_end() {
            return Ok(());
        }
        match self.peek() {
            Some(tok) if tok.is_eos() => {
                self.advance();
                Ok(())
            }
            Some(tok) => Err(AuraError::parse(
                format!("expected end of statement, found {:?}", tok.kind),
                Some(tok.at),
            )),
            None => Ok(()),
        }
    }

    // ---- top level -------------------------------------------------

    fn parse_program(&mut self) -> Result<Node, AuraError> {
        self.skip_eos();
        let mut stmts = Vec::new();
        while !self.at_end() {
            stmts.push(self.parse_statement()?);
            if !self.at_end() {
                self.expect_eos()?;
                self.skip_eos();
            }
        }
        Ok(Self::wrap_seq(stmts, Cursor::start()))
    }

    fn wrap_seq(mut stmts: Vec<Node>, fallback_at: Cursor) -> Node {
        match stmts.len() {
            0 => Node::new(NodeKind::Nihil, fallback_at),
            1 => stmts.pop().unwrap(),
            _ => {
                let at = stmts[0].at;
                Node::new(NodeKind::Seq(stmts), at)
            }
        }
    }

    /// Parse statements until a terminator keyword is seen (without
    /// consuming it); used for `if`/`while`/`fun` bodies.
    fn parse_block_until(&mut self, terminators: &[&str]) -> Result<Node, AuraError> {
        self.skip_eos();
        let mut stmts = Vec::new();
        loop {
            if self.at_end() {
                return Err(AuraError::parse(
                    format!("unexpected end of input, expected one of {terminators:?}"),
                    None,
                ));
            }
            if terminators.iter().any(|t| self.is_keyword(t)) {
                break;
            }
            stmts.push(self.parse_statement()?);
            if !terminators.iter().any(|t| self.is_keyword(t)) {
                self.expect_eos()?;
                self.skip_eos();
            }
        }
        Ok(Self::wrap_seq(stmts, self.here()))
    }

    // ---- statements --------------------------------------------------

    fn parse_statement(&mut self) -> Result<Node, AuraError> {
        if self.is_keyword("if") {
            return self.parse_if();
        }
        if self.is_keyword("while") {
            return self.parse_while();
        }
        if self.is_keyword("type") {
            return self.parse_type_declaration();
        }
        if self.is_keyword("fun") {
            return self.parse_fun_def();
        }
        if matches!(self.peek_kind(), Some(TokenKind::Id(_)))
            && matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::Equals))
        {
            return self.parse_assignment();
        }
        self.parse_expr_statement()
    }

    fn parse_assignment(&mut self) -> Result<Node, AuraError> {
        let (name, at) = self.expect_id()?;
        self.expect(TokenKind::Equals)?;
        let rhs = self.parse_expr()?;
        Ok(Node::new(NodeKind::Assign(name, Box::new(rhs)), at))
    }

    fn parse_if(&mut self) -> Result<Node, AuraError> {
        let at = self.expect_keyword("if")?;
        let cond = self.parse_expr()?;
        self.expect_keyword("then")?;
        let then = self.parse_block_until(&["elif", "else", "end"])?;

        let mut elifs = Vec::new();
        while self.is_keyword("elif") {
            self.advance();
            let elif_cond = self.parse_expr()?;
            self.expect_keyword("then")?;
            let elif_body = self.parse_block_until(&["elif", "else", "end"])?;
            elifs.push((elif_cond, elif_body));
        }

        let els = if self.is_keyword("else") {
            self.advance();
            Some(Box::new(self.parse_block_until(&["end"])?))
        } else {
            None
        };

        self.expect_keyword("end")?;

        Ok(Node::new(
            NodeKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                elifs,
                els,
            },
            at,
        ))
    }

    fn parse_while(&mut self) -> Result<Node, AuraError> {
        let at = self.expect_keyword("while")?;
        let cond = self.parse_expr()?;
        let body = self.parse_block_until(&["end"])?;
        self.expect_keyword("end")?;
        Ok(Node::new(
            NodeKind::While { cond: Box::new(cond), body: Box::new(body) },
            at,
        ))
    }

    fn parse_type_declaration(&mut self) -> Result<Node, AuraError> {
        let at = self.expect_keyword("type")?;
        let (name, _) = self.expect_id()?;
        self.expect(TokenKind::Equals)?;
        let def = self.parse_type_expr()?;
        Ok(Node::new(
            NodeKind::TypeDeclaration { name, def: Box::new(def) },
            at,
        ))
    }

    fn parse_fun_def(&mut self) -> Result<Node, AuraError> {
        let at = self.expect_keyword("fun")?;
        let (name, _) = self.expect_id()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
            loop {
                let (param, _) = self.expect_id()?;
                params.push(param);
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block_until(&["end"])?;
        self.expect_keyword("end")?;
        Ok(Node::new(
            NodeKind::FunDef { name, params, body: Box::new(body) },
            at,
        ))
    }

    /// Either a parens-less command call (`say "hi"`) or a plain expression
    /// statement. Disambiguated by whether the identifier is immediately
    /// followed by something that can start a primary but is not an infix
    /// operator (spec section 4.3).
    fn parse_expr_statement(&mut self) -> Result<Node, AuraError> {
        if let Some(Token { kind: TokenKind::Id(name), at }) = self.peek().cloned() {
            if self
                .peek_at(1)
                .is_some_and(|tok| Self::starts_command_arg(&tok.kind))
            {
                self.advance();
                let mut args = Vec::new();
                while self
                    .peek()
                    .is_some_and(|tok| Self::starts_command_arg(&tok.kind))
                {
                    args.push(self.parse_postfix()?);
                }
                return Ok(Node::new(NodeKind::Call { name, args }, at));
            }
        }
        self.parse_expr()
    }

    fn starts_command_arg(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Bool(_)
                | TokenKind::Nihil
                | TokenKind::SimpleStr(_)
                | TokenKind::StrPart(_)
                | TokenKind::StrEnd
                | TokenKind::GenLit(_)
                | TokenKind::Id(_)
                | TokenKind::LBracket
                | TokenKind::LBrace
        )
    }

    // ---- expressions (precedence, loosest to tightest) ----------------

    fn parse_expr(&mut self) -> Result<Node, AuraError> {
        self.parse_pipe()
    }

    /// Reserved `|-` / `~|-` pipe operators, at assignment precedence.
    fn parse_pipe(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_as()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Pipe) => BinOp::Pipe,
                Some(TokenKind::Tilde) => BinOp::TildePipe,
                _ => break,
            };
            let at = self.advance().unwrap().at;
            let rhs = self.parse_as()?;
            lhs = Node::new(NodeKind::BinOp(op, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_as(&mut self) -> Result<Node, AuraError> {
        let mut expr = self.parse_or()?;
        while matches!(self.peek_kind(), Some(TokenKind::As)) {
            let at = self.advance().unwrap().at;
            let ty = self.parse_type_expr()?;
            expr = Node::new(
                NodeKind::TypeAnnotation { expr: Box::new(expr), ty: Box::new(ty) },
                at,
            );
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek_kind(), Some(TokenKind::Or)) {
            let at = self.advance().unwrap().at;
            let rhs = self.parse_and()?;
            lhs = Node::new(NodeKind::BinOp(BinOp::Or, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_equality()?;
        while matches!(self.peek_kind(), Some(TokenKind::And)) {
            let at = self.advance().unwrap().at;
            let rhs = self.parse_equality()?;
            lhs = Node::new(NodeKind::BinOp(BinOp::And, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Eq) => BinOp::Eq,
                Some(TokenKind::Neq) => BinOp::Neq,
                _ => break,
            };
            let at = self.advance().unwrap().at;
            let rhs = self.parse_relational()?;
            lhs = Node::new(NodeKind::BinOp(op, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::Lte) => BinOp::Lte,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::Gte) => BinOp::Gte,
                _ => break,
            };
            let at = self.advance().unwrap().at;
            let rhs = self.parse_additive()?;
            lhs = Node::new(NodeKind::BinOp(op, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Plus,
                Some(TokenKind::Minus) => BinOp::Minus,
                _ => break,
            };
            let at = self.advance().unwrap().at;
            let rhs = self.parse_multiplicative()?;
            lhs = Node::new(NodeKind::BinOp(op, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, AuraError> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Star,
                Some(TokenKind::Slash) => BinOp::Slash,
                _ => break,
            };
            let at = self.advance().unwrap().at;
            let rhs = self.parse_power()?;
            lhs = Node::new(NodeKind::BinOp(op, Box::new(lhs), Box::new(rhs)), at);
        }
        Ok(lhs)
    }

    fn parse_power(&mut self) -> Result<Node, AuraError> {
        let lhs = self.parse_unary()?;
        if matches!(self.peek_kind(), Some(TokenKind::Pow)) {
            let at = self.advance().unwrap().at;
            let rhs = self.parse_power()?; // right-associative
            return Ok(Node::new(NodeKind::BinOp(BinOp::Pow, Box::new(lhs), Box::new(rhs)), at));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, AuraError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                let at = self.advance().unwrap().at;
                let operand = self.parse_unary()?;
                Ok(Node::new(NodeKind::Negate(Box::new(operand)), at))
            }
            Some(TokenKind::Not) => {
                let at = self.advance().unwrap().at;
                let operand = self.parse_unary()?;
                Ok(Node::new(NodeKind::Not(Box::new(operand)), at))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Node, AuraError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    let at = self.advance().unwrap().at;
                    let (field, field_at) = self.expect_id()?;
                    let field_node = Node::new(NodeKind::Str(field), field_at);
                    expr = Node::new(
                        NodeKind::BinOp(BinOp::Dot, Box::new(expr), Box::new(field_node)),
                        at,
                    );
                }
                Some(TokenKind::LParen) => {
                    // `name(arg, arg, ...)` call syntax, usable anywhere a
                    // value expression is, complementing the parens-less
                    // statement-level command call.
                    if !matches!(expr.kind, NodeKind::Id(_)) {
                        break;
                    }
                    let NodeKind::Id(name) = expr.kind.clone() else { unreachable!() };
                    let at = expr.at;
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek_kind(), Some(TokenKind::RParen)) {
                        loop {
                            args.push(self.parse_expr()?);
                            if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Node::new(NodeKind::Call { name, args }, at);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, AuraError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(AuraError::parse("unexpected end of input", None));
        };
        match tok.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Int(n), tok.at))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Float(n), tok.at))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Node::new(NodeKind::Bool(b), tok.at))
            }
            TokenKind::Nihil => {
                self.advance();
                Ok(Node::new(NodeKind::Nihil, tok.at))
            }
            TokenKind::SimpleStr(s) => {
                self.advance();
                Ok(Node::new(NodeKind::Str(s), tok.at))
            }
            TokenKind::GenLit(s) => {
                self.advance();
                Ok(Node::new(NodeKind::GenLit(s), tok.at))
            }
            TokenKind::StrPart(_) | TokenKind::InterpolationStart | TokenKind::StrEnd | TokenKind::GenEnd => {
                self.parse_structured_string()
            }
            TokenKind::Id(name) => {
                self.advance();
                Ok(Node::new(NodeKind::Id(name), tok.at))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            other => Err(AuraError::parse(format!("unexpected token {other:?}"), Some(tok.at))),
        }
    }

    fn parse_structured_string(&mut self) -> Result<Node, AuraError> {
        let at = self.here();
        let mut parts = Vec::new();
        loop {
            match self.peek_kind().cloned() {
                Some(TokenKind::StrPart(s)) => {
                    self.advance();
                    parts.push(StrPart::Literal(s));
                }
                Some(TokenKind::InterpolationStart) => {
                    self.advance();
                    let expr = self.parse_expr()?;
                    self.expect(TokenKind::InterpolationEnd)?;
                    parts.push(StrPart::Expr(Box::new(expr)));
                }
                Some(TokenKind::StrEnd) => {
                    self.advance();
                    return Ok(Node::new(NodeKind::StructuredStr(parts), at));
                }
                Some(TokenKind::GenEnd) => {
                    self.advance();
                    return Ok(Node::new(NodeKind::StructuredGenLit(parts), at));
                }
                other => {
                    return Err(AuraError::parse(
                        format!("unterminated string, found {other:?}"),
                        Some(self.here()),
                    ))
                }
            }
        }
    }

    fn parse_array_literal(&mut self) -> Result<Node, AuraError> {
        let at = self.expect(TokenKind::LBracket)?.at;
        let mut elems = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::RBracket)) {
            loop {
                elems.push(self.parse_expr()?);
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Node::new(NodeKind::ArrayLiteral(elems), at))
    }

    fn parse_object_literal(&mut self) -> Result<Node, AuraError> {
        let at = self.expect(TokenKind::LBrace)?.at;
        let mut fields = Vec::new();
        if !matches!(self.peek_kind(), Some(TokenKind::RBrace)) {
            loop {
                let (name, field_at) = self.expect_id()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expr()?;
                fields.push(Node::new(
                    NodeKind::Field { name, value: Box::new(value), optional: false },
                    field_at,
                ));
                if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Node::new(NodeKind::ObjectLiteral(fields), at))
    }

    // ---- type expressions ---------------------------------------------

    fn parse_type_expr(&mut self) -> Result<Node, AuraError> {
        let first = self.parse_type_primary()?;
        if !matches!(self.peek_kind(), Some(TokenKind::Pipe)) {
            return Ok(first);
        }
        let at = first.at;
        let mut members = vec![first];
        while matches!(self.peek_kind(), Some(TokenKind::Pipe)) {
            self.advance();
            members.push(self.parse_type_primary()?);
        }
        Ok(Node::new(NodeKind::UnionType(members), at))
    }

    fn parse_type_primary(&mut self) -> Result<Node, AuraError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(AuraError::parse("unexpected end of input in type expression", None));
        };
        match tok.kind {
            TokenKind::Id(name) => {
                self.advance();
                if matches!(self.peek_kind(), Some(TokenKind::Lt)) {
                    self.advance();
                    let mut params = Vec::new();
                    loop {
                        params.push(self.parse_type_expr()?);
                        if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(TokenKind::Gt)?;
                    Ok(Node::new(NodeKind::GenericType { base: name, params }, tok.at))
                } else {
                    Ok(Node::new(NodeKind::TypeReference(name), tok.at))
                }
            }
            TokenKind::SimpleStr(s) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::TypeConstant(Box::new(Node::new(NodeKind::Str(s), tok.at))),
                    tok.at,
                ))
            }
            TokenKind::StrPart(_) | TokenKind::InterpolationStart => Err(AuraError::parse(
                "string literals in type position must be compile-time constants; interpolation is rejected",
                Some(tok.at),
            )),
            TokenKind::Int(n) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::TypeConstant(Box::new(Node::new(NodeKind::Int(n), tok.at))),
                    tok.at,
                ))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::TypeConstant(Box::new(Node::new(NodeKind::Float(n), tok.at))),
                    tok.at,
                ))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Node::new(
                    NodeKind::TypeConstant(Box::new(Node::new(NodeKind::Bool(b), tok.at))),
                    tok.at,
                ))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                if !matches!(self.peek_kind(), Some(TokenKind::RBrace)) {
                    loop {
                        let (name, field_at) = self.expect_id()?;
                        let optional = if matches!(self.peek_kind(), Some(TokenKind::Question)) {
                            self.advance();
                            true
                        } else {
                            false
                        };
                        self.expect(TokenKind::Colon)?;
                        let ty = self.parse_type_expr()?;
                        fields.push(Node::new(
                            NodeKind::Field { name, value: Box::new(ty), optional },
                            field_at,
                        ));
                        if matches!(self.peek_kind(), Some(TokenKind::Comma)) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace)?;
                Ok(Node::new(NodeKind::RecordType(fields), tok.at))
            }
            other => Err(AuraError::parse(
                format!("expected a type expression, found {other:?}"),
                Some(tok.at),
            )),
        }
    }
}
