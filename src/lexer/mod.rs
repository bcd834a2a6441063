//! Character stream -> token stream.
//!
//! The lexer holds a [`StringMachine`] sub-automaton for the current string
//! body (if any) and a context stack that disambiguates a closing `}`
//! between "end of interpolation" and "end of object literal" (see
//! [`LexContext`]). Interpolated expressions may themselves contain string
//! literals, so a suspended machine is pushed onto `machine_stack` for the
//! duration of the interpolation and popped back once the matching `}` is
//! seen. `tokens()` is a finite, non-restartable iterator over the whole
//! source.

mod context;
mod string_machine;
mod token;

pub use context::LexContext;
pub use string_machine::{QuoteKind, StringMachine, StringMode, MAX_STRING_LEN};
pub use token::{Token, TokenKind, KEYWORDS};

use crate::cursor::{Cursor, TextDocument};
use crate::error::AuraError;

/// Produces tokens from a [`TextDocument`] in source order.
pub struct Lexer {
    doc: TextDocument,
    context: Vec<LexContext>,
    machine: Option<StringMachine>,
    machine_stack: Vec<StringMachine>,
    /// A single queued token, used when closing `${` emits both a `str_part`
    /// and an `interpolation_start` but a fetch can only return one.
    pending: Option<Token>,
    /// Set when the last token was an `interpolation_end` whose matching
    /// string machine was restored from `machine_stack`; the *next* fetch
    /// must resume scanning its body rather than doing normal dispatch.
    resume_body: bool,
    done: bool,
}

impl Lexer {
    pub fn new(source: impl Into<String>) -> Self {
        let mut source = source.into();
        if let Some(rest) = source.strip_prefix("#!") {
            let first_newline = rest.find('\n').map(|i| i + 2).unwrap_or(source.len());
            source.replace_range(0..first_newline, "");
        }
        Lexer {
            doc: TextDocument::new(source),
            context: Vec::new(),
            machine: None,
            machine_stack: Vec::new(),
            pending: None,
            resume_body: false,
            done: false,
        }
    }

    /// Lex the entire source eagerly, returning the full token vector or the
    /// first lex error encountered.
    pub fn tokens(mut self) -> Result<Vec<Token>, AuraError> {
        let mut out = Vec::new();
        while let Some(tok) = self.next_token()? {
            out.push(tok);
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Option<Token>, AuraError> {
        if self.done {
            return Ok(None);
        }

        if let Some(tok) = self.pending.take() {
            return Ok(Some(tok));
        }

        if self.resume_body {
            self.resume_body = false;
            return self.drive_string().map(Some);
        }

        self.skip_whitespace_and_comments();

        let Some(c) = self.doc.current_char() else {
            self.done = true;
            return Ok(None);
        };

        let at = self.doc.caret();

        let tok = match c {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(at)?,
            '0'..='9' => self.lex_number(at)?,
            '\'' | '"' => self.lex_string_start(at)?,
            '\n' | ';' => {
                self.doc.advance(1);
                Token::new(TokenKind::Eos, at)
            }
            '}' => self.lex_rbrace(at)?,
            _ => self.lex_operator_or_delimiter(at)?,
        };

        Ok(Some(tok))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.doc.current_char() {
                Some(c) if c == ' ' || c == '\t' || c == '\r' => self.doc.advance(1),
                Some('#') => {
                    while let Some(c) = self.doc.current_char() {
                        if c == '\n' {
                            break;
                        }
                        self.doc.advance(1);
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_identifier(&mut self, at: Cursor) -> Result<Token, AuraError> {
        let start = self.doc.pos();
        let mut len = 0;
        while let Some(c) = self.doc.current_char() {
            if c.is_alphanumeric() || c == '_' {
                self.doc.advance(1);
                len += 1;
            } else {
                break;
            }
        }
        let word = self.doc.slice(start, len);
        let kind = match word.as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "nihil" => TokenKind::Nihil,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "as" => TokenKind::As,
            w if KEYWORDS.contains(&w) => TokenKind::Keyword(w.to_string()),
            _ => TokenKind::Id(word),
        };
        Ok(Token::new(kind, at))
    }

    fn lex_number(&mut self, at: Cursor) -> Result<Token, AuraError> {
        let start = self.doc.pos();
        let mut len = 0;
        let mut dots = 0;
        while let Some(c) = self.doc.current_char() {
            if c.is_ascii_digit() {
                self.doc.advance(1);
                len += 1;
            } else if c == '.' && self.doc.peek(1).is_some_and(|n| n.is_ascii_digit()) {
                dots += 1;
                self.doc.advance(1);
                len += 1;
            } else {
                break;
            }
        }
        if dots > 1 {
            return Err(AuraError::lex("multiple dots in number", at));
        }
        if let Some(c) = self.doc.current_char() {
            if c.is_alphabetic() || c == '_' {
                return Err(AuraError::lex(
                    "number immediately followed by identifier",
                    at,
                ));
            }
        }
        let text = self.doc.slice(start, len);
        let kind = if dots == 1 {
            let value: f64 = text
                .parse()
                .map_err(|_| AuraError::lex("invalid float literal", at))?;
            TokenKind::Float(value)
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| AuraError::lex("invalid integer literal", at))?;
            TokenKind::Int(value)
        };
        Ok(Token::new(kind, at))
    }

    fn lex_string_start(&mut self, at: Cursor) -> Result<Token, AuraError> {
        let quote = self.doc.current_char().unwrap();
        let (kind, quote_len) = if quote == '\'' {
            (QuoteKind::Raw, 1)
        } else if self.doc.peek_n(3) == ['"', '"', '"'] {
            (QuoteKind::Generative, 3)
        } else {
            (QuoteKind::Interpolated, 1)
        };
        self.doc.advance(quote_len);
        let mut machine = StringMachine::new(kind, at);
        machine.mode = StringMode::Body;
        self.machine = Some(machine);
        self.drive_string()
    }

    /// Consume body characters until a terminator, `${`, or error. Emits
    /// exactly one token (a buffered `str_part`, an `interpolation_start`,
    /// or a terminator); a following `str_part` may queue the terminator or
    /// `interpolation_start` into `pending`.
    fn drive_string(&mut self) -> Result<Token, AuraError> {
        loop {
            let kind = self.machine.as_ref().unwrap().kind;
            let start = self.machine.as_ref().unwrap().start;

            if self.is_closing_quote(kind) {
                return self.close_string(kind, start);
            }

            match self.doc.current_char() {
                None => return Err(AuraError::lex("unterminated string literal", start)),
                Some('\\') if self.doc.peek(1) == Some('"') => {
                    self.doc.advance(2);
                    self.machine.as_mut().unwrap().push('"')?;
                }
                Some('$') if self.doc.peek(1) == Some('{') => {
                    self.doc.advance(2);
                    let buffered = self.machine.as_mut().unwrap().take_buffer();
                    self.machine.as_mut().unwrap().had_interpolation = true;
                    self.context.push(LexContext::Interpolation);
                    // Suspend this machine for the duration of the
                    // interpolated expression, which may contain strings of
                    // its own.
                    self.machine_stack.push(self.machine.take().unwrap());
                    if !buffered.is_empty() {
                        self.pending = Some(Token::new(TokenKind::InterpolationStart, start));
                        return Ok(Token::new(TokenKind::StrPart(buffered), start));
                    }
                    return Ok(Token::new(TokenKind::InterpolationStart, start));
                }
                Some(c) => {
                    self.doc.advance(1);
                    self.machine.as_mut().unwrap().push(c)?;
                }
            }
        }
    }

    fn is_closing_quote(&self, kind: QuoteKind) -> bool {
        match kind {
            QuoteKind::Raw => self.doc.current_char() == Some('\''),
            QuoteKind::Interpolated => self.doc.current_char() == Some('"'),
            QuoteKind::Generative => self.doc.peek_n(3) == ['"', '"', '"'],
        }
    }

    fn close_string(&mut self, kind: QuoteKind, start: Cursor) -> Result<Token, AuraError> {
        let quote_len = if kind == QuoteKind::Generative { 3 } else { 1 };
        self.doc.advance(quote_len);
        let machine = self.machine.take().unwrap();
        let buffer = machine.buffer;
        let terminator = if kind == QuoteKind::Generative {
            TokenKind::GenEnd
        } else {
            TokenKind::StrEnd
        };

        if kind == QuoteKind::Raw {
            return Ok(Token::new(TokenKind::SimpleStr(buffer), start));
        }
        if kind == QuoteKind::Generative && !machine.had_interpolation {
            return Ok(Token::new(TokenKind::GenLit(buffer), start));
        }
        if buffer.is_empty() {
            Ok(Token::new(terminator, start))
        } else {
            self.pending = Some(Token::new(terminator, start));
            Ok(Token::new(TokenKind::StrPart(buffer), start))
        }
    }

    fn lex_rbrace(&mut self, at: Cursor) -> Result<Token, AuraError> {
        self.doc.advance(1);
        match self.context.pop() {
            Some(LexContext::Interpolation) => {
                self.machine = self.machine_stack.pop();
                self.resume_body = true;
                Ok(Token::new(TokenKind::InterpolationEnd, at))
            }
            Some(LexContext::ObjectLiteral) | None => Ok(Token::new(TokenKind::RBrace, at)),
        }
    }

    fn lex_operator_or_delimiter(&mut self, at: Cursor) -> Result<Token, AuraError> {
        let c = self.doc.current_char().unwrap();
        if self.doc.peek_n(3) == ['~', '|', '-'] {
            self.doc.advance(3);
            return Ok(Token::new(TokenKind::Tilde, at));
        }
        let two = (c, self.doc.peek(1));
        let (kind, len) = match two {
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::Neq, 2),
            ('<', Some('=')) => (TokenKind::Lte, 2),
            ('>', Some('=')) => (TokenKind::Gte, 2),
            ('*', Some('*')) => (TokenKind::Pow, 2),
            ('~', Some('|')) => (TokenKind::Tilde, 2),
            ('|', Some('-')) => (TokenKind::Pipe, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('|', _) => (TokenKind::Pipe, 1),
            ('~', _) => (TokenKind::Tilde, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('=', _) => (TokenKind::Equals, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => {
                self.context.push(LexContext::ObjectLiteral);
                (TokenKind::LBrace, 1)
            }
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (':', _) => (TokenKind::Colon, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('?', _) => (TokenKind::Question, 1),
            (other, _) => {
                return Err(AuraError::lex(format!("unexpected character '{other}'"), at))
            }
        };
        self.doc.advance(len);
        Ok(Token::new(kind, at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_arithmetic() {
        assert_eq!(
            lex("1 + 2 * 3"),
            vec![
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Star,
                TokenKind::Int(3),
            ]
        );
    }

    #[test]
    fn lexes_simple_string() {
        assert_eq!(
            lex("'hello world'"),
            vec![TokenKind::SimpleStr("hello world".to_string())]
        );
    }

    #[test]
    fn lexes_interpolated_string() {
        let toks = lex(r#""Hello ${name}!""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StrPart("Hello ".to_string()),
                TokenKind::InterpolationStart,
                TokenKind::Id("name".to_string()),
                TokenKind::InterpolationEnd,
                TokenKind::StrPart("!".to_string()),
                TokenKind::StrEnd,
            ]
        );
    }

    #[test]
    fn lexes_generative_literal_without_interpolation() {
        assert_eq!(
            lex(r#""""Why is the sky blue?""""#),
            vec![TokenKind::GenLit("Why is the sky blue?".to_string())]
        );
    }

    #[test]
    fn lexes_generative_literal_with_interpolation() {
        let toks = lex(r#""""Describe ${topic} briefly""""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StrPart("Describe ".to_string()),
                TokenKind::InterpolationStart,
                TokenKind::Id("topic".to_string()),
                TokenKind::InterpolationEnd,
                TokenKind::StrPart(" briefly".to_string()),
                TokenKind::GenEnd,
            ]
        );
    }

    #[test]
    fn disambiguates_object_literal_from_interpolation() {
        let toks = lex(r#""${ { x: 1 } }""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::InterpolationStart,
                TokenKind::LBrace,
                TokenKind::Id("x".to_string()),
                TokenKind::Colon,
                TokenKind::Int(1),
                TokenKind::RBrace,
                TokenKind::InterpolationEnd,
                TokenKind::StrEnd,
            ]
        );
    }

    #[test]
    fn nested_string_inside_interpolation() {
        let toks = lex(r#""outer ${ 'inner' } after""#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StrPart("outer ".to_string()),
                TokenKind::InterpolationStart,
                TokenKind::SimpleStr("inner".to_string()),
                TokenKind::InterpolationEnd,
                TokenKind::StrPart(" after".to_string()),
                TokenKind::StrEnd,
            ]
        );
    }

    #[test]
    fn multiple_dots_is_lex_error() {
        assert!(Lexer::new("1.2.3").tokens().is_err());
    }

    #[test]
    fn number_then_identifier_is_lex_error() {
        assert!(Lexer::new("42abc").tokens().is_err());
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            lex("1 # comment\n+ 2"),
            vec![TokenKind::Int(1), TokenKind::Eos, TokenKind::Plus, TokenKind::Int(2)]
        );
    }

    #[test]
    fn eos_on_newline_and_semicolon() {
        assert_eq!(
            lex("x = 1\ny = 2; z = 3"),
            vec![
                TokenKind::Id("x".into()),
                TokenKind::Equals,
                TokenKind::Int(1),
                TokenKind::Eos,
                TokenKind::Id("y".into()),
                TokenKind::Equals,
                TokenKind::Int(2),
                TokenKind::Eos,
                TokenKind::Id("z".into()),
                TokenKind::Equals,
                TokenKind::Int(3),
            ]
        );
    }

    #[test]
    fn shebang_is_skipped() {
        assert_eq!(lex("#!/usr/bin/env aura\n1"), vec![TokenKind::Int(1)]);
    }

    #[test]
    fn unterminated_string_is_lex_error() {
        assert!(Lexer::new("\"unterminated").tokens().is_err());
    }

    #[test]
    fn context_stack_and_machine_stack_empty_after_success() {
        let mut lexer = Lexer::new(r#""${ { x: 1 } }""#);
        while lexer.next_token().unwrap().is_some() {}
        assert!(lexer.context.is_empty());
        assert!(lexer.machine_stack.is_empty());
        assert!(lexer.machine.is_none());
    }
}
