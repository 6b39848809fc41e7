use std::iter::Peekable;

use logos::{Logos, Span, SpannedIter};
use thiserror::Error;

use super::lexer::Token;
use super::{ArgSpec, Mode, ModeDecl};

struct TokenStream<'a> {
    source: &'a str,
    lexer: Peekable<SpannedIter<'a, Token>>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        let lexer = Token::lexer(source).spanned().peekable();

        Self { source, lexer }
    }

    pub fn next(&mut self) -> Option<(Result<Token, ()>, Span)> {
        self.lexer.next()
    }

    pub fn advance(&mut self) {
        self.lexer.next();
    }

    pub fn peek_token(&mut self) -> Option<Result<Token, ()>> {
        self.lexer.peek().map(|(tok, _)| tok).cloned()
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.source[span]
    }

    pub fn eof(&self) -> Span {
        self.source.len()..self.source.len()
    }

    /// Consume the next token, which must be present. Used for reporting the span of a token
    /// that was only peeked at.
    fn unexpected(&mut self, found: Result<Token, ()>) -> ParseError {
        match self.next() {
            Some((_, span)) => ParseError::new(span, ParseErrorKind::unexpected(found)),
            None => ParseError::new(self.eof(), ParseErrorKind::UnexpectedEof),
        }
    }
}

/// A parse error originating from [`Parser`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {span:?}")]
pub struct ParseError {
    /// The range in the source text where the error occurred.
    pub span: Span,
    /// The type of error that occurred.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(span: Span, kind: ParseErrorKind) -> Self {
        Self { span, kind }
    }
}

/// The various types of parse errors reported by [`Parser`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The parser reached the end of the input, but expected more tokens to follow.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// The parser encountered a token that doesn't belong in that place.
    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),
    /// The parser encountered input that could not be recognized as a token.
    #[error("unrecognized token")]
    UnrecognizedToken,
    /// The parser encountered more tokens after the input should have ended.
    #[error("expected end of input")]
    ExpectedEof,
}

impl ParseErrorKind {
    /// Translate an unexpected item in the token stream (either an unexpected token or a lexer
    /// error) into the matching [`ParseErrorKind`].
    pub fn unexpected(res: Result<Token, ()>) -> Self {
        match res {
            Ok(tok) => Self::UnexpectedToken(tok),
            Err(()) => Self::UnrecognizedToken,
        }
    }
}

/// A parser for mode declarations such as `friends(+person,-person)` or
/// `drinks(+person,[beer;wine])`.
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    // //////////////////////////////// PUBLIC PARSER ////////////////////////////////

    /// Parse exactly one declaration, optionally terminated by a period.
    pub fn parse_decl_str(&self, decl: &str) -> Result<ModeDecl, ParseError> {
        let mut tokens = TokenStream::new(decl);
        let result = self.parse_decl(&mut tokens)?;
        self.expect_eof(&mut tokens)?;
        Ok(result)
    }

    /// Parse any number of declarations.
    pub fn parse_decls_str(&self, decls: &str) -> Result<Vec<ModeDecl>, ParseError> {
        let mut tokens = TokenStream::new(decls);
        let mut result = vec![];
        while tokens.peek_token().is_some() {
            result.push(self.parse_decl(&mut tokens)?);
        }
        Ok(result)
    }

    /// Parse a single argument specification like `+person` or `[a;b]`.
    pub fn parse_arg_str(&self, arg: &str) -> Result<ArgSpec, ParseError> {
        let mut tokens = TokenStream::new(arg);
        let result = self.parse_arg(&mut tokens)?;
        self.expect_eof(&mut tokens)?;
        Ok(result)
    }

    // //////////////////////////////// PARSER INTERNALS ////////////////////////////////

    fn parse_decl(&self, tokens: &mut TokenStream) -> Result<ModeDecl, ParseError> {
        let name = self.parse_name(tokens)?;
        self.expect_token(tokens, Token::LParen)?;
        let mut args = vec![self.parse_arg(tokens)?];
        loop {
            match tokens.peek_token() {
                Some(Ok(Token::Comma)) => {
                    tokens.advance();
                    args.push(self.parse_arg(tokens)?);
                }
                Some(Ok(Token::RParen)) => {
                    tokens.advance();
                    break;
                }
                Some(other) => return Err(tokens.unexpected(other)),
                None => return Err(ParseError::new(tokens.eof(), ParseErrorKind::UnexpectedEof)),
            }
        }
        if let Some(Ok(Token::Period)) = tokens.peek_token() {
            tokens.advance();
        }
        Ok(ModeDecl::new(name, args))
    }

    fn parse_arg(&self, tokens: &mut TokenStream) -> Result<ArgSpec, ParseError> {
        let mode = match tokens.peek_token() {
            Some(Ok(Token::LBracket)) => {
                tokens.advance();
                return self.parse_constants(tokens).map(ArgSpec::Constants);
            }
            Some(Ok(Token::Plus)) => Some(Mode::Input),
            Some(Ok(Token::Minus)) => Some(Mode::Output),
            Some(Ok(Token::Hash)) => Some(Mode::Ground),
            _ => None,
        };
        if mode.is_some() {
            tokens.advance();
        }
        let ty = self.parse_name(tokens)?;
        Ok(ArgSpec::Variable { mode, ty })
    }

    fn parse_constants(&self, tokens: &mut TokenStream) -> Result<Vec<String>, ParseError> {
        let mut constants = vec![self.parse_name(tokens)?];
        loop {
            match tokens.peek_token() {
                Some(Ok(Token::Semicolon)) => {
                    tokens.advance();
                    constants.push(self.parse_name(tokens)?);
                }
                Some(Ok(Token::RBracket)) => {
                    tokens.advance();
                    break;
                }
                Some(other) => return Err(tokens.unexpected(other)),
                None => return Err(ParseError::new(tokens.eof(), ParseErrorKind::UnexpectedEof)),
            }
        }
        Ok(constants)
    }

    fn expect_eof(&self, tokens: &mut TokenStream) -> Result<(), ParseError> {
        if let Some((_, span)) = tokens.next() {
            Err(ParseError::new(span, ParseErrorKind::ExpectedEof))
        } else {
            Ok(())
        }
    }

    fn expect_token(&self, tokens: &mut TokenStream, expected: Token) -> Result<Span, ParseError> {
        if let Some((actual, span)) = tokens.next() {
            if actual == Ok(expected) {
                Ok(span)
            } else {
                Err(ParseError::new(span, ParseErrorKind::unexpected(actual)))
            }
        } else {
            Err(ParseError::new(tokens.eof(), ParseErrorKind::UnexpectedEof))
        }
    }

    fn parse_name(&self, tokens: &mut TokenStream) -> Result<String, ParseError> {
        let span = self.expect_token(tokens, Token::Name)?;
        Ok(tokens.slice(span).to_owned())
    }
}
