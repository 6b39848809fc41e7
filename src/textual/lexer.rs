use logos::Logos;

#[derive(Logos, Debug, PartialEq, Eq, Clone)]
pub enum Token {
    #[token(".")]
    Period,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    /// Reuse a variable of the same type if there is one.
    #[token("+")]
    Plus,

    /// Always introduce a new variable.
    #[token("-")]
    Minus,

    #[token("#")]
    Hash,

    /// Predicate names, type names and constants.
    #[regex("[a-zA-Z0-9_][a-zA-Z0-9_']*")]
    Name,

    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,
}
