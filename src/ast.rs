//! # Terms and rules
//!
//! The prover works directly on the textual representation used by the training data: a term is
//! a predicate name applied to a list of argument tokens, and a rule is a head term with a
//! (possibly empty) conjunction of body terms.
//!
//! Arguments are plain strings. Whether a token is a variable or a constant is not stored in the
//! term, it is decided by [`crate::unification::is_variable`] at the time of unification.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator between the head and the body of a rule.
pub const IMPLIED_BY: &str = ":-";

/// Separator between body literals. Note that this is a conjunction, `,` is taken by argument
/// lists.
pub const BODY_SEPARATOR: char = ';';

/// A malformed term or rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in {text:?}")]
pub struct SyntaxError {
    /// The text that failed to parse.
    pub text: String,
    /// What was wrong with it.
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(text: impl Into<String>, kind: SyntaxErrorKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// The various kinds of [`SyntaxError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// The term does not end with `)`.
    #[error("term should end with ')'")]
    MissingClosingParen,
    /// The term does not split into exactly a name and an argument list at `(`.
    #[error("term should be composed of two fields, found {0}")]
    FieldCount(usize),
}

/// A predicate applied to an ordered list of argument tokens, e.g. `friends(X,bob)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub predicate: String,
    pub args: Vec<String>,
}

impl Term {
    pub fn new(predicate: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Parse `name(arg1,arg2,...)`.
    ///
    /// All spaces inside the argument list are dropped. The text must end with `)` and contain
    /// exactly one `(`. An empty argument list yields a single empty argument, which mirrors how
    /// the argument list is split.
    pub fn parse(text: &str) -> Result<Term, SyntaxError> {
        let Some(inner) = text.strip_suffix(')') else {
            return Err(SyntaxError::new(text, SyntaxErrorKind::MissingClosingParen));
        };
        let fields = text.split('(').count();
        if fields != 2 {
            return Err(SyntaxError::new(text, SyntaxErrorKind::FieldCount(fields)));
        }
        // exactly one '(' is present, checked above
        let (predicate, args) = inner.split_once('(').unwrap_or((inner, ""));
        let args = args.replace(' ', "").split(',').map(str::to_owned).collect();
        Ok(Term::new(predicate, args))
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl FromStr for Term {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Term::parse(s)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.predicate, self.args.join(","))
    }
}

/// A Horn clause `head:-body1;body2;...`. A rule with an empty body is a fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The term that holds when every body term is proven.
    pub head: Term,
    /// The conjunction of terms that need to hold for the head to become true.
    pub body: Vec<Term>,
}

impl Rule {
    /// A rule that always holds.
    pub fn fact(head: Term) -> Self {
        Self { head, body: vec![] }
    }

    /// Add another condition to the body.
    pub fn when(mut self, term: Term) -> Self {
        self.body.push(term);
        self
    }

    /// Parse `head:-lit1;lit2;...` or a bare `head`.
    ///
    /// The text is split at the first `:-`. Commas that directly follow a closing parenthesis in
    /// the body are treated as literal separators, so `p(X),q(X)` and `p(X);q(X)` are the same
    /// body. Nothing after the separator means an empty body.
    pub fn parse(text: &str) -> Result<Rule, SyntaxError> {
        let Some((head, body)) = text.split_once(IMPLIED_BY) else {
            return Ok(Rule::fact(Term::parse(text)?));
        };
        let head = Term::parse(head)?;
        if body.is_empty() {
            return Ok(Rule::fact(head));
        }
        let body = body
            .replace("),", ");")
            .split(BODY_SEPARATOR)
            .map(Term::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rule { head, body })
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

impl FromStr for Rule {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::parse(s)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if let Some((first, rest)) = self.body.split_first() {
            write!(f, "{}{}", IMPLIED_BY, first)?;
            for term in rest {
                write!(f, "{}{}", BODY_SEPARATOR, term)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn term_parsing() {
        let term = Term::parse("person(batflyer)").unwrap();
        assert_eq!(term.predicate, "person");
        assert_eq!(term.args, args(&["batflyer"]));

        let term = Term::parse("drinks(person, beer, pub)").unwrap();
        assert_eq!(term.predicate, "drinks");
        assert_eq!(term.args, args(&["person", "beer", "pub"]));

        let term = Term::parse("()").unwrap();
        assert_eq!(term.predicate, "");
        assert_eq!(term.args, args(&[""]));
    }

    #[test]
    fn term_roundtrip() {
        for input in ["p(a,b,c)", "friends(X,Y)", "smokes(bob)"] {
            let term = Term::parse(input).unwrap();
            let reparsed = Term::parse(&term.to_string()).unwrap();
            assert_eq!(term, reparsed);
            assert_eq!(term.to_string(), input);
        }
    }

    #[test]
    fn bad_terms() {
        assert_eq!(
            Term::parse(")(").unwrap_err().kind,
            SyntaxErrorKind::MissingClosingParen
        );
        assert_eq!(
            Term::parse("hello(world).").unwrap_err().kind,
            SyntaxErrorKind::MissingClosingParen
        );
        assert_eq!(
            Term::parse("x)").unwrap_err().kind,
            SyntaxErrorKind::FieldCount(1)
        );
        assert_eq!(
            Term::parse("f(g(x))").unwrap_err().kind,
            SyntaxErrorKind::FieldCount(3)
        );
        let err = Term::parse("drinks(person, pub).").unwrap_err();
        assert_eq!(err.text, "drinks(person, pub).");
    }

    #[test]
    fn rule_parsing() {
        let rule = Rule::parse("advises(x,y):-paper(x,y);student(y)").unwrap();
        assert_eq!(rule.head, Term::new("advises", args(&["x", "y"])));
        assert_eq!(
            rule.body,
            vec![
                Term::new("paper", args(&["x", "y"])),
                Term::new("student", args(&["y"])),
            ]
        );

        // argument commas and literal separators are told apart
        let with_commas = Rule::parse("grand(X,Z):-parent(X,Y),parent(Y,Z)").unwrap();
        let with_semis = Rule::parse("grand(X,Z):-parent(X,Y);parent(Y,Z)").unwrap();
        assert_eq!(with_commas, with_semis);
        assert_eq!(with_semis.to_string(), "grand(X,Z):-parent(X,Y);parent(Y,Z)");
    }

    #[test]
    fn facts() {
        let fact = Rule::parse("parent(a,b)").unwrap();
        assert!(fact.is_fact());
        let empty_body = Rule::parse("cancer(X):-").unwrap();
        assert!(empty_body.is_fact());
        assert_eq!(empty_body.to_string(), "cancer(X)");
    }

    #[test]
    fn bad_rules() {
        assert!(Rule::parse("").is_err());
        assert!(Rule::parse("advises(x,y):!-paper(v)").is_err());
        assert!(Rule::parse("p(X):-q(X);").is_err());
    }
}
