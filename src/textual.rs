//! # Mode declarations
//!
//! Background knowledge tells the learner which literals it may use in tests, and how their
//! arguments may be filled. Each declaration names a predicate and gives one specification per
//! argument:
//!
//! - `+type`: reuse a variable of that type that already occurs in the clause, if there is one.
//! - `-type`: introduce a new variable.
//! - `#type`: treated like `+type`.
//! - `type`: no mode at all. Such declarations only describe the argument types of a target.
//! - `[c1;c2;...]`: one of the listed constants.
//!
//! ```
//! # use relboost::textual::{ArgSpec, Mode, ModeDecl};
//! let decl: ModeDecl = "drinks(+person,[beer;wine])".parse().unwrap();
//! assert_eq!(decl.name, "drinks");
//! assert_eq!(
//!     decl.args[0],
//!     ArgSpec::Variable { mode: Some(Mode::Input), ty: "person".into() }
//! );
//! assert!(decl.is_literal());
//! ```

mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use self::lexer::Token;
pub use self::parser::{ParseError, ParseErrorKind, Parser};

/// How a variable argument of a generated literal is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `+`
    Input,
    /// `-`
    Output,
    /// `#`
    Ground,
}

impl Mode {
    pub fn symbol(self) -> char {
        match self {
            Mode::Input => '+',
            Mode::Output => '-',
            Mode::Ground => '#',
        }
    }
}

/// Specification of one argument position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgSpec {
    /// A variable slot of the given type.
    Variable { mode: Option<Mode>, ty: String },
    /// A slot filled with one of a fixed set of constants.
    Constants(Vec<String>),
}

impl ArgSpec {
    /// The type of a variable slot.
    pub fn ty(&self) -> Option<&str> {
        match self {
            ArgSpec::Variable { ty, .. } => Some(ty),
            ArgSpec::Constants(_) => None,
        }
    }
}

impl FromStr for ArgSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new().parse_arg_str(s)
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSpec::Variable { mode, ty } => {
                if let Some(mode) = mode {
                    write!(f, "{}", mode.symbol())?;
                }
                write!(f, "{}", ty)
            }
            ArgSpec::Constants(constants) => write!(f, "[{}]", constants.join(";")),
        }
    }
}

/// A declaration like `friends(+person,-person)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModeDecl {
    pub name: String,
    pub args: Vec<ArgSpec>,
}

impl ModeDecl {
    pub fn new(name: impl Into<String>, args: Vec<ArgSpec>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Whether tests may be generated from this declaration, i.e. some argument is `+` or `-`.
    pub fn is_literal(&self) -> bool {
        self.args.iter().any(|arg| {
            matches!(
                arg,
                ArgSpec::Variable {
                    mode: Some(Mode::Input | Mode::Output),
                    ..
                }
            )
        })
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl FromStr for ModeDecl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new().parse_decl_str(s)
    }
}

impl fmt::Display for ModeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "{}", first)?;
            for arg in rest {
                write!(f, ",{}", arg)?;
            }
        }
        write!(f, ")")
    }
}
