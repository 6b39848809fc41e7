//! # Training and test data
//!
//! The learner only ever looks at data through the [`Dataset`] trait: the facts to prove against,
//! the target, the literal declarations and the current value of each example. [`Data`] is the
//! in-memory implementation, loaded from a directory of text files:
//!
//! | file           | contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | `facts.txt`    | one ground fact per line, e.g. `friends(ann,bob)`         |
//! | `pos.txt`      | positive examples (classification)                       |
//! | `neg.txt`      | negative examples (classification)                       |
//! | `examples.txt` | `example value` per line (regression)                    |
//! | `bk.txt`       | mode declarations, e.g. `friends(+person,-person)`       |
//! | `advice.txt`   | `clause [preferred,...] [nonPreferred,...]` per line      |
//!
//! Blank lines are skipped, and each line is trimmed and stripped of a trailing `.`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::{Rule, SyntaxError, Term};
use crate::generate::{fresh_variable, VariableTypes};
use crate::textual::{ArgSpec, ModeDecl, ParseError, Parser};

/// Initial gradient of a positive example, `1 - 0.5`.
pub const INITIAL_POSITIVE_GRADIENT: f64 = 0.5;
/// Initial gradient of a negative example, `0 - 0.5`.
pub const INITIAL_NEGATIVE_GRADIENT: f64 = -0.5;

/// Errors raised while loading data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("invalid mode declaration {line:?}")]
    Declaration {
        line: String,
        #[source]
        source: ParseError,
    },
    #[error("no declaration found for target {0:?}")]
    MissingTargetDeclaration(String),
    #[error("invalid example {0:?}")]
    InvalidExample(String),
    #[error("invalid advice {0:?}")]
    InvalidAdvice(String),
}

/// The view of the data the tree learner works with.
pub trait Dataset {
    /// Ground facts, in file order.
    fn facts(&self) -> &[String];

    /// The target term with one variable per argument, e.g. `cancer(A)`.
    fn target(&self) -> &str;

    /// Declarations that tests may be generated from.
    fn literals(&self) -> &[ModeDecl];

    /// Types of the variables of [`Dataset::target`].
    fn variable_types(&self) -> &VariableTypes;

    /// Every example identifier, in a stable order.
    fn examples(&self) -> Vec<String>;

    /// The current value of an example: its gradient, or its regression value.
    fn value(&self, example: &str) -> f64;

    /// Population variance of the values of `examples`. Zero for no examples.
    fn variance(&self, examples: &[String]) -> f64 {
        if examples.is_empty() {
            return 0.0;
        }
        let count = examples.len() as f64;
        let mean = examples.iter().map(|e| self.value(e)).sum::<f64>() / count;
        examples
            .iter()
            .map(|e| (self.value(e) - mean).powi(2))
            .sum::<f64>()
            / count
    }

    /// Mean of the values of `examples`. Zero for no examples.
    fn mean(&self, examples: &[String]) -> f64 {
        if examples.is_empty() {
            return 0.0;
        }
        examples.iter().map(|e| self.value(e)).sum::<f64>() / examples.len() as f64
    }
}

/// Which kind of learning problem the data describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOptions {
    /// Read `examples.txt` with real values instead of `pos.txt` and `neg.txt`.
    pub regression: bool,
    /// Read `advice.txt` and add advice gradients.
    pub advice: bool,
}

/// An expert hint: examples satisfying `clause` should (or should not) be labelled with the
/// listed targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceClause {
    pub clause: String,
    pub preferred: Vec<String>,
    pub non_preferred: Vec<String>,
}

impl AdviceClause {
    fn parse_list(list: &str) -> Option<Vec<String>> {
        let inner = list.strip_prefix('[')?.strip_suffix(']')?;
        Some(
            inner
                .split(',')
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl FromStr for AdviceClause {
    type Err = DataError;

    /// Parse `clause [preferred,...] [nonPreferred,...]`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidAdvice(line.to_owned());
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [clause, preferred, non_preferred] = fields[..] else {
            return Err(invalid());
        };
        Rule::parse(clause)?;
        Ok(Self {
            clause: clause.to_owned(),
            preferred: Self::parse_list(preferred).ok_or_else(invalid)?,
            non_preferred: Self::parse_list(non_preferred).ok_or_else(invalid)?,
        })
    }
}

/// Relational data for one target.
#[derive(Debug, Clone, Default)]
pub struct Data {
    options: DataOptions,
    facts: Vec<String>,
    pos: IndexMap<String, f64>,
    neg: IndexMap<String, f64>,
    /// Current values of regression examples.
    examples: IndexMap<String, f64>,
    true_values: IndexMap<String, f64>,
    advice_clauses: Vec<AdviceClause>,
    target: String,
    literals: Vec<ModeDecl>,
    variable_types: VariableTypes,
}

/// The predicate name of an example like `cancer(bob)`.
fn predicate_of(example: &str) -> &str {
    example.split('(').next().unwrap_or_default()
}

/// Non-blank lines of `text`, trimmed and without a trailing period.
pub fn clean_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_suffix('.').unwrap_or(line).trim_end()
        })
        .filter(|line| !line.is_empty())
}

fn read_lines(path: &Path) -> Result<Vec<String>, DataError> {
    let text = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_owned(),
        source,
    })?;
    Ok(clean_lines(&text).map(str::to_owned).collect())
}

impl Data {
    pub fn new(options: DataOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn is_regression(&self) -> bool {
        self.options.regression
    }

    pub fn set_facts(&mut self, facts: Vec<String>) {
        self.facts = facts;
    }

    /// Add positive examples of `target` with the initial positive gradient. Examples of other
    /// predicates are skipped.
    pub fn set_pos<S: AsRef<str>>(&mut self, pos: &[S], target: &str) {
        for example in pos.iter().map(AsRef::as_ref) {
            if predicate_of(example) == target {
                self.pos.insert(example.to_owned(), INITIAL_POSITIVE_GRADIENT);
            } else {
                warn!(example, predicate = target, "ignoring positive example of another predicate");
            }
        }
    }

    /// Add negative examples of `target` with the initial negative gradient. Examples of other
    /// predicates are skipped.
    pub fn set_neg<S: AsRef<str>>(&mut self, neg: &[S], target: &str) {
        for example in neg.iter().map(AsRef::as_ref) {
            if predicate_of(example) == target {
                self.neg.insert(example.to_owned(), INITIAL_NEGATIVE_GRADIENT);
            } else {
                warn!(example, predicate = target, "ignoring negative example of another predicate");
            }
        }
    }

    /// Add regression examples, given as `example value` lines. The current value of each
    /// example starts out as its true value.
    pub fn set_examples<S: AsRef<str>>(&mut self, lines: &[S], target: &str) -> Result<(), DataError> {
        for line in lines.iter().map(AsRef::as_ref) {
            let invalid = || DataError::InvalidExample(line.to_owned());
            let (example, value) = line.split_once(char::is_whitespace).ok_or_else(invalid)?;
            let value: f64 = value.trim().parse().map_err(|_| invalid())?;
            if predicate_of(example) == target {
                self.true_values.insert(example.to_owned(), value);
                self.examples.insert(example.to_owned(), value);
            } else {
                warn!(example, predicate = target, "ignoring example of another predicate");
            }
        }
        Ok(())
    }

    /// Take the literal declarations of `bk` and build the target term from the declaration
    /// of `target`.
    ///
    /// The declaration of the target itself is not used for tests: a test on the target would
    /// make the clause recursive.
    pub fn set_background(&mut self, bk: &[ModeDecl], target: &str) -> Result<(), DataError> {
        self.literals = bk
            .iter()
            .filter(|decl| decl.is_literal() && decl.name != target)
            .cloned()
            .collect();

        let decl = bk
            .iter()
            .find(|decl| decl.name == target)
            .ok_or_else(|| DataError::MissingTargetDeclaration(target.to_owned()))?;
        let mut variables = Vec::with_capacity(decl.arity());
        let mut taken = Default::default();
        self.variable_types = VariableTypes::new();
        for arg in &decl.args {
            let var = fresh_variable(&taken);
            taken.insert(var.clone());
            if let ArgSpec::Variable { ty, .. } = arg {
                self.variable_types.insert(var.as_str(), ty.as_str());
            }
            variables.push(var);
        }
        self.target = Term::new(target, variables).to_string();
        debug!(term = %self.target, literals = self.literals.len(), "background set");
        Ok(())
    }

    pub fn add_advice(&mut self, advice: AdviceClause) {
        self.advice_clauses.push(advice);
    }

    pub fn advice_clauses(&self) -> &[AdviceClause] {
        &self.advice_clauses
    }

    /// Whether advice gradients are added during boosting.
    pub fn uses_advice(&self) -> bool {
        self.options.advice && !self.options.regression
    }

    pub fn is_positive(&self, example: &str) -> bool {
        self.pos.contains_key(example)
    }

    /// The true regression value of an example.
    pub fn true_value(&self, example: &str) -> Option<f64> {
        self.true_values.get(example).copied()
    }

    /// Overwrite the current value of a known example. Unknown examples are ignored.
    pub fn set_value(&mut self, example: &str, value: f64) {
        let slot = if self.options.regression {
            self.examples.get_mut(example)
        } else {
            match self.pos.get_mut(example) {
                Some(slot) => Some(slot),
                None => self.neg.get_mut(example),
            }
        };
        match slot {
            Some(slot) => *slot = value,
            None => warn!(example, "cannot set the value of an unknown example"),
        }
    }

    /// Load training data for `target` from `dir`.
    pub fn read_training(
        dir: impl AsRef<Path>,
        target: &str,
        options: DataOptions,
    ) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        let mut data = Self::read_test(dir, target, options)?;

        let bk = read_lines(&dir.join("bk.txt"))?
            .into_iter()
            .map(|line| {
                Parser::new()
                    .parse_decl_str(&line)
                    .map_err(|source| DataError::Declaration { line, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        data.set_background(&bk, target)?;

        if options.advice {
            for line in read_lines(&dir.join("advice.txt"))? {
                data.add_advice(line.parse()?);
            }
        }
        debug!(dir = %dir.display(), predicate = target, "read training data");
        Ok(data)
    }

    /// Load the facts and examples for `target` from `dir`.
    pub fn read_test(
        dir: impl AsRef<Path>,
        target: &str,
        options: DataOptions,
    ) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        let mut data = Self::new(options);

        let facts = read_lines(&dir.join("facts.txt"))?;
        for fact in &facts {
            Rule::parse(fact)?;
        }
        data.set_facts(facts);

        if options.regression {
            let examples = read_lines(&dir.join("examples.txt"))?;
            data.set_examples(&examples, target)?;
        } else {
            let pos = read_lines(&dir.join("pos.txt"))?;
            let neg = read_lines(&dir.join("neg.txt"))?;
            for example in pos.iter().chain(&neg) {
                Term::parse(example).map_err(|_| DataError::InvalidExample(example.clone()))?;
            }
            data.set_pos(&pos, target);
            data.set_neg(&neg, target);
        }
        Ok(data)
    }
}

impl Dataset for Data {
    fn facts(&self) -> &[String] {
        &self.facts
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn literals(&self) -> &[ModeDecl] {
        &self.literals
    }

    fn variable_types(&self) -> &VariableTypes {
        &self.variable_types
    }

    fn examples(&self) -> Vec<String> {
        if self.options.regression {
            self.examples.keys().cloned().collect()
        } else {
            self.pos.keys().chain(self.neg.keys()).cloned().collect()
        }
    }

    fn value(&self, example: &str) -> f64 {
        let value = if self.options.regression {
            self.examples.get(example)
        } else {
            self.pos.get(example).or_else(|| self.neg.get(example))
        };
        value.copied().unwrap_or_else(|| {
            warn!(example, "no value for unknown example");
            0.0
        })
    }
}
