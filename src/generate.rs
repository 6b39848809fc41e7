//! # Candidate literal generation
//!
//! At every node the tree learner extends the clause built so far with one more literal. This
//! module enumerates the literals that are allowed by the [mode declarations](crate::textual)
//! and that connect to the variables already present in the clause.

#[cfg(test)]
mod test;

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::ast::{SyntaxError, Term, BODY_SEPARATOR, IMPLIED_BY};
use crate::textual::{ArgSpec, Mode, ModeDecl};

/// Types of the variables of a clause, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTypes {
    types: HashMap<String, String>,
}

impl VariableTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of `var` unless it already has one.
    pub fn insert(&mut self, var: impl Into<String>, ty: impl Into<String>) {
        self.types.entry(var.into()).or_insert_with(|| ty.into());
    }

    pub fn get(&self, var: &str) -> Option<&str> {
        self.types.get(var).map(String::as_str)
    }

    /// Record the types of the variables of `term`, as declared by `decl`.
    pub fn record_literal(&mut self, term: &Term, decl: &ModeDecl) {
        for (arg, spec) in term.args.iter().zip(&decl.args) {
            if let Some(ty) = spec.ty() {
                if is_clause_variable(arg) {
                    self.insert(arg.as_str(), ty);
                }
            }
        }
    }
}

/// Whether `token` names a clause variable: an upper case ASCII letter followed by letters or
/// digits.
pub fn is_clause_variable(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

/// The first variable name not in `taken`: `A` to `Z`, then `A1` to `Z1`, and so on.
pub fn fresh_variable(taken: &HashSet<String>) -> String {
    (0..)
        .flat_map(|round: usize| {
            ('A'..='Z').map(move |letter| {
                if round == 0 {
                    letter.to_string()
                } else {
                    format!("{}{}", letter, round)
                }
            })
        })
        .find(|name| !taken.contains(name))
        .unwrap_or_default()
}

fn mint_variable(taken: &mut HashSet<String>) -> String {
    let var = fresh_variable(taken);
    taken.insert(var.clone());
    var
}

/// Every combination that takes one element from each set, the first set varying slowest.
pub fn cartesian_product(sets: &[Vec<String>]) -> Vec<Vec<String>> {
    sets.iter().fold(vec![vec![]], |acc, set| {
        acc.iter()
            .flat_map(|prefix| {
                set.iter().map(move |item| {
                    let mut combination = prefix.clone();
                    combination.push(item.clone());
                    combination
                })
            })
            .collect()
    })
}

/// A clause split into its head and body literals.
#[derive(Debug, Clone)]
struct ClauseParts {
    head: Term,
    body: Vec<Term>,
}

impl ClauseParts {
    /// Parse `head:-lit1;lit2;...`. Empty literals, such as the one after a trailing separator,
    /// are skipped.
    fn parse(clause: &str) -> Result<Self, SyntaxError> {
        let (head, body) = clause.split_once(IMPLIED_BY).unwrap_or((clause, ""));
        let head = Term::parse(head)?;
        let body = body
            .replace("),", ");")
            .split(BODY_SEPARATOR)
            .filter(|literal| !literal.is_empty())
            .map(Term::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { head, body })
    }

    /// Variables of the clause in order of first appearance, head arguments first.
    fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let body_vars = self
            .body
            .iter()
            .flat_map(|literal| literal.args.iter())
            .filter(|arg| is_clause_variable(arg));
        self.head
            .args
            .iter()
            .chain(body_vars)
            .filter(|var| seen.insert(var.as_str()))
            .cloned()
            .collect()
    }
}

/// Generates test literals for clauses of one learning problem.
#[derive(Debug, Clone, Copy)]
pub struct TestGenerator<'a> {
    background: &'a [ModeDecl],
    target_types: &'a VariableTypes,
}

impl<'a> TestGenerator<'a> {
    /// `background` is the full set of declarations and is used both for generating literals
    /// and for typing the variables introduced by earlier literals. `target_types` holds the
    /// types of the target's variables.
    pub fn new(background: &'a [ModeDecl], target_types: &'a VariableTypes) -> Self {
        Self {
            background,
            target_types,
        }
    }

    /// Types of the variables of `clause`.
    ///
    /// Target variables take their type from the target, variables introduced in the body take
    /// the type declared for their position by the first matching declaration.
    fn clause_types(&self, clause: &ClauseParts) -> VariableTypes {
        let mut types = VariableTypes::new();
        for var in &clause.head.args {
            if let Some(ty) = self.target_types.get(var) {
                types.insert(var.as_str(), ty);
            }
        }
        for literal in &clause.body {
            let decl = self
                .background
                .iter()
                .find(|decl| decl.name == literal.predicate && decl.arity() == literal.arity());
            if let Some(decl) = decl {
                types.record_literal(literal, decl);
            }
        }
        types
    }

    /// All candidate literals for the declaration `name(spec...)` that extend `clause`.
    ///
    /// The result may contain duplicates.
    pub fn generate(
        &self,
        name: &str,
        spec: &[ArgSpec],
        clause: &str,
    ) -> Result<Vec<String>, SyntaxError> {
        let clause = ClauseParts::parse(clause)?;
        let clause_vars = clause.variables();
        let types = self.clause_types(&clause);

        let mut taken: HashSet<String> = clause_vars.iter().cloned().collect();

        let slots: Vec<Vec<String>> = spec
            .iter()
            .map(|arg| match arg {
                ArgSpec::Constants(constants) => constants.clone(),
                ArgSpec::Variable {
                    mode: Some(Mode::Output),
                    ..
                } => vec![mint_variable(&mut taken)],
                ArgSpec::Variable { ty, .. } => {
                    let same_type: Vec<String> = clause_vars
                        .iter()
                        .filter(|var| types.get(var) == Some(ty.as_str()))
                        .cloned()
                        .collect();
                    if same_type.is_empty() {
                        vec![mint_variable(&mut taken)]
                    } else {
                        same_type
                    }
                }
            })
            .collect();

        let candidates: Vec<String> = cartesian_product(&slots)
            .into_iter()
            .map(|args| format!("{}({})", name, args.join(",")))
            .collect();
        trace!(name, count = candidates.len(), "generated candidates");
        Ok(candidates)
    }

    /// Candidates from every literal declaration, without the tests in `exclude` and without
    /// duplicates. The order is the order of first generation.
    pub fn generate_all(
        &self,
        clause: &str,
        exclude: &[String],
    ) -> Result<Vec<String>, SyntaxError> {
        let mut seen = HashSet::new();
        let mut tests = vec![];
        for decl in self.background.iter().filter(|decl| decl.is_literal()) {
            for test in self.generate(&decl.name, &decl.args, clause)? {
                if !exclude.contains(&test) && seen.insert(test.clone()) {
                    tests.push(test);
                }
            }
        }
        Ok(tests)
    }
}
