//! # Backtracking proof search
//!
//! This module answers a single question: is a query term provable from a set of facts and one
//! candidate clause? The search walks an explicit stack of [`Goal`]s instead of recursing, and
//! backtracking falls out of how that stack is filled: every rule head that unifies with the
//! current subgoal is pushed as its own goal, while heads that do not unify are dropped and never
//! occupy stack space.
//!
//! A depth-first search like this one is not complete. A rule base with cyclic definitions can
//! keep the search busy forever. [`ProverSession::with_step_limit`] turns such runs into a
//! [`ProveError::SearchExhausted`] instead.


use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::ast::{Rule, SyntaxError, Term};
use crate::data::Dataset;
use crate::unification::{unify, Env};

/// Failure of a proof attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProveError {
    /// A fact, clause or query could not be parsed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// The configured step limit was reached before the search finished.
    #[error("search gave up after {steps} steps")]
    SearchExhausted { steps: usize },
}

/// An ordered collection of rules, indexed by head predicate and arity.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    by_head: HashMap<(String, usize), Vec<usize>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every fact (or rule) string in order.
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self, SyntaxError> {
        let mut set = RuleSet::new();
        for rule in rules {
            set.insert(Rule::parse(rule.as_ref())?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, rule: Rule) {
        let key = (rule.head.predicate.clone(), rule.head.arity());
        self.by_head.entry(key).or_default().push(self.rules.len());
        self.rules.push(rule);
    }

    /// All rules whose head has the predicate and arity of `term`, in insertion order.
    pub fn rules_by_head<'a>(&'a self, term: &Term) -> impl Iterator<Item = &'a Rule> + 'a {
        self.by_head
            .get(&(term.predicate.clone(), term.arity()))
            .into_iter()
            .flatten()
            .map(move |&index| &self.rules[index])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A choice point of the search: a rule being worked through, body literal by body literal.
#[derive(Debug, Clone)]
struct Goal<'r> {
    rule: &'r Rule,
    /// The goal whose subgoal this rule is resolving. Parents are never mutated, resuming one
    /// works on a copy.
    parent: Option<Rc<Goal<'r>>>,
    env: Env,
    /// Index of the next unresolved body literal.
    cursor: usize,
}

impl<'r> Goal<'r> {
    fn new(rule: &'r Rule, parent: Option<Rc<Goal<'r>>>) -> Self {
        Self {
            rule,
            parent,
            env: Env::new(),
            cursor: 0,
        }
    }

    /// The next body literal to resolve, or `None` once the whole body is resolved.
    fn pending(&self) -> Option<&'r Term> {
        self.rule.body.get(self.cursor)
    }
}

/// The rule database of a single proof: a shared fact base plus one candidate clause.
///
/// Sessions are cheap to create. Nothing is shared between sessions except the read-only facts,
/// so proofs can run concurrently on separate threads.
#[derive(Debug, Clone)]
pub struct ProverSession<'f> {
    facts: &'f RuleSet,
    clause: Option<Rule>,
    step_limit: Option<usize>,
}

impl<'f> ProverSession<'f> {
    /// A session that only knows the facts.
    pub fn new(facts: &'f RuleSet) -> Self {
        Self {
            facts,
            clause: None,
            step_limit: None,
        }
    }

    /// A session over the facts and one additional clause.
    pub fn with_clause(facts: &'f RuleSet, clause: Rule) -> Self {
        Self {
            facts,
            clause: Some(clause),
            step_limit: None,
        }
    }

    /// Give up with [`ProveError::SearchExhausted`] after popping `limit` goals.
    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Candidate rules for `term`: matching facts first, then the clause.
    fn candidates<'a>(&'a self, term: &'a Term) -> impl Iterator<Item = &'a Rule> + 'a {
        let clause = self.clause.as_ref().filter(|clause| {
            clause.head.predicate == term.predicate && clause.head.arity() == term.arity()
        });
        self.facts.rules_by_head(term).chain(clause)
    }

    /// Whether `query` is provable in this session.
    pub fn prove(&self, query: &Term) -> Result<bool, ProveError> {
        // The query becomes the single body literal of a wrapper goal without a parent. Once
        // that wrapper has resolved its body, the query is proved.
        let wrapper = Rule::fact(Term::new("query", vec![])).when(query.clone());
        let mut stack = vec![Goal::new(&wrapper, None)];
        let mut steps = 0;

        while let Some(goal) = stack.pop() {
            steps += 1;
            if self.step_limit.is_some_and(|limit| steps > limit) {
                return Err(ProveError::SearchExhausted { steps: steps - 1 });
            }

            let Some(literal) = goal.pending() else {
                let Some(parent) = &goal.parent else {
                    trace!(steps, "proved {}", query);
                    return Ok(true);
                };
                // Hand the bindings of the finished rule back to the subgoal slot of the parent
                // and continue with the parent's next body literal. The outcome of this
                // unification does not decide anything, the head already matched the slot.
                let mut resumed = Goal::clone(parent);
                if let Some(slot) = parent.pending() {
                    unify(&goal.rule.head, &goal.env, slot, &mut resumed.env);
                }
                resumed.cursor += 1;
                trace!(steps, "resume {} at {}", resumed.rule, resumed.cursor);
                stack.push(resumed);
                continue;
            };

            let goal = Rc::new(goal);
            for rule in self.candidates(literal) {
                let mut child = Goal::new(rule, Some(Rc::clone(&goal)));
                if unify(literal, &goal.env, &rule.head, &mut child.env) {
                    trace!(steps, "push {} for {}", rule, literal);
                    stack.push(child);
                }
            }
        }

        Ok(false)
    }
}

/// Whether `example` satisfies `clause` given the facts of `data`.
///
/// Every call parses the facts again and builds a fresh session. Callers that prove many
/// examples against the same facts should parse a [`RuleSet`] once and use [`ProverSession`].
pub fn prove<D: Dataset + ?Sized>(data: &D, example: &str, clause: &str) -> Result<bool, ProveError> {
    let facts = RuleSet::parse(data.facts())?;
    let clause = Rule::parse(clause)?;
    let query = Term::parse(example)?;
    ProverSession::with_clause(&facts, clause).prove(&query)
}
