//! # Relational regression trees
//!
//! A tree is learned top down. Every inner node holds a test literal, and examples that satisfy
//! the clause built along the path to a node, extended by its test, go left. The others go right.
//! Nodes are expanded breadth first from a queue owned by a single [`TreeBuilder`], so independent
//! trees can be learned concurrently.
//!
//! The learned tree is not kept as a tree. Each leaf is turned into a [`TreeClause`]: the target,
//! the tests of all ancestors that were passed on the left edge, and the mean value of the
//! examples that reached the leaf. Tests passed on a right edge are *not* negated into the clause.
//! Instead the clauses are ordered most specific first, and inference picks the first clause an
//! example satisfies.

#[cfg(test)]
mod test;

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::ast::{Rule, SyntaxError, Term, BODY_SEPARATOR, IMPLIED_BY};
use crate::data::Dataset;
use crate::generate::TestGenerator;
use crate::search::{ProveError, ProverSession, RuleSet};

/// Parameters of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Nodes at this level become leaves.
    pub max_depth: usize,
    /// Score candidate tests on the rayon thread pool.
    pub parallel: bool,
    /// Abort proofs that take more than this many steps.
    pub step_limit: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            parallel: false,
            step_limit: None,
        }
    }
}

/// A malformed leaf record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeClauseError {
    #[error("leaf record {0:?} has no value")]
    MissingValue(String),
    #[error("invalid leaf value in {0:?}")]
    InvalidValue(String),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// One leaf of a learned tree: a clause and the value it predicts.
///
/// The textual form is `clause value`, e.g. `cancer(A):-smokes(A) 0.5`. A leaf reached only
/// through right edges has an empty body and is written `cancer(A):- -0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeClause {
    pub rule: Rule,
    pub value: f64,
}

impl TreeClause {
    pub fn new(rule: Rule, value: f64) -> Self {
        Self { rule, value }
    }

    /// Number of body literals.
    pub fn specificity(&self) -> usize {
        self.rule.body.len()
    }

    /// Whether the clause applies to every example.
    pub fn is_unconditional(&self) -> bool {
        self.rule.is_fact()
    }
}

impl fmt::Display for TreeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rule.is_fact() {
            write!(f, "{}{} {:?}", self.rule.head, IMPLIED_BY, self.value)
        } else {
            write!(f, "{} {:?}", self.rule, self.value)
        }
    }
}

impl FromStr for TreeClause {
    type Err = TreeClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (clause, value) = s
            .trim()
            .rsplit_once(' ')
            .ok_or_else(|| TreeClauseError::MissingValue(s.to_owned()))?;
        let value = value
            .parse()
            .map_err(|_| TreeClauseError::InvalidValue(s.to_owned()))?;
        Ok(Self::new(Rule::parse(clause)?, value))
    }
}

/// The leaf clauses of one tree, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LearnedTree {
    clauses: Vec<TreeClause>,
}

impl LearnedTree {
    /// Order `clauses` by descending number of body literals. Clauses of equal length keep their
    /// relative order.
    pub fn new(mut clauses: Vec<TreeClause>) -> Self {
        clauses.sort_by_key(|clause| Reverse(clause.specificity()));
        Self { clauses }
    }

    pub fn clauses(&self) -> &[TreeClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The value of the first clause that applies to `query`, if any.
    pub fn value_of(
        &self,
        facts: &RuleSet,
        query: &Term,
        step_limit: Option<usize>,
    ) -> Result<Option<f64>, ProveError> {
        for clause in &self.clauses {
            if clause.is_unconditional() {
                return Ok(Some(clause.value));
            }
            let session =
                ProverSession::with_clause(facts, clause.rule.clone()).with_step_limit(step_limit);
            if session.prove(query)? {
                return Ok(Some(clause.value));
            }
        }
        Ok(None)
    }
}

impl fmt::Display for LearnedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            writeln!(f, "{}", clause)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for LearnedTree {
    type Error = TreeClauseError;

    /// Records are taken in the given order.
    fn try_from(records: Vec<String>) -> Result<Self, Self::Error> {
        let clauses = records
            .iter()
            .map(|record| record.parse())
            .collect::<Result<_, _>>()?;
        Ok(Self { clauses })
    }
}

impl From<LearnedTree> for Vec<String> {
    fn from(tree: LearnedTree) -> Self {
        tree.clauses.iter().map(ToString::to_string).collect()
    }
}

/// The value of the first clause of `tree` that applies to `example`.
///
/// This parses the facts of `data` on every call. Use [`LearnedTree::value_of`] with a
/// prepared [`RuleSet`] when evaluating many examples.
pub fn prove_example<D: Dataset + ?Sized>(
    tree: &LearnedTree,
    example: &str,
    data: &D,
) -> Result<Option<f64>, ProveError> {
    let facts = RuleSet::parse(data.facts())?;
    tree.value_of(&facts, &Term::parse(example)?, None)
}

/// Learn a single tree on the current values of `data`.
pub fn learn_tree<D: Dataset + Sync + ?Sized>(
    data: &D,
    config: &TreeConfig,
) -> Result<LearnedTree, ProveError> {
    TreeBuilder::new(data, *config)?.learn()
}

/// Which edge leads from a node to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The examples satisfied the parent's test.
    Left,
    /// The examples did not satisfy the parent's test.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
enum NodeParent {
    Root,
    Child { parent: NodeId, side: Side },
}

#[derive(Debug)]
struct TreeNode {
    /// The test chosen for this node, once it has been expanded.
    test: Option<Term>,
    examples: Vec<String>,
    /// Variance of the example values.
    info: f64,
    level: usize,
    parent: NodeParent,
}

/// A candidate test together with the partition it induces.
struct Split {
    test: Term,
    satisfied: Vec<String>,
    unsatisfied: Vec<String>,
    score: f64,
}

/// Whether `value` rounds to zero at three decimals.
fn rounds_to_zero(value: f64) -> bool {
    (value * 1000.0).round() == 0.0
}

/// The state of learning one tree: the nodes created so far, the expansion queue and the leaf
/// clauses recorded so far.
pub struct TreeBuilder<'d, D: ?Sized> {
    data: &'d D,
    config: TreeConfig,
    facts: RuleSet,
    target: Term,
    nodes: Vec<TreeNode>,
    queue: VecDeque<NodeId>,
    learned: Vec<TreeClause>,
    depth: usize,
}

impl<'d, D: Dataset + Sync + ?Sized> TreeBuilder<'d, D> {
    /// Create the root node from all examples of `data`.
    pub fn new(data: &'d D, config: TreeConfig) -> Result<Self, ProveError> {
        let facts = RuleSet::parse(data.facts())?;
        let target = Term::parse(data.target())?;
        let examples = data.examples();
        let info = data.variance(&examples);
        let mut builder = Self {
            data,
            config,
            facts,
            target,
            nodes: vec![],
            queue: VecDeque::new(),
            learned: vec![],
            depth: 0,
        };
        builder.add_node(examples, info, 0, NodeParent::Root);
        Ok(builder)
    }

    /// Expand nodes until the queue is empty.
    pub fn learn(mut self) -> Result<LearnedTree, ProveError> {
        while let Some(id) = self.queue.pop_front() {
            self.expand(id)?;
        }
        let tree = LearnedTree::new(self.learned);
        info!(
            head = %self.target,
            clauses = tree.len(),
            depth = self.depth,
            "learned tree"
        );
        Ok(tree)
    }

    fn add_node(&mut self, examples: Vec<String>, info: f64, level: usize, parent: NodeParent) {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            test: None,
            examples,
            info,
            level,
            parent,
        });
        self.queue.push_back(id);
        self.depth = self.depth.max(level);
    }

    /// The tests on the path from `id` to the root, nearest first. The first list holds the tests
    /// passed on a left edge, the second all tests on the path.
    fn path_tests(&self, id: NodeId) -> (Vec<Term>, Vec<Term>) {
        let mut body = vec![];
        let mut ancestors = vec![];
        let mut current = &self.nodes[id.0];
        while let NodeParent::Child { parent, side } = current.parent {
            current = &self.nodes[parent.0];
            if let Some(test) = &current.test {
                if side == Side::Left {
                    body.push(test.clone());
                }
                ancestors.push(test.clone());
            }
        }
        (body, ancestors)
    }

    fn record_leaf(&mut self, rule: Rule, examples: &[String]) {
        let clause = TreeClause::new(rule, self.data.mean(examples));
        debug!(examples = examples.len(), "leaf {}", clause);
        self.learned.push(clause);
    }

    fn expand(&mut self, id: NodeId) -> Result<(), ProveError> {
        let (body, ancestors) = self.path_tests(id);
        let node = &self.nodes[id.0];
        let rule = Rule {
            head: self.target.clone(),
            body,
        };

        if node.level == self.config.max_depth || rounds_to_zero(node.info) {
            let examples = node.examples.clone();
            self.record_leaf(rule, &examples);
            return Ok(());
        }

        let level = node.level;
        let clause = format!(
            "{}{}{}",
            self.target,
            IMPLIED_BY,
            rule.body
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(&BODY_SEPARATOR.to_string())
        );
        let exclude: Vec<String> = ancestors.iter().map(ToString::to_string).collect();
        let tests = TestGenerator::new(self.data.literals(), self.data.variable_types())
            .generate_all(&clause, &exclude)?;
        debug!(%clause, candidates = tests.len(), "expanding node at level {}", level);

        let Some(best) = self.best_split(&rule, &node.examples, &tests)? else {
            let examples = node.examples.clone();
            self.record_leaf(rule, &examples);
            return Ok(());
        };

        info!(test = %best.test, score = best.score, "best test for {}", clause);
        self.nodes[id.0].test = Some(best.test);
        if !best.satisfied.is_empty() {
            let info = self.data.variance(&best.satisfied);
            let parent = NodeParent::Child {
                parent: id,
                side: Side::Left,
            };
            self.add_node(best.satisfied, info, level + 1, parent);
        }
        if !best.unsatisfied.is_empty() {
            let info = self.data.variance(&best.unsatisfied);
            let parent = NodeParent::Child {
                parent: id,
                side: Side::Right,
            };
            self.add_node(best.unsatisfied, info, level + 1, parent);
        }
        Ok(())
    }

    /// The candidate with the lowest weighted variance. Ties go to the earlier candidate.
    fn best_split(
        &self,
        rule: &Rule,
        examples: &[String],
        tests: &[String],
    ) -> Result<Option<Split>, ProveError> {
        let queries = examples
            .iter()
            .map(|example| Term::parse(example))
            .collect::<Result<Vec<_>, _>>()?;
        let evaluate = |test: &String| self.evaluate(rule, examples, &queries, test);

        let splits = if self.config.parallel {
            tests.par_iter().map(evaluate).collect::<Result<Vec<_>, _>>()?
        } else {
            tests.iter().map(evaluate).collect::<Result<Vec<_>, _>>()?
        };

        let mut best: Option<Split> = None;
        for split in splits {
            if best.as_ref().map_or(true, |best| split.score < best.score) {
                best = Some(split);
            }
        }
        Ok(best)
    }

    /// Partition `examples` by whether they satisfy `rule` extended by `test`.
    fn evaluate(
        &self,
        rule: &Rule,
        examples: &[String],
        queries: &[Term],
        test: &String,
    ) -> Result<Split, ProveError> {
        let test = Term::parse(test)?;
        let extended = rule.clone().when(test.clone());
        let session = ProverSession::with_clause(&self.facts, extended)
            .with_step_limit(self.config.step_limit);

        let mut satisfied = vec![];
        let mut unsatisfied = vec![];
        for (example, query) in examples.iter().zip(queries) {
            if session.prove(query)? {
                satisfied.push(example.clone());
            } else {
                unsatisfied.push(example.clone());
            }
        }

        let total = examples.len() as f64;
        let score = satisfied.len() as f64 / total * self.data.variance(&satisfied)
            + unsatisfied.len() as f64 / total * self.data.variance(&unsatisfied);
        trace!(%test, score, satisfied = satisfied.len(), "scored candidate");
        Ok(Split {
            test,
            satisfied,
            unsatisfied,
            score,
        })
    }
}
