//! # Functional gradient boosting
//!
//! Each tree is fitted to the current gradients of the training examples, after which the
//! gradients are recomputed from the whole ensemble learned so far. For classification the
//! ensemble sum is a log-odds value and the gradient of an example is its label minus the
//! predicted probability. For regression the gradient depends on the [`Loss`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ast::{Rule, Term};
use crate::data::{Data, Dataset};
use crate::search::{ProveError, ProverSession, RuleSet};
use crate::tree::{learn_tree, LearnedTree, TreeConfig};

/// Log odds of the prior probability `0.5`, i.e. `ln(0.5 / (1 - 0.5))`.
pub const LOG_PRIOR: f64 = 0.0;

/// The logistic function `e^x / (1 + e^x)`.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Loss function for regression targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Loss {
    /// Gradient `y - ŷ`.
    #[default]
    LeastSquares,
    /// Gradient `sign(y - ŷ)`.
    LeastAbsoluteDeviation,
    /// Like [`Loss::LeastAbsoluteDeviation`] for residuals above `delta`, like
    /// [`Loss::LeastSquares`] otherwise.
    Huber { delta: f64 },
}

impl Loss {
    /// The gradient for an example with true value `actual` and ensemble sum `predicted`.
    pub fn gradient(self, actual: f64, predicted: f64) -> f64 {
        let residual = actual - predicted;
        if residual == 0.0 {
            return 0.0;
        }
        match self {
            Loss::LeastSquares => residual,
            Loss::LeastAbsoluteDeviation => residual.signum(),
            Loss::Huber { delta } if residual > delta => residual.signum(),
            Loss::Huber { .. } => residual,
        }
    }
}

/// Parameters of a boosting run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Number of trees to learn.
    pub trees: usize,
    pub loss: Loss,
    pub tree: TreeConfig,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            trees: 10,
            loss: Loss::default(),
            tree: TreeConfig::default(),
        }
    }
}

/// A set of trees evaluated against the facts of one data set.
pub struct Ensemble<'t> {
    trees: &'t [LearnedTree],
    facts: RuleSet,
    step_limit: Option<usize>,
}

impl<'t> Ensemble<'t> {
    pub fn new<D: Dataset + ?Sized>(trees: &'t [LearnedTree], data: &D) -> Result<Self, ProveError> {
        Ok(Self {
            trees,
            facts: RuleSet::parse(data.facts())?,
            step_limit: None,
        })
    }

    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Sum of the leaf values `example` reaches in every tree. A tree without an applicable
    /// clause contributes nothing.
    pub fn sum(&self, example: &str) -> Result<f64, ProveError> {
        let query = Term::parse(example)?;
        let mut sum = 0.0;
        for tree in self.trees {
            match tree.value_of(&self.facts, &query, self.step_limit)? {
                Some(value) => sum += value,
                None => debug!(example, "no clause applies"),
            }
        }
        Ok(sum)
    }

    /// The advice gradient of `example`: the number of advice clauses it satisfies that prefer
    /// the target, minus those that advise against it.
    pub fn advice(&self, data: &Data, example: &str) -> Result<f64, ProveError> {
        let query = Term::parse(example)?;
        let target = query.predicate.as_str();
        let mut gradient = 0i64;
        for advice in data.advice_clauses() {
            let rule = Rule::parse(&advice.clause)?;
            let session =
                ProverSession::with_clause(&self.facts, rule).with_step_limit(self.step_limit);
            if session.prove(&query)? {
                if advice.preferred.iter().any(|t| t == target) {
                    gradient += 1;
                }
                if advice.non_preferred.iter().any(|t| t == target) {
                    gradient -= 1;
                }
            }
        }
        Ok(gradient as f64)
    }
}

/// Sum of the values `example` gets from each of `trees`.
pub fn sum_of_gradients<D: Dataset + ?Sized>(
    example: &str,
    trees: &[LearnedTree],
    data: &D,
) -> Result<f64, ProveError> {
    Ensemble::new(trees, data)?.sum(example)
}

/// The advice gradient of `example` over the advice clauses of `data`.
pub fn advice_gradient(data: &Data, example: &str) -> Result<f64, ProveError> {
    Ensemble::new(&[], data)?.advice(data, example)
}

/// Recompute the value of every example of `data` from `trees`.
pub fn update_gradients(data: &mut Data, trees: &[LearnedTree], loss: Loss) -> Result<(), ProveError> {
    update_gradients_with(data, trees, loss, None)
}

fn update_gradients_with(
    data: &mut Data,
    trees: &[LearnedTree],
    loss: Loss,
    step_limit: Option<usize>,
) -> Result<(), ProveError> {
    let ensemble = Ensemble::new(trees, &*data)?.with_step_limit(step_limit);
    let mut updates = vec![];
    for example in data.examples() {
        let sum = ensemble.sum(&example)?;
        let gradient = if data.is_regression() {
            let Some(actual) = data.true_value(&example) else {
                warn!(%example, "regression example without a true value");
                continue;
            };
            loss.gradient(actual, sum)
        } else {
            let label = if data.is_positive(&example) { 1.0 } else { 0.0 };
            let mut gradient = label - sigmoid(LOG_PRIOR + sum);
            if data.uses_advice() {
                gradient += ensemble.advice(data, &example)?;
            }
            gradient
        };
        updates.push((example, gradient));
    }
    for (example, gradient) in updates {
        data.set_value(&example, gradient);
    }
    Ok(())
}

/// Learn `config.trees` trees for the target of `data`, updating the gradients after each.
pub fn learn(data: &mut Data, config: &BoostConfig) -> Result<Vec<LearnedTree>, ProveError> {
    let mut trees = Vec::with_capacity(config.trees);
    for i in 0..config.trees {
        let tree = learn_tree(&*data, &config.tree)?;
        info!(tree = i + 1, of = config.trees, head = data.target(), "learned tree");
        for clause in tree.clauses() {
            debug!("  {}", clause);
        }
        trees.push(tree);
        update_gradients_with(data, &trees, config.loss, config.tree.step_limit)?;
    }
    Ok(trees)
}

/// Predict every example of `data` with `trees`: the probability of being positive for
/// classification, the ensemble sum for regression.
///
/// The predictions replace the values stored in `data` and are also returned in example order.
pub fn infer(data: &mut Data, trees: &[LearnedTree]) -> Result<Vec<(String, f64)>, ProveError> {
    infer_with(data, trees, None)
}

/// Like [`infer`], but each proof gives up after `step_limit` steps.
pub fn infer_with(
    data: &mut Data,
    trees: &[LearnedTree],
    step_limit: Option<usize>,
) -> Result<Vec<(String, f64)>, ProveError> {
    let ensemble = Ensemble::new(trees, &*data)?.with_step_limit(step_limit);
    let mut predictions = vec![];
    for example in data.examples() {
        let sum = ensemble.sum(&example)?;
        let prediction = if data.is_regression() {
            sum
        } else {
            sigmoid(LOG_PRIOR + sum)
        };
        predictions.push((example, prediction));
    }
    for (example, prediction) in &predictions {
        data.set_value(example, *prediction);
    }
    Ok(predictions)
}
