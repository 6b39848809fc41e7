//! # Boosted relational regression trees
//!
//! Relboost learns models for a target predicate from ground facts, labelled (or valued)
//! examples and mode declarations. A model is a sum of relational regression trees. Each tree is
//! a list of Horn clauses with a value attached, and an example gets the value of the first clause
//! it satisfies. Satisfaction is decided by a small backtracking prover over the facts.
//!
//! The pieces, bottom up:
//!
//! - [ast] holds terms like `friends(X,bob)` and rules like `cancer(X):-smokes(X)`.
//! - [unification] and [search] implement the prover.
//! - [textual] parses mode declarations, which [generate] turns into candidate tests.
//! - [data] holds facts and examples, [tree] learns single trees on them.
//! - [boosting] learns whole ensembles and runs inference, [model] stores them as JSON.
//!
//! # Example
//!
//! Suppose Bob smokes and has cancer, while Ann does neither:
//!
//! ```
//! use relboost::data::{Data, DataOptions, Dataset};
//! use relboost::textual::Parser;
//!
//! let mut data = Data::new(DataOptions::default());
//! data.set_facts(vec!["smokes(bob)".to_owned()]);
//! data.set_pos(&["cancer(bob)"], "cancer");
//! data.set_neg(&["cancer(ann)"], "cancer");
//!
//! let bk = Parser::new().parse_decls_str("smokes(+person). cancer(+person).").unwrap();
//! data.set_background(&bk, "cancer").unwrap();
//! assert_eq!(data.target(), "cancer(A)");
//! ```
//!
//! Initially, positive examples carry the gradient `0.5` and negative ones `-0.5`. A single tree
//! separates them with the test `smokes(A)`:
//!
//! ```
//! # use relboost::data::{Data, DataOptions, Dataset};
//! # use relboost::textual::Parser;
//! # use relboost::tree::{learn_tree, prove_example, TreeConfig};
//! # let mut data = Data::new(DataOptions::default());
//! # data.set_facts(vec!["smokes(bob)".to_owned()]);
//! # data.set_pos(&["cancer(bob)"], "cancer");
//! # data.set_neg(&["cancer(ann)"], "cancer");
//! # let bk = Parser::new().parse_decls_str("smokes(+person). cancer(+person).").unwrap();
//! # data.set_background(&bk, "cancer").unwrap();
//! let tree = learn_tree(&data, &TreeConfig::default()).unwrap();
//! assert_eq!(tree.to_string(), "cancer(A):-smokes(A) 0.5\ncancer(A):- -0.5\n");
//!
//! assert_eq!(prove_example(&tree, "cancer(bob)", &data).unwrap(), Some(0.5));
//! assert_eq!(prove_example(&tree, "cancer(ann)", &data).unwrap(), Some(-0.5));
//! ```
//!
//! [boosting::learn] repeats this, each time fitting a tree to the gradients left over by the
//! trees before it, and [boosting::infer] turns the summed values into probabilities.
//!
//! Clauses are consulted after all facts with the same head, and the prover performs a plain
//! depth first search. Recursive clauses can therefore keep it busy forever.
//! [tree::TreeConfig::step_limit] bounds the work spent on a single proof.

pub mod ast;
pub mod boosting;
pub mod data;
pub mod generate;
pub mod model;
pub mod search;
pub mod textual;
pub mod tree;
pub mod unification;

pub use boosting::{infer, infer_with, learn, BoostConfig, Loss};
pub use data::{Data, DataOptions, Dataset};
pub use model::Model;
pub use search::{prove, ProverSession, RuleSet};
pub use tree::{learn_tree, prove_example, LearnedTree, TreeConfig};
