use super::*;
use crate::data::{Data, DataOptions};
use crate::textual::Parser;

fn cancer(facts: &[&str], pos: &[&str], neg: &[&str], bk: &str) -> Data {
    let mut data = Data::new(DataOptions::default());
    data.set_facts(facts.iter().map(|fact| fact.to_string()).collect());
    data.set_pos(pos, "cancer");
    data.set_neg(neg, "cancer");
    let bk = Parser::new().parse_decls_str(bk).unwrap();
    data.set_background(&bk, "cancer").unwrap();
    data
}

fn records(tree: &LearnedTree) -> Vec<String> {
    tree.clone().into()
}

#[test]
fn single_split() {
    let data = cancer(
        &["smokes(bob)"],
        &["cancer(bob)"],
        &["cancer(ann)"],
        "smokes(+person) cancer(+person)",
    );
    let tree = learn_tree(&data, &TreeConfig::default()).unwrap();
    assert_eq!(
        records(&tree),
        vec!["cancer(A):-smokes(A) 0.5", "cancer(A):- -0.5"]
    );

    assert_eq!(prove_example(&tree, "cancer(bob)", &data).unwrap(), Some(0.5));
    assert_eq!(prove_example(&tree, "cancer(ann)", &data).unwrap(), Some(-0.5));
    // the unconditional clause catches everything else
    assert_eq!(prove_example(&tree, "cancer(eve)", &data).unwrap(), Some(-0.5));
}

#[test]
fn pure_root_is_a_leaf() {
    let data = cancer(
        &["smokes(bob)"],
        &["cancer(bob)", "cancer(ann)"],
        &[],
        "smokes(+person) cancer(+person)",
    );
    let builder = TreeBuilder::new(&data, TreeConfig::default()).unwrap();
    let tree = builder.learn().unwrap();
    assert_eq!(records(&tree), vec!["cancer(A):- 0.5"]);
}

#[test]
fn no_candidates() {
    let data = cancer(&["smokes(bob)"], &["cancer(bob)"], &["cancer(ann)"], "cancer(+person)");
    let tree = learn_tree(&data, &TreeConfig::default()).unwrap();
    assert_eq!(records(&tree), vec!["cancer(A):- 0.0"]);
}

#[test]
fn depth_limit() {
    let data = cancer(
        &["smokes(bob)"],
        &["cancer(bob)"],
        &["cancer(ann)"],
        "smokes(+person) cancer(+person)",
    );
    let config = TreeConfig {
        max_depth: 0,
        ..TreeConfig::default()
    };
    let tree = learn_tree(&data, &config).unwrap();
    assert_eq!(records(&tree), vec!["cancer(A):- 0.0"]);
}

fn friends() -> Data {
    cancer(
        &[
            "smokes(ann)",
            "smokes(bob)",
            "friends(ann,bob)",
            "friends(bob,ann)",
            "friends(eve,bob)",
            "friends(dan,eve)",
        ],
        &["cancer(ann)", "cancer(bob)", "cancer(eve)"],
        &["cancer(dan)", "cancer(fay)"],
        "friends(+person,-person) smokes(+person) cancer(+person)",
    )
}

#[test]
fn two_levels() {
    let data = friends();
    let config = TreeConfig {
        max_depth: 2,
        ..TreeConfig::default()
    };
    let builder = TreeBuilder::new(&data, config).unwrap();
    let tree = builder.learn().unwrap();

    // smokes(A) wins at the root. The right child then splits on friends(A,B), and the test it
    // failed on the way down does not show up in its clauses.
    assert_eq!(
        records(&tree),
        vec![
            "cancer(A):-smokes(A) 0.5",
            "cancer(A):-friends(A,B) 0.0",
            "cancer(A):- -0.5",
        ]
    );

    let value = |example: &str| prove_example(&tree, example, &data).unwrap();
    assert_eq!(value("cancer(ann)"), Some(0.5));
    assert_eq!(value("cancer(eve)"), Some(0.0));
    assert_eq!(value("cancer(dan)"), Some(0.0));
    assert_eq!(value("cancer(fay)"), Some(-0.5));
}

#[test]
fn parallel_scoring_is_deterministic() {
    let data = friends();
    let sequential = learn_tree(&data, &TreeConfig::default()).unwrap();
    let parallel = learn_tree(
        &data,
        &TreeConfig {
            parallel: true,
            ..TreeConfig::default()
        },
    )
    .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn inference_is_repeatable() {
    let data = friends();
    let tree = learn_tree(&data, &TreeConfig::default()).unwrap();
    for example in data.examples() {
        let first = prove_example(&tree, &example, &data).unwrap();
        let second = prove_example(&tree, &example, &data).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn clause_records() {
    for record in [
        "cancer(A):-friends(A,B);smokes(B) 0.25",
        "cancer(A):-smokes(A) 1.0",
        "cancer(A):- -0.3333333333333333",
    ] {
        let clause: TreeClause = record.parse().unwrap();
        assert_eq!(clause.to_string(), record);
    }

    let clause: TreeClause = "cancer(A):-friends(A,B);smokes(B) 0.25".parse().unwrap();
    assert_eq!(clause.specificity(), 2);
    assert!(!clause.is_unconditional());
    assert!("cancer(A):- 0.5".parse::<TreeClause>().unwrap().is_unconditional());

    assert_eq!(
        "cancer(A):-".parse::<TreeClause>(),
        Err(TreeClauseError::MissingValue("cancer(A):-".into()))
    );
    assert_eq!(
        "cancer(A):- high".parse::<TreeClause>(),
        Err(TreeClauseError::InvalidValue("cancer(A):- high".into()))
    );
    assert!(matches!(
        "cancer(A:- 0.5".parse::<TreeClause>(),
        Err(TreeClauseError::Syntax(_))
    ));
}

#[test]
fn sorted_by_specificity() {
    let clause = |record: &str| record.parse::<TreeClause>().unwrap();
    let tree = LearnedTree::new(vec![
        clause("t(A):- 0.1"),
        clause("t(A):-p(A) 0.2"),
        clause("t(A):-p(A);q(A) 0.3"),
        clause("t(A):-q(A) 0.4"),
    ]);
    assert_eq!(
        records(&tree),
        vec!["t(A):-p(A);q(A) 0.3", "t(A):-p(A) 0.2", "t(A):-q(A) 0.4", "t(A):- 0.1"]
    );
}

#[test]
fn malformed_fact() {
    let data = cancer(
        &["smokes(bob)", "smokes(ann"],
        &["cancer(bob)"],
        &["cancer(ann)"],
        "smokes(+person) cancer(+person)",
    );
    match learn_tree(&data, &TreeConfig::default()) {
        Err(ProveError::Syntax(err)) => assert_eq!(err.text, "smokes(ann"),
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn step_limit_while_scoring() {
    // the recursive rule sends every proof of smokes/1 into an endless descent
    let data = cancer(
        &["smokes(bob)", "smokes(X):-smokes(X)"],
        &["cancer(bob)"],
        &["cancer(ann)"],
        "smokes(+person) cancer(+person)",
    );
    for parallel in [false, true] {
        let config = TreeConfig {
            parallel,
            step_limit: Some(500),
            ..TreeConfig::default()
        };
        assert_eq!(
            learn_tree(&data, &config),
            Err(ProveError::SearchExhausted { steps: 500 })
        );
    }
}
