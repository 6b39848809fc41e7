//! # Unification of argument tokens
//!
//! Terms are matched argument by argument under two independent [`Env`]ironments, one for the
//! source term (the goal being resolved) and one for the destination term (the candidate rule
//! head). Only the destination environment receives new bindings.

use std::collections::HashMap;

use crate::ast::Term;

/// Variable bindings of a single proof branch.
///
/// Each goal owns its environment. Deriving a new goal always copies it, so one branch never
/// observes the bindings made in a sibling branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    bindings: HashMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound to `var`, if any. Empty values count as unbound.
    pub fn get(&self, var: &str) -> Option<&str> {
        self.bindings
            .get(var)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn bind(&mut self, var: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(var.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Whether a token denotes a variable.
///
/// The test is ordinal: a token is a variable when its first character does not sort after `Z`.
/// Upper case names are variables and lower case names are constants, but digits and the empty
/// token also count as variables.
#[inline]
pub fn is_variable(token: &str) -> bool {
    token.chars().next().map_or(true, |first| first <= 'Z')
}

/// Unify `src` (under `src_env`) into `dst` (under `dst_env`).
///
/// Returns `false` as soon as the predicates, the arities or a pair of values disagree. Bindings
/// made before a failing argument are left in `dst_env`.
///
/// An argument whose source side is an unbound variable is accepted without binding anything,
/// whatever the destination argument is.
pub fn unify(src: &Term, src_env: &Env, dst: &Term, dst_env: &mut Env) -> bool {
    if src.arity() != dst.arity() || src.predicate != dst.predicate {
        return false;
    }
    for (src_arg, dst_arg) in src.args.iter().zip(&dst.args) {
        let src_val = if is_variable(src_arg) {
            src_env.get(src_arg)
        } else {
            Some(src_arg.as_str()).filter(|value| !value.is_empty())
        };
        let Some(src_val) = src_val else {
            continue;
        };
        if is_variable(dst_arg) {
            match dst_env.get(dst_arg) {
                None => dst_env.bind(dst_arg.as_str(), src_val),
                Some(dst_val) if dst_val != src_val => return false,
                Some(_) => {}
            }
        } else if dst_arg != src_val {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;

    fn term(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    #[test]
    fn variable_classification() {
        assert!(is_variable("X"));
        assert!(is_variable("Person"));
        assert!(is_variable("Zed"));
        assert!(is_variable("42"));
        assert!(is_variable(""));
        assert!(!is_variable("x"));
        assert!(!is_variable("bob"));
        // '_' and '[' sort after 'Z'
        assert!(!is_variable("_X"));
    }

    #[test]
    fn ground_terms() {
        let pairs = [
            ("p(a,b)", "p(a,b)", true),
            ("p(a,b)", "p(a,c)", false),
            ("p(a,b)", "q(a,b)", false),
            ("p(a)", "p(a,b)", false),
        ];
        for (a, b, expected) in pairs {
            assert_eq!(unify(&term(a), &Env::new(), &term(b), &mut Env::new()), expected);
            assert_eq!(unify(&term(b), &Env::new(), &term(a), &mut Env::new()), expected);
        }
    }

    #[test]
    fn binds_destination_variables() {
        let mut dst_env = Env::new();
        assert!(unify(
            &term("parent(alice,carol)"),
            &Env::new(),
            &term("parent(X,Y)"),
            &mut dst_env
        ));
        assert_eq!(dst_env.get("X"), Some("alice"));
        assert_eq!(dst_env.get("Y"), Some("carol"));

        // repeated destination variable must agree
        let mut dst_env = Env::new();
        assert!(!unify(
            &term("same(a,b)"),
            &Env::new(),
            &term("same(X,X)"),
            &mut dst_env
        ));
        assert_eq!(dst_env.get("X"), Some("a"));
    }

    #[test]
    fn reads_source_bindings() {
        let mut src_env = Env::new();
        src_env.bind("X", "bob");
        let mut dst_env = Env::new();
        assert!(unify(
            &term("smokes(X)"),
            &src_env,
            &term("smokes(bob)"),
            &mut dst_env
        ));
        assert!(!unify(
            &term("smokes(X)"),
            &src_env,
            &term("smokes(ann)"),
            &mut dst_env
        ));
    }

    #[test]
    fn unbound_source_is_accepted_without_binding() {
        let mut dst_env = Env::new();
        assert!(unify(
            &term("friends(X,Y)"),
            &Env::new(),
            &term("friends(ann,Z)"),
            &mut dst_env
        ));
        assert!(dst_env.is_empty());
    }
}
