use super::*;

fn decls(text: &str) -> Vec<ModeDecl> {
    crate::textual::Parser::new().parse_decls_str(text).unwrap()
}

fn person_types(vars: &[&str]) -> VariableTypes {
    let mut types = VariableTypes::new();
    for var in vars {
        types.insert(*var, "person");
    }
    types
}

fn spec(args: &[&str]) -> Vec<ArgSpec> {
    args.iter().map(|arg| arg.parse().unwrap()).collect()
}

#[test]
fn reuses_typed_variable() {
    let background = decls("smokes(+person)");
    let types = person_types(&["X"]);
    let gen = TestGenerator::new(&background, &types);
    assert_eq!(
        gen.generate("smokes", &spec(&["+person"]), "cancer(X):-").unwrap(),
        vec!["smokes(X)"]
    );
}

#[test]
fn constants_and_output_variables() {
    let background = decls("friends([ann;bob],-person)");
    let types = person_types(&["X"]);
    let gen = TestGenerator::new(&background, &types);
    assert_eq!(
        gen.generate("friends", &spec(&["[ann;bob]", "-person"]), "cancer(X):-")
            .unwrap(),
        vec!["friends(ann,A)", "friends(bob,A)"]
    );
}

#[test]
fn mints_missing_input_variable() {
    let background = decls("owns(+person,+car)");
    let types = person_types(&["X"]);
    let gen = TestGenerator::new(&background, &types);
    assert_eq!(
        gen.generate("owns", &spec(&["+person", "+car"]), "cancer(X):-")
            .unwrap(),
        vec!["owns(X,A)"]
    );
}

#[test]
fn body_variables_take_declared_types() {
    let background = decls("friends(+person,-person) smokes(+person)");
    let types = person_types(&["A"]);
    let gen = TestGenerator::new(&background, &types);
    assert_eq!(
        gen.generate("smokes", &spec(&["+person"]), "cancer(A):-friends(A,B)")
            .unwrap(),
        vec!["smokes(A)", "smokes(B)"]
    );
    // the trailing separator of a clause under construction is ignored
    assert_eq!(
        gen.generate("friends", &spec(&["+person", "-person"]), "cancer(A):-friends(A,B);")
            .unwrap(),
        vec!["friends(A,C)", "friends(B,C)"]
    );
}

#[test]
fn output_variables_are_distinct() {
    let background = decls("pair(-t,-t)");
    let types = VariableTypes::new();
    let gen = TestGenerator::new(&background, &types);
    assert_eq!(
        gen.generate("pair", &spec(&["-t", "-t"]), "p(A,C):-").unwrap(),
        vec!["pair(B,D)"]
    );
}

#[test]
fn fresh_variable_names() {
    let mut taken = HashSet::new();
    assert_eq!(fresh_variable(&taken), "A");
    taken.insert("A".to_owned());
    taken.insert("C".to_owned());
    assert_eq!(fresh_variable(&taken), "B");
    for letter in 'A'..='Z' {
        taken.insert(letter.to_string());
    }
    assert_eq!(fresh_variable(&taken), "A1");
}

#[test]
fn clause_variable_names() {
    assert!(is_clause_variable("X"));
    assert!(is_clause_variable("A1"));
    assert!(!is_clause_variable("bob"));
    assert!(!is_clause_variable("1"));
    assert!(!is_clause_variable(""));
}

#[test]
fn product_order() {
    let sets = vec![
        vec!["a".to_owned(), "b".to_owned()],
        vec!["X".to_owned()],
        vec!["1".to_owned(), "2".to_owned()],
    ];
    let product: Vec<String> = cartesian_product(&sets)
        .into_iter()
        .map(|combination| combination.concat())
        .collect();
    assert_eq!(product, vec!["aX1", "aX2", "bX1", "bX2"]);

    assert_eq!(cartesian_product(&[]), vec![Vec::<String>::new()]);
    assert!(cartesian_product(&[vec![], vec!["a".to_owned()]]).is_empty());
}

#[test]
fn all_tests() {
    let background = decls(
        "friends(+person,-person)
         friends(-person,+person)
         smokes(+person)
         cancer(person)",
    );
    let types = person_types(&["A"]);
    let gen = TestGenerator::new(&background, &types);

    let tests = gen.generate_all("cancer(A):-", &[]).unwrap();
    assert_eq!(tests, vec!["friends(A,B)", "friends(B,A)", "smokes(A)"]);

    let tests = gen
        .generate_all("cancer(A):-", &["smokes(A)".to_owned()])
        .unwrap();
    assert_eq!(tests, vec!["friends(A,B)", "friends(B,A)"]);
}

#[test]
fn malformed_clause() {
    let background = decls("smokes(+person)");
    let types = VariableTypes::new();
    let gen = TestGenerator::new(&background, &types);
    assert!(gen.generate_all("cancer(A:-", &[]).is_err());
}
