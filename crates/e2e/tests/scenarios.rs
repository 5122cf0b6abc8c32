use std::path::PathBuf;

use cedar_qa_e2e::pages;
use cedar_qa_e2e::TestSpec;

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

fn selector_references(value: &serde_yaml::Value, out: &mut Vec<String>) {
    match value {
        serde_yaml::Value::String(s) if s.starts_with('@') => out.push(s.clone()),
        serde_yaml::Value::Sequence(items) => {
            items.iter().for_each(|v| selector_references(v, out))
        }
        serde_yaml::Value::Mapping(map) => map.values().for_each(|v| selector_references(v, out)),
        _ => {}
    }
}

#[test]
fn bundled_scenarios_parse() {
    let specs = TestSpec::load_all(&scenarios_dir()).unwrap();
    let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"admin-login"));
    assert!(names.contains(&"client-send"));
    assert!(names.contains(&"client-signup"));
    assert_eq!(TestSpec::filter_by_tag(&specs, "smoke").len(), 1);
}

#[test]
fn only_signup_needs_a_dev_browser_token() {
    let specs = TestSpec::load_all(&scenarios_dir()).unwrap();
    let needing: Vec<&str> = specs
        .iter()
        .filter(|s| s.references(cedar_qa_e2e::runner::DEV_BROWSER_TOKEN))
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(needing, vec!["client-signup"]);
}

#[test]
fn bundled_scenarios_reference_known_selectors() {
    for entry in walkdir::WalkDir::new(scenarios_dir()) {
        let entry = entry.unwrap();
        if entry.path().extension().map_or(true, |e| e != "yaml") {
            continue;
        }
        let doc: serde_yaml::Value =
            serde_yaml::from_str(&std::fs::read_to_string(entry.path()).unwrap()).unwrap();
        let mut refs = Vec::new();
        selector_references(&doc, &mut refs);
        assert!(!refs.is_empty(), "{} has no selector references", entry.path().display());
        for reference in refs {
            assert!(
                pages::resolve(&reference).is_ok(),
                "{}: unknown selector {}",
                entry.path().display(),
                reference
            );
        }
    }
}
