//! Integration tests for the complete semtab pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Dataset files → Load → Sample → Save → Load
//! - Semantic models → Transformation → Scoring
//!
//! Run with: cargo test --test integration_tests

use approx::assert_relative_eq;
use semtab_dataset::{
    deser_simple_tree_yaml, sample_table_data, ser_simple_tree_yaml, Dataset, LoadOptions,
    SaveOptions,
};
use semtab_eval::{
    precision_recall_f1, remove_isolated_nodes, replace_class_nodes_by_subject_columns,
};
use semtab_model::{KgNamespaceRegistry, Node, SemanticModel};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

fn write_films_dataset(root: &Path) {
    fs::create_dir_all(root.join("tables")).unwrap();
    fs::create_dir_all(root.join("descriptions/films")).unwrap();

    let mut csv = String::from("title,year,director\n");
    for i in 0..20 {
        csv.push_str(&format!("Film {i},{},Director {}\n", 1990 + i, i % 4));
    }
    fs::write(root.join("tables/films.csv"), csv).unwrap();

    fs::write(
        root.join("descriptions/films/version.01.yml"),
        r#"
prefixes:
  wd: http://www.wikidata.org/entity/
  wdt: http://www.wikidata.org/prop/direct/
  rdfs: http://www.w3.org/2000/01/rdf-schema#
models:
  - nodes:
      - { id: 0, type: class, uri: "wd:Q11424" }
      - { id: 1, type: class, uri: "wd:Q5" }
      - { id: 2, type: data, col_index: 0, label: title }
      - { id: 3, type: data, col_index: 1, label: year }
      - { id: 4, type: data, col_index: 2, label: director }
      - { id: 5, type: literal, value: "Q11424", datatype: entity-id }
    edges:
      - { source: 0, target: 2, uri: "rdfs:label" }
      - { source: 0, target: 3, uri: "wdt:P577" }
      - { source: 0, target: 1, uri: "wdt:P57" }
      - { source: 1, target: 4, uri: "rdfs:label" }
"#,
    )
    .unwrap();
}

/// Property linking each column to its parent, keyed by column index.
fn column_properties(sm: &SemanticModel) -> BTreeMap<usize, String> {
    let mut out = BTreeMap::new();
    for (_, _, target, edge) in sm.iter_edges() {
        if let Some(Node::Data(d)) = sm.node(target) {
            out.insert(d.col_index, edge.rel_uri.clone());
        }
    }
    out
}

#[test]
fn test_load_sample_save_reload() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("films");
    write_films_dataset(&src);

    let examples = Dataset::new(&src).load(&LoadOptions::default()).unwrap();
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].table.shape(), (20, 3));
    assert_eq!(examples[0].sms.len(), 1);
    assert_eq!(examples[0].sms[0].num_nodes(), 6);

    let sampled = sample_table_data(examples, 5, Some(11)).unwrap();
    assert_eq!(sampled[0].table.nrows(), 5);
    assert_eq!(sampled[0].table.links.shape().unwrap(), (5, 3));

    let dst = dir.path().join("sampled");
    let options = SaveOptions {
        batch_compressed: true,
        ..Default::default()
    };
    Dataset::new(&dst).save(&sampled, &options).unwrap();
    let reloaded = Dataset::new(&dst).load(&LoadOptions::default()).unwrap();
    assert_eq!(reloaded, sampled);
}

#[test]
fn test_transform_then_score_column_properties() {
    let dir = tempdir().unwrap();
    write_films_dataset(dir.path());
    let examples = Dataset::new(dir.path()).load(&LoadOptions::default()).unwrap();
    let mut sm = examples[0].sms[0].clone();

    let id_props: HashSet<String> = HashSet::from([RDFS_LABEL.to_string()]);
    replace_class_nodes_by_subject_columns(&mut sm, &id_props).unwrap();
    remove_isolated_nodes(&mut sm);

    // both classes collapse into their label columns; the literal is dropped
    assert_eq!(sm.num_nodes(), 3);
    let props = column_properties(&sm);
    assert_eq!(props.get(&1).map(String::as_str), Some("wdt:P577"));
    assert_eq!(props.get(&2).map(String::as_str), Some("wdt:P57"));
    assert!(!props.contains_key(&0));

    let truth = vec![None, Some("wdt:P577".to_string()), Some("wdt:P57".to_string())];
    let preds: Vec<Option<String>> = (0..3)
        .map(|ci| Some(props.get(&ci).cloned().unwrap_or_else(|| "none".to_string())))
        .collect();
    let r = precision_recall_f1(truth, &preds, None).unwrap();
    assert_relative_eq!(r.recall, 1.0);
    assert_relative_eq!(r.precision, 2.0 / 3.0);
}

#[test]
fn test_simple_tree_export_reimports() {
    let dir = tempdir().unwrap();
    write_films_dataset(dir.path());
    let examples = Dataset::new(dir.path()).load(&LoadOptions::default()).unwrap();
    let example = &examples[0];

    let ns = KgNamespaceRegistry::with_defaults().combined_namespace();
    let yaml = ser_simple_tree_yaml(&example.table.table, &example.sms[0], &ns).unwrap();
    assert!(yaml.contains("simple-tree-1"));
    assert!(yaml.contains("title"));

    let back = deser_simple_tree_yaml(&example.table.table, &yaml).unwrap();
    assert_eq!(back.num_nodes(), example.sms[0].num_nodes());
    assert_eq!(back.num_edges(), example.sms[0].num_edges());
    assert_eq!(column_properties(&back), column_properties(&example.sms[0]));
}
