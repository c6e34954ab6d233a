use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn semtab_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_semtab"))
}

fn run(args: &[&str]) -> Output {
    let output = Command::new(semtab_bin())
        .args(args)
        .output()
        .expect("run semtab");
    assert!(
        output.status.success(),
        "semtab {args:?} failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn csv_dataset(root: &Path) {
    fs::create_dir_all(root.join("tables")).unwrap();
    fs::write(root.join("tables/cities.csv"), "city,country\nParis,France\nRome,Italy\nOslo,Norway\n").unwrap();
    fs::write(root.join("tables/rivers.csv"), "river,length\nNile,6650\n").unwrap();
}

#[test]
fn inspect_convert_sample_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let batched = dir.path().join("batched");
    let sampled = dir.path().join("sampled");
    csv_dataset(&src);

    let out = run(&["inspect", src.to_str().unwrap(), "--list"]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("2 examples"), "{stdout}");
    assert!(stdout.contains("cities"), "{stdout}");

    run(&[
        "convert",
        src.to_str().unwrap(),
        batched.to_str().unwrap(),
        "--batch",
        "--batch-size",
        "1",
    ]);
    assert!(batched.join("tables/part-0001.zip").is_file());
    let out = run(&["inspect", batched.to_str().unwrap()]);
    assert!(String::from_utf8_lossy(&out.stdout).contains("4 rows"));

    run(&[
        "sample",
        batched.to_str().unwrap(),
        sampled.to_str().unwrap(),
        "--rows",
        "2",
        "--seed",
        "3",
    ]);
    let out = run(&["inspect", sampled.to_str().unwrap()]);
    assert!(String::from_utf8_lossy(&out.stdout).contains("3 rows"));
}

#[test]
fn score_prints_metrics() {
    let dir = TempDir::new().unwrap();
    let truth = dir.path().join("truth.json");
    let pred = dir.path().join("pred.json");
    fs::write(&truth, r#"["A", "B"]"#).unwrap();
    fs::write(&pred, r#"["A", "C"]"#).unwrap();

    let out = run(&["score", truth.to_str().unwrap(), pred.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("precision=0.5000"), "{stdout}");
    assert!(stdout.contains("f1=0.5000"), "{stdout}");
}

#[test]
fn missing_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(semtab_bin())
        .args(["inspect", dir.path().join("nope").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load dataset"));
}
