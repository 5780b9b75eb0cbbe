//! End-to-end tests of the stage binaries and the standalone runner.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const MATRICES: &str = "\
A,0,0,1
A,0,1,2
A,0,2,3
A,1,0,4
A,1,1,5
A,1,2,6
B,0,0,7
B,0,1,8
B,1,0,9
B,1,1,10
B,2,0,11
B,2,1,12
";

fn run_stage(bin: &str, args: &[&str], stdin: &str) -> String {
    let output = Command::cargo_bin(bin)
        .unwrap()
        .env_remove("MAX_I")
        .env_remove("MAX_K")
        .args(args)
        .write_stdin(stdin)
        .output()
        .unwrap();
    assert!(output.status.success(), "{bin} failed: {output:?}");
    String::from_utf8(output.stdout).unwrap()
}

/// What the streaming framework does between the stages.
fn shuffle(mapped: &str) -> String {
    let mut lines = mapped.lines().collect::<Vec<_>>();
    lines.sort();
    lines.iter().map(|l| format!("{l}\n")).collect()
}

#[test]
fn word_count_pipeline() {
    let mapped = run_stage("mrs-mapper", &["wc"], "Hello Hadoop\nHello World\n");
    assert_eq!(mapped, "hello\t1\nhadoop\t1\nhello\t1\nworld\t1\n");

    let reduced = run_stage("mrs-reducer", &["wc"], &shuffle(&mapped));
    assert_eq!(reduced, "hadoop\t1\nhello\t2\nworld\t1\n");
}

#[test]
fn matrix_mult_pipeline() {
    let mapped = run_stage(
        "mrs-mapper",
        &["mm", "--", "--rows-a", "2", "--cols-b", "2"],
        MATRICES,
    );
    // every entry is replicated twice
    assert_eq!(mapped.lines().count(), 24);
    assert!(mapped.contains("0,1\tA,2,3.0\n"));
    assert!(mapped.contains("1,0\tB,2,11.0\n"));

    let reduced = run_stage("mrs-reducer", &["mm"], &shuffle(&mapped));
    assert_eq!(reduced, "0 0 58.0\n0 1 64.0\n1 0 139.0\n1 1 154.0\n");
}

#[test]
fn matrix_bounds_from_environment() {
    Command::cargo_bin("mrs-mapper")
        .unwrap()
        .env("MAX_I", "1")
        .env("MAX_K", "3")
        .arg("mm")
        .write_stdin("A,0,1,2.5\n")
        .assert()
        .success()
        .stdout("0,0\tA,1,2.5\n0,1\tA,1,2.5\n0,2\tA,1,2.5\n");
}

#[test]
fn missing_matrix_bounds_abort_before_reading() {
    Command::cargo_bin("mrs-mapper")
        .unwrap()
        .env_remove("MAX_I")
        .env_remove("MAX_K")
        .arg("mm")
        .write_stdin("A,0,0,1\n")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--rows-a"));
}

#[test]
fn unknown_workload_fails() {
    Command::cargo_bin("mrs-reducer")
        .unwrap()
        .arg("pagerank")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No app named `pagerank`"));
}

#[test]
fn malformed_lines_are_dropped_quietly() {
    let reduced = run_stage(
        "mrs-reducer",
        &["wc"],
        "a\t1\nbroken line\na\tnan\na\t1\n\nb\t1\n",
    );
    assert_eq!(reduced, "a\t2\nb\t1\n");
}

#[test]
fn standalone_word_count() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("part-0.txt"), "Hello Hadoop\n").unwrap();
    fs::write(input.join("part-1.txt"), "Hello World\n").unwrap();
    let output = dir.path().join("output");
    let pattern = format!("{}/*.txt", input.display());

    Command::cargo_bin("standalone")
        .unwrap()
        .args([
            "submit",
            "--input",
            pattern.as_str(),
            "--workload",
            "wc",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("mr-out-0"));

    let result = fs::read_to_string(output.join("mr-out-0")).unwrap();
    assert_eq!(result, "hadoop\t1\nhello\t2\nworld\t1\n");

    let summary = fs::read_to_string(output.join("job-summary.json")).unwrap();
    assert!(summary.contains("\"workload\": \"wc\""));
}

#[test]
fn standalone_rejects_zero_partitions() {
    Command::cargo_bin("standalone")
        .unwrap()
        .args(["submit", "-i", "x", "-w", "wc", "-o", "y", "-n", "0"])
        .assert()
        .failure();
}
