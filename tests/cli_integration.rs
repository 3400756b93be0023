//! CLI integration tests for stepsort
//!
//! These tests run the binary against real files on disk, covering
//! destination resolution, batch behavior and the reordering
//! guarantees visible from the outside.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command instance for the stepsort binary
fn stepsort_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("stepsort"))
}

/// Wraps data-section lines in a minimal Part 21 skeleton
fn step_text(data: &[&str]) -> String {
    format!(
        "ISO-10303-21;\n\
         HEADER;\n\
         FILE_DESCRIPTION((''),'2;1');\n\
         ENDSEC;\n\
         DATA;\n\
         {}\
         ENDSEC;\n\
         END-ISO-10303-21;\n",
        data.concat()
    )
}

fn write_step(dir: &Path, name: &str, data: &[&str]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, step_text(data)).unwrap();
    path
}

/// Identifiers of the data-section records, in file order
fn data_ids(content: &str) -> Vec<u64> {
    let mut ids = Vec::new();
    let mut in_data = false;
    for line in content.lines() {
        match line.trim() {
            "DATA;" => in_data = true,
            "ENDSEC;" if in_data => break,
            trimmed if in_data => {
                if let Some(rest) = trimmed.strip_prefix('#') {
                    if let Some((digits, _)) = rest.split_once(|c: char| !c.is_ascii_digit()) {
                        if let Ok(id) = digits.parse() {
                            ids.push(id);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    ids
}

const FORWARD: [&str; 3] = [
    "#3 = AXIS2_PLACEMENT_3D('',#1,#2,#2);\n",
    "#1 = CARTESIAN_POINT('',(0.,0.,0.));\n",
    "#2 = DIRECTION('',(0.,0.,1.));\n",
];

// =============================================================================
// Single File Tests
// =============================================================================

#[test]
fn test_default_output_is_sorted_sibling() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);

    stepsort_cmd()
        .arg(&src)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records"));

    let out = dir.path().join("model_sorted.step");
    assert!(out.is_file());
    // Source untouched
    assert_eq!(data_ids(&fs::read_to_string(&src).unwrap()), vec![3, 1, 2]);
}

#[test]
fn test_forward_references_are_eliminated_and_renumbered() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);
    let out = dir.path().join("out.step");

    stepsort_cmd().arg(&src).arg(&out).assert().success();

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(data_ids(&content), vec![1, 2, 3]);

    // The placement now references the two already-defined leaves
    assert!(content.contains("#3 = AXIS2_PLACEMENT_3D('',#1,#2,#2);"));
}

#[test]
fn test_header_and_footer_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);
    let out = dir.path().join("out.step");

    stepsort_cmd().arg(&src).arg(&out).assert().success();

    let content = fs::read_to_string(&out).unwrap();
    assert!(content.starts_with(
        "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION((''),'2;1');\nENDSEC;\nDATA;\n"
    ));
    assert!(content.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));
}

#[test]
fn test_in_place_overwrites_source() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);

    stepsort_cmd().arg("--in-place").arg(&src).assert().success();

    assert_eq!(data_ids(&fs::read_to_string(&src).unwrap()), vec![1, 2, 3]);
    assert!(!dir.path().join("model_sorted.step").exists());
}

#[test]
fn test_no_renum_keeps_identifiers() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);
    let out = dir.path().join("out.step");

    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&src)
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    // Same identifiers, dependency order
    assert_eq!(data_ids(&content), vec![1, 2, 3]);
    assert!(content.contains("#3 = AXIS2_PLACEMENT_3D('',#1,#2,#2);"));
}

#[test]
fn test_no_renum_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);
    let first = dir.path().join("first.step");
    let second = dir.path().join("second.step");

    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&src)
        .arg(&first)
        .assert()
        .success();
    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

// =============================================================================
// Clustering Tests
// =============================================================================

const LEAVES: [&str; 5] = [
    "#10 = PT('a');\n",
    "#20 = DIR('b');\n",
    "#30 = PT('c');\n",
    "#40 = DIR('d');\n",
    "#50 = PT('e');\n",
];

#[test]
fn test_strict_grouping_clusters_kinds() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "leaves.step", &LEAVES);
    let out = dir.path().join("out.step");

    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&src)
        .arg(&out)
        .assert()
        .success();

    // PT block first (origin 0), then the DIR block
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(data_ids(&content), vec![10, 30, 50, 20, 40]);
}

#[test]
fn test_group_none_keeps_origin_order() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "leaves.step", &LEAVES);
    let out = dir.path().join("out.step");

    stepsort_cmd()
        .args(["--group", "none", "--no-renum"])
        .arg(&src)
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(data_ids(&content), vec![10, 20, 30, 40, 50]);
}

// =============================================================================
// Degenerate Input Tests
// =============================================================================

#[test]
fn test_cycle_is_warned_not_fatal() {
    let dir = TempDir::new().unwrap();
    let src = write_step(
        dir.path(),
        "cycle.step",
        &[
            "#1 = LOOP_A('',#2);\n",
            "#2 = LOOP_B('',#1);\n",
            "#3 = PT('');\n",
        ],
    );
    let out = dir.path().join("out.step");

    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&src)
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("cycle"))
        .stderr(predicate::str::contains("#1"))
        .stderr(predicate::str::contains("#2"));

    // Both cycle members survive, appended in original order
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(data_ids(&content), vec![3, 1, 2]);
}

#[test]
fn test_malformed_record_fails_the_file() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "bad.step", &["NOT_A_RECORD('');\n"]);

    stepsort_cmd()
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Skipping"));

    assert!(!dir.path().join("bad_sorted.step").exists());
}

#[test]
fn test_missing_endsec_fails_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trunc.step");
    fs::write(&path, "ISO-10303-21;\nDATA;\n#1 = PT('');\n").unwrap();

    stepsort_cmd()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENDSEC"));
}

#[test]
fn test_dangling_reference_fails_renumbering() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "dangling.step", &["#1 = PT('',#99);\n"]);

    stepsort_cmd()
        .arg(&src)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no assigned mapping"));

    // With --no-renum the file still processes; #1 is a leftover
    stepsort_cmd()
        .args(["--no-renum"])
        .arg(&src)
        .assert()
        .success()
        .stderr(predicate::str::contains("#1"));
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_out_dir_mirrors_subdirectories() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    write_step(&root, "a/x.step", &FORWARD);
    write_step(&root, "b/y.stp", &FORWARD);
    let out = dir.path().join("out");

    stepsort_cmd()
        .arg(&root)
        .args(["--out-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 file(s), 0 failed"));

    assert!(out.join("a/x.step").is_file());
    assert!(out.join("b/y.stp").is_file());
}

#[test]
fn test_batch_skips_bad_file_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    write_step(&root, "good.step", &FORWARD);
    write_step(&root, "bad.step", &["NOT_A_RECORD('');\n"]);
    let out = dir.path().join("out");

    stepsort_cmd()
        .arg(&root)
        .args(["--out-dir"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.step"));

    // The good file was still processed
    assert!(out.join("good.step").is_file());
    assert!(!out.join("bad.step").exists());
}

#[test]
fn test_empty_directory_is_an_error() {
    let dir = TempDir::new().unwrap();

    stepsort_cmd()
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No STEP files found"));
}

#[test]
fn test_extension_match_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    write_step(&root, "upper.STEP", &FORWARD);
    let out = dir.path().join("out");

    stepsort_cmd()
        .arg(&root)
        .args(["--out-dir"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("upper.STEP").is_file());
}

// =============================================================================
// Output Format Tests
// =============================================================================

#[test]
fn test_json_format_reports_per_file() {
    let dir = TempDir::new().unwrap();
    let src = write_step(dir.path(), "model.step", &FORWARD);
    let out = dir.path().join("out.step");

    let assert = stepsort_cmd()
        .args(["--format", "json"])
        .arg(&src)
        .arg(&out)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let first: serde_json::Value =
        serde_json::from_str(stdout.lines().next().unwrap()).unwrap();

    assert_eq!(first["records"], 3);
    assert_eq!(first["cycles"], serde_json::json!([]));
    assert!(first["output"].as_str().unwrap().ends_with("out.step"));
}
