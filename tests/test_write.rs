use std::fs;

use nmldiff::backup::{backup_path, MAX_BACKUP_INDEX};
use nmldiff::patch::patch_text;
use nmldiff::{write_tree, Error, Tree, WriteOptions};

fn tree(src: &str) -> Tree {
    nmldiff::source::parse_tree(src).unwrap()
}

#[test]
fn test_backup_skips_existing_names() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.nml");
    fs::write(&out, "a: 1\n").unwrap();
    fs::write(dir.path().join("out.nml.0.bak"), "old").unwrap();

    write_tree(&tree("a: 2"), &out, None, WriteOptions::default()).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("out.nml.0.bak")).unwrap(), "old");
    assert_eq!(fs::read_to_string(dir.path().join("out.nml.1.bak")).unwrap(), "a: 1\n");
    assert_eq!(nmldiff::source::read_tree(&out).unwrap(), tree("a: 2"));
}

#[test]
fn test_too_many_backups() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.nml");
    for n in 0..=MAX_BACKUP_INDEX {
        fs::write(dir.path().join(format!("out.nml.{}.bak", n)), "").unwrap();
    }

    assert!(matches!(backup_path(&out), Err(Error::TooManyBackups { .. })));

    fs::write(&out, "a: 1\n").unwrap();
    let err = write_tree(&tree("a: 2"), &out, None, WriteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TooManyBackups { .. }));
    // The destination was not touched.
    assert_eq!(fs::read_to_string(&out).unwrap(), "a: 1\n");
}

#[test]
fn test_overwrite_skips_backup() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.yaml");
    fs::write(&out, "a: 1\n").unwrap();

    let options = WriteOptions { patch: false, overwrite: true };
    write_tree(&tree("a: 2"), &out, None, options).unwrap();

    assert!(!dir.path().join("out.yaml.0.bak").exists());
    assert_eq!(fs::read_to_string(&out).unwrap(), "a: 2\n");
}

#[test]
fn test_write_to_separate_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.yaml");
    let out = dir.path().join("result.yaml");
    fs::write(&source, "a: 1\n").unwrap();

    write_tree(&tree("a: 2"), &source, Some(&out), WriteOptions::default()).unwrap();

    assert_eq!(fs::read_to_string(&source).unwrap(), "a: 1\n");
    assert_eq!(nmldiff::source::read_tree(&out).unwrap(), tree("a: 2"));
}

#[test]
fn test_patch_keeps_comments_and_layout() {
    let original = "# run settings\ngrp:\n  x: 1   # keep me\n  y: 2\n\nother:\n  flag: true\n";
    let updated = tree("grp:\n  x: 1\n  y: 3\n  z: 4\nother:\n  flag: true\nextra:\n  k: v");

    let patched = patch_text(original, &updated).unwrap();

    assert_eq!(
        patched,
        "# run settings\ngrp:\n  x: 1   # keep me\n  y: 3\n  z: 4\n\nother:\n  flag: true\nextra:\n  k: v\n"
    );
    assert_eq!(tree(&patched), updated);
}

#[test]
fn test_patch_replaces_block_sequence() {
    let patched = patch_text("arr:\n  - 1\n  - 2\nn: 1\n", &tree("arr: [1, 3]\nn: 1")).unwrap();

    assert_eq!(patched, "arr: [1, 3]\nn: 1\n");
}

#[test]
fn test_patch_keeps_keys_missing_from_tree() {
    let patched = patch_text("a: 1\nb: 2\n", &tree("a: 5")).unwrap();

    assert_eq!(patched, "a: 5\nb: 2\n");
}

#[test]
fn test_patch_rejects_value_turned_mapping() {
    let err = patch_text("a: 1\n", &tree("a:\n  b: 2")).unwrap_err();

    assert!(matches!(err, Error::Conflict { .. }));
}

#[test]
fn test_patch_mode_uses_backup_as_template() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("run.yaml");
    fs::write(&source, "# header\ngrp:\n  x: 1  # note\n").unwrap();

    let options = WriteOptions { patch: true, overwrite: false };
    write_tree(&tree("grp:\n  x: 2"), &source, None, options).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("run.yaml.0.bak")).unwrap(),
        "# header\ngrp:\n  x: 1  # note\n"
    );
    assert_eq!(fs::read_to_string(&source).unwrap(), "# header\ngrp:\n  x: 2  # note\n");
}
