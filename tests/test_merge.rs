use nmldiff::{apply, update, Accumulator, Elements, Error, Tree};

fn tree(src: &str) -> Tree {
    nmldiff::source::parse_tree(src).unwrap()
}

#[test]
fn test_common_round_trip() {
    let t1 = tree("grp:\n  x: 1\n  y: 2\nother:\n  flag: true");
    let t2 = tree("grp:\n  x: 1\n  y: 5\nother:\n  flag: true");
    let diff = Accumulator::new(&t1, "a").unwrap().and_diff(&t2, "b").unwrap();

    let mut base = t1.clone();
    apply(&mut base, &diff, "a", "b", Elements::Common).unwrap();
    assert_eq!(base, t2);
}

#[test]
fn test_new_only_adds_missing_keys() {
    let t1 = tree("grp:\n  x: 1\n  y: 2");
    let t2 = tree("grp:\n  y: 3\n  z: 4\nextra:\n  deep:\n    k: v");
    let diff = Accumulator::new(&t1, "a").unwrap().and_diff(&t2, "b").unwrap();

    let mut base = t1.clone();
    apply(&mut base, &diff, "a", "b", Elements::New).unwrap();
    assert_eq!(base, tree("grp:\n  x: 1\n  y: 2\n  z: 4\nextra:\n  deep:\n    k: v"));
}

#[test]
fn test_update_all() {
    let mut base = tree("a:\n  x: 1\n  y: 2\nkeep: true");
    update(&mut base, tree("a:\n  y: 3\n  z: 4\nb:\n  w: 1"), Elements::All).unwrap();

    assert_eq!(base, tree("a:\n  x: 1\n  y: 3\n  z: 4\nb:\n  w: 1\nkeep: true"));
}

#[test]
fn test_update_common() {
    let mut base = tree("a:\n  x: 1\n  y: 2");
    update(&mut base, tree("a:\n  y: 3\n  z: 4\nb:\n  w: 1"), Elements::Common).unwrap();

    assert_eq!(base, tree("a:\n  x: 1\n  y: 3"));
}

#[test]
fn test_update_without_changes_is_identity() {
    let src = "a:\n  x: 1\n  list: [1, 2]";
    let mut base = tree(src);
    update(&mut base, tree(src), Elements::All).unwrap();

    assert_eq!(base, tree(src));
}

#[test]
fn test_conflict_leaves_base_untouched() {
    let mut base = tree("grp: 5\nx: 1");
    let err = update(&mut base, tree("grp:\n  inner: 1\nx: 2"), Elements::All).unwrap_err();

    assert!(matches!(err, Error::Conflict { ref path, .. } if path == "grp"));
    assert_eq!(base, tree("grp: 5\nx: 1"));
}

#[test]
fn test_apply_with_unknown_labels_is_noop() {
    let t1 = tree("x: 1");
    let diff = Accumulator::new(&t1, "a").unwrap().and_diff(tree("x: 2"), "b").unwrap();

    let mut base = t1.clone();
    apply(&mut base, &diff, "a", "zzz", Elements::All).unwrap();
    assert_eq!(base, t1);
}
