use log::debug;

use crate::accumulator::{Accumulator, Label, LabelTuple, Partition};
use crate::deep_equal::deep_equal;
use crate::error::{Error, Result};
use crate::source::IntoTree;
use crate::tree::{Node, PathTree, Scalar, Tree};

impl Accumulator {
    /// Folds `tree` in under `label` and returns the result as a new
    /// accumulator, leaving `self` untouched.
    pub fn diff(&self, tree: impl IntoTree, label: &str) -> Result<Accumulator> {
        let mut copy = self.clone();
        copy.diff_in_place(tree, label)?;
        Ok(copy)
    }

    /// Folds `tree` in under `label`, mutating `self`.
    ///
    /// The label and tree are validated before anything is touched, so an
    /// error leaves the accumulator exactly as it was.
    pub fn diff_in_place(&mut self, tree: impl IntoTree, label: &str) -> Result<()> {
        let label = self.check_label(label)?;
        let tree = tree.into_tree()?;
        self.fold(tree, label);
        Ok(())
    }

    /// Consuming form of [`Accumulator::diff_in_place`], for chaining.
    pub fn and_diff(mut self, tree: impl IntoTree, label: &str) -> Result<Accumulator> {
        self.diff_in_place(tree, label)?;
        Ok(self)
    }

    fn check_label(&self, label: &str) -> Result<Label> {
        if self.has_label(label) {
            return Err(Error::DuplicateLabel {
                label: label.to_string(),
            });
        }
        Label::new(label)
    }

    /// Compares `incoming` against every existing entry, unique first, then
    /// equal, then different. Each leaf of `incoming` is consumed by the
    /// first entry holding the same path; whatever is left is unique to
    /// `label`.
    fn fold(&mut self, mut incoming: Tree, label: Label) {
        debug!(
            "Folding {} into accumulator with labels [{}].",
            label,
            crate::accumulator::join_labels(&self.labels, ", ")
        );
        incoming.prune();

        // Entries created by this fold. They are kept apart so the loops
        // below only see entries that existed before it.
        let mut equal: Partition<LabelTuple, Scalar> = Partition::default();
        let mut different: Partition<LabelTuple, Vec<Scalar>> = Partition::default();

        for (old_label, mut tree) in self.unique.take() {
            let key = vec![old_label.clone(), label.clone()];
            compare_trees(&mut tree, &mut incoming, &mut Vec::new(), &mut |path, old, new| {
                compare_leaf(&mut equal, &mut different, &key, path, old, new)
            });
            self.unique.push(old_label, tree);
        }

        for (old_key, mut tree) in self.equal.take() {
            let key = extend(&old_key, &label);
            compare_trees(&mut tree, &mut incoming, &mut Vec::new(), &mut |path, old, new| {
                compare_leaf(&mut equal, &mut different, &key, path, old, new)
            });
            self.equal.push(old_key, tree);
        }

        for (old_key, mut tree) in self.different.take() {
            let key = extend(&old_key, &label);
            compare_trees(&mut tree, &mut incoming, &mut Vec::new(), &mut |path, mut values: Vec<Scalar>, new| {
                debug!("{} stays different, appending {}", path.join("/"), new);
                values.push(new);
                store(&mut different, &key, path, values);
            });
            self.different.push(old_key, tree);
        }

        for (key, tree) in equal.take() {
            self.equal.push(key, tree);
        }
        for (key, tree) in different.take() {
            self.different.push(key, tree);
        }
        if !incoming.is_empty() {
            debug!("{} top-level keys are unique to {}.", incoming.len(), label);
            self.unique.push(label.clone(), incoming);
        }
        self.labels.push(label);

        self.unique.prune();
        self.equal.prune();
        self.different.prune();
    }
}

fn extend(key: &[Label], label: &Label) -> LabelTuple {
    let mut key = key.to_vec();
    key.push(label.clone());
    key
}

enum Step {
    Branches { old_empty: bool, new_empty: bool },
    Leaves,
    Mismatch,
}

/// Walks `old` and `new` in lock-step over their shared keys.
///
/// Matched leaves are removed from both sides and handed to `on_leaf`;
/// branches emptied by the walk are removed as well. A key that is a leaf
/// on one side and a branch on the other is left alone on both sides.
fn compare_trees<V>(
    old: &mut PathTree<V>,
    new: &mut Tree,
    path: &mut Vec<String>,
    on_leaf: &mut dyn FnMut(&[String], V, Scalar),
) {
    let shared: Vec<String> = old.keys().filter(|k| new.contains_key(k)).cloned().collect();

    for key in shared {
        path.push(key.clone());

        let step = match (old.get_mut(&key), new.get_mut(&key)) {
            (Some(Node::Branch(old_sub)), Some(Node::Branch(new_sub))) => {
                compare_trees(old_sub, new_sub, path, on_leaf);
                Step::Branches {
                    old_empty: old_sub.is_empty(),
                    new_empty: new_sub.is_empty(),
                }
            }
            (Some(Node::Leaf(_)), Some(Node::Leaf(_))) => Step::Leaves,
            _ => Step::Mismatch,
        };

        match step {
            Step::Branches { old_empty, new_empty } => {
                if old_empty {
                    old.remove(&key);
                }
                if new_empty {
                    new.remove(&key);
                }
            }
            Step::Leaves => {
                if let (Some(Node::Leaf(old_value)), Some(Node::Leaf(new_value))) =
                    (old.remove(&key), new.remove(&key))
                {
                    on_leaf(path, old_value, new_value);
                }
            }
            Step::Mismatch => {
                debug!("{} is a leaf on one side and a mapping on the other.", path.join("/"));
            }
        }

        path.pop();
    }
}

/// Classifies a leaf coming from a unique or equal entry.
///
/// Every label of such an entry shares `old`, so on first divergence the
/// value list is backfilled with one copy of `old` per earlier label.
fn compare_leaf(
    equal: &mut Partition<LabelTuple, Scalar>,
    different: &mut Partition<LabelTuple, Vec<Scalar>>,
    key: &LabelTuple,
    path: &[String],
    old: Scalar,
    new: Scalar,
) {
    if deep_equal(&old, &new) {
        debug!("{} is equal: {}", path.join("/"), old);
        store(equal, key, path, old);
    } else {
        debug!("{} differs: {} vs {}", path.join("/"), old, new);
        let mut values = vec![old; key.len() - 1];
        values.push(new);
        store(different, key, path, values);
    }
}

fn store<V>(partition: &mut Partition<LabelTuple, V>, key: &LabelTuple, path: &[String], value: V) {
    let inserted = partition.entry(key.clone()).set_leaf(path, value);
    debug_assert!(inserted, "walked path {} collided with a leaf", path.join("/"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_tree;

    #[test]
    fn compare_trees_consumes_matched_leaves_from_both_sides() {
        let mut old = parse_tree("grp:\n  x: 1\n  y: 2\nonly_old: 0\n").unwrap();
        let mut new = parse_tree("grp:\n  x: 1\n  y: 3\nonly_new: 0\n").unwrap();
        let mut seen = Vec::new();
        compare_trees(&mut old, &mut new, &mut Vec::new(), &mut |path, o, n| {
            seen.push((path.join("/"), o, n));
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(old, parse_tree("only_old: 0\n").unwrap());
        assert_eq!(new, parse_tree("only_new: 0\n").unwrap());
    }

    #[test]
    fn compare_trees_leaves_kind_mismatch_untouched() {
        let mut old = parse_tree("grp: 5\n").unwrap();
        let mut new = parse_tree("grp:\n  x: 1\n").unwrap();
        let mut calls = 0;
        compare_trees(&mut old, &mut new, &mut Vec::new(), &mut |_, _, _| calls += 1);
        assert_eq!(calls, 0);
        assert!(old.contains_key("grp"));
        assert!(new.contains_key("grp"));
    }
}
