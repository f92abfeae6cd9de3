use std::fmt;

use log::debug;
use yaml_rust2::Yaml;

use crate::emit::{path_tree_to_yaml, yaml_to_string};
use crate::error::{Error, Result};
use crate::source::IntoTree;
use crate::tree::{PathTree, Scalar, Tree};

/// Name of the source a tree came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Labels are non-empty and free of whitespace, since dumps join label
    /// tuples with spaces.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::TypeKind("label must not be empty".to_string()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::TypeKind(format!(
                "label {:?} must not contain whitespace",
                name
            )));
        }
        Ok(Label(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Insertion-ordered map from classification key to a partition tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition<K, V> {
    entries: Vec<(K, PathTree<V>)>,
}

impl<K, V> Default for Partition<K, V> {
    fn default() -> Self {
        Partition { entries: Vec::new() }
    }
}

impl<K: PartialEq, V> Partition<K, V> {
    pub fn get(&self, key: &K) -> Option<&PathTree<V>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    /// Tree stored under `key`, created empty when missing.
    pub(crate) fn entry(&mut self, key: K) -> &mut PathTree<V> {
        let index = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, PathTree::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub(crate) fn push(&mut self, key: K, tree: PathTree<V>) {
        self.entries.push((key, tree));
    }

    /// Drops empty branches and then empty entries.
    pub(crate) fn prune(&mut self) {
        for (_, tree) in &mut self.entries {
            tree.prune();
        }
        self.entries.retain(|(_, tree)| !tree.is_empty());
    }

    pub(crate) fn take(&mut self) -> Vec<(K, PathTree<V>)> {
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &PathTree<V>)> {
        self.entries.iter().map(|(k, t)| (k, t))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered tuple of labels that were compared to produce an entry.
pub type LabelTuple = Vec<Label>;

/// Three-way classification of the leaves of every tree folded in so far.
///
/// - `unique`: leaves only one source has, keyed by that source's label.
/// - `equal`: leaves every source in the key tuple shares, with the value.
/// - `different`: leaves the key tuple disagrees on, with one value per
///   label in tuple order.
///
/// Each leaf path lives in exactly one entry of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulator {
    pub(crate) unique: Partition<Label, Scalar>,
    pub(crate) equal: Partition<LabelTuple, Scalar>,
    pub(crate) different: Partition<LabelTuple, Vec<Scalar>>,
    pub(crate) labels: Vec<Label>,
}

impl Accumulator {
    /// Starts an accumulator holding `tree` as unique to `label`.
    pub fn new(tree: impl IntoTree, label: &str) -> Result<Self> {
        let label = Label::new(label)?;
        let mut tree = tree.into_tree()?;
        tree.prune();
        debug!("New accumulator from {} with {} top-level keys.", label, tree.len());

        let mut unique = Partition::default();
        if !tree.is_empty() {
            unique.push(label.clone(), tree);
        }
        Ok(Accumulator {
            unique,
            equal: Partition::default(),
            different: Partition::default(),
            labels: vec![label],
        })
    }

    /// Labels in the order they were folded in.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    pub fn unique(&self) -> &Partition<Label, Scalar> {
        &self.unique
    }

    pub fn equal(&self) -> &Partition<LabelTuple, Scalar> {
        &self.equal
    }

    pub fn different(&self) -> &Partition<LabelTuple, Vec<Scalar>> {
        &self.different
    }

    pub fn unique_for(&self, label: &str) -> Option<&Tree> {
        self.unique
            .iter()
            .find(|(k, _)| k.as_str() == label)
            .map(|(_, t)| t)
    }

    pub fn equal_for(&self, labels: &[&str]) -> Option<&PathTree<Scalar>> {
        self.equal
            .iter()
            .find(|(k, _)| tuple_matches(k, labels))
            .map(|(_, t)| t)
    }

    pub fn different_for(&self, labels: &[&str]) -> Option<&PathTree<Vec<Scalar>>> {
        self.different
            .iter()
            .find(|(k, _)| tuple_matches(k, labels))
            .map(|(_, t)| t)
    }

    /// True when nothing has been classified, e.g. all sources were empty.
    pub fn is_empty(&self) -> bool {
        self.unique.is_empty() && self.equal.is_empty() && self.different.is_empty()
    }

    /// Human readable rendering of the three partitions.
    pub fn dump(&self) -> Result<String> {
        let mut out = String::from("Diff of ");
        out.push_str(&join_labels(&self.labels, ", "));
        out.push('\n');

        out.push_str("\nUnique values:\n");
        for (label, tree) in self.unique.iter() {
            dump_entry(&mut out, label.as_str(), path_tree_to_yaml(tree, |v| v.into()))?;
        }
        out.push_str("\nEqual values:\n");
        for (labels, tree) in self.equal.iter() {
            dump_entry(&mut out, &join_labels(labels, " "), path_tree_to_yaml(tree, |v| v.into()))?;
        }
        out.push_str("\nDifferent values:\n");
        for (labels, tree) in self.different.iter() {
            let yaml = path_tree_to_yaml(tree, |values: &Vec<Scalar>| {
                Yaml::Array(values.iter().map(Yaml::from).collect())
            });
            dump_entry(&mut out, &join_labels(labels, " "), yaml)?;
        }
        Ok(out)
    }
}

impl fmt::Display for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.dump().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn dump_entry(out: &mut String, heading: &str, yaml: Yaml) -> Result<()> {
    let body = yaml_to_string(&yaml)?;
    out.push_str("  ");
    out.push_str(heading);
    out.push('\n');
    for line in body.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    Ok(())
}

pub(crate) fn join_labels(labels: &[Label], sep: &str) -> String {
    labels.iter().map(Label::as_str).collect::<Vec<_>>().join(sep)
}

fn tuple_matches(tuple: &[Label], labels: &[&str]) -> bool {
    tuple.len() == labels.len() && tuple.iter().zip(labels).all(|(l, s)| l.as_str() == *s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rejects_whitespace_and_empty() {
        assert!(matches!(Label::new(""), Err(Error::TypeKind(_))));
        assert!(matches!(Label::new("run 1"), Err(Error::TypeKind(_))));
        assert_eq!(Label::new("run_1").unwrap().as_str(), "run_1");
    }

    #[test]
    fn partition_entry_keeps_insertion_order() {
        let mut partition: Partition<Label, Scalar> = Partition::default();
        partition.entry(Label::new("b").unwrap());
        partition.entry(Label::new("a").unwrap());
        partition.entry(Label::new("b").unwrap());
        let keys: Vec<&str> = partition.keys().map(Label::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn prune_drops_empty_entries() {
        let mut partition: Partition<Label, Scalar> = Partition::default();
        partition.entry(Label::new("a").unwrap());
        partition.prune();
        assert!(partition.is_empty());
    }
}
