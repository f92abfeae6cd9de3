use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// A leaf value of a configuration tree.
///
/// Reals keep the text they were read from, the same way `yaml-rust2` does;
/// equality between reals is numeric (see [`crate::deep_equal`]).
#[derive(Clone, Debug)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(String),
    String(String),
    Array(Vec<Scalar>),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        crate::deep_equal::deep_equal(self, other)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "~"),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(r) => write!(f, "{}", r),
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Either a leaf holding `V` or a nested mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum Node<V> {
    Leaf(V),
    Branch(PathTree<V>),
}

impl<V> Node<V> {
    pub fn as_leaf(&self) -> Option<&V> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&PathTree<V>> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(t) => Some(t),
        }
    }
}

/// Nested string-keyed mapping whose leaves hold `V`.
///
/// Used both for configuration trees ([`Tree`]) and for the partitions of
/// an accumulator, where leaves carry the shared value or the per-label
/// value list.
#[derive(Clone, Debug, PartialEq)]
pub struct PathTree<V> {
    entries: BTreeMap<String, Node<V>>,
}

/// A configuration tree as read from a source.
pub type Tree = PathTree<Scalar>;

impl<V> Default for PathTree<V> {
    fn default() -> Self {
        PathTree {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> PathTree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Node<V>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node<V>> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, node: Node<V>) -> Option<Node<V>> {
        self.entries.insert(key.into(), node)
    }

    pub fn remove(&mut self, key: &str) -> Option<Node<V>> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Node<V>> {
        self.entries.iter()
    }

    /// Looks up the node at `path`. The empty path never matches.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node<V>> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.get(key.as_ref())?.as_branch()?;
        }
        current.get(last.as_ref())
    }

    /// Leaf value at `path`, if the path ends on a leaf.
    pub fn leaf<S: AsRef<str>>(&self, path: &[S]) -> Option<&V> {
        self.get_path(path)?.as_leaf()
    }

    /// Sets the leaf at `path`, creating intermediate branches.
    ///
    /// Returns `false` without modifying anything when an existing leaf sits
    /// where a branch would be needed.
    pub fn set_leaf(&mut self, path: &[String], value: V) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut current = self;
        for key in parents {
            match current.entries.get(key.as_str()) {
                Some(Node::Leaf(_)) => return false,
                Some(Node::Branch(_)) => {}
                None => {
                    current.entries.insert(key.clone(), Node::Branch(PathTree::new()));
                }
            }
            current = match current.entries.get_mut(key.as_str()) {
                Some(Node::Branch(t)) => t,
                _ => return false,
            };
        }
        current.entries.insert(last.clone(), Node::Leaf(value));
        true
    }

    /// Removes every branch that is, or becomes, empty.
    pub fn prune(&mut self) {
        self.entries.retain(|_, node| match node {
            Node::Leaf(_) => true,
            Node::Branch(t) => {
                t.prune();
                !t.is_empty()
            }
        });
    }

    /// Depth-first list of `(path, leaf)` pairs in key order.
    pub fn leaves(&self) -> Vec<(Vec<String>, &V)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a V)>) {
        for (key, node) in &self.entries {
            path.push(key.clone());
            match node {
                Node::Leaf(v) => out.push((path.clone(), v)),
                Node::Branch(t) => t.collect_leaves(path, out),
            }
            path.pop();
        }
    }

    /// Length of the longest path to a leaf.
    pub fn depth(&self) -> usize {
        self.entries
            .values()
            .map(|node| match node {
                Node::Leaf(_) => 1,
                Node::Branch(t) => 1 + t.depth(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl<V> FromIterator<(String, Node<V>)> for PathTree<V> {
    fn from_iter<I: IntoIterator<Item = (String, Node<V>)>>(iter: I) -> Self {
        PathTree {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for PathTree<V> {
    type Item = (String, Node<V>);
    type IntoIter = btree_map::IntoIter<String, Node<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a PathTree<V> {
    type Item = (&'a String, &'a Node<V>);
    type IntoIter = btree_map::Iter<'a, String, Node<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn set_leaf_creates_branches() {
        let mut tree = Tree::new();
        assert!(tree.set_leaf(&path(&["grp", "sub", "x"]), Scalar::Integer(1)));
        assert_eq!(tree.leaf(&["grp", "sub", "x"]), Some(&Scalar::Integer(1)));
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn set_leaf_refuses_to_descend_through_leaf() {
        let mut tree = Tree::new();
        tree.set_leaf(&path(&["grp"]), Scalar::Integer(5));
        assert!(!tree.set_leaf(&path(&["grp", "x"]), Scalar::Integer(1)));
        assert_eq!(tree.leaf(&["grp"]), Some(&Scalar::Integer(5)));
    }

    #[test]
    fn prune_removes_nested_empty_branches() {
        let mut tree = Tree::new();
        let mut inner = Tree::new();
        inner.insert("empty", Node::Branch(Tree::new()));
        tree.insert("outer", Node::Branch(inner));
        tree.insert("keep", Node::Leaf(Scalar::Boolean(true)));
        tree.prune();
        assert_eq!(tree.len(), 1);
        assert!(tree.contains_key("keep"));
    }

    #[test]
    fn leaves_are_listed_in_key_order() {
        let mut tree = Tree::new();
        tree.set_leaf(&path(&["b", "y"]), Scalar::Integer(2));
        tree.set_leaf(&path(&["a"]), Scalar::Integer(1));
        let paths: Vec<Vec<String>> = tree.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec![path(&["a"]), path(&["b", "y"])]);
    }
}
