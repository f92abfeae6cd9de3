use clap::ValueEnum;
use log::{debug, info};

use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::IntoTree;
use crate::tree::{Node, PathTree, Scalar, Tree};

/// Which part of a two-way diff is written back onto the base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Elements {
    /// Values both sources have but disagree on, taken from the other side.
    Common,
    /// Keys only the other side has.
    New,
    /// Both of the above.
    #[default]
    All,
}

impl Elements {
    fn common(self) -> bool {
        matches!(self, Elements::All | Elements::Common)
    }

    fn new_keys(self) -> bool {
        matches!(self, Elements::All | Elements::New)
    }
}

/// Applies the diff between `base_label` and `other_label` onto `base`.
///
/// The base is only modified when every change applies cleanly; on a
/// [`Error::Conflict`] it is left as it was.
pub fn apply(
    base: &mut Tree,
    diff: &Accumulator,
    base_label: &str,
    other_label: &str,
    elements: Elements,
) -> Result<()> {
    let mut merged = base.clone();

    if elements.common() {
        if let Some(changes) = diff.different_for(&[base_label, other_label]) {
            for (path, values) in changes.leaves() {
                // The other side's value is always last.
                if let Some(value) = values.last() {
                    debug!("Updating {} to {}", path.join("/"), value);
                    set_value(&mut merged, &path, value.clone())?;
                }
            }
        }
    }

    if elements.new_keys() {
        if let Some(additions) = diff.unique_for(other_label) {
            merge_new(&mut merged, additions, &mut Vec::new())?;
        }
    }

    *base = merged;
    Ok(())
}

/// Merges `other` into `base`, labelling the sides `self` and `new`.
pub fn update(base: &mut Tree, other: impl IntoTree, elements: Elements) -> Result<()> {
    let diff = Accumulator::new(&*base, "self")?.and_diff(other, "new")?;
    info!(
        "Applying {:?} elements: {} differing, {} new top-level keys.",
        elements,
        diff.different_for(&["self", "new"]).map_or(0, |t| t.leaves().len()),
        diff.unique_for("new").map_or(0, PathTree::len)
    );
    apply(base, &diff, "self", "new", elements)
}

fn merge_new(base: &mut Tree, additions: &Tree, path: &mut Vec<String>) -> Result<()> {
    for (key, node) in additions {
        path.push(key.clone());
        match node {
            Node::Branch(sub) => {
                match base.get(key) {
                    Some(Node::Leaf(_)) => {
                        return Err(Error::conflict(path, "a value exists where a mapping is needed"))
                    }
                    Some(Node::Branch(_)) => {}
                    None => {
                        base.insert(key.clone(), Node::Branch(Tree::new()));
                    }
                }
                if let Some(Node::Branch(inner)) = base.get_mut(key) {
                    merge_new(inner, sub, path)?;
                }
            }
            Node::Leaf(value) => {
                debug!("Adding {} = {}", path.join("/"), value);
                set_value(base, path, value.clone())?;
            }
        }
        path.pop();
    }
    Ok(())
}

fn set_value(tree: &mut Tree, path: &[String], value: Scalar) -> Result<()> {
    if let Some(Node::Branch(_)) = tree.get_path(path) {
        return Err(Error::conflict(path, "a mapping exists where a value is expected"));
    }
    if !tree.set_leaf(path, value) {
        return Err(Error::conflict(path, "a value exists where a mapping is needed"));
    }
    Ok(())
}
