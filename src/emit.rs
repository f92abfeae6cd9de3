use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlEmitter};

use crate::error::Result;
use crate::tree::{Node, PathTree, Scalar, Tree};

impl From<&Scalar> for Yaml {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Yaml::Null,
            Scalar::Boolean(b) => Yaml::Boolean(*b),
            Scalar::Integer(i) => Yaml::Integer(*i),
            Scalar::Real(r) => Yaml::Real(r.clone()),
            Scalar::String(s) => Yaml::String(s.clone()),
            Scalar::Array(items) => Yaml::Array(items.iter().map(Yaml::from).collect()),
        }
    }
}

/// Converts a tree of any leaf type into a YAML mapping.
pub fn path_tree_to_yaml<V>(tree: &PathTree<V>, leaf: impl Fn(&V) -> Yaml) -> Yaml {
    convert(tree, &leaf)
}

fn convert<V>(tree: &PathTree<V>, leaf: &dyn Fn(&V) -> Yaml) -> Yaml {
    let mut hash = Hash::with_capacity(tree.len());
    for (key, node) in tree {
        let value = match node {
            Node::Leaf(v) => leaf(v),
            Node::Branch(t) => convert(t, leaf),
        };
        hash.insert(Yaml::String(key.clone()), value);
    }
    Yaml::Hash(hash)
}

pub fn tree_to_yaml(tree: &Tree) -> Yaml {
    path_tree_to_yaml(tree, |s| Yaml::from(s))
}

/// Emits a YAML document without the leading `---` marker.
pub fn yaml_to_string(yaml: &Yaml) -> Result<String> {
    let mut out_str = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out_str);
        emitter.dump(yaml)?;
    }
    let mut out_str = out_str
        .trim_start_matches("---\n")
        .trim_start_matches("---")
        .trim_start()
        .to_string();
    out_str.push('\n');
    Ok(out_str)
}

/// Renders the whole tree as a YAML document.
pub fn tree_to_string(tree: &Tree) -> Result<String> {
    if tree.is_empty() {
        return Ok("{}\n".to_string());
    }
    yaml_to_string(&tree_to_yaml(tree))
}

/// Renders a leaf on a single line, arrays in flow style.
pub fn inline_scalar(scalar: &Scalar) -> Result<String> {
    match scalar {
        Scalar::Array(items) => {
            let rendered = items.iter().map(inline_scalar).collect::<Result<Vec<_>>>()?;
            Ok(format!("[{}]", rendered.join(", ")))
        }
        other => Ok(yaml_to_string(&Yaml::from(other))?.trim_end().to_string()),
    }
}
