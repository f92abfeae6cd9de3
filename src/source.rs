use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use yaml_rust2::{Yaml, YamlLoader};

use crate::error::{Error, Result};
use crate::tree::{Node, Scalar, Tree};

/// Anything that can be resolved to a configuration tree.
///
/// Paths are read as YAML; in-memory trees and parsed YAML documents are
/// used directly.
pub trait IntoTree {
    fn into_tree(self) -> Result<Tree>;
}

impl IntoTree for Tree {
    fn into_tree(self) -> Result<Tree> {
        Ok(self)
    }
}

impl IntoTree for &Tree {
    fn into_tree(self) -> Result<Tree> {
        Ok(self.clone())
    }
}

impl IntoTree for Yaml {
    fn into_tree(self) -> Result<Tree> {
        yaml_to_tree(&self)
    }
}

impl IntoTree for &Yaml {
    fn into_tree(self) -> Result<Tree> {
        yaml_to_tree(self)
    }
}

impl IntoTree for &Path {
    fn into_tree(self) -> Result<Tree> {
        read_tree(self)
    }
}

impl IntoTree for PathBuf {
    fn into_tree(self) -> Result<Tree> {
        read_tree(&self)
    }
}

impl IntoTree for &PathBuf {
    fn into_tree(self) -> Result<Tree> {
        read_tree(self)
    }
}

/// Reads the first YAML document of `path`. An empty file is an empty tree.
pub fn read_tree(path: &Path) -> Result<Tree> {
    info!("Reading input file: {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_tree(&content).map_err(|e| match e {
        Error::TypeKind(msg) => Error::TypeKind(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parses the first YAML document in `content`.
pub fn parse_tree(content: &str) -> Result<Tree> {
    let docs = YamlLoader::load_from_str(content)?;
    match docs.first() {
        Some(doc) => {
            if docs.len() > 1 {
                warn!("Ignoring {} trailing YAML documents.", docs.len() - 1);
            }
            yaml_to_tree(doc)
        }
        None => Ok(Tree::new()),
    }
}

/// Converts a YAML mapping into a tree. A null document is an empty tree.
pub fn yaml_to_tree(yaml: &Yaml) -> Result<Tree> {
    match yaml {
        Yaml::Hash(_) => hash_to_tree(yaml, &mut Vec::new()),
        Yaml::Null => Ok(Tree::new()),
        other => Err(Error::TypeKind(format!(
            "expected a mapping at the document root, found {}",
            kind_name(other)
        ))),
    }
}

fn hash_to_tree(yaml: &Yaml, path: &mut Vec<String>) -> Result<Tree> {
    let Yaml::Hash(hash) = yaml else {
        return Err(Error::TypeKind(format!("expected a mapping at {}", path.join("/"))));
    };
    let mut tree = Tree::new();
    for (key, value) in hash {
        let key = key_to_string(key, path)?;
        path.push(key.clone());
        let node = match value {
            Yaml::Hash(_) => Node::Branch(hash_to_tree(value, path)?),
            _ => Node::Leaf(yaml_to_scalar(value, path)?),
        };
        path.pop();
        tree.insert(key, node);
    }
    Ok(tree)
}

fn key_to_string(key: &Yaml, path: &[String]) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        other => Err(Error::TypeKind(format!(
            "unsupported {} key under {}",
            kind_name(other),
            path.join("/")
        ))),
    }
}

fn yaml_to_scalar(yaml: &Yaml, path: &[String]) -> Result<Scalar> {
    Ok(match yaml {
        Yaml::Null => Scalar::Null,
        Yaml::Boolean(b) => Scalar::Boolean(*b),
        Yaml::Integer(i) => Scalar::Integer(*i),
        Yaml::Real(r) => Scalar::Real(r.clone()),
        Yaml::String(s) => Scalar::String(s.clone()),
        Yaml::Array(items) => Scalar::Array(
            items
                .iter()
                .map(|item| yaml_to_scalar(item, path))
                .collect::<Result<_>>()?,
        ),
        other => {
            return Err(Error::TypeKind(format!(
                "unsupported {} value at {}",
                kind_name(other),
                path.join("/")
            )))
        }
    })
}

fn kind_name(yaml: &Yaml) -> &'static str {
    match yaml {
        Yaml::Null => "null",
        Yaml::Boolean(_) => "bool",
        Yaml::Integer(_) => "int",
        Yaml::Real(_) => "real",
        Yaml::String(_) => "string",
        Yaml::Array(_) => "array",
        Yaml::Hash(_) => "hash",
        Yaml::Alias(_) => "alias",
        Yaml::BadValue => "bad value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_mapping() {
        let tree = parse_tree("grp:\n  x: 1\n  y: [1.5, 2.0]\nflag: true\n").unwrap();
        assert_eq!(tree.leaf(&["grp", "x"]), Some(&Scalar::Integer(1)));
        assert_eq!(
            tree.leaf(&["grp", "y"]),
            Some(&Scalar::Array(vec![
                Scalar::Real("1.5".into()),
                Scalar::Real("2.0".into())
            ]))
        );
        assert_eq!(tree.leaf(&["flag"]), Some(&Scalar::Boolean(true)));
    }

    #[test]
    fn empty_document_is_empty_tree() {
        assert!(parse_tree("").unwrap().is_empty());
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(matches!(parse_tree("42"), Err(Error::TypeKind(_))));
    }

    #[test]
    fn mapping_inside_array_is_rejected() {
        assert!(matches!(parse_tree("a:\n  - b: 1\n"), Err(Error::TypeKind(_))));
    }
}
