//! Line-level patching of YAML text.
//!
//! Only block-style mappings are understood structurally. Changed leaves
//! are rewritten on their own line (trailing comments kept), new keys are
//! inserted at the end of their closest existing parent block, and every
//! other line is copied through untouched.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::deep_equal::deep_equal;
use crate::emit::{inline_scalar, tree_to_string};
use crate::error::{Error, Result};
use crate::source::parse_tree;
use crate::tree::{Node, Tree};

/// A `key: value` or `key:` line of the original text.
#[derive(Debug)]
struct KeyLine {
    line: usize,
    indent: usize,
    path: Vec<String>,
    /// Byte offset of the `:` following the key.
    colon: usize,
    /// Byte range of the inline value, comments excluded.
    value: Option<(usize, usize)>,
    /// Last line belonging to this key, nested content included.
    end: usize,
}

impl KeyLine {
    fn is_flow_mapping(&self, text: &str) -> bool {
        self.value
            .map(|(start, end)| text[start..end].starts_with('{'))
            .unwrap_or(false)
    }
}

/// Rewrites `original` so it parses to `tree` on every path `tree` has.
///
/// Keys that only exist in `original` are kept.
pub fn patch_text(original: &str, tree: &Tree) -> Result<String> {
    let before = parse_tree(original)?;
    let lines: Vec<&str> = original.lines().collect();
    let keys = scan(&lines);
    let by_path: HashMap<&[String], &KeyLine> = keys.iter().map(|k| (k.path.as_slice(), k)).collect();

    let mut replaced: BTreeMap<usize, String> = BTreeMap::new();
    let mut deleted: BTreeSet<usize> = BTreeSet::new();
    let mut missing: BTreeMap<Vec<String>, Tree> = BTreeMap::new();

    for (path, value) in tree.leaves() {
        match before.get_path(path.as_slice()) {
            Some(Node::Leaf(old)) if deep_equal(old, value) => {}
            Some(Node::Leaf(_)) => {
                let key = locate(&by_path, &lines, &path)?;
                let text = lines[key.line];
                let rendered = inline_scalar(value)?;
                debug!("Patching line {}: {}", key.line + 1, path.join("/"));
                let line = match key.value {
                    Some((start, end)) => {
                        if text[start..end].starts_with(['|', '>']) {
                            deleted.extend(key.line + 1..=key.end);
                        }
                        format!("{}{}{}", &text[..start], rendered, &text[end..])
                    }
                    None => {
                        // A block sequence collapses into a flow one.
                        deleted.extend(key.line + 1..=key.end);
                        format!("{} {}", &text[..=key.colon], rendered)
                    }
                };
                replaced.insert(key.line, line);
            }
            Some(Node::Branch(_)) => {
                return Err(Error::conflict(&path, "a mapping in the original is a value in the tree"));
            }
            None => {
                let (anchor, rest) = split_missing(&before, &path)?;
                let added = missing.entry(anchor).or_default();
                if !added.set_leaf(&rest, value.clone()) {
                    return Err(Error::conflict(&path, "a value exists where a mapping is needed"));
                }
            }
        }
    }

    let mut inserted: Vec<(usize, usize, Vec<String>)> = Vec::new();
    let mut appended: Vec<String> = Vec::new();
    for (anchor, added) in &missing {
        let body = tree_to_string(added)?;
        if anchor.is_empty() {
            appended.extend(body.lines().map(str::to_string));
            continue;
        }
        let key = by_path
            .get(anchor.as_slice())
            .ok_or_else(|| Error::Format(format!("cannot locate {} in the original text", anchor.join("/"))))?;
        if key.value.is_some() {
            return Err(Error::Format(format!(
                "cannot add keys to the inline mapping {}",
                anchor.join("/")
            )));
        }
        let indent = keys
            .iter()
            .find(|k| k.path.len() == anchor.len() + 1 && k.path.starts_with(anchor))
            .map(|k| k.indent)
            .unwrap_or(key.indent + 2);
        let pad = " ".repeat(indent);
        let block = body.lines().map(|l| format!("{}{}", pad, l)).collect();
        inserted.push((key.end, anchor.len(), block));
    }
    // Deeper blocks first so they stay attached to their own parent.
    inserted.sort_by_key(|(line, depth, _)| (*line, Reverse(*depth)));

    let mut out = String::with_capacity(original.len());
    let mut pending = inserted.into_iter().peekable();
    for (i, text) in lines.iter().enumerate() {
        if !deleted.contains(&i) {
            out.push_str(replaced.get(&i).map(String::as_str).unwrap_or(*text));
            out.push('\n');
        }
        while let Some((_, _, block)) = pending.next_if(|(line, _, _)| *line == i) {
            for l in block {
                out.push_str(&l);
                out.push('\n');
            }
        }
    }
    for l in appended {
        out.push_str(&l);
        out.push('\n');
    }
    Ok(out)
}

/// Finds the key line of a changed leaf.
fn locate<'a>(by_path: &HashMap<&[String], &'a KeyLine>, lines: &[&str], path: &[String]) -> Result<&'a KeyLine> {
    if let Some(key) = by_path.get(path) {
        return Ok(*key);
    }
    for depth in (1..path.len()).rev() {
        if let Some(parent) = by_path.get(&path[..depth]) {
            if parent.is_flow_mapping(lines[parent.line]) {
                return Err(Error::Format(format!(
                    "cannot patch {} inside the inline mapping {}",
                    path.join("/"),
                    path[..depth].join("/")
                )));
            }
        }
    }
    Err(Error::Format(format!("cannot locate {} in the original text", path.join("/"))))
}

/// Splits a path absent from `before` into its deepest existing parent
/// mapping and the remainder.
fn split_missing(before: &Tree, path: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    for depth in (1..path.len()).rev() {
        match before.get_path(&path[..depth]) {
            Some(Node::Branch(_)) => return Ok((path[..depth].to_vec(), path[depth..].to_vec())),
            Some(Node::Leaf(_)) => {
                return Err(Error::conflict(&path[..depth], "a value in the original is a mapping in the tree"))
            }
            None => {}
        }
    }
    Ok((Vec::new(), path.to_vec()))
}

fn scan(lines: &[&str]) -> Vec<KeyLine> {
    let mut keys: Vec<KeyLine> = Vec::new();
    // Indices into `keys` of open `key:` lines.
    let mut open: Vec<usize> = Vec::new();
    // Block scalar bodies are skipped while more indented than their key.
    let mut opaque: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("---") || trimmed.starts_with("...") {
            continue;
        }
        let indent = line.len() - trimmed.len();

        if let Some(limit) = opaque {
            if indent > limit {
                extend_open(&mut keys, &open, i);
                continue;
            }
            opaque = None;
        }

        if trimmed == "-" || trimmed.starts_with("- ") {
            extend_open(&mut keys, &open, i);
            continue;
        }

        let Some((key, colon, value)) = split_key(trimmed) else {
            extend_open(&mut keys, &open, i);
            continue;
        };

        while let Some(&top) = open.last() {
            if keys[top].indent >= indent {
                open.pop();
            } else {
                break;
            }
        }
        extend_open(&mut keys, &open, i);

        let mut path: Vec<String> = open.last().map(|&top| keys[top].path.clone()).unwrap_or_default();
        path.push(key);

        let value = value.map(|(start, end)| (start + indent, end + indent));
        if let Some((start, _)) = value {
            if line[start..].starts_with('|') || line[start..].starts_with('>') {
                opaque = Some(indent);
            }
        }
        keys.push(KeyLine {
            line: i,
            indent,
            path,
            colon: colon + indent,
            value,
            end: i,
        });
        if value.is_none() || opaque.is_some() {
            open.push(keys.len() - 1);
        }
    }
    keys
}

fn extend_open(keys: &mut [KeyLine], open: &[usize], line: usize) {
    for &index in open {
        keys[index].end = line;
    }
}

/// Splits `key: value  # comment` into the key, the colon offset and the
/// value range. Returns `None` for lines that are not mapping entries.
fn split_key(text: &str) -> Option<(String, usize, Option<(usize, usize)>)> {
    let (key, colon) = match text.chars().next()? {
        quote @ ('"' | '\'') => {
            let close = text[1..].find(quote)? + 1;
            if !text[close + 1..].starts_with(':') {
                return None;
            }
            (text[1..close].to_string(), close + 1)
        }
        _ => {
            let colon = text
                .match_indices(':')
                .map(|(i, _)| i)
                .find(|&i| text[i + 1..].is_empty() || text[i + 1..].starts_with(' '))?;
            (text[..colon].trim_end().to_string(), colon)
        }
    };
    if key.is_empty() {
        return None;
    }

    let rest = &text[colon + 1..];
    let start = colon + 1 + (rest.len() - rest.trim_start().len());
    let end = start + value_len(&text[start..]);
    let value = if end > start { Some((start, end)) } else { None };
    Some((key, colon, value))
}

/// Length of a value up to a trailing comment, surrounding spaces removed.
fn value_len(text: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    let mut end = text.len();
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && prev == ' ' => {
                end = i;
                break;
            }
            None => {}
        }
        prev = c;
    }
    text[..end].trim_end().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_key_handles_comments_and_quotes() {
        assert_eq!(split_key("x: 1  # one"), Some(("x".to_string(), 1, Some((3, 4)))));
        assert_eq!(split_key("grp:"), Some(("grp".to_string(), 3, None)));
        assert_eq!(split_key("\"a b\": 'c # d'"), Some(("a b".to_string(), 5, Some((7, 14)))));
        assert_eq!(split_key("url: http://x"), Some(("url".to_string(), 3, Some((5, 13)))));
        assert_eq!(split_key("just text"), None);
    }

    #[test]
    fn scan_tracks_paths_and_block_ends() {
        let lines: Vec<&str> = "grp:\n  x: 1\n  sub:\n    y: 2\nother: 3\n".lines().collect();
        let keys = scan(&lines);
        let grp = keys.iter().find(|k| k.path == ["grp"]).unwrap();
        assert_eq!(grp.end, 3);
        let y = keys.iter().find(|k| k.path == ["grp", "sub", "y"]).unwrap();
        assert_eq!(y.indent, 4);
    }

    #[test]
    fn scan_skips_block_scalars() {
        let lines: Vec<&str> = "doc: |\n  a: not a key\nnext: 1\n".lines().collect();
        let keys = scan(&lines);
        let paths: Vec<String> = keys.iter().map(|k| k.path.join("/")).collect();
        assert_eq!(paths, vec!["doc", "next"]);
    }
}
