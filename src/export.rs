//! Flattens accumulator partitions into spreadsheet-like sheets.
//!
//! Each classification key becomes one sheet with a column per tree level
//! followed by the value column(s). Paths shorter than the deepest one in
//! the sheet are padded on the left with empty cells.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::accumulator::{join_labels, Accumulator};
use crate::tree::{PathTree, Scalar};

/// One table of a [`Workbook`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Scalar>>>,
}

impl Sheet {
    fn from_tree<V>(
        name: String,
        tree: &PathTree<V>,
        value_columns: Vec<String>,
        values: impl Fn(&V) -> Vec<Scalar>,
    ) -> Self {
        let depth = tree.depth();
        let rows = tree
            .leaves()
            .into_iter()
            .map(|(path, leaf)| {
                let mut row: Vec<Option<Scalar>> = vec![None; depth - path.len()];
                row.extend(path.into_iter().map(|key| Some(Scalar::String(key))));
                row.extend(values(leaf).into_iter().map(Some));
                row
            })
            .collect();

        let mut columns: Vec<String> = (0..depth).map(|i| format!("level {}", i)).collect();
        columns.extend(value_columns);
        Sheet { name, columns, rows }
    }

    /// File name used when the sheet is written to a directory.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{}.csv", stem)
    }
}

/// All sheets of an accumulator: unique, then equal, then different.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_accumulator(diff: &Accumulator) -> Self {
        let value = || vec!["value".to_string()];
        let mut sheets = Vec::new();

        for (label, tree) in diff.unique().iter() {
            sheets.push(Sheet::from_tree(format!("{} unique", label), tree, value(), |v| vec![v.clone()]));
        }
        for (labels, tree) in diff.equal().iter() {
            let name = format!("{} equal", join_labels(labels, "_"));
            sheets.push(Sheet::from_tree(name, tree, value(), |v| vec![v.clone()]));
        }
        for (labels, tree) in diff.different().iter() {
            let name = format!("{} different", join_labels(labels, "_"));
            let columns = labels.iter().map(|l| l.to_string()).collect();
            sheets.push(Sheet::from_tree(name, tree, columns, |v: &Vec<Scalar>| v.clone()));
        }
        Workbook { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Writes every sheet as `<dir>/<sheet name>.csv`.
    pub fn write_csv_dir(&self, dir: &Path) -> crate::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.sheets.len());
        for sheet in &self.sheets {
            let path = dir.join(sheet.file_name());
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(&sheet.columns)?;
            for row in &sheet.rows {
                writer.write_record(row.iter().map(|cell| match cell {
                    Some(value) => value.to_string(),
                    None => String::new(),
                }))?;
            }
            writer.flush()?;
            info!("Sheet {:?} written to {}", sheet.name, path.display());
            written.push(path);
        }
        Ok(written)
    }
}
