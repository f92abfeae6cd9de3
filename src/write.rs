use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::backup;
use crate::emit::tree_to_string;
use crate::error::{Error, Result};
use crate::patch::patch_text;
use crate::tree::Tree;

/// How a tree is written back to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Edit the original text instead of regenerating the whole file,
    /// keeping comments and layout.
    pub patch: bool,
    /// Replace an existing destination instead of moving it to a backup.
    pub overwrite: bool,
}

/// Writes `tree` to `out`, or back to `source` when `out` is `None`.
///
/// Unless `overwrite` is set, an existing destination is first moved to
/// `<name>.<N>.bak`. In patch mode the text being patched is that backup
/// when one was made, otherwise `source`.
pub fn write_tree(tree: &Tree, source: &Path, out: Option<&Path>, options: WriteOptions) -> Result<PathBuf> {
    let out = out.unwrap_or(source);

    let backup = if options.overwrite {
        None
    } else {
        backup::rotate(out)?
    };
    let template = backup.unwrap_or_else(|| source.to_path_buf());

    let out_str = if options.patch {
        if !template.exists() {
            return Err(Error::Format(format!(
                "nothing to patch: {} does not exist",
                template.display()
            )));
        }
        info!("Patching {} into {}", template.display(), out.display());
        let original = fs::read_to_string(&template)?;
        patch_text(&original, tree)?
    } else {
        tree_to_string(tree)?
    };

    fs::write(out, out_str)?;
    info!("Tree written to {}", out.display());
    Ok(out.to_path_buf())
}
