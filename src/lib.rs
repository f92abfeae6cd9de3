pub mod accumulator;
pub mod backup;
pub mod deep_equal;
pub mod diff;
pub mod emit;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod merge;
pub mod patch;
pub mod source;
pub mod tree;
pub mod write;

// Re-export the main entry points
pub use accumulator::{Accumulator, Label};
pub use error::{Error, Result};
pub use merge::{apply, update, Elements};
pub use source::IntoTree;
pub use tree::{Node, PathTree, Scalar, Tree};
pub use write::{write_tree, WriteOptions};
