//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tokenizer`: lazy Newick tokenizer that strips lengths and labels.
//! - `taxa`: taxon registry plus per-taxon column / tree lists.
//! - `boundary`: per-tree column ranges.
//! - `extractor`: stack machine turning trees into bipartition columns.
//! - `matrix`: MRP row encoding over the extracted columns.
//! - `io`: reading tree files and writing NEXUS / PHYLIP / FASTA matrices.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod boundary;
pub mod error;
pub mod extractor;
pub mod io;
pub mod matrix;
pub mod taxa;
pub mod tokenizer;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use error::{MrpError, Result};
pub use extractor::{Forest, ForestBuilder, Randomization, TreeSummary};
pub use io::{OutputFormat, read_forest, write_matrix};
pub use matrix::Alphabet;
