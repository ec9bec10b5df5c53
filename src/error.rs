//! Error types shared by the parser, the assembler and the file layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MrpError {
    /// I/O error while reading trees or writing the matrix.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A tree whose first token is not `(`.
    ///
    /// `line` is the 1-based line of the input file, or the 1-based tree
    /// number when trees are fed to the builder directly.
    #[error("malformed tree at line {line}: expected '(' but found {found}")]
    MalformedTree { line: usize, found: String },

    /// Bad arguments (unknown alphabet, unparsable seed, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MrpError>;
