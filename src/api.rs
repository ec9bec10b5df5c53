//! Python binding layer for MRP matrix construction.
//!
//! Provides Python functions that parse a Newick trees file and either
//! return the matrix rows or write them to disk.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::error::MrpError;
use crate::extractor::{Forest, Randomization};
use crate::io::{OutputFormat, read_forest, write_matrix};
use crate::matrix::Alphabet;

fn to_py_err(e: MrpError) -> PyErr {
    match e {
        MrpError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Helper function to parse a trees file into a forest
fn load_forest(path: &str, randomize: bool, seed: Option<i64>) -> PyResult<Forest> {
    let (forest, _reports) = read_forest(path, Randomization::from_options(randomize, seed))
        .map_err(to_py_err)?;
    if forest.tree_count() == 0 {
        return Err(PyValueError::new_err(format!("No trees found in file '{}'", path)));
    }
    Ok(forest)
}

/// Build the MRP matrix for a file of Newick trees (one per line).
///
/// Args:
///     path: Path to the trees file (.gz accepted)
///     dna: Use A/T/- instead of 1/0/? (default: False)
///     randomize: Randomize the coding of each column (default: False)
///     seed: Seed for randomization, implies randomize (default: None)
///
/// Returns:
///     A tuple of (taxon_names, rows) where rows[i] is the character
///     string for taxon_names[i]
///
/// Raises:
///     ValueError: If a tree is malformed or the file holds no trees
///     IOError: If the file cannot be read
#[pyfunction]
#[pyo3(signature = (path, dna=false, randomize=false, seed=None))]
fn mrp_matrix(
    path: String,
    dna: bool,
    randomize: bool,
    seed: Option<i64>,
) -> PyResult<(Vec<String>, Vec<String>)> {
    let forest = load_forest(&path, randomize, seed)?;
    let (names, rows): (Vec<String>, Vec<String>) = forest
        .rows(Alphabet::select(dna))
        .map(|(name, row)| (name.to_string(), row.collect::<String>()))
        .unzip();
    Ok((names, rows))
}

/// Build the MRP matrix and write it to `output`.
///
/// Args:
///     input: Path to the trees file (.gz accepted)
///     output: Output path (.gz to compress)
///     format: "NEXUS", "PHYLIP", anything else writes FASTA (default: "NEXUS")
///     dna: Use A/T/- instead of 1/0/? (default: False)
///     randomize: Randomize the coding of each column (default: False)
///     seed: Seed for randomization, implies randomize (default: None)
///
/// Returns:
///     A tuple of (number_of_taxa, number_of_characters)
#[pyfunction]
#[pyo3(signature = (input, output, format="NEXUS", dna=false, randomize=false, seed=None))]
fn write_mrp(
    input: String,
    output: String,
    format: &str,
    dna: bool,
    randomize: bool,
    seed: Option<i64>,
) -> PyResult<(usize, usize)> {
    let forest = load_forest(&input, randomize, seed)?;
    write_matrix(&output, &forest, OutputFormat::from_name(format), Alphabet::select(dna))
        .map_err(to_py_err)?;
    Ok((forest.taxon_count(), forest.column_count()))
}

/// Python module definition
#[pymodule]
fn fast_mrp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(mrp_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(write_mrp, m)?)?;
    Ok(())
}
