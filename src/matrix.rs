//! Matrix assembly: one row of MRP characters per taxon.
//!
//! # Overview
//! A row is produced in a single forward pass over the columns, with one
//! pointer into the taxon's ascending column list and one into its ascending
//! tree list. Trees the taxon is absent from become a contiguous run of the
//! missing symbol; the column pointer is not consulted there since the taxon
//! has no columns in that range.
//!
//! ```text
//! trees:   (A,B);      (A,(B,C));
//! columns: 0           1      2
//! clades:  {A,B}       {B,C}  {A,B,C}
//!
//! A  1  01
//! B  1  11
//! C  ?  11
//! ```
//!
//! With polarity `false` the same column is coded the other way round, so
//! members get the absent symbol and non-members the present one.

use crate::error::{MrpError, Result};
use crate::extractor::Forest;
use crate::taxa::{TaxonId, TaxonRecord};

/// Symbols used for the three cell states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    /// Taxon is on the side of the split the column's polarity selects.
    pub present: char,
    /// Taxon is in the tree but on the other side.
    pub absent: char,
    /// Taxon is not in the tree.
    pub missing: char,
}

impl Alphabet {
    pub const BINARY: Alphabet = Alphabet { present: '1', absent: '0', missing: '?' };
    pub const DNA: Alphabet = Alphabet { present: 'A', absent: 'T', missing: '-' };

    /// Custom alphabet. The three symbols must differ.
    pub fn new(present: char, absent: char, missing: char) -> Result<Self> {
        if present == absent || present == missing || absent == missing {
            return Err(MrpError::InvalidConfig(format!(
                "alphabet symbols must be distinct, got '{present}', '{absent}', '{missing}'"
            )));
        }
        Ok(Alphabet { present, absent, missing })
    }

    /// `BINARY`, or `DNA` when `dna` is set.
    pub fn select(dna: bool) -> Self {
        if dna { Alphabet::DNA } else { Alphabet::BINARY }
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet::BINARY
    }
}

/// Iterator over the symbols of one taxon's row.
#[derive(Debug, Clone)]
pub struct RowEncoder<'a> {
    alphabet: Alphabet,
    polarity: &'a [bool],
    ends: &'a [usize],
    record: &'a TaxonRecord,
    /// next tree whose range has not been entered
    tree: usize,
    /// exclusive end of the current tree's range
    tree_end: usize,
    in_tree: bool,
    column: usize,
    column_ptr: usize,
    tree_ptr: usize,
}

impl<'a> RowEncoder<'a> {
    fn new(forest: &'a Forest, record: &'a TaxonRecord, alphabet: Alphabet) -> Self {
        RowEncoder {
            alphabet,
            polarity: forest.polarities(),
            ends: forest.boundaries().ends(),
            record,
            tree: 0,
            tree_end: 0,
            in_tree: false,
            column: 0,
            column_ptr: 0,
            tree_ptr: 0,
        }
    }

    /// Step into the next tree's range. Returns false past the last tree.
    fn enter_next_tree(&mut self) -> bool {
        let Some(&end) = self.ends.get(self.tree) else {
            return false;
        };
        self.in_tree = self.record.trees.get(self.tree_ptr) == Some(&self.tree);
        if self.in_tree {
            self.tree_ptr += 1;
        }
        self.tree_end = end;
        self.tree += 1;
        true
    }
}

impl Iterator for RowEncoder<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        while self.column >= self.tree_end {
            if !self.enter_next_tree() {
                return None;
            }
        }
        let column = self.column;
        self.column += 1;

        if !self.in_tree {
            return Some(self.alphabet.missing);
        }
        let member = self.record.columns.get(self.column_ptr) == Some(&column);
        if member {
            self.column_ptr += 1;
        }
        if member == self.polarity[column] {
            Some(self.alphabet.present)
        } else {
            Some(self.alphabet.absent)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.ends.last().copied().unwrap_or(0);
        let left = total - self.column;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RowEncoder<'_> {}

impl Forest {
    /// Symbols of `taxon`'s row, or `None` for an unknown id.
    pub fn row(&self, taxon: TaxonId, alphabet: Alphabet) -> Option<RowEncoder<'_>> {
        let record = self.record(taxon)?;
        Some(RowEncoder::new(self, record, alphabet))
    }

    /// `taxon`'s row as a string.
    pub fn encode_row(&self, taxon: TaxonId, alphabet: Alphabet) -> Option<String> {
        self.row(taxon, alphabet).map(|row| row.collect())
    }

    /// All rows in registry order, paired with the taxon name.
    pub fn rows(&self, alphabet: Alphabet) -> impl Iterator<Item = (&str, RowEncoder<'_>)> + '_ {
        self.taxa()
            .iter()
            .map(move |(_, name, record)| (name, RowEncoder::new(self, record, alphabet)))
    }
}
