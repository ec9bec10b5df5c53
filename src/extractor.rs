//! Bipartition extraction: a stack machine over the Newick token stream.
//!
//! # Overview
//! No tree object is built. Each open parenthesis pushes an empty clade
//! accumulator; each leaf name goes into the accumulator on top; each close
//! parenthesis pops the top accumulator, allocates the next column for it
//! and merges its members into the parent clade.
//!
//! ```text
//! (A,(B,C));
//!
//! token   stack             action
//! (       [{}]
//! A       [{A}]
//! (       [{A},{}]
//! B C     [{A},{B,C}]
//! )       [{A,B,C}]         column 0 = {B,C}
//! )       []                column 1 = {A,B,C}
//! ;                         tree 0 ends after column 1
//! ```
//!
//! The outermost `)` also allocates a column (the full taxon set of the
//! tree), even though it is trivial for an unrooted tree.
//!
//! Column indices only grow, so every taxon's column list is sorted by
//! construction and the matrix assembler can walk it with a single forward
//! pointer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

use crate::boundary::TreeBoundaries;
use crate::error::{MrpError, Result};
use crate::taxa::{TaxonId, TaxonRecord, TaxonRegistry};
use crate::tokenizer::{Token, Tokenizer};

/// How column polarity is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Randomization {
    /// Clade members are always coded with the present symbol.
    #[default]
    Off,
    /// Uniform random polarity per column from a seeded generator.
    /// Any 64-bit integer is a valid seed, negative ones included.
    Seeded(i64),
    /// Uniform random polarity per column from OS entropy.
    Entropy,
}

impl Randomization {
    /// `--randomize` / `--seed` folded into one value. A seed implies randomization.
    pub fn from_options(randomize: bool, seed: Option<i64>) -> Self {
        match (randomize, seed) {
            (_, Some(seed)) => Randomization::Seeded(seed),
            (true, None) => Randomization::Entropy,
            (false, None) => Randomization::Off,
        }
    }

    fn rng(self) -> Option<StdRng> {
        match self {
            Randomization::Off => None,
            Randomization::Seeded(seed) => Some(StdRng::seed_from_u64(seed as u64)),
            Randomization::Entropy => Some(StdRng::from_os_rng()),
        }
    }
}

/// What a single tree contributed to the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSummary {
    /// 0-based tree index.
    pub tree: usize,
    /// Columns allocated by this tree.
    pub columns: Range<usize>,
    /// Distinct taxa seen as leaves.
    pub taxa: usize,
    /// Open parentheses never closed before end of line (their clades are dropped).
    pub unclosed: usize,
    /// Whether a `;` ended the tree. Otherwise end of line did.
    pub terminated: bool,
}

/// Mutable state threaded through the parse of a whole forest.
#[derive(Debug)]
pub struct ForestBuilder {
    taxa: TaxonRegistry,
    boundaries: TreeBoundaries,
    polarity: Vec<bool>,
    stack: Vec<Vec<TaxonId>>,
    rng: Option<StdRng>,
}

impl ForestBuilder {
    pub fn new(randomization: Randomization) -> Self {
        ForestBuilder {
            taxa: TaxonRegistry::new(),
            boundaries: TreeBoundaries::new(),
            polarity: Vec::new(),
            stack: Vec::new(),
            rng: randomization.rng(),
        }
    }

    /// Number of trees added so far.
    pub fn tree_count(&self) -> usize {
        self.boundaries.len()
    }

    /// Number of columns allocated so far.
    pub fn column_count(&self) -> usize {
        self.polarity.len()
    }

    /// Parse one Newick tree and append its bipartitions.
    ///
    /// # Errors
    /// [`MrpError::MalformedTree`] if the first token is not `(`. Nothing is
    /// recorded for a rejected tree. `line` in the error is the 1-based tree
    /// number.
    pub fn add_tree(&mut self, newick: &str) -> Result<TreeSummary> {
        let tree = self.boundaries.len();
        let mut tokens = Tokenizer::new(newick);

        match tokens.next() {
            Some(Token::Open) => {}
            other => {
                return Err(MrpError::MalformedTree {
                    line: tree + 1,
                    found: other.map_or_else(|| "end of line".to_string(), |t| t.to_string()),
                });
            }
        }

        let first_column = self.polarity.len();
        let mut taxa = 0;
        let mut terminated = false;
        self.stack.clear();
        self.stack.push(Vec::new());

        for token in tokens {
            match token {
                Token::Open => self.stack.push(Vec::new()),
                Token::Close => self.close_clade(),
                Token::End => {
                    terminated = true;
                    break;
                }
                Token::Name(name) => {
                    let id = self.taxa.intern(&name);
                    if let Some(top) = self.stack.last_mut() {
                        top.push(id);
                    }
                    if self.taxa.record_mut(id).add_tree(tree) {
                        taxa += 1;
                    }
                }
                Token::Label(_) | Token::Length(_) => {}
            }
        }

        let unclosed = self.stack.len();
        self.stack.clear();
        self.boundaries.push(self.polarity.len());

        Ok(TreeSummary {
            tree,
            columns: first_column..self.polarity.len(),
            taxa,
            unclosed,
            terminated,
        })
    }

    /// Pop the top clade, give it a column, and fold it into its parent.
    fn close_clade(&mut self) {
        // stray ')' with nothing open
        let Some(clade) = self.stack.pop() else {
            return;
        };
        let column = self.polarity.len();
        let polarity = match self.rng.as_mut() {
            Some(rng) => rng.random::<bool>(),
            None => true,
        };
        self.polarity.push(polarity);

        for &id in &clade {
            self.taxa.record_mut(id).add_column(column);
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.extend(clade);
        }
    }

    /// Freeze the collected indices.
    pub fn finish(self) -> Forest {
        Forest {
            taxa: self.taxa,
            boundaries: self.boundaries,
            polarity: self.polarity,
        }
    }
}

/// Read-only result of parsing a forest: everything the assembler needs.
#[derive(Debug, Clone)]
pub struct Forest {
    taxa: TaxonRegistry,
    boundaries: TreeBoundaries,
    polarity: Vec<bool>,
}

impl Forest {
    /// Parse every tree in `trees`, stopping at the first malformed one.
    pub fn parse<'a, I>(trees: I, randomization: Randomization) -> Result<Forest>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = ForestBuilder::new(randomization);
        for tree in trees {
            builder.add_tree(tree)?;
        }
        Ok(builder.finish())
    }

    pub fn taxa(&self) -> &TaxonRegistry {
        &self.taxa
    }

    pub fn boundaries(&self) -> &TreeBoundaries {
        &self.boundaries
    }

    pub fn taxon_count(&self) -> usize {
        self.taxa.len()
    }

    pub fn tree_count(&self) -> usize {
        self.boundaries.len()
    }

    pub fn column_count(&self) -> usize {
        self.polarity.len()
    }

    /// Polarity of `column`: `true` maps clade members to the present symbol.
    pub fn polarity(&self, column: usize) -> Option<bool> {
        self.polarity.get(column).copied()
    }

    pub(crate) fn polarities(&self) -> &[bool] {
        &self.polarity
    }

    pub fn record(&self, taxon: TaxonId) -> Option<&TaxonRecord> {
        self.taxa.record(taxon)
    }

    /// Ascending columns whose clade holds `taxon`.
    pub fn columns_of(&self, taxon: TaxonId) -> &[usize] {
        self.taxa.record(taxon).map_or(&[], |r| r.columns.as_slice())
    }

    /// Ascending trees in which `taxon` is a leaf.
    pub fn trees_of(&self, taxon: TaxonId) -> &[usize] {
        self.taxa.record(taxon).map_or(&[], |r| r.trees.as_slice())
    }

    /// Taxa on the counted side of `column`, in id order.
    ///
    /// This scans every taxon; the assembler never needs it.
    pub fn clade(&self, column: usize) -> Vec<TaxonId> {
        self.taxa
            .iter()
            .filter(|(_, _, rec)| rec.columns.binary_search(&column).is_ok())
            .map(|(id, _, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use phylotree::tree::Tree as PhyloTree;

    fn forest(trees: &[&str]) -> Forest {
        Forest::parse(trees.iter().copied(), Randomization::Off).unwrap()
    }

    fn clade_names(f: &Forest, column: usize) -> Vec<String> {
        f.clade(column)
            .into_iter()
            .map(|id| f.taxa().name(id).unwrap().to_string())
            .sorted()
            .collect()
    }

    #[test]
    fn test_nested_clades_close_inner_first() {
        let f = forest(&["(A,(B,C));"]);
        assert_eq!(f.taxon_count(), 3);
        assert_eq!(f.column_count(), 2);
        assert_eq!(clade_names(&f, 0), ["B", "C"]);
        assert_eq!(clade_names(&f, 1), ["A", "B", "C"]);
        assert_eq!(f.columns_of(0), [1]);
        assert_eq!(f.columns_of(1), [0, 1]);
        assert_eq!(f.boundaries().last_column(0), Some(1));
    }

    #[test]
    fn test_first_token_must_open() {
        let mut b = ForestBuilder::new(Randomization::Off);
        b.add_tree("(A,B);").unwrap();
        let err = b.add_tree("A,(B,C);").unwrap_err();
        match err {
            MrpError::MalformedTree { line, found } => {
                assert_eq!(line, 2);
                assert_eq!(found, "name 'A'");
            }
            other => panic!("unexpected error {other:?}"),
        }
        // the rejected tree left nothing behind
        assert_eq!(b.tree_count(), 1);
        let f = b.finish();
        assert_eq!(f.taxon_count(), 2);
        assert_eq!(f.column_count(), 1);
    }

    #[test]
    fn test_empty_line_is_malformed() {
        let mut b = ForestBuilder::new(Randomization::Off);
        let err = b.add_tree("").unwrap_err();
        assert!(matches!(err, MrpError::MalformedTree { ref found, .. } if found == "end of line"));
    }

    #[test]
    fn test_columns_monotonic_and_boundaries() {
        let trees = ["((A,B),(C,D));", "(A,(B,(C,E)));", "(D,E);"];
        let mut b = ForestBuilder::new(Randomization::Off);
        let summaries: Vec<_> = trees.iter().map(|t| b.add_tree(t).unwrap()).collect();
        assert_eq!(summaries[0].columns, 0..3);
        assert_eq!(summaries[1].columns, 3..6);
        assert_eq!(summaries[2].columns, 6..7);
        assert_eq!(summaries[1].taxa, 4);
        let f = b.finish();

        let ends: Vec<_> = (0..f.tree_count())
            .map(|t| f.boundaries().last_column(t).unwrap())
            .collect();
        assert!(ends.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*ends.last().unwrap(), f.column_count() - 1);

        for (id, _, rec) in f.taxa().iter() {
            assert!(rec.columns.windows(2).all(|w| w[0] < w[1]), "taxon {id}");
            // every column lies inside a tree the taxon belongs to
            for &c in &rec.columns {
                let tree = f.boundaries().ranges().position(|r| r.contains(&c)).unwrap();
                assert!(rec.in_tree(tree));
            }
        }
    }

    #[test]
    fn test_tree_membership() {
        let f = forest(&["(A,B);", "(C,D);", "(A,C);"]);
        let a = f.taxa().id("A").unwrap();
        let d = f.taxa().id("D").unwrap();
        assert_eq!(f.trees_of(a), [0, 2]);
        assert_eq!(f.trees_of(d), [1]);
    }

    #[test]
    fn test_degenerate_trees() {
        let mut b = ForestBuilder::new(Randomization::Off);
        let s = b.add_tree("(A);").unwrap();
        assert_eq!(s.columns, 0..1);
        let s = b.add_tree("();").unwrap();
        assert_eq!(s.columns, 1..2);
        assert_eq!(s.taxa, 0);
        let f = b.finish();
        assert!(f.clade(1).is_empty());
        assert_eq!(f.boundaries().last_column(1), Some(1));
    }

    #[test]
    fn test_tree_without_columns_keeps_boundary() {
        // "(A" never closes: no column, boundary unchanged
        let mut b = ForestBuilder::new(Randomization::Off);
        b.add_tree("(A,B);").unwrap();
        let s = b.add_tree("(C").unwrap();
        assert_eq!(s.columns, 1..1);
        assert_eq!(s.unclosed, 1);
        assert!(!s.terminated);
        let f = b.finish();
        assert_eq!(f.boundaries().last_column(1), f.boundaries().last_column(0));
        assert!(f.trees_of(f.taxa().id("C").unwrap()).contains(&1));
    }

    #[test]
    fn test_unclosed_clades_do_not_leak_into_next_tree() {
        let f = forest(&["((A,B);", "(C,D);"]);
        // tree 0 closes only {A,B}; tree 1 closes {C,D}
        assert_eq!(f.column_count(), 2);
        assert_eq!(clade_names(&f, 1), ["C", "D"]);
    }

    #[test]
    fn test_stray_close_and_trailing_tokens() {
        let f = forest(&["(A,B)));X;", "(C,D);"]);
        assert_eq!(f.column_count(), 2);
        assert_eq!(f.taxa().id("X"), None);
    }

    #[test]
    fn test_missing_semicolon_ends_tree_at_line_end() {
        let mut b = ForestBuilder::new(Randomization::Off);
        let s = b.add_tree("(A,(B,C))").unwrap();
        assert!(!s.terminated);
        assert_eq!(s.unclosed, 0);
        assert_eq!(b.tree_count(), 1);
    }

    #[test]
    fn test_repeated_taxon_records_column_once() {
        let f = forest(&["((A,A),B);"]);
        let a = f.taxa().id("A").unwrap();
        assert_eq!(f.columns_of(a), [0, 1]);
        assert_eq!(f.trees_of(a), [0]);
    }

    #[test]
    fn test_polarity_fixed_without_randomization() {
        let f = forest(&["((A,B),(C,D));", "(A,(C,D));"]);
        assert!((0..f.column_count()).all(|c| f.polarity(c) == Some(true)));
        assert_eq!(f.polarity(f.column_count()), None);
    }

    #[test]
    fn test_seeded_polarity_is_reproducible() {
        let trees: Vec<String> = (0..40).map(|i| format!("((t{i},u{i}),(v{i},w{i}));")).collect();
        let run = |seed| {
            let f = Forest::parse(trees.iter().map(String::as_str), Randomization::Seeded(seed)).unwrap();
            (0..f.column_count()).map(|c| f.polarity(c).unwrap()).collect::<Vec<_>>()
        };
        let a = run(7);
        assert_eq!(a, run(7));
        assert_eq!(run(-7), run(-7));
        assert_ne!(run(-7), a);
        assert_eq!(a.len(), 120);
        // 120 fair coin flips are not all the same
        assert!(a.iter().any(|&p| p) && a.iter().any(|&p| !p));
    }

    #[test]
    fn test_randomization_from_options() {
        assert_eq!(Randomization::from_options(false, None), Randomization::Off);
        assert_eq!(Randomization::from_options(true, None), Randomization::Entropy);
        assert_eq!(Randomization::from_options(false, Some(3)), Randomization::Seeded(3));
        assert_eq!(Randomization::from_options(true, Some(-3)), Randomization::Seeded(-3));
    }

    /// Leaf-name sets under every internal node, collected with `phylotree`.
    fn phylotree_clades(newick: &str) -> Vec<Vec<String>> {
        fn walk(tree: &PhyloTree, id: usize, out: &mut Vec<Vec<String>>) -> Vec<String> {
            let node = tree.get(&id).unwrap();
            if node.children.is_empty() {
                return vec![node.name.clone().unwrap_or_default()];
            }
            let mut leaves = Vec::new();
            for &child in &node.children {
                leaves.extend(walk(tree, child, out));
            }
            leaves.sort();
            out.push(leaves.clone());
            leaves
        }
        let tree = PhyloTree::from_newick(newick).unwrap();
        let mut out = Vec::new();
        walk(&tree, tree.get_root().unwrap(), &mut out);
        out.sort();
        out
    }

    #[test]
    fn test_clades_match_phylotree() {
        let trees = [
            "(A:0.1,(B:0.1,(H:0.1,(D:0.1,(J:0.1,(((G:0.1,E:0.1):0.1,(F:0.1,I:0.1):0.1):0.1,C:0.1):0.1):0.1):0.1):0.1):0.1);",
            "(A:0.1,(B:0.1,(D:0.1,((J:0.1,H:0.1):0.1,(((G:0.1,E:0.1):0.1,(F:0.1,I:0.1):0.1):0.1,C:0.1):0.1):0.1):0.1):0.1);",
            "((A,B),(C,D),E);",
            "(((Q,R),S),T);",
        ];
        let f = forest(&trees);
        for (t, newick) in trees.iter().enumerate() {
            let range = f.boundaries().range(t).unwrap();
            let ours: Vec<_> = range.map(|c| clade_names(&f, c)).sorted().collect();
            assert_eq!(ours, phylotree_clades(newick), "tree {t}");
        }
    }
}
