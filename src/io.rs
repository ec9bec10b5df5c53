use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tempfile::NamedTempFile;

use crate::error::{MrpError, Result};
use crate::extractor::{Forest, ForestBuilder, Randomization, TreeSummary};
use crate::matrix::Alphabet;

/// `-` stands for stdout.
pub fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Open a trees file for line reading. `.gz` files are decompressed on the fly.
pub fn open_trees<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    let file = File::open(p)?;
    if is_gz(p) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Per-tree report from [`read_forest`]: 1-based input line and what the tree added.
pub type TreeReport = (usize, TreeSummary);

/// Parse one Newick tree per line from `reader`.
///
/// Blank lines are skipped. The first malformed tree aborts the whole run,
/// since every later column and boundary index would be shifted; the error
/// carries the 1-based line number.
pub fn read_forest_from<R: BufRead>(
    reader: R,
    randomization: Randomization,
) -> Result<(Forest, Vec<TreeReport>)> {
    let mut builder = ForestBuilder::new(randomization);
    let mut reports = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let tree = line.trim();
        if tree.is_empty() {
            continue;
        }
        let summary = builder.add_tree(tree).map_err(|e| match e {
            MrpError::MalformedTree { found, .. } => MrpError::MalformedTree { line: idx + 1, found },
            other => other,
        })?;
        reports.push((idx + 1, summary));
    }

    Ok((builder.finish(), reports))
}

/// [`read_forest_from`] over a file opened with [`open_trees`].
pub fn read_forest<P: AsRef<Path>>(
    path: P,
    randomization: Randomization,
) -> Result<(Forest, Vec<TreeReport>)> {
    read_forest_from(open_trees(path)?, randomization)
}

/// Output layout, picked by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Nexus,
    Phylip,
    Fasta,
}

impl OutputFormat {
    /// `NEXUS` and `PHYLIP` in any case; everything else is FASTA.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("nexus") {
            OutputFormat::Nexus
        } else if name.eq_ignore_ascii_case("phylip") {
            OutputFormat::Phylip
        } else {
            OutputFormat::Fasta
        }
    }
}

/// Write the matrix for `forest` to any writer.
pub fn write_matrix_to<W: Write>(
    out: &mut W,
    forest: &Forest,
    format: OutputFormat,
    alphabet: Alphabet,
) -> io::Result<()> {
    let ntax = forest.taxon_count();
    let nchar = forest.column_count();

    // Header
    match format {
        OutputFormat::Nexus => {
            writeln!(out, "#NEXUS")?;
            writeln!(out, "begin data;")?;
            writeln!(out, "\t dimensions ntax = {ntax} nchar = {nchar};")?;
            writeln!(out, "\t format missing = {};", alphabet.missing)?;
            writeln!(out, "\tmatrix")?;
        }
        OutputFormat::Phylip => writeln!(out, "{ntax} {nchar}")?,
        OutputFormat::Fasta => {}
    }

    // Rows
    let mut buf = String::with_capacity(nchar);
    for (name, row) in forest.rows(alphabet) {
        match format {
            OutputFormat::Nexus => write!(out, "\t'{name}' ")?,
            OutputFormat::Phylip => write!(out, "{name} ")?,
            OutputFormat::Fasta => writeln!(out, ">{name}")?,
        }
        buf.clear();
        buf.extend(row);
        out.write_all(buf.as_bytes())?;
        writeln!(out)?;
    }

    // Footer
    if format == OutputFormat::Nexus {
        writeln!(out, "\t;")?;
        writeln!(out, "end;")?;
    }
    out.flush()
}

/// Write the matrix to `path`, or to stdout when `path` is `-`.
///
/// File output goes to a temporary file next to `path` that only replaces
/// it after every byte has been flushed, so a failed run leaves no truncated
/// matrix behind. If `path` ends with `.gz`, the output is gzip-compressed.
/// Stdout is always written uncompressed.
pub fn write_matrix<P: AsRef<Path>>(
    path: P,
    forest: &Forest,
    format: OutputFormat,
    alphabet: Alphabet,
) -> Result<()> {
    let p = path.as_ref();
    if is_stdout(p) {
        let mut out = BufWriter::new(io::stdout().lock());
        write_matrix_to(&mut out, forest, format, alphabet)?;
        return Ok(());
    }
    let dir = match p.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;

    let tmp = if is_gz(p) {
        let mut out = BufWriter::new(GzEncoder::new(tmp, Compression::default()));
        write_matrix_to(&mut out, forest, format, alphabet)?;
        out.into_inner().map_err(|e| e.into_error())?.finish()?
    } else {
        let mut out = BufWriter::new(tmp);
        write_matrix_to(&mut out, forest, format, alphabet)?;
        out.into_inner().map_err(|e| e.into_error())?
    };

    tmp.persist(p).map_err(|e| e.error)?;
    Ok(())
}
