use clap::Parser;
use fast_mrp::io::{OutputFormat, is_stdout, read_forest, write_matrix};
use fast_mrp::{Alphabet, MrpError, Randomization};
use std::path::PathBuf;
use std::time::Instant;

/// Build a Matrix Representation with Parsimony (MRP) supermatrix from a
/// file of Newick trees, one tree per line.
#[derive(Parser, Debug)]
#[command(name = "fast-mrp", version, about = "MRP supermatrix from Newick trees")]
struct Args {
    /// File with one Newick tree per line (.gz accepted)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output path for the matrix (.gz to compress, - for stdout)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Output format: NEXUS, PHYLIP, anything else is FASTA (case-insensitive)
    #[arg(short = 'f', long = "format", default_value = "NEXUS")]
    format: String,

    /// Write A/T/- instead of 1/0/?
    #[arg(long = "dna", default_value_t = false)]
    dna: bool,

    /// Randomize the 0/1 coding of each column
    #[arg(long = "randomize", default_value_t = false)]
    randomize: bool,

    /// Integer seed for --randomize, negative allowed (implies --randomize)
    #[arg(long = "seed", allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn randomization(&self) -> Randomization {
        Randomization::from_options(self.randomize, self.seed)
    }

    /// Progress goes to stdout, so it is silenced when the matrix does too.
    fn show_progress(&self) -> bool {
        !self.quiet && !is_stdout(&self.output)
    }
}

fn main() {
    let args = Args::parse();
    let format = OutputFormat::from_name(&args.format);
    let alphabet = Alphabet::select(args.dna);
    let randomization = args.randomization();
    let show = args.show_progress();

    // Read trees and extract bipartitions
    let t0 = Instant::now();
    let (forest, reports) = match read_forest(&args.input, randomization) {
        Ok(r) => r,
        Err(e @ MrpError::MalformedTree { .. }) => {
            eprintln!("Failed to parse {:?}: {e}", args.input);
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    if forest.tree_count() == 0 {
        eprintln!("No trees parsed from {:?}.", args.input);
        std::process::exit(2);
    }
    for (line, summary) in &reports {
        if !summary.terminated {
            eprintln!("Warning: tree on line {line} has no terminating ';'");
        }
        if summary.unclosed > 0 {
            eprintln!("Warning: tree on line {line} leaves {} clade(s) unclosed", summary.unclosed);
        }
    }
    let read_s = t0.elapsed().as_secs_f64();
    log_if(show, format!("Reading trees {read_s:.3}s"));
    log_if(
        show,
        format!(
            "Read in {} taxa for {} trees, {} bipartitions",
            forest.taxon_count(),
            forest.tree_count(),
            forest.column_count()
        ),
    );

    let t1 = Instant::now();
    if let Err(e) = write_matrix(&args.output, &forest, format, alphabet) {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        std::process::exit(4);
    }
    let write_s = t1.elapsed().as_secs_f64();
    log_if(show, format!("Writing {format:?} matrix to output {write_s:.3}s"));
}

fn log_if(show: bool, msg: String) {
    if show { println!("{}", msg); }
}
