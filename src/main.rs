use anyhow::Result;
use clap::Parser;
use memaudit::report::interpretation_path;
use memaudit::{AuditConfig, DanglingPolicy, run};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Concept memory audit: redundancy and transferability", long_about = None)]
struct Args {
    /// Path to concepts JSON file (bare mapping or wrapped under "concepts")
    #[arg(long)]
    concepts: Option<PathBuf>,

    /// Path to retrieval log JSON file (enables transferability analysis)
    #[arg(long)]
    retrievals: Option<PathBuf>,

    /// Output path for the analysis report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Similarity threshold for redundancy detection
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Embedding model identifier (hashing, hashing-<dims>, none)
    #[arg(long)]
    model: Option<String>,

    /// Skip the embedding step (redundancy reports zero findings)
    #[arg(long)]
    skip_semantic: bool,

    /// Include the full similarity matrix in the report
    #[arg(long)]
    include_matrix: bool,

    /// Report retrievals of concepts missing from the store separately
    #[arg(long)]
    flag_dangling: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "memaudit=debug" } else { "memaudit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load from file or default
    let mut config = AuditConfig::load_from_file().unwrap_or_default();

    // 2. Override with CLI args
    if let Some(c) = args.concepts {
        config.concepts = c;
    }
    if let Some(r) = args.retrievals {
        config.retrievals = Some(r);
    }
    if let Some(o) = args.output {
        config.output = o;
    }
    if let Some(t) = args.similarity_threshold {
        config.similarity_threshold = t;
    }
    if let Some(m) = args.model {
        config.model = m;
    }
    if args.skip_semantic {
        config.skip_semantic = true;
    }
    if args.include_matrix {
        config.include_similarity_matrix = true;
    }
    if args.flag_dangling {
        config.dangling = DanglingPolicy::Flag;
    }
    if args.verbose {
        config.verbose = true;
    }

    init_tracing(config.verbose);

    let output = config.output.clone();
    let report = run(config)?;

    println!();
    println!("{}", report.interpretation);
    println!();
    println!("Report saved to: {}", output.display());
    println!(
        "Interpretation saved to: {}",
        interpretation_path(&output).display()
    );

    Ok(())
}
