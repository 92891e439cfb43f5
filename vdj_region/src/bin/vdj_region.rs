//! vdj_region
#![deny(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use vdj_region::{run, RunPaths};
use vdj_trim::{SplitPolicy, TrimConfig};

/// Generate full V-CDR3-J amino-acid sequences from germline V and J tables and a table of
/// CDR3 sequences.
#[derive(Parser, Debug)]
#[clap(name = "vdj_region", version)]
struct Args {
    /// CSV file with VID, JID and CDR3 columns. Other columns are passed through.
    #[clap(value_name = "VJ_FILE")]
    vj_file: PathBuf,

    /// V germline CSV with V.Accession.Number, V.Name and V.AA.String columns.
    #[clap(short = 'v', long, value_name = "CSV")]
    v_file: PathBuf,

    /// J germline CSV with J.Accession.Number, J.Name and J.AA.String columns.
    #[clap(short = 'j', long, value_name = "CSV")]
    j_file: PathBuf,

    /// Output CSV of assembled sequences.
    #[clap(short, long, default_value = "vdj_output.csv", value_name = "CSV")]
    output: PathBuf,

    /// Output CSV of rows that could not be assembled, with the reason.
    #[clap(short, long, default_value = "dropout_threading.csv", value_name = "CSV")]
    quarantine: PathBuf,

    /// TOML file of trimming parameters. Keys that are left out keep their defaults.
    #[clap(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Start from the strict parameter set instead of the defaults.
    #[clap(long, conflicts_with = "config")]
    strict: bool,

    /// Number of trailing V residues searched for the junction.
    #[clap(long, value_name = "NUM")]
    tail_window_size: Option<usize>,

    /// Shortest cysteine-anchored exact overlap accepted.
    #[clap(long, value_name = "NUM")]
    min_exact_match_length: Option<usize>,

    /// Minimum V-tail versus CDR3 alignment score.
    #[clap(long, value_name = "SCORE", allow_negative_numbers = true)]
    score_threshold: Option<f64>,

    /// Cut V at the first_occurrence or last_occurrence of the overlap.
    #[clap(long, value_name = "POLICY")]
    split_policy: Option<SplitPolicy>,

    /// Number of worker threads. Defaults to one per core.
    #[clap(long, value_name = "NUM")]
    threads: Option<usize>,
}

impl Args {
    fn trim_config(&self) -> Result<TrimConfig> {
        let mut config = match (&self.config, self.strict) {
            (Some(path), _) => TrimConfig::load(path)?,
            (None, true) => TrimConfig::strict(),
            (None, false) => TrimConfig::default(),
        };
        if let Some(n) = self.tail_window_size {
            config.tail_window_size = n;
        }
        if let Some(n) = self.min_exact_match_length {
            config.min_exact_match_length = n;
        }
        if let Some(score) = self.score_threshold {
            config.alignment_score_threshold = score;
        }
        if let Some(policy) = self.split_policy {
            config.split_policy = policy;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the thread pool")?;
    }
    let config = args.trim_config()?;

    let paths = RunPaths {
        junction_table: args.vj_file,
        v_germline: args.v_file,
        j_germline: args.j_file,
        assembled: args.output,
        quarantined: args.quarantine,
    };
    let summary = run(&paths, &config)?;
    info!(
        "wrote {} assembled rows to {} and {} quarantined rows to {}",
        summary.assembled,
        paths.assembled.display(),
        summary.quarantined,
        paths.quarantined.display()
    );
    Ok(())
}
