use std::path::PathBuf;

use clap::Parser;

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Parser)]
#[command(name = "mapreduce-demo", version, about = "Word-count over the mapreduce engine")]
pub struct Cli {
    /// File to read lines from. Reads from stdin when omitted.
    #[arg(long, env = "MAPREDUCE_INPUT")]
    pub input: Option<PathBuf>,

    /// Number of worker threads to run the job across.
    #[arg(
        short = 'w',
        long,
        env = "MAPREDUCE_WORKERS",
        default_value_t = default_workers()
    )]
    pub workers: usize,

    /// Disable the progress bar (useful when piping output).
    #[arg(long, env = "MAPREDUCE_NO_PROGRESS", default_value_t = false)]
    pub no_progress: bool,
}
