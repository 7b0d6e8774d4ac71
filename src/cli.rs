//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Flatten an arXiv paper's LaTeX source into a single document.
///
/// Fetches the paper's source bundle (or reuses the cached copy), finds the
/// root `.tex` file and inlines every `\input`/`\include` into it.
#[derive(Parser, Debug)]
#[command(name = "arxiv-latex")]
#[command(author, version, about)]
pub struct Args {
    /// arXiv URL (https://arxiv.org/abs/2301.01234) or bare identifier
    pub reference: String,

    /// Write the combined source to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Cache root directory (default: $XDG_CACHE_HOME/arxiv-latex or ~/.arxiv_cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum include nesting depth (1-64, default 10)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=64))]
    pub max_depth: Option<u8>,

    /// Extract into this directory and keep it after the run
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Remove image files from the extracted tree
    #[arg(long)]
    pub strip_images: bool,

    /// Discard the cached archive and fetch it again
    #[arg(long)]
    pub refresh: bool,

    /// E-print endpoint base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
