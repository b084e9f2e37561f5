use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the bundle archives and redirect configuration.
    #[arg(short, long, default_value = "bundles")]
    pub bundles: PathBuf,

    /// Extra configuration layer applied on top of the built-in defaults and
    /// the collection's context-param.properties.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Load every bundle and print what was loaded, skipped and indexed.
    #[command(alias = "s")]
    Scan,

    /// Resolve a logical path the way a request handler would.
    #[command(alias = "r")]
    Resolve {
        /// The logical path, e.g. /guide/intro.html.
        path: String,

        /// Print the resolution outcome as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Full-text search across all loaded bundles.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum number of hits to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Look up a keyword in the federated topic index.
    Topic {
        /// The keyword to look up.
        keyword: String,
    },
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Result<Args, Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    Ok(args)
}
