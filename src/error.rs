use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a rule database from a source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch rules from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read rules file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress rules from {origin}")]
    Decompress {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules from {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no rule source succeeded ({})", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("spelling rules could not be loaded")]
    Load(#[from] LoadError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
