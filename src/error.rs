use std::path::PathBuf;

/// Errors surfaced by the assembly engine.
///
/// An empty assembly is not an error: a region whose graph cleans away to
/// nothing is reported as a successful zero-unitig result.
#[derive(Debug, thiserror::Error)]
pub enum AsmError {
    /// Invalid input data: a base outside {A,C,G,T,N}, or a quality string
    /// whose length does not match its sequence.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Invalid configuration, reported before any processing begins.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {source} ({})", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl AsmError {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }
}

impl From<std::io::Error> for AsmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<unknown>"),
        }
    }
}

pub type Result<T> = std::result::Result<T, AsmError>;
