use std::path::PathBuf;

/// Everything that can go wrong while loading, resolving or writing tokens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid source pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to parse tokens in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid token at '{path}': {reason}")]
    InvalidToken { path: String, reason: String },

    #[error("token '{token}' references '{reference}', which does not exist")]
    MissingReference { token: String, reference: String },

    #[error("circular reference: {chain}")]
    CircularReference { chain: String },

    #[error("unsupported modifier on '{token}': {reason}")]
    UnsupportedModifier { token: String, reason: String },

    #[error("unknown transform group '{name}' for platform '{platform}'")]
    UnknownTransformGroup { platform: String, name: String },

    #[error("unknown format '{name}' for file '{destination}'")]
    UnknownFormat { destination: String, name: String },

    #[error("platform '{0}' is not configured")]
    UnknownPlatform(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
