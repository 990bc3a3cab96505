#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Infra(#[from] sl_infra::Error),
}
