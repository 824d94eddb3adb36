use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset {url} either does not exist or if it does then it doesn't have any worksheet called '{}'", .tried.join("', '"))]
    NotFound { url: String, tried: Vec<String> },

    #[error("Datasets missing from every hub ({}): {}", .hubs.join(", "), .relative_urls.join(", "))]
    MissingEverywhere { relative_urls: Vec<String>, hubs: Vec<String> },

    #[error("Unable to retrieve {url} because of this error: '{reason}'")]
    Unreadable { url: String, reason: String },

    #[error("Please close file(s) under {url} so system can {action} it. Thanks.")]
    ResourceBusy { url: String, action: String },

    #[error("Invalid sampler: {0}")]
    InvalidSampler(String),

    #[error("Statistics are misaligned: input urls {input:?} vs output urls {output:?}")]
    StatisticsMisaligned { input: Vec<String>, output: Vec<String> },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl ProjectorError {
    /// True for failures caused by the OS refusing access, typically because another
    /// process holds a lock on the file.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            ProjectorError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            ProjectorError::Walk(e) => e
                .io_error()
                .map(|io| io.kind() == std::io::ErrorKind::PermissionDenied)
                .unwrap_or(false),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectorError>;
