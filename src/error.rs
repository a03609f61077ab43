use thiserror::Error;

/// Failures reported by a [`Tracker`](crate::providers::Tracker) call.
///
/// Each variant names the step that failed and carries the remote error
/// payload when one was returned.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("could not read issue {key}: {detail}")]
    Lookup { key: String, detail: String },

    #[error("create-field metadata unavailable for {project}/{issue_type}: {detail}")]
    FieldMetadata {
        project: String,
        issue_type: String,
        detail: String,
    },

    #[error("issue creation failed: {0}")]
    Create(String),

    #[error("could not update {key}: {detail}")]
    Update { key: String, detail: String },

    #[error("could not download {url}: {detail}")]
    Download { url: String, detail: String },

    #[error("could not upload {filename} to {key}: {detail}")]
    Upload {
        key: String,
        filename: String,
        detail: String,
    },

    #[error("could not archive {filename}: {detail}")]
    Archive { filename: String, detail: String },

    #[error("relationship type not found: {0}")]
    RelationshipNotFound(String),

    #[error("could not link {from} to {to}: {detail}")]
    Link {
        from: String,
        to: String,
        detail: String,
    },
}

impl TrackerError {
    pub fn is_relationship_not_found(&self) -> bool {
        matches!(self, TrackerError::RelationshipNotFound(_))
    }
}

/// Fatal problems detected before any target is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("no clone targets configured")]
    NoTargets,

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
