#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    #[error("JSONBin not configured. Provide bin and access credentials.")]
    NotConfigured,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Remote store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Name required: {0}")]
    NameRequired(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already pending: {0}")]
    MutationPending(String),

    #[error("Failed to {action}: {source}")]
    MutationFailed {
        action: &'static str,
        #[source]
        source: Box<PartyError>,
    },
}

impl PartyError {
    pub(crate) fn unauthorized() -> Self {
        Self::Unauthorized(
            "Authentication failed. Please verify your access key is correct.".into(),
        )
    }

    pub(crate) fn forbidden() -> Self {
        Self::Forbidden(
            "Access forbidden. Please verify your access key is correct and has write permissions."
                .into(),
        )
    }

    pub(crate) fn bin_not_found() -> Self {
        Self::NotFound("Bin not found. Please verify your bin ID is correct.".into())
    }

    /// Whether a remote operation failing with this error is worth retrying.
    ///
    /// Transport failures and unexpected statuses are; credential, payload and
    /// configuration problems will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            PartyError::Http(_) | PartyError::Status { .. } | PartyError::Json(_) => true,
            PartyError::MutationFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Whether the failure is a credential problem the user can fix.
    pub fn is_auth(&self) -> bool {
        match self {
            PartyError::Unauthorized(_) | PartyError::Forbidden(_) => true,
            PartyError::MutationFailed { source, .. } => source.is_auth(),
            _ => false,
        }
    }

    /// The innermost error, unwrapping [`PartyError::MutationFailed`].
    pub fn root(&self) -> &PartyError {
        match self {
            PartyError::MutationFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PartyError>;
