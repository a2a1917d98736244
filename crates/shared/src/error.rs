use thiserror::Error;

/// Failures talking to the extraction backend that are not reported in a JSON body.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned status {status} for {path}")]
    Status { path: &'static str, status: u16 },
    #[error("backend unreachable at {path}: {message}")]
    Transport { path: &'static str, message: String },
    #[error("malformed response from {path}: {message}")]
    Malformed { path: &'static str, message: String },
}

impl BackendError {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Status { path, .. }
            | Self::Transport { path, .. }
            | Self::Malformed { path, .. } => *path,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
