use std::fmt;

/// Error value carried through a dispatch chain.
///
/// Any layer can push one of these into its continuation with
/// [`Next::fail`](crate::route::Next::fail); from that point normal layers
/// are skipped and only error-handling layers see the request until one of
/// them consumes the error by calling `proceed`.
#[derive(Debug)]
pub enum DispatchError {
    /// Synthesized when dispatch exhausts every route without a match and
    /// without a terminal response.
    NotFound {
        /// Path of the request that nothing answered
        url: String,
    },
    /// An application failure with an explicit HTTP status suggestion.
    Status { status: u16, message: String },
    /// A panic raised synchronously inside a layer, captured by the chain.
    LayerPanic { message: String },
    /// Any other application error.
    Other(anyhow::Error),
}

impl DispatchError {
    /// Status error with an explicit code.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        DispatchError::Status {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status this error suggests to whoever ends up answering.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::Status { status, .. } => *status,
            DispatchError::LayerPanic { .. } | DispatchError::Other(_) => 500,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "layer panicked".to_string()
        };
        DispatchError::LayerPanic { message }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { url } => {
                write!(f, "resource {url:?} not found")
            }
            DispatchError::Status { status, message } => {
                write!(f, "{message} (status {status})")
            }
            DispatchError::LayerPanic { message } => {
                write!(f, "layer panicked: {message}")
            }
            DispatchError::Other(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Other(err)
    }
}

impl From<String> for DispatchError {
    fn from(message: String) -> Self {
        DispatchError::Status {
            status: 500,
            message,
        }
    }
}

impl From<&str> for DispatchError {
    fn from(message: &str) -> Self {
        DispatchError::from(message.to_string())
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Other(err.into())
    }
}
