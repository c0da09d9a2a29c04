use std::path::PathBuf;

/// Result type alias for router construction
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while building a router
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    Discovery { path: PathBuf, message: String },
    InvalidOpenApiConfig { field: String, reason: String },
    InvalidControllerOpenApi {
        field: String,
        action: String,
        route: String,
        reason: String,
    },
    ControllerNotFound(PathBuf),
    ParseError { file: PathBuf, message: String },
    InvalidArgument(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::Discovery { path, message } => {
                write!(f, "Cannot discover controllers in {}: {}", path.display(), message)
            }
            Error::InvalidOpenApiConfig { field, reason } => {
                write!(f, "Invalid OpenAPI config: `{}` {}", field, reason)
            }
            Error::InvalidControllerOpenApi {
                field,
                action,
                route,
                reason,
            } => write!(
                f,
                "Invalid `{}` for action `{}` of controller `{}`: {}",
                field, action, route, reason
            ),
            Error::ControllerNotFound(path) => {
                write!(f, "No controller module bound to {}", path.display())
            }
            Error::ParseError { file, message } => {
                write!(f, "Parse error in {}: {}", file.display(), message)
            }
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Discovery {
            path: err.path().map(PathBuf::from).unwrap_or_default(),
            message: err.to_string(),
        }
    }
}
