//! Error types for routing.

use thiserror::Error;
use waypoint_path::PathError;

/// Router-specific errors.
///
/// Cancel and redirect instructions from lifecycle hooks are values
/// ([`HookOutcome`](crate::HookOutcome)), never errors.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// No route matched the pathname at any depth.
    #[error("page not found ({pathname})")]
    NotFound {
        /// The pathname that was being resolved.
        pathname: String,
    },

    /// The redirect ceiling was exceeded.
    #[error("too many redirects when rendering {from}")]
    TooManyRedirects {
        /// Pathname of the last redirecting navigation.
        from: String,
    },

    /// A route definition is malformed.
    #[error("invalid route config: {0}")]
    InvalidRoute(String),

    /// Two routes share an explicit name.
    #[error("duplicate route with name {0:?}, try setting unique 'name' route properties")]
    DuplicateRouteName(String),

    /// Route name not found.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// Invalid path pattern or reverse-building failure.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A bundle failed to load.
    #[error("bundle not found: {0}. Check if the file name is correct")]
    BundleNotFound(String),

    /// A route action or dynamic children function failed.
    #[error("{0}")]
    Action(String),

    /// A resolved context carried neither an element nor a redirect.
    #[error(
        "invalid route resolution result for path {pathname:?}, expected redirect or element; \
         double check the action return value for the route"
    )]
    InvalidResult {
        /// The pathname that was being resolved.
        pathname: String,
    },

    /// Rendering needed an outlet but none is set.
    #[error("outlet is not set")]
    OutletMissing,

    /// A URL could not be parsed.
    #[error("invalid url {url:?}: {message}")]
    InvalidUrl {
        /// The offending input.
        url: String,
        /// Parser message.
        message: String,
    },

    /// A route table could not be decoded.
    #[error("invalid route table: {0}")]
    InvalidConfig(String),
}

impl RouterError {
    /// Creates an action error from any message.
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }

    /// HTTP-like status code: 404 for unmatched paths, 500 otherwise.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Returns whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let not_found = RouterError::NotFound {
            pathname: "/missing".into(),
        };
        assert_eq!(not_found.code(), 404);
        assert!(not_found.is_not_found());
        assert_eq!(RouterError::action("boom").code(), 500);
    }

    #[test]
    fn test_messages() {
        let err = RouterError::TooManyRedirects { from: "/a".into() };
        assert_eq!(err.to_string(), "too many redirects when rendering /a");
    }
}
