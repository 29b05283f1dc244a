//! Logging setup and formatting helpers

use std::fmt::Debug;

use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `filter` applies. Returns `false` when
/// a global subscriber was already installed, which is not an error.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}

/// Wrapper for pretty-printing types in logs as YAML
///
/// ```ignore
/// use folio::Pretty;
/// use tracing::debug;
///
/// debug!("lookup map: {}", Pretty(&installed.lookup));
/// ```
///
/// Outputs YAML with a leading newline, falling back to `Debug` if YAML
/// serialization fails.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
