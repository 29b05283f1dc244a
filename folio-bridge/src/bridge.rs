//! The storage contract the engine depends on

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};

use crate::error::{BridgeError, Result};

/// Glob semantics shared by every bridge: `*` stays within one path segment,
/// `**` spans any number of them.
pub const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Narrow storage interface over opaque, forward-slash separated paths.
///
/// Implementations provide last-writer-wins semantics; the engine layers any
/// stronger consistency on top.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Read the text stored at `path`; [`BridgeError::NotFound`] if absent.
    async fn get(&self, path: &str) -> Result<String>;

    /// Store `contents` at `path`, replacing what was there.
    async fn put(&self, path: &str, contents: &str) -> Result<()>;

    /// Every stored path matching `pattern`, sorted.
    async fn glob(&self, pattern: &str) -> Result<Vec<String>>;

    /// Remove the entry at `path`; [`BridgeError::NotFound`] if absent.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Whether `path` names a stored entry or a directory holding entries.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Reject paths that are empty, absolute, or climb with `..`.
pub fn validate_path(path: &str) -> Result<&str> {
    let trimmed = path.trim_end_matches('/');
    let invalid = trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.contains('\\')
        || trimmed.split('/').any(|seg| seg.is_empty() || seg == "..");
    if invalid {
        return Err(BridgeError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(trimmed)
}

pub fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| BridgeError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("content/posts/a.md", true)]
    #[case("content/posts/", true)]
    #[case("", false)]
    #[case("/etc/passwd", false)]
    #[case("content/../secret", false)]
    #[case("content//a.md", false)]
    fn validate_path_cases(#[case] path: &str, #[case] ok: bool) {
        assert_eq!(validate_path(path).is_ok(), ok, "{path}");
    }

    #[rstest]
    #[case("content/posts/**/*.md", "content/posts/a.md", true)]
    #[case("content/posts/**/*.md", "content/posts/2024/a.md", true)]
    #[case("content/posts/*.md", "content/posts/2024/a.md", false)]
    #[case("content/posts/**/*.md", "content/postsx/a.md", false)]
    #[case("content/posts/**/*.md", "content/posts/a.json", false)]
    fn match_options(#[case] pattern: &str, #[case] path: &str, #[case] matched: bool) {
        let pattern = compile_pattern(pattern).unwrap();
        assert_eq!(pattern.matches_with(path, MATCH_OPTIONS), matched);
    }

    #[test]
    fn bad_pattern() {
        assert!(matches!(
            compile_pattern("content/[a"),
            Err(BridgeError::Pattern { .. })
        ));
    }
}
