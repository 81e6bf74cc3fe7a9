//! Environment configuration helpers
//!
//! These are only meant to be called while building a configuration object
//! at startup. Components receive the finished configuration and never read
//! the environment themselves.

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Load a `.env` file from the working directory or one of its parents.
///
/// Returns the path of the loaded file. Callers log it once tracing is up.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load a specific env file; `None` when it is missing or malformed.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    dotenvy::from_path(path).ok().map(|()| path.to_path_buf())
}

/// Read a non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable.
///
/// Unset variables yield `Ok(None)`; values that fail to parse yield an
/// error message naming the variable.
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, String> {
    match env_opt(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{key} has an invalid value: {raw}")),
    }
}

/// Read a boolean flag (`1`, `true`, `yes`, `on`, case-insensitive).
pub fn env_flag(key: &str) -> bool {
    env_opt(key).is_some_and(|v| {
        matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse() {
        // SAFETY: test-local variable names, no other test touches them
        unsafe {
            std::env::set_var("AGENT_UTILS_TEST_NUM", "42");
            std::env::set_var("AGENT_UTILS_TEST_BAD", "forty-two");
        }

        assert_eq!(env_parse::<u32>("AGENT_UTILS_TEST_NUM"), Ok(Some(42)));
        assert!(env_parse::<u32>("AGENT_UTILS_TEST_BAD").is_err());
        assert_eq!(env_parse::<u32>("AGENT_UTILS_TEST_UNSET"), Ok(None));

        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_NUM");
            std::env::remove_var("AGENT_UTILS_TEST_BAD");
        }
    }

    #[test]
    fn test_env_opt_ignores_blank() {
        unsafe {
            std::env::set_var("AGENT_UTILS_TEST_BLANK", "   ");
        }
        assert_eq!(env_opt("AGENT_UTILS_TEST_BLANK"), None);
        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_BLANK");
        }
    }

    #[test]
    fn test_env_flag() {
        unsafe {
            std::env::set_var("AGENT_UTILS_TEST_FLAG", "Yes");
        }
        assert!(env_flag("AGENT_UTILS_TEST_FLAG"));
        assert!(!env_flag("AGENT_UTILS_TEST_FLAG_UNSET"));
        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_FLAG");
        }
    }

    #[test]
    fn test_load_dotenv_from_file() {
        let path = std::env::temp_dir().join(format!("agent-utils-{}.env", std::process::id()));
        std::fs::write(&path, "AGENT_UTILS_TEST_DOTENV=loaded\n").unwrap();

        assert_eq!(load_dotenv_from(&path), Some(path.clone()));
        assert_eq!(env_opt("AGENT_UTILS_TEST_DOTENV").as_deref(), Some("loaded"));
        assert_eq!(load_dotenv_from(path.with_extension("missing")), None);

        std::fs::remove_file(&path).unwrap();
        unsafe {
            std::env::remove_var("AGENT_UTILS_TEST_DOTENV");
        }
    }
}
