//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so a bare `$` is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        std::env::var(var).map(Some).map_err(|_| LookupError {
            var_name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("LORE_TEST_EXPAND_SIMPLE", "/srv/lore");
        }
        let result = expand_env("${LORE_TEST_EXPAND_SIMPLE}", "storage.data_dir").unwrap();
        assert_eq!(result, "/srv/lore");
        unsafe {
            std::env::remove_var("LORE_TEST_EXPAND_SIMPLE");
        }
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("LORE_TEST_EXPAND_HOME", "/home/scribe");
        }
        let result = expand_env("${LORE_TEST_EXPAND_HOME}/lore/data", "storage.data_dir").unwrap();
        assert_eq!(result, "/home/scribe/lore/data");
        unsafe {
            std::env::remove_var("LORE_TEST_EXPAND_HOME");
        }
    }

    #[test]
    fn test_expand_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LORE_TEST_EXPAND_UNSET");
        }
        let result = expand_env("${LORE_TEST_EXPAND_UNSET:-data}", "storage.data_dir").unwrap();
        assert_eq!(result, "data");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("LORE_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${LORE_TEST_EXPAND_MISSING}", "storage.data_dir").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("LORE_TEST_EXPAND_MISSING"));
        assert!(err.to_string().contains("storage.data_dir"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("data/$archive", "storage.data_dir").unwrap();
        assert_eq!(result, "data/$archive");
    }
}
