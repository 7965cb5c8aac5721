//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Bare `$VAR` syntax is left alone. An unset variable without a default is
/// reported against `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar {
            name: var.to_owned(),
        })
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.name),
    })
}

struct UnsetVar {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MMDR_TEST_SIMPLE", "mmdc");
        }
        let result = expand_env("${MMDR_TEST_SIMPLE}", "renderer.command").unwrap();
        assert_eq!(result, "mmdc");
        unsafe {
            std::env::remove_var("MMDR_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MMDR_TEST_UNSET");
        }
        let result = expand_env("${MMDR_TEST_UNSET:-https://kroki.io}", "renderer.kroki_url")
            .unwrap();
        assert_eq!(result, "https://kroki.io");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MMDR_TEST_HOST", "kroki.internal");
        }
        let result = expand_env("http://${MMDR_TEST_HOST}:8000", "renderer.kroki_url").unwrap();
        assert_eq!(result, "http://kroki.internal:8000");
        unsafe {
            std::env::remove_var("MMDR_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MMDR_TEST_MISSING");
        }
        let err = expand_env("${MMDR_TEST_MISSING}", "renderer.kroki_url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("MMDR_TEST_MISSING"));
        assert!(msg.contains("renderer.kroki_url"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("/opt/$HOME/mmdc", "renderer.command").unwrap();
        assert_eq!(result, "/opt/$HOME/mmdc");
    }
}
