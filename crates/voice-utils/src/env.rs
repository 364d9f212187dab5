//! Environment variable helpers used when loading configuration

use std::str::FromStr;

/// Read an environment variable, treating unset and blank values the same
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse an environment variable
///
/// Unparseable values are ignored (with a warning) rather than treated as fatal.
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_var(name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable environment value");
            None
        },
    }
}

/// Read a comma separated environment variable into its non-empty items
pub fn env_list(name: &str) -> Vec<String> {
    env_var(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_none() {
        assert_eq!(env_var("VOICE_UTILS_TEST_SURELY_UNSET"), None);
        assert_eq!(env_parse::<u64>("VOICE_UTILS_TEST_SURELY_UNSET"), None);
        assert!(env_list("VOICE_UTILS_TEST_SURELY_UNSET").is_empty());
    }
}
