use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::compiler::CompileOptions;
use crate::ItlError;

pub const CONFIG_FILE_NAME: &str = "itl.toml";

/// Contents of an `itl.toml`. Every table and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItlToml {
    #[serde(default)]
    pub compile: CompileOptions,
}

pub fn read_itl_toml(path: &Path) -> Result<ItlToml, ItlError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|err| ItlError::Config(format!("failed to parse {}: {err}", path.display())))
}

pub fn parse_itl_toml(text: &str) -> Result<ItlToml, ItlError> {
    toml::from_str(text).map_err(|err| ItlError::Config(format!("failed to parse config: {err}")))
}

/// Nearest `itl.toml` in `start` or one of its ancestors.
pub fn find_itl_toml(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        let Some(parent) = dir.parent() else {
            return None;
        };
        dir = parent.to_path_buf();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Dialect;

    #[test]
    fn missing_tables_fall_back_to_defaults() {
        let config = parse_itl_toml("").expect("empty config");
        assert_eq!(config, ItlToml::default());
        assert_eq!(config.compile.dialect, Dialect::Standard);
        assert!(!config.compile.allow_unterminated_function_calls);
    }

    #[test]
    fn compile_table_sets_both_switches() {
        let config = parse_itl_toml(
            "[compile]\ndialect = \"single_function\"\nallow_unterminated_function_calls = true\n",
        )
        .expect("valid config");
        assert_eq!(config.compile.dialect, Dialect::SingleFunction);
        assert!(config.compile.allow_unterminated_function_calls);
    }

    #[test]
    fn misspelled_compile_switch_is_rejected() {
        let err = parse_itl_toml("[compile]\nallow_unterminated = true\n").unwrap_err();
        assert!(
            matches!(&err, ItlError::Config(message) if message.contains("allow_unterminated")),
            "{err}"
        );
    }

    #[test]
    fn unknown_dialect_is_a_config_error() {
        let err = parse_itl_toml("[compile]\ndialect = \"fancy\"\n").unwrap_err();
        assert!(matches!(err, ItlError::Config(message) if message.contains("fancy")));
    }
}
