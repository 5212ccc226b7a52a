use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".pipeshrc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub log_filter: String,
    pub env_vars: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "$ ".to_string(),
            log_filter: "warn".to_string(),
            env_vars: HashMap::new(),
        }
    }

    /// The file to read: `explicit` if given, else `~/.pipeshrc` when it exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_FILE))
            .filter(|path| path.is_file())
    }

    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        match Self::locate(explicit) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default_config()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (idx, line) in src.lines().enumerate() {
            let lineno = idx + 1;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: lineno,
                    message: format!("no '=' found: {}", line),
                });
            };
            // Values are kept verbatim so a prompt can end in a space.
            match key.trim() {
                "prompt" => config.prompt = value.to_string(),
                "log_filter" => config.log_filter = value.trim().to_string(),
                k if k.starts_with("env.") => {
                    let var = k.trim_start_matches("env.");
                    if var.is_empty() {
                        return Err(ConfigError::Parse {
                            line: lineno,
                            message: "empty variable name".to_string(),
                        });
                    }
                    config.env_vars.insert(var.to_string(), value.to_string());
                }
                k => {
                    return Err(ConfigError::Parse {
                        line: lineno,
                        message: format!("unknown key: {}", k),
                    })
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_source() {
        assert_eq!(ConfigLoader::load_from_str("").unwrap(), ConfigLoader::default_config());
    }

    #[test]
    fn test_parse_all_keys() {
        let src = "# comment\n\nprompt=pipesh> \nlog_filter = debug\nenv.EDITOR=vi\n";
        let config = ConfigLoader::load_from_str(src).unwrap();
        assert_eq!(config.prompt, "pipesh> ");
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.env_vars.get("EDITOR").map(String::as_str), Some("vi"));
    }

    #[test]
    fn test_unknown_key_reports_line() {
        let err = ConfigLoader::load_from_str("prompt=$ \nhistory_max=5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_equals() {
        let err = ConfigLoader::load_from_str("prompt\n").unwrap_err();
        assert_eq!(err.to_string(), "config line 1: no '=' found: prompt");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        fs::write(&path, "prompt=> \n").unwrap();
        assert_eq!(ConfigLoader::load(Some(&path)).unwrap().prompt, "> ");

        let missing = dir.path().join("missing");
        assert!(matches!(ConfigLoader::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }
}
