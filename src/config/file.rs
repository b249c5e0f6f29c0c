use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file. Every field is optional; the loader in
/// `config::ServerConfig` fills gaps from environment variables and
/// defaults, and CLI flags override everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerSection>,
    pub storage: Option<StorageSection>,
    pub audio: Option<AudioSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub workers: Option<usize>,
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub audio_bucket: Option<String>,
    pub midi_bucket: Option<String>,
    pub local_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioSection {
    pub processing_sample_rate: Option<u32>,
    pub max_download_mb: Option<usize>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::InvalidConfigValueError {
            field: "config_file".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` with the environment value; unset variables
    /// are left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
port = 9000
workers = 8
log_format = "json"

[storage]
supabase_url = "https://proj.supabase.co"
supabase_key = "service-key"
audio_bucket = "processed-audio"
midi_bucket = "processed-midi"

[audio]
processing_sample_rate = 22050
max_download_mb = 25
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.as_ref().unwrap().port, Some(9000));
        assert_eq!(config.server.as_ref().unwrap().workers, Some(8));
        assert_eq!(
            config.storage.as_ref().unwrap().supabase_url.as_deref(),
            Some("https://proj.supabase.co")
        );
        assert_eq!(
            config.audio.as_ref().unwrap().max_download_mb,
            Some(25)
        );
    }

    #[test]
    fn test_all_sections_optional() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.server.is_none());
        assert!(config.storage.is_none());
        assert!(config.audio.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REPITCH_TEST_SUPABASE_URL", "https://sub.supabase.co");

        let toml_content = r#"
[storage]
supabase_url = "${REPITCH_TEST_SUPABASE_URL}"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.storage.unwrap().supabase_url.as_deref(),
            Some("https://sub.supabase.co")
        );

        std::env::remove_var("REPITCH_TEST_SUPABASE_URL");
    }

    #[test]
    fn test_unset_env_var_left_in_place() {
        let toml_content = r#"
[storage]
supabase_key = "${REPITCH_TEST_UNSET_VAR}"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.storage.unwrap().supabase_key.as_deref(),
            Some("${REPITCH_TEST_UNSET_VAR}")
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(FileConfig::from_toml_str("[server\nport=1").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 8081\n")
            .unwrap();

        let config = FileConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.unwrap().port, Some(8081));
    }
}
