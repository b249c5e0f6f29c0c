pub mod file;

pub use file::FileConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    validate_bucket_name, validate_positive_number, validate_range, validate_url, Validate,
};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_AUDIO_BUCKET: &str = "processed-audio";
const DEFAULT_MIDI_BUCKET: &str = "processed-midi";
const DEFAULT_SAMPLE_RATE: u32 = 22_050;
const DEFAULT_MAX_DOWNLOAD_MB: usize = 50;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Parser)]
#[command(name = "repitch")]
#[command(about = "Audio processing service: tempo/key adjustment plus MIDI transcription")]
pub struct CliArgs {
    #[arg(long, help = "TOML config file; environment and flags override it")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Listen port (env: PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Worker threads and max concurrent jobs (env: WORKERS)")]
    pub workers: Option<usize>,

    #[arg(long, help = "Store uploads under a local directory instead of Supabase")]
    pub local_storage: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "compact" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::InvalidConfigValueError {
                field: "log_format".to_string(),
                value: other.to_string(),
                reason: "expected \"text\" or \"json\"".to_string(),
            }),
        }
    }
}

/// Where processed artifacts go.
#[derive(Debug, Clone)]
pub enum StorageMode {
    Supabase { url: String, service_key: String },
    Local { base_path: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub workers: usize,
    pub storage: StorageMode,
    pub audio_bucket: String,
    pub midi_bucket: String,
    pub processing_sample_rate: u32,
    pub max_download_bytes: usize,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Resolves the effective configuration: defaults, then the optional
    /// TOML file, then environment variables, then CLI flags.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let server = file.server.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let audio = file.audio.unwrap_or_default();

        let port = args
            .port
            .or(parse_env::<u16>("PORT")?)
            .or(server.port)
            .unwrap_or(DEFAULT_PORT);
        let workers = args
            .workers
            .or(parse_env::<usize>("WORKERS")?)
            .or(server.workers)
            .unwrap_or(DEFAULT_WORKERS);

        let log_format = match env_var("LOG_FORMAT").or(server.log_format) {
            Some(raw) => raw.parse()?,
            None => LogFormat::Text,
        };

        let local_dir = args
            .local_storage
            .clone()
            .or(env_var("LOCAL_STORAGE_DIR"))
            .or(storage.local_dir);
        let storage_mode = match local_dir {
            Some(base_path) => StorageMode::Local { base_path },
            None => {
                let url = env_var("SUPABASE_URL").or(storage.supabase_url).ok_or(
                    AppError::MissingConfigError {
                        field: "SUPABASE_URL".to_string(),
                    },
                )?;
                let service_key = env_var("SUPABASE_KEY").or(storage.supabase_key).ok_or(
                    AppError::MissingConfigError {
                        field: "SUPABASE_KEY".to_string(),
                    },
                )?;
                StorageMode::Supabase { url, service_key }
            }
        };

        Ok(Self {
            port,
            workers,
            storage: storage_mode,
            audio_bucket: env_var("AUDIO_BUCKET")
                .or(storage.audio_bucket)
                .unwrap_or_else(|| DEFAULT_AUDIO_BUCKET.to_string()),
            midi_bucket: env_var("MIDI_BUCKET")
                .or(storage.midi_bucket)
                .unwrap_or_else(|| DEFAULT_MIDI_BUCKET.to_string()),
            processing_sample_rate: audio.processing_sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            max_download_bytes: audio.max_download_mb.unwrap_or(DEFAULT_MAX_DOWNLOAD_MB)
                * 1024
                * 1024,
            request_timeout_secs: audio
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_format,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::InvalidConfigValueError {
                field: name.to_string(),
                value: raw,
                reason: "not a valid number".to_string(),
            }),
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("port", self.port as usize, 1)?;
        validate_positive_number("workers", self.workers, 1)?;
        validate_range("workers", self.workers, 1, 64)?;

        validate_bucket_name("audio_bucket", &self.audio_bucket)?;
        validate_bucket_name("midi_bucket", &self.midi_bucket)?;

        match &self.storage {
            StorageMode::Supabase { url, service_key } => {
                validate_url("SUPABASE_URL", url)?;
                if service_key.trim().is_empty() {
                    return Err(AppError::MissingConfigError {
                        field: "SUPABASE_KEY".to_string(),
                    });
                }
            }
            StorageMode::Local { base_path } => {
                crate::utils::validation::validate_path("local_storage", base_path)?;
            }
        }

        validate_range(
            "processing_sample_rate",
            self.processing_sample_rate,
            8_000,
            192_000,
        )?;
        validate_positive_number("max_download_bytes", self.max_download_bytes, 1)?;
        validate_positive_number("request_timeout_secs", self.request_timeout_secs as usize, 1)?;

        tracing::info!("✅ Server configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for ServerConfig {
    fn audio_bucket(&self) -> &str {
        &self.audio_bucket
    }

    fn midi_bucket(&self) -> &str {
        &self.midi_bucket
    }

    fn processing_sample_rate(&self) -> u32 {
        self.processing_sample_rate
    }

    fn max_download_bytes(&self) -> usize {
        self.max_download_bytes
    }

    fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }
}
