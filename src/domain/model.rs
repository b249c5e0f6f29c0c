use crate::utils::error::{AppError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};

pub const MIN_DESIRED_TEMPO: f32 = 20.0;
pub const MAX_DESIRED_TEMPO: f32 = 400.0;

/// Body of `POST /process-audio`. Absent optional fields mean "leave the
/// audio as analyzed" for that dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub audio_file_url: String,
    pub user_id: String,
    pub audio_file_id: String,
    #[serde(default)]
    pub desired_key: Option<String>,
    #[serde(default)]
    pub desired_tempo: Option<f32>,
}

impl Validate for ProcessRequest {
    fn validate(&self) -> Result<()> {
        match url::Url::parse(&self.audio_file_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(AppError::ValidationError {
                    field: "audio_file_url".to_string(),
                    message: format!("unsupported URL scheme: {}", parsed.scheme()),
                });
            }
            Err(e) => {
                return Err(AppError::ValidationError {
                    field: "audio_file_url".to_string(),
                    message: format!("invalid URL: {}", e),
                });
            }
        }

        validate_key_segment("user_id", &self.user_id)?;
        validate_key_segment("audio_file_id", &self.audio_file_id)?;

        if let Some(tempo) = self.desired_tempo {
            if !tempo.is_finite() || !(MIN_DESIRED_TEMPO..=MAX_DESIRED_TEMPO).contains(&tempo) {
                return Err(AppError::ValidationError {
                    field: "desired_tempo".to_string(),
                    message: format!(
                        "must be between {} and {} BPM",
                        MIN_DESIRED_TEMPO, MAX_DESIRED_TEMPO
                    ),
                });
            }
        }

        Ok(())
    }
}

// user_id and audio_file_id become storage key segments; anything that could
// escape the prefix is rejected up front.
fn validate_key_segment(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError {
            field: field.to_string(),
            message: "cannot be empty".to_string(),
        });
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") || value.contains('\0') {
        return Err(AppError::ValidationError {
            field: field.to_string(),
            message: "cannot contain path separators".to_string(),
        });
    }
    Ok(())
}

/// Decoded audio: mono samples in `[-1, 1]` at a known sample rate.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioAnalysis {
    pub tempo_bpm: f32,
    pub key: String,
}

/// One transcribed note, in seconds relative to clip start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note: u8,
    pub onset_secs: f32,
    pub duration_secs: f32,
    pub velocity: u8,
}

/// Encoded outputs of the render stage, ready for upload.
#[derive(Debug, Clone)]
pub struct RenderedArtifacts {
    pub wav_bytes: Vec<u8>,
    pub midi_bytes: Vec<u8>,
}

/// Response body of `POST /process-audio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedArtifacts {
    pub message: String,
    pub modified_audio_url: String,
    pub midi_url: String,
}
