use crate::core::{
    AudioAnalysis, AudioClip, ConfigProvider, Pipeline, ProcessRequest, ProcessedArtifacts,
    RenderedArtifacts, Storage,
};
use crate::dsp;
use crate::utils::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;

/// The production pipeline: HTTP fetch, DSP analysis and rendering, then
/// upload through the storage port. All CPU-heavy work runs on the blocking
/// pool so the request loop stays responsive.
pub struct AudioPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> AudioPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    fn audio_key(&self, request: &ProcessRequest) -> String {
        format!(
            "{}/{}/processed_audio/modified_{}.wav",
            self.config.audio_bucket(),
            request.user_id,
            request.audio_file_id
        )
    }

    fn midi_key(&self, request: &ProcessRequest) -> String {
        format!(
            "{}/{}/processed_midi/midi_{}.mid",
            self.config.midi_bucket(),
            request.user_id,
            request.audio_file_id
        )
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::ProcessingError {
            message: format!("worker task failed: {}", e),
        })?
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AudioPipeline<S, C> {
    async fn fetch(&self, request: &ProcessRequest) -> Result<AudioClip> {
        tracing::debug!("Downloading source audio from: {}", request.audio_file_url);
        let mut response = self
            .client
            .get(&request.audio_file_url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs()))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Source response status: {}", status);
        if !status.is_success() {
            return Err(AppError::DownloadError {
                status: status.as_u16(),
                url: request.audio_file_url.clone(),
            });
        }

        let limit = self.config.max_download_bytes();
        if let Some(length) = response.content_length() {
            if length as usize > limit {
                return Err(AppError::TooLargeError { limit_bytes: limit });
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if data.len() + chunk.len() > limit {
                return Err(AppError::TooLargeError { limit_bytes: limit });
            }
            data.extend_from_slice(&chunk);
        }
        tracing::debug!("Downloaded {} bytes", data.len());

        let target_rate = self.config.processing_sample_rate();
        run_blocking(move || {
            let decoded = dsp::wav::decode_wav(&data)?;
            if decoded.sample_rate == target_rate {
                return Ok(decoded);
            }
            let samples = dsp::resample::resample(&decoded.samples, decoded.sample_rate, target_rate);
            Ok(AudioClip {
                samples,
                sample_rate: target_rate,
            })
        })
        .await
    }

    async fn analyze(&self, clip: &AudioClip) -> Result<AudioAnalysis> {
        let samples = clip.samples.clone();
        let sample_rate = clip.sample_rate;

        run_blocking(move || {
            let tempo_bpm = dsp::tempo::estimate_tempo(&samples, sample_rate);
            let key = dsp::key::estimate_key(&samples, sample_rate);
            Ok(AudioAnalysis { tempo_bpm, key })
        })
        .await
    }

    async fn render(
        &self,
        clip: &AudioClip,
        analysis: &AudioAnalysis,
        request: &ProcessRequest,
    ) -> Result<RenderedArtifacts> {
        let samples = clip.samples.clone();
        let sample_rate = clip.sample_rate;
        let analysis = analysis.clone();
        let desired_tempo = request.desired_tempo;
        let desired_key = request.desired_key.clone();

        run_blocking(move || {
            let mut modified = samples.clone();

            if let Some(tempo) = desired_tempo {
                // Treat near-equal tempi as "already there".
                if (tempo - analysis.tempo_bpm).abs() / analysis.tempo_bpm > 1e-3 {
                    let rate = tempo / analysis.tempo_bpm;
                    tracing::debug!("Stretching by rate {:.3}", rate);
                    modified = dsp::stretch::time_stretch(&modified, rate);
                }
            }

            if let Some(key) = desired_key.as_deref() {
                if !key.is_empty() && key != analysis.key {
                    let steps = dsp::key::semitone_shift(&analysis.key, key);
                    tracing::debug!("Shifting pitch by {} semitones", steps);
                    modified = dsp::pitch::pitch_shift(&modified, steps as f32);
                }
            }

            // Transcription reads the source clip, not the modified one.
            let notes = dsp::transcribe::transcribe(&samples, sample_rate);
            tracing::debug!("Transcribed {} note events", notes.len());
            let midi_bytes = dsp::midi::encode_midi(&notes, analysis.tempo_bpm)?;
            let wav_bytes = dsp::wav::encode_wav_mono(&modified, sample_rate)?;

            Ok(RenderedArtifacts {
                wav_bytes,
                midi_bytes,
            })
        })
        .await
    }

    async fn publish(
        &self,
        request: &ProcessRequest,
        artifacts: RenderedArtifacts,
    ) -> Result<ProcessedArtifacts> {
        let audio_key = self.audio_key(request);
        let midi_key = self.midi_key(request);

        tracing::debug!(
            "Uploading {} bytes to {}",
            artifacts.wav_bytes.len(),
            audio_key
        );
        self.storage
            .write_file(&audio_key, &artifacts.wav_bytes)
            .await?;

        tracing::debug!(
            "Uploading {} bytes to {}",
            artifacts.midi_bytes.len(),
            midi_key
        );
        self.storage
            .write_file(&midi_key, &artifacts.midi_bytes)
            .await?;

        Ok(ProcessedArtifacts {
            message: "Audio processed successfully".to_string(),
            modified_audio_url: self.storage.public_url(&audio_key),
            midi_url: self.storage.public_url(&midi_key),
        })
    }
}
