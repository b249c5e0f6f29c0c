use crate::core::{Pipeline, ProcessRequest, ProcessedArtifacts};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives one request through the pipeline stages with per-stage logging
/// and optional resource monitoring.
pub struct ProcessingEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ProcessingEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self, request: &ProcessRequest) -> Result<ProcessedArtifacts> {
        tracing::info!(
            "🚀 Processing audio {} for user {}",
            request.audio_file_id,
            request.user_id
        );

        let clip = self.pipeline.fetch(request).await?;
        tracing::info!(
            "📥 Fetched {:.2}s of audio at {} Hz",
            clip.duration_secs(),
            clip.sample_rate
        );
        self.monitor.log_stats("Fetch");

        let analysis = self.pipeline.analyze(&clip).await?;
        tracing::info!(
            "🎼 Estimated tempo {:.1} BPM, key {}",
            analysis.tempo_bpm,
            analysis.key
        );
        self.monitor.log_stats("Analyze");

        let artifacts = self.pipeline.render(&clip, &analysis, request).await?;
        tracing::info!(
            "🎛 Rendered {} WAV bytes, {} MIDI bytes",
            artifacts.wav_bytes.len(),
            artifacts.midi_bytes.len()
        );
        self.monitor.log_stats("Render");

        let result = self.pipeline.publish(request, artifacts).await?;
        tracing::info!("✅ Published artifacts for {}", request.audio_file_id);
        self.monitor.log_final_stats();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AudioAnalysis, AudioClip, RenderedArtifacts};
    use crate::utils::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubPipeline {
        fetch_calls: AtomicUsize,
        publish_calls: AtomicUsize,
        fail_fetch: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn fetch(&self, _request: &ProcessRequest) -> Result<AudioClip> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(AppError::DownloadError {
                    status: 404,
                    url: "https://example.com/a.wav".to_string(),
                });
            }
            Ok(AudioClip {
                samples: vec![0.0; 2048],
                sample_rate: 22_050,
            })
        }

        async fn analyze(&self, _clip: &AudioClip) -> Result<AudioAnalysis> {
            Ok(AudioAnalysis {
                tempo_bpm: 120.0,
                key: "C Major".to_string(),
            })
        }

        async fn render(
            &self,
            _clip: &AudioClip,
            _analysis: &AudioAnalysis,
            _request: &ProcessRequest,
        ) -> Result<RenderedArtifacts> {
            Ok(RenderedArtifacts {
                wav_bytes: vec![1],
                midi_bytes: vec![2],
            })
        }

        async fn publish(
            &self,
            _request: &ProcessRequest,
            _artifacts: RenderedArtifacts,
        ) -> Result<ProcessedArtifacts> {
            self.publish_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProcessedArtifacts {
                message: "Audio processed successfully".to_string(),
                modified_audio_url: "mock://audio".to_string(),
                midi_url: "mock://midi".to_string(),
            })
        }
    }

    fn request() -> ProcessRequest {
        ProcessRequest {
            audio_file_url: "https://example.com/a.wav".to_string(),
            user_id: "u".to_string(),
            audio_file_id: "f".to_string(),
            desired_key: None,
            desired_tempo: None,
        }
    }

    #[tokio::test]
    async fn test_runs_all_stages_once() {
        let engine = ProcessingEngine::new(StubPipeline::default());
        let result = engine.run(&request()).await.unwrap();

        assert_eq!(result.message, "Audio processed successfully");
        assert_eq!(engine.pipeline.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.pipeline.publish_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stage_failure_stops_the_run() {
        let engine = ProcessingEngine::new(StubPipeline {
            fail_fetch: true,
            ..StubPipeline::default()
        });

        let err = engine.run(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::DownloadError { .. }));
        assert_eq!(engine.pipeline.publish_calls.load(Ordering::SeqCst), 0);
    }
}
