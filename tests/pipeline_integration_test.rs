use anyhow::Result;
use httpmock::prelude::*;
use repitch::config::{LogFormat, StorageMode};
use repitch::core::ProcessRequest;
use repitch::utils::error::AppError;
use repitch::{AudioPipeline, LocalStorage, ProcessingEngine, ServerConfig};
use tempfile::TempDir;

fn test_config(base_path: &str) -> ServerConfig {
    ServerConfig {
        port: 0,
        workers: 2,
        storage: StorageMode::Local {
            base_path: base_path.to_string(),
        },
        audio_bucket: "processed-audio".to_string(),
        midi_bucket: "processed-midi".to_string(),
        processing_sample_rate: 22_050,
        max_download_bytes: 50 * 1024 * 1024,
        request_timeout_secs: 5,
        log_format: LogFormat::Text,
    }
}

/// A tone sitting exactly on an FFT bin, so analysis is deterministic.
fn steady_tone_wav(duration_secs: f32) -> Vec<u8> {
    let sample_rate = 22_050u32;
    let freq = 32.0 * sample_rate as f32 / 2048.0;
    let n = (duration_secs * sample_rate as f32) as usize;
    let samples: Vec<f32> = (0..n)
        .map(|i| {
            0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
        })
        .collect();
    repitch::dsp::wav::encode_wav_mono(&samples, sample_rate).unwrap()
}

fn request_for(url: String) -> ProcessRequest {
    ProcessRequest {
        audio_file_url: url,
        user_id: "user-1".to_string(),
        audio_file_id: "clip-1".to_string(),
        desired_key: None,
        desired_tempo: None,
    }
}

#[tokio::test]
async fn test_end_to_end_processing_with_tempo_change() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let wav_body = steady_tone_wav(2.0);
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/audio/test.wav");
        then.status(200)
            .header("Content-Type", "audio/wav")
            .body(wav_body.clone());
    });

    let storage = LocalStorage::new(base_path.clone());
    let pipeline = AudioPipeline::new(storage, test_config(&base_path));
    let engine = ProcessingEngine::new(pipeline);

    let mut request = request_for(server.url("/audio/test.wav"));
    request.desired_tempo = Some(60.0);

    let artifacts = engine.run(&request).await?;
    api_mock.assert();

    assert_eq!(artifacts.message, "Audio processed successfully");
    assert!(artifacts
        .modified_audio_url
        .ends_with("processed-audio/user-1/processed_audio/modified_clip-1.wav"));
    assert!(artifacts
        .midi_url
        .ends_with("processed-midi/user-1/processed_midi/midi_clip-1.mid"));

    // The steady tone falls back to 120 BPM, so 60 BPM doubles the length.
    let wav_path = temp_dir
        .path()
        .join("processed-audio/user-1/processed_audio/modified_clip-1.wav");
    assert!(wav_path.exists());
    let written = std::fs::read(&wav_path)?;
    let clip = repitch::dsp::wav::decode_wav(&written)?;
    assert_eq!(clip.sample_rate, 22_050);
    assert_eq!(clip.samples.len(), 2 * 44_100);

    let midi_path = temp_dir
        .path()
        .join("processed-midi/user-1/processed_midi/midi_clip-1.mid");
    assert!(midi_path.exists());
    let midi_bytes = std::fs::read(&midi_path)?;
    assert_eq!(&midi_bytes[..4], b"MThd");

    // The tone is one sustained pitch, which the transcriber should report.
    let smf = midly::Smf::parse(&midi_bytes)?;
    let note_ons = smf.tracks[0]
        .iter()
        .filter(|event| {
            matches!(
                event.kind,
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOn { .. },
                    ..
                }
            )
        })
        .count();
    assert!(note_ons >= 1);

    Ok(())
}

#[tokio::test]
async fn test_no_adjustments_keeps_audio_length() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let wav_body = steady_tone_wav(1.0);
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/audio/plain.wav");
        then.status(200)
            .header("Content-Type", "audio/wav")
            .body(wav_body.clone());
    });

    let storage = LocalStorage::new(base_path.clone());
    let pipeline = AudioPipeline::new(storage, test_config(&base_path));
    let engine = ProcessingEngine::new(pipeline);

    let mut request = request_for(server.url("/audio/plain.wav"));
    request.audio_file_id = "clip-2".to_string();

    let artifacts = engine.run(&request).await?;
    api_mock.assert();
    assert_eq!(artifacts.message, "Audio processed successfully");

    let wav_path = temp_dir
        .path()
        .join("processed-audio/user-1/processed_audio/modified_clip-2.wav");
    let written = std::fs::read(&wav_path)?;
    let clip = repitch::dsp::wav::decode_wav(&written)?;
    assert_eq!(clip.samples.len(), 22_050);

    Ok(())
}

#[tokio::test]
async fn test_missing_source_fails_with_download_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/audio/missing.wav");
        then.status(404);
    });

    let storage = LocalStorage::new(base_path.clone());
    let pipeline = AudioPipeline::new(storage, test_config(&base_path));
    let engine = ProcessingEngine::new(pipeline);

    let request = request_for(server.url("/audio/missing.wav"));
    let err = engine.run(&request).await.unwrap_err();
    api_mock.assert();

    assert!(matches!(err, AppError::DownloadError { status: 404, .. }));

    // Nothing should have been published.
    let audio_dir = temp_dir.path().join("processed-audio");
    assert!(!audio_dir.exists());

    Ok(())
}

#[tokio::test]
async fn test_monitoring_enabled_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let wav_body = steady_tone_wav(0.5);
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/audio/short.wav");
        then.status(200)
            .header("Content-Type", "audio/wav")
            .body(wav_body.clone());
    });

    let storage = LocalStorage::new(base_path.clone());
    let pipeline = AudioPipeline::new(storage, test_config(&base_path));
    let engine = ProcessingEngine::new_with_monitoring(pipeline, true);

    let mut request = request_for(server.url("/audio/short.wav"));
    request.audio_file_id = "clip-3".to_string();

    let artifacts = engine.run(&request).await?;
    api_mock.assert();
    assert_eq!(artifacts.message, "Audio processed successfully");

    Ok(())
}
