use anyhow::Result;
use httpmock::prelude::*;
use repitch::config::{LogFormat, StorageMode};
use repitch::{
    build_router, AppState, AudioPipeline, LocalStorage, ProcessingEngine, ServerConfig,
};
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

/// Binds an ephemeral port, serves the real router on it, and returns the
/// base URL.
async fn spawn_server(base_path: &str) -> Result<String> {
    let storage = LocalStorage::new(base_path.to_string());
    let pipeline = AudioPipeline::new(storage, test_config(base_path));
    let engine = ProcessingEngine::new(pipeline);
    let state = AppState::new(engine, 2);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok(format!("http://{}", addr))
}

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

#[tokio::test]
async fn test_process_audio_endpoint_happy_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let source = MockServer::start();
    let wav_body = steady_tone_wav(1.0);
    let source_mock = source.mock(|when, then| {
        when.method(GET).path("/songs/take1.wav");
        then.status(200)
            .header("Content-Type", "audio/wav")
            .body(wav_body.clone());
    });

    let base_url = spawn_server(&base_path).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/process-audio", base_url))
        .json(&serde_json::json!({
            "audio_file_url": source.url("/songs/take1.wav"),
            "user_id": "user-7",
            "audio_file_id": "take-1",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    source_mock.assert();

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["message"], "Audio processed successfully");
    assert!(body["modified_audio_url"]
        .as_str()
        .unwrap()
        .ends_with("processed-audio/user-7/processed_audio/modified_take-1.wav"));
    assert!(body["midi_url"]
        .as_str()
        .unwrap()
        .ends_with("processed-midi/user-7/processed_midi/midi_take-1.mid"));

    let wav_path = temp_dir
        .path()
        .join("processed-audio/user-7/processed_audio/modified_take-1.wav");
    assert!(wav_path.exists());

    Ok(())
}

#[tokio::test]
async fn test_process_audio_unreachable_source_is_bad_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let source = MockServer::start();
    source.mock(|when, then| {
        when.method(GET).path("/songs/gone.wav");
        then.status(404);
    });

    let base_url = spawn_server(&base_path).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/process-audio", base_url))
        .json(&serde_json::json!({
            "audio_file_url": source.url("/songs/gone.wav"),
            "user_id": "user-7",
            "audio_file_id": "take-2",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"], "Failed to download audio file");

    Ok(())
}

#[tokio::test]
async fn test_process_audio_rejects_invalid_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let base_url = spawn_server(&base_path).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/process-audio", base_url))
        .json(&serde_json::json!({
            "audio_file_url": "https://example.com/a.wav",
            "user_id": "",
            "audio_file_id": "take-3",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await?;
    assert!(body["error"].as_str().unwrap().contains("user_id"));

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path().to_str().unwrap().to_string();

    let base_url = spawn_server(&base_path).await?;

    let response = reqwest::get(format!("{}/health", base_url)).await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_secs"].is_u64());

    Ok(())
}
