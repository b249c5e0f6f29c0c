use crate::domain::model::AudioClip;
use crate::utils::error::{AppError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// Decodes a WAV payload into a mono clip. Integer PCM (8/16/24/32 bit) and
/// 32-bit float are accepted; multi-channel input is averaged down to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(|e| AppError::DecodeError {
        reason: format!("unsupported or corrupt audio container: {}", e),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AppError::DecodeError {
            reason: "WAV header declares zero channels".to_string(),
        });
    }
    if spec.sample_rate == 0 {
        return Err(AppError::DecodeError {
            reason: "WAV header declares a zero sample rate".to_string(),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
    };

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if samples.is_empty() {
        return Err(AppError::DecodeError {
            reason: "WAV file contains no samples".to_string(),
        });
    }

    Ok(AudioClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Encodes mono samples as 16-bit PCM WAV. Values outside `[-1, 1]` are
/// clamped rather than wrapped.
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
