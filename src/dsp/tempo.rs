use crate::dsp::stft::{stft, HOP, N_FFT};

const MIN_BPM: f32 = 30.0;
const MAX_BPM: f32 = 300.0;
/// Returned when the input carries no usable onset information.
pub const FALLBACK_BPM: f32 = 120.0;

/// Estimates tempo in BPM from an onset-strength envelope.
///
/// Spectral flux (half-wave-rectified frame-to-frame magnitude increase,
/// averaged over bins) is autocorrelated over the 30-300 BPM lag range and
/// scored with a log-normal prior centered at 120 BPM. Steady or too-short
/// input falls back to 120 BPM.
pub fn estimate_tempo(samples: &[f32], sample_rate: u32) -> f32 {
    let frames = stft(samples, N_FFT, HOP);
    if frames.len() < 3 {
        return FALLBACK_BPM;
    }

    let envelope = onset_envelope(&frames);

    // A steady tone produces no flux; nothing to autocorrelate.
    let mean_flux = envelope.iter().sum::<f32>() / envelope.len() as f32;
    if mean_flux < 1e-3 {
        return FALLBACK_BPM;
    }

    let mean = mean_flux;
    let centered: Vec<f32> = envelope.iter().map(|v| v - mean).collect();

    let frame_rate = sample_rate as f32 / HOP as f32;
    let lag_min = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(1);
    let lag_max = (60.0 * frame_rate / MIN_BPM).ceil() as usize;
    if centered.len() <= lag_min + 1 {
        return FALLBACK_BPM;
    }
    let lag_max = lag_max.min(centered.len() - 1);

    let mut best_lag = 0usize;
    let mut best_score = 0.0_f32;
    for lag in lag_min..=lag_max {
        let n = centered.len() - lag;
        let ac = (0..n).map(|t| centered[t] * centered[t + lag]).sum::<f32>() / n as f32;
        if ac <= 0.0 {
            continue;
        }

        let bpm = 60.0 * frame_rate / lag as f32;
        // Log-normal tempo prior, one octave standard deviation.
        let octaves = (bpm / FALLBACK_BPM).log2();
        let prior = (-0.5 * octaves * octaves).exp();

        let score = ac * prior;
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return FALLBACK_BPM;
    }

    60.0 * frame_rate / best_lag as f32
}

fn onset_envelope(frames: &[Vec<rustfft::num_complex::Complex<f32>>]) -> Vec<f32> {
    let bins = frames[0].len();
    let mut envelope = Vec::with_capacity(frames.len() - 1);

    let mut prev: Vec<f32> = frames[0].iter().map(|c| c.norm()).collect();
    for frame in &frames[1..] {
        let mut flux = 0.0_f32;
        for (k, c) in frame.iter().enumerate() {
            let mag = c.norm();
            let diff = mag - prev[k];
            if diff > 0.0 {
                flux += diff;
            }
            prev[k] = mag;
        }
        envelope.push(flux / bins as f32);
    }

    envelope
}
