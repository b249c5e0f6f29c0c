use crate::dsp::stft::{istft, stft, HOP, N_FFT};
use rustfft::num_complex::Complex;

/// Stretches time by `rate` without changing pitch: `rate > 1` speeds up
/// (shorter output), `rate < 1` slows down. Output length is
/// `round(len / rate)`.
///
/// Phase vocoder: synthesis frames are read from the analysis frames at
/// `rate`-spaced positions, magnitudes linearly interpolated, phases
/// accumulated from per-bin expected advance plus the wrapped deviation.
pub fn time_stretch(samples: &[f32], rate: f32) -> Vec<f32> {
    if samples.is_empty() || !(rate > 0.0) || (rate - 1.0).abs() < 1e-6 {
        return samples.to_vec();
    }

    let out_len = (samples.len() as f64 / rate as f64).round() as usize;
    let frames = stft(samples, N_FFT, HOP);
    if frames.len() < 2 {
        // Not enough frames to vocode; plain linear interpolation.
        return linear_stretch(samples, out_len);
    }

    let bins = frames[0].len();
    let phi_advance: Vec<f32> = (0..bins)
        .map(|k| 2.0 * std::f32::consts::PI * HOP as f32 * k as f32 / N_FFT as f32)
        .collect();

    let mut phase_acc: Vec<f32> = frames[0].iter().map(|c| c.arg()).collect();
    let mut synth: Vec<Vec<Complex<f32>>> = Vec::new();

    let mut t = 0.0_f64;
    while t < (frames.len() - 1) as f64 {
        let i0 = t.floor() as usize;
        let i1 = (i0 + 1).min(frames.len() - 1);
        let alpha = (t - i0 as f64) as f32;

        let mut frame = Vec::with_capacity(bins);
        for k in 0..bins {
            let mag = (1.0 - alpha) * frames[i0][k].norm() + alpha * frames[i1][k].norm();
            frame.push(Complex::from_polar(mag, phase_acc[k]));
        }
        synth.push(frame);

        for k in 0..bins {
            let mut dphase = frames[i1][k].arg() - frames[i0][k].arg() - phi_advance[k];
            dphase -= 2.0
                * std::f32::consts::PI
                * (dphase / (2.0 * std::f32::consts::PI)).round();
            phase_acc[k] += phi_advance[k] + dphase;
        }

        t += rate as f64;
    }

    istft(&synth, N_FFT, HOP, out_len)
}

fn linear_stretch(samples: &[f32], out_len: usize) -> Vec<f32> {
    if out_len == 0 {
        return Vec::new();
    }
    if samples.len() == 1 {
        return vec![samples[0]; out_len];
    }

    let scale = (samples.len() - 1) as f64 / (out_len.max(2) - 1) as f64;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * scale;
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(samples.len() - 1);
            let frac = (pos - i0 as f64) as f32;
            samples[i0] * (1.0 - frac) + samples[i1] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22_050;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn zero_crossing_freq(samples: &[f32]) -> f32 {
        let lo = samples.len() / 4;
        let hi = 3 * samples.len() / 4;
        let mut crossings = 0u32;
        for i in lo..hi {
            if samples[i - 1] < 0.0 && samples[i] >= 0.0 {
                crossings += 1;
            }
        }
        crossings as f32 * SR as f32 / (hi - lo) as f32
    }

    #[test]
    fn test_unit_rate_is_noop() {
        let input = sine(440.0, 4 * N_FFT);
        assert_eq!(time_stretch(&input, 1.0), input);
    }

    #[test]
    fn test_output_length_follows_rate() {
        let input = sine(440.0, SR as usize);
        assert_eq!(time_stretch(&input, 2.0).len(), SR as usize / 2);
        assert_eq!(time_stretch(&input, 0.5).len(), SR as usize * 2);
    }

    #[test]
    fn test_pitch_survives_stretching() {
        let input = sine(440.0, 2 * SR as usize);
        for rate in [0.75_f32, 1.5] {
            let output = time_stretch(&input, rate);
            let freq = zero_crossing_freq(&output);
            assert!(
                (freq - 440.0).abs() < 10.0,
                "rate {}: estimated {} Hz",
                rate,
                freq
            );
        }
    }

    #[test]
    fn test_short_input_still_scales() {
        let input = sine(440.0, 400);
        assert_eq!(time_stretch(&input, 0.5).len(), 800);
    }
}
