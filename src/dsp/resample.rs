//! Windowed-sinc sample rate conversion.
//!
//! Good enough for speech/music at the processing rate; not a mastering-grade
//! resampler. The kernel is a Hann-windowed sinc with 32 taps per side and a
//! cutoff at the lower of the two Nyquist frequencies.

const TAPS: i64 = 32;

pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }
    resample_ratio(samples, to_rate as f64 / from_rate as f64)
}

/// Resamples by an arbitrary positive ratio (`output rate / input rate`);
/// a ratio of 2 doubles the sample count. Used by pitch shifting, where the
/// virtual source rate is not an integer.
pub fn resample_ratio(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() || !ratio.is_finite() || !(ratio > 0.0) || (ratio - 1.0).abs() < 1e-12 {
        return samples.to_vec();
    }

    let out_len = (samples.len() as f64 * ratio).ceil() as usize;
    let step = 1.0 / ratio;
    // Anti-aliasing cutoff, as a fraction of the input Nyquist.
    let cutoff = ratio.min(1.0);

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let t = i as f64 * step;
        let center = t.floor() as i64;

        let mut acc = 0.0_f64;
        for j in (center - TAPS + 1)..=(center + TAPS) {
            if j < 0 || j as usize >= samples.len() {
                continue;
            }
            let x = t - j as f64;
            acc += samples[j as usize] as f64 * kernel(x, cutoff);
        }
        out.push(acc as f32);
    }

    out
}

fn kernel(x: f64, cutoff: f64) -> f64 {
    let abs = x.abs();
    if abs >= TAPS as f64 {
        return 0.0;
    }
    let window = 0.5 + 0.5 * (std::f64::consts::PI * x / TAPS as f64).cos();
    cutoff * sinc(cutoff * x) * window
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}
