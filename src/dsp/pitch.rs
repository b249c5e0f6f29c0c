use crate::dsp::resample::resample_ratio;
use crate::dsp::stretch::time_stretch;

/// Shifts pitch by `n_steps` semitones (positive is up) without changing
/// duration: time-stretch by `2^(-n/12)`, resample the result back, then
/// pin the length to the input's.
pub fn pitch_shift(samples: &[f32], n_steps: f32) -> Vec<f32> {
    if samples.is_empty() || n_steps.abs() < 1e-6 {
        return samples.to_vec();
    }

    let rate = 2.0_f32.powf(-n_steps / 12.0);
    let stretched = time_stretch(samples, rate);
    let mut shifted = resample_ratio(&stretched, rate as f64);

    shifted.resize(samples.len(), 0.0);
    shifted
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
    fn test_octave_up_doubles_frequency() {
        let input = sine(220.0, 2 * SR as usize);
        let output = pitch_shift(&input, 12.0);

        assert_eq!(output.len(), input.len());
        let freq = zero_crossing_freq(&output);
        assert!((freq - 440.0).abs() < 15.0, "estimated {} Hz", freq);
    }

    #[test]
    fn test_octave_down_halves_frequency() {
        let input = sine(440.0, 2 * SR as usize);
        let output = pitch_shift(&input, -12.0);

        assert_eq!(output.len(), input.len());
        let freq = zero_crossing_freq(&output);
        assert!((freq - 220.0).abs() < 10.0, "estimated {} Hz", freq);
    }

    #[test]
    fn test_zero_steps_is_noop() {
        let input = sine(330.0, SR as usize);
        assert_eq!(pitch_shift(&input, 0.0), input);
    }

    #[test]
    fn test_two_semitones_up() {
        let input = sine(261.63, 2 * SR as usize);
        let output = pitch_shift(&input, 2.0);

        // C4 up a whole tone is D4.
        let freq = zero_crossing_freq(&output);
        assert!((freq - 293.66).abs() < 10.0, "estimated {} Hz", freq);
    }
}
