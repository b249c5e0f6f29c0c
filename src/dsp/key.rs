use crate::dsp::stft::{stft, HOP, N_FFT};

/// Krumhansl-Kessler key profiles, C-rooted.
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const MIN_CHROMA_HZ: f32 = 55.0;
const MAX_CHROMA_HZ: f32 = 4000.0;

/// Estimates the musical key as `"{root} Major"` or `"{root} Minor"`.
///
/// Spectrogram energy between 55 Hz and 4 kHz is folded onto the 12 pitch
/// classes and correlated against the Krumhansl-Kessler profiles in all 24
/// rotations. Silent or featureless input reports `"C Major"`.
pub fn estimate_key(samples: &[f32], sample_rate: u32) -> String {
    let chroma = chromagram(samples, sample_rate);
    match best_profile_match(&chroma) {
        Some((root, is_major)) => {
            let mode = if is_major { "Major" } else { "Minor" };
            format!("{} {}", NOTE_NAMES[root], mode)
        }
        None => "C Major".to_string(),
    }
}

/// Semitone distance from `current_key`'s root to `desired_key`'s root.
/// The root is the token before the first space; if either root is
/// unrecognized the shift is 0 and the audio is left alone. The result is
/// signed and not wrapped to an octave.
pub fn semitone_shift(current_key: &str, desired_key: &str) -> i32 {
    match (root_semitone(current_key), root_semitone(desired_key)) {
        (Some(current), Some(desired)) => desired - current,
        _ => 0,
    }
}

fn root_semitone(key: &str) -> Option<i32> {
    let root = key.split(' ').next().unwrap_or("");
    match root {
        "C" => Some(0),
        "C#" | "Db" => Some(1),
        "D" => Some(2),
        "D#" | "Eb" => Some(3),
        "E" => Some(4),
        "F" => Some(5),
        "F#" | "Gb" => Some(6),
        "G" => Some(7),
        "G#" | "Ab" => Some(8),
        "A" => Some(9),
        "A#" | "Bb" => Some(10),
        "B" => Some(11),
        _ => None,
    }
}

fn chromagram(samples: &[f32], sample_rate: u32) -> [f32; 12] {
    let frames = stft(samples, N_FFT, HOP);
    let mut chroma = [0.0_f32; 12];

    let bin_hz = sample_rate as f32 / N_FFT as f32;
    for frame in &frames {
        for (k, c) in frame.iter().enumerate() {
            let freq = k as f32 * bin_hz;
            if !(MIN_CHROMA_HZ..=MAX_CHROMA_HZ).contains(&freq) {
                continue;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let pitch_class = (midi.round() as i32).rem_euclid(12) as usize;
            chroma[pitch_class] += c.norm();
        }
    }

    chroma
}

/// Returns `(root, is_major)` of the best-correlating profile rotation, or
/// `None` when the chroma vector has no variance to correlate.
fn best_profile_match(chroma: &[f32; 12]) -> Option<(usize, bool)> {
    let mut best: Option<(usize, bool)> = None;
    let mut best_r = f32::NEG_INFINITY;

    for root in 0..12 {
        let rotated: Vec<f32> = (0..12).map(|i| chroma[(root + i) % 12]).collect();
        for (profile, is_major) in [(&MAJOR_PROFILE, true), (&MINOR_PROFILE, false)] {
            let r = pearson(profile, &rotated)?;
            if r > best_r {
                best_r = r;
                best = Some((root, is_major));
            }
        }
    }

    best
}

fn pearson(x: &[f32], y: &[f32]) -> Option<f32> {
    let n = x.len() as f32;
    let mean_x = x.iter().sum::<f32>() / n;
    let mean_y = y.iter().sum::<f32>() / n;

    let mut cov = 0.0_f32;
    let mut var_x = 0.0_f32;
    let mut var_y = 0.0_f32;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}
