use crate::domain::model::NoteEvent;

const FRAME: usize = 2048;
const HOP: usize = 256;
/// Correlation window inside a frame.
const WINDOW: usize = FRAME / 2;
/// Largest lag searched, bounding the lowest detectable pitch
/// (`sr / TAU_MAX`, about 43 Hz at 22.05 kHz).
const TAU_MAX: usize = FRAME / 4;

const CMNDF_THRESHOLD: f32 = 0.15;
const RMS_GATE: f32 = 0.01;
const MIN_NOTE_FRAMES: usize = 3;
const MEDIAN_WIDTH: usize = 5;

/// Transcribes a monophonic clip into note events using YIN pitch tracking:
/// per-frame cumulative mean-normalized difference, absolute threshold,
/// parabolic lag refinement, then median smoothing and segmentation into
/// notes of at least `MIN_NOTE_FRAMES` frames.
pub fn transcribe(samples: &[f32], sample_rate: u32) -> Vec<NoteEvent> {
    if samples.len() < FRAME || sample_rate == 0 {
        return Vec::new();
    }

    let mut notes_per_frame: Vec<Option<i32>> = Vec::new();
    let mut rms_per_frame: Vec<f32> = Vec::new();

    let mut start = 0;
    while start + FRAME <= samples.len() {
        let frame = &samples[start..start + FRAME];
        let rms = (frame.iter().map(|s| s * s).sum::<f32>() / FRAME as f32).sqrt();
        rms_per_frame.push(rms);

        if rms < RMS_GATE {
            notes_per_frame.push(None);
        } else {
            notes_per_frame.push(frame_pitch(frame, sample_rate));
        }
        start += HOP;
    }

    let smoothed = median_smooth(&notes_per_frame);
    segment(&smoothed, &rms_per_frame, sample_rate)
}

/// YIN estimate for one frame, as a rounded MIDI note number.
fn frame_pitch(frame: &[f32], sample_rate: u32) -> Option<i32> {
    // Squared difference function over the correlation window.
    let mut diff = vec![0.0_f32; TAU_MAX + 1];
    for tau in 1..=TAU_MAX {
        let mut acc = 0.0_f32;
        for i in 0..WINDOW {
            let d = frame[i] - frame[i + tau];
            acc += d * d;
        }
        diff[tau] = acc;
    }

    // Cumulative mean-normalized difference.
    let mut cmndf = vec![1.0_f32; TAU_MAX + 1];
    let mut running = 0.0_f32;
    for tau in 1..=TAU_MAX {
        running += diff[tau];
        cmndf[tau] = if running > 0.0 {
            diff[tau] * tau as f32 / running
        } else {
            1.0
        };
    }

    // First dip under the threshold, extended to its local minimum.
    let mut tau = None;
    for t in 2..TAU_MAX {
        if cmndf[t] < CMNDF_THRESHOLD {
            let mut best = t;
            while best + 1 < TAU_MAX && cmndf[best + 1] < cmndf[best] {
                best += 1;
            }
            tau = Some(best);
            break;
        }
    }
    let tau = tau?;

    // Parabolic interpolation around the minimum for sub-sample lag.
    let refined = if tau > 0 && tau + 1 <= TAU_MAX {
        let (a, b, c) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            tau as f32 + 0.5 * (a - c) / denom
        } else {
            tau as f32
        }
    } else {
        tau as f32
    };

    if refined <= 0.0 {
        return None;
    }
    let freq = sample_rate as f32 / refined;
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    Some(midi.round() as i32)
}

fn median_smooth(notes: &[Option<i32>]) -> Vec<Option<i32>> {
    let half = MEDIAN_WIDTH / 2;
    (0..notes.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(notes.len());
            let mut voiced: Vec<i32> = notes[lo..hi].iter().flatten().copied().collect();
            if voiced.len() < 3 {
                return None;
            }
            voiced.sort_unstable();
            Some(voiced[voiced.len() / 2])
        })
        .collect()
}

fn segment(notes: &[Option<i32>], rms: &[f32], sample_rate: u32) -> Vec<NoteEvent> {
    let frame_secs = HOP as f32 / sample_rate as f32;
    let mut events = Vec::new();

    let mut run_start = 0usize;
    let mut run_note: Option<i32> = None;
    for i in 0..=notes.len() {
        let current = notes.get(i).copied().flatten();
        if current == run_note && i < notes.len() {
            continue;
        }

        if let Some(note) = run_note {
            let len = i - run_start;
            if len >= MIN_NOTE_FRAMES && (0..=127).contains(&note) {
                let mean_rms =
                    rms[run_start..i].iter().sum::<f32>() / len as f32;
                events.push(NoteEvent {
                    note: note as u8,
                    onset_secs: run_start as f32 * frame_secs,
                    duration_secs: len as f32 * frame_secs,
                    velocity: ((mean_rms * 180.0).round() as i32).clamp(20, 127) as u8,
                });
            }
        }
        run_start = i;
        run_note = current;
    }

    events
}
