use crate::domain::model::NoteEvent;
use crate::utils::error::Result;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

const TICKS_PER_BEAT: u16 = 480;

/// Encodes note events as a single-track Standard MIDI File at the given
/// tempo. Note offs sort before note ons at the same tick so back-to-back
/// notes never overlap.
pub fn encode_midi(notes: &[NoteEvent], tempo_bpm: f32) -> Result<Vec<u8>> {
    let bpm = if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
        tempo_bpm
    } else {
        120.0
    };
    let ticks_per_sec = TICKS_PER_BEAT as f64 * bpm as f64 / 60.0;

    // (tick, is_on, key, velocity)
    let mut moments: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let on = (note.onset_secs as f64 * ticks_per_sec).round() as u32;
        let off = ((note.onset_secs + note.duration_secs) as f64 * ticks_per_sec).round() as u32;
        moments.push((on, true, note.note.min(127), note.velocity.min(127)));
        moments.push((off.max(on + 1), false, note.note.min(127), 0));
    }
    moments.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

    let mut track: Vec<TrackEvent> = Vec::with_capacity(moments.len() + 2);

    let us_per_beat = (60_000_000.0 / bpm as f64).round() as u32;
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(us_per_beat.min(0xFF_FFFF)))),
    });

    let mut last_tick = 0u32;
    for (tick, is_on, key, velocity) in moments {
        let delta = tick - last_tick;
        last_tick = tick;

        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(velocity),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_BEAT))),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}
