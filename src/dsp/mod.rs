// Signal processing: everything in this tree is pure and synchronous, so it
// runs under spawn_blocking from the async pipeline.

pub mod key;
pub mod midi;
pub mod pitch;
pub mod resample;
pub mod stft;
pub mod stretch;
pub mod tempo;
pub mod transcribe;
pub mod wav;
