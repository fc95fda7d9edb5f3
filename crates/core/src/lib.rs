//! Local artifacts produced by a voice agent session: the streaming WAV header,
//! the per-turn audio recorder and the append-only chat log.

pub mod chatlog;
pub mod recorder;
pub mod wav;

pub use chatlog::ChatLog;
pub use recorder::AudioRecorder;
pub use wav::{WavError, WavSpec};
