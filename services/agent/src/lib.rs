//! Voice agent demo service.
//!
//! Streams a recorded WAV file to a conversational voice agent, writes each
//! spoken agent turn to `output-{n}.wav` and every event to `chatlog.txt`.
//! The `voice-agent` binary is a thin wrapper around [`run`].

pub mod cli;
pub mod config;
pub mod run;
pub mod session;
pub mod source;
