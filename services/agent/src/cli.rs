//! Command-line interface.

use agent_realtime::{
    Settings,
    protocol::{AudioOutput, Provider},
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Sample audio streamed when no `--audio` is given.
pub const DEFAULT_AUDIO_URL: &str = "https://dpgr.am/spacewalk.wav";

#[derive(Parser, Debug)]
#[command(name = "voice-agent", version, about = "Talk to a voice agent with a recorded WAV file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream audio to the agent and record what it says back.
    Converse(ConverseArgs),
    /// Exchange the API key for a short-lived access token.
    Grant(GrantArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConverseArgs {
    /// WAV file to stream: an http(s) URL or a local path.
    #[arg(long, default_value = DEFAULT_AUDIO_URL)]
    pub audio: String,

    /// Directory receiving `output-{n}.wav` and `chatlog.txt`.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Bytes of audio per frame.
    #[arg(long, default_value_t = 8192, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: u64,

    /// Pause after each frame, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub chunk_delay_ms: u64,

    /// How long to keep listening after the upload, in seconds.
    #[arg(long, default_value_t = 30)]
    pub wait_secs: u64,

    /// Sample rate of the streamed input audio.
    #[arg(long, default_value_t = 24000, value_parser = sample_rate_parser())]
    pub input_sample_rate: u32,

    /// Sample rate requested for agent audio.
    #[arg(long, default_value_t = 16000, value_parser = sample_rate_parser())]
    pub output_sample_rate: u32,

    #[arg(long)]
    pub language: Option<String>,

    /// System prompt for the think stage.
    #[arg(long)]
    pub prompt: Option<String>,

    /// First thing the agent says.
    #[arg(long)]
    pub greeting: Option<String>,

    #[arg(long)]
    pub listen_model: Option<String>,

    #[arg(long)]
    pub think_model: Option<String>,

    #[arg(long)]
    pub speak_model: Option<String>,
}

impl ConverseArgs {
    /// Agent settings: the defaults with any command-line overrides applied.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.audio.input.sample_rate = self.input_sample_rate;
        settings.audio.output = AudioOutput {
            sample_rate: self.output_sample_rate,
            ..AudioOutput::default()
        };

        let agent = &mut settings.agent;
        if let Some(language) = &self.language {
            agent.language = language.clone();
        }
        if let Some(prompt) = &self.prompt {
            agent.think.prompt = Some(prompt.clone());
        }
        if let Some(greeting) = &self.greeting {
            agent.greeting = Some(greeting.clone());
        }
        override_model(&mut agent.listen.provider, &self.listen_model);
        override_model(&mut agent.think.provider, &self.think_model);
        override_model(&mut agent.speak.provider, &self.speak_model);
        settings
    }

    pub fn chunk_size(&self) -> usize {
        usize::try_from(self.chunk_size).unwrap_or(usize::MAX)
    }
}

/// Highest sample rate accepted on the command line.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

fn sample_rate_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_SAMPLE_RATE))
}

fn override_model(provider: &mut Provider, model: &Option<String>) {
    if let Some(model) = model {
        provider.model = Some(model.clone());
    }
}

#[derive(Args, Debug, Clone)]
pub struct GrantArgs {
    /// Token lifetime in seconds; the server default when omitted.
    #[arg(long)]
    pub ttl: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converse(args: &[&str]) -> ConverseArgs {
        let cli = Cli::try_parse_from(["voice-agent", "converse"].iter().chain(args))
            .expect("arguments should parse");
        match cli.command {
            Command::Converse(args) => args,
            other => panic!("expected converse, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_converse_defaults() {
        let args = converse(&[]);

        assert_eq!(args.audio, DEFAULT_AUDIO_URL);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.chunk_size(), 8192);
        assert_eq!(args.chunk_delay_ms, 100);
        assert_eq!(args.wait_secs, 30);
        assert_eq!(args.settings(), Settings::default());
    }

    #[test]
    fn test_converse_overrides() {
        let args = converse(&[
            "--audio",
            "clip.wav",
            "--output-dir",
            "out",
            "--output-sample-rate",
            "24000",
            "--prompt",
            "Answer in one sentence.",
            "--think-model",
            "gpt-4o",
            "--speak-model",
            "aura-2-orion-en",
        ]);
        let settings = args.settings();

        assert_eq!(args.audio, "clip.wav");
        assert_eq!(settings.audio.output.sample_rate, 24000);
        assert_eq!(settings.audio.output.container.as_deref(), Some("wav"));
        assert_eq!(
            settings.agent.think.prompt.as_deref(),
            Some("Answer in one sentence.")
        );
        assert_eq!(settings.agent.think.provider.model.as_deref(), Some("gpt-4o"));
        assert_eq!(settings.agent.think.provider.kind, "open_ai");
        assert_eq!(
            settings.agent.speak.provider.model.as_deref(),
            Some("aura-2-orion-en")
        );
        assert_eq!(settings.agent.listen.provider.model.as_deref(), Some("nova-3"));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        assert!(Cli::try_parse_from(["voice-agent", "converse", "--chunk-size", "0"]).is_err());
    }

    #[test]
    fn test_sample_rate_bounds() {
        let args = converse(&["--output-sample-rate", "384000"]);
        assert_eq!(args.output_sample_rate, MAX_SAMPLE_RATE);

        for rate in ["0", "384001", "3000000000"] {
            assert!(
                Cli::try_parse_from(["voice-agent", "converse", "--output-sample-rate", rate])
                    .is_err(),
                "{rate} should be rejected"
            );
        }
        assert!(
            Cli::try_parse_from(["voice-agent", "converse", "--input-sample-rate", "0"]).is_err()
        );
    }

    #[test]
    fn test_grant_args() {
        let cli = Cli::try_parse_from(["voice-agent", "grant", "--ttl", "120"]).unwrap();
        match cli.command {
            Command::Grant(args) => assert_eq!(args.ttl, Some(120)),
            other => panic!("expected grant, got {other:?}"),
        }
    }
}
