//! Render a scripted piano performance to a WAV file.
//!
//! ```text
//! piano-render performance.json out.wav --config piano.json
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use digital_piano::config::PianoConfig;
use digital_piano::dsp::renderer::{Performance, render_wav};
use digital_piano::error::PianoError;

#[derive(Parser)]
#[command(name = "piano-render", version, about = "Render a piano performance to WAV")]
struct Cli {
    /// Performance JSON: {"events":[{"time":0.0,"type":"keyDown","key":"a"}, ...]}
    performance: PathBuf,
    /// Output WAV path
    out: PathBuf,
    /// Piano config JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<(), PianoError> {
    let config = match &cli.config {
        Some(path) => PianoConfig::from_json(&fs::read_to_string(path)?)?,
        None => PianoConfig::default(),
    };
    let performance = Performance::from_json(&fs::read_to_string(&cli.performance)?)?;
    log::info!(
        "rendering {} events at {} Hz",
        performance.events.len(),
        config.sample_rate
    );

    let wav = render_wav(&performance, &config)?;
    fs::write(&cli.out, &wav)?;
    log::info!("wrote {} bytes to {}", wav.len(), cli.out.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("piano-render: {e}");
            ExitCode::FAILURE
        }
    }
}
