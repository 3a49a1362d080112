//! stemdeck - terminal stem player
//!
//! Loads the separated stems of one song (or two, in dual-deck mode), opens
//! the output device and reads commands from stdin. Set RUST_LOG=debug for
//! verbose output.

mod cli;
mod commands;
mod config;
mod debounce;
mod dual;
mod mute;
mod session;
#[cfg(test)]
mod test_support;

use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use commands::{Command, ParseError, HELP};
use config::PlayerConfig;
use dual::{DualCommand, DualSession, DUAL_HELP};
use session::{format_time, Flow, Session};
use stemdeck_core::audio::{get_output_devices, CpalBackend, DeviceId};
use stemdeck_core::config::load_config;
use stemdeck_core::effects::EffectParams;
use stemdeck_core::{EngineResult, StemEngine};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Stems are decoded and stretched on the global pool; name its threads
    rayon::ThreadPoolBuilder::new()
        .num_threads(stemdeck_core::NUM_STEMS)
        .thread_name(|i| format!("rayon-stems-{}", i))
        .build_global()
        .context("Failed to initialize Rayon thread pool")?;

    let config_path = cli.config.unwrap_or_else(config::default_config_file);
    let mut config: PlayerConfig = load_config(&config_path);

    match cli.command {
        Commands::Devices => list_devices(config.engine.sample_rate),
        Commands::Play {
            song,
            speed,
            pitch,
            device,
            autoplay,
        } => {
            override_device(&mut config, device);
            run_player(&config, &song, EffectParams::new(f64::from(speed) / 100.0, pitch), autoplay)
        }
        Commands::Dual {
            deck_a,
            deck_b,
            device,
            autoplay,
        } => {
            override_device(&mut config, device);
            run_dual(&config, &deck_a, &deck_b, autoplay)
        }
    }
}

fn override_device(config: &mut PlayerConfig, device: Option<String>) {
    if let Some(name) = device {
        config.engine.audio = config.engine.audio.clone().with_device(DeviceId::new(name));
    }
}

fn list_devices(sample_rate: u32) -> Result<()> {
    let devices = get_output_devices(sample_rate).context("Failed to enumerate output devices")?;
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}

/// Session with its own output stream, song loaded
fn open_session(config: &PlayerConfig, song: &Path, label: &str) -> Result<Session> {
    let backend = CpalBackend::new(config.engine.audio.clone());
    let engine = StemEngine::new(&config.engine, Box::new(backend));
    let mut session = Session::new(engine, config.effects_debounce()).context("Failed to start debounce thread")?;

    let song_id = session
        .load(song)
        .with_context(|| format!("Failed to load stems for {}", song.display()))?;
    println!(
        "{}Loaded '{}' ({})",
        label,
        song_id,
        format_time(session.engine().get_duration_seconds())
    );
    for skipped in session.engine().skipped_stems() {
        println!("  {} unavailable: {}", skipped.stem, skipped.error);
    }
    Ok(session)
}

fn run_player(config: &PlayerConfig, song: &Path, initial: EffectParams, autoplay: bool) -> Result<()> {
    log::info!("stemdeck starting up");

    let mut session = open_session(config, song, "")?;
    if initial != EffectParams::default() {
        session
            .apply_effects_now(initial)
            .context("Failed to apply initial speed/pitch")?;
    }
    if autoplay {
        session.handle(Command::Play).context("Failed to start playback")?;
    }

    run_console(&mut session, config)?;
    session.shutdown();
    log::info!("stemdeck shut down");
    Ok(())
}

fn run_dual(config: &PlayerConfig, deck_a: &Path, deck_b: &Path, autoplay: bool) -> Result<()> {
    log::info!("stemdeck starting up with two decks");

    let session_a = open_session(config, deck_a, "Deck A: ")?;
    let session_b = open_session(config, deck_b, "Deck B: ")?;
    let mut dual = DualSession::new(session_a, session_b);
    if autoplay {
        for deck in [dual::Deck::A, dual::Deck::B] {
            dual.handle(DualCommand::Deck(deck, Command::Play))
                .with_context(|| format!("Failed to start deck {}", deck))?;
        }
    }

    run_console(&mut dual, config)?;
    dual.shutdown();
    log::info!("stemdeck shut down");
    Ok(())
}

/// What the input loop drives
trait Console {
    type Command: FromStr<Err = ParseError>;

    const HELP: &'static str;

    fn handle(&mut self, command: Self::Command) -> EngineResult<Flow>;

    /// Report installed or failed effects
    fn tick(&mut self);

    /// Position line, if anything is playing
    fn progress(&self) -> Option<String>;
}

impl Console for Session {
    type Command = Command;

    const HELP: &'static str = HELP;

    fn handle(&mut self, command: Command) -> EngineResult<Flow> {
        Session::handle(self, command)
    }

    fn tick(&mut self) {
        report_tick("", Session::tick(self));
    }

    fn progress(&self) -> Option<String> {
        let engine = self.engine();
        engine.is_playing().then(|| {
            format!(
                "{} / {}{}",
                format_time(engine.get_position_seconds()),
                format_time(engine.get_duration_seconds()),
                if engine.take_clip_indicator() { " CLIP" } else { "" }
            )
        })
    }
}

impl Console for DualSession {
    type Command = DualCommand;

    const HELP: &'static str = DUAL_HELP;

    fn handle(&mut self, command: DualCommand) -> EngineResult<Flow> {
        DualSession::handle(self, command)
    }

    fn tick(&mut self) {
        for (deck, result) in DualSession::tick(self) {
            report_tick(&format!("Deck {}: ", deck), result);
        }
    }

    fn progress(&self) -> Option<String> {
        let decks = [dual::Deck::A, dual::Deck::B];
        if !decks.iter().any(|&deck| self.deck(deck).engine().is_playing()) {
            return None;
        }
        let parts: Vec<String> = decks
            .iter()
            .map(|&deck| {
                let engine = self.deck(deck).engine();
                format!(
                    "{} {}{}{}",
                    deck,
                    format_time(engine.get_position_seconds()),
                    if engine.is_playing() { "" } else { " (stopped)" },
                    if engine.take_clip_indicator() { " CLIP" } else { "" }
                )
            })
            .collect();
        Some(format!("{} | {}", parts.join(" | "), self.crossfader().label()))
    }
}

fn report_tick(label: &str, result: EngineResult<Option<EffectParams>>) {
    match result {
        Ok(Some(params)) => println!(
            "\n{}Now at speed {:.0}%, pitch {:+}",
            label,
            params.speed_ratio * 100.0,
            params.pitch_semitones
        ),
        Ok(None) => {}
        Err(e) => eprintln!("\n{}Effects failed: {}", label, e),
    }
}

fn run_console<C: Console>(console: &mut C, config: &PlayerConfig) -> Result<()> {
    println!("Type 'help' for commands.");

    let lines = spawn_stdin_reader()?;
    let poll = config.position_poll();

    loop {
        match lines.recv_timeout(poll) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<C::Command>() {
                    Ok(command) => match console.handle(command) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    },
                    Err(e) => {
                        eprintln!("{}", e);
                        if matches!(e, ParseError::Unknown(_)) {
                            eprintln!("{}", C::HELP);
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // stdin closed
            Err(RecvTimeoutError::Disconnected) => break,
        }

        console.tick();

        if let Some(progress) = console.progress() {
            print!("\r{}   ", progress);
            let _ = std::io::stdout().flush();
        }
    }

    println!();
    Ok(())
}

/// Forward stdin lines to the main loop
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(rx)
}
