//! Interactive player session
//!
//! Ties the parsed commands to one `StemEngine`. Speed and pitch changes go
//! through a debouncer and are rendered on the background worker, so the
//! current stems keep playing while the new ones are prepared.

use std::path::Path;
use std::time::Duration;

use stemdeck_core::effects::EffectParams;
use stemdeck_core::types::{PlayState, Stem};
use stemdeck_core::{EngineResult, StemEngine};

use crate::commands::{Command, HELP};
use crate::debounce::Debouncer;
use crate::mute::MuteState;

/// Whether the input loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    engine: StemEngine,
    mute: MuteState,
    debouncer: Debouncer<EffectParams>,
    /// Speed/pitch the user asked for, possibly not yet rendered
    desired: EffectParams,
}

impl Session {
    pub fn new(engine: StemEngine, debounce: Duration) -> std::io::Result<Self> {
        Ok(Self {
            engine,
            mute: MuteState::new(),
            debouncer: Debouncer::spawn("effects-debounce", debounce)?,
            desired: EffectParams::default(),
        })
    }

    pub fn engine(&self) -> &StemEngine {
        &self.engine
    }

    pub fn desired_effects(&self) -> EffectParams {
        self.desired
    }

    /// Load a song; speed and pitch start fresh, muted stems are restored
    pub fn load(&mut self, song_path: &Path) -> EngineResult<String> {
        let song_id = self.engine.load_song_stems(song_path)?;
        self.debouncer.cancel();
        self.desired = EffectParams::default();
        for stem in Stem::ALL {
            if self.mute.is_muted(stem) {
                self.mute.toggle(&self.engine, stem);
            }
        }
        Ok(song_id)
    }

    /// Render speed/pitch right away, bypassing the debouncer
    pub fn apply_effects_now(&mut self, params: EffectParams) -> EngineResult<()> {
        self.debouncer.cancel();
        self.desired = params;
        self.engine.apply_effects(params.speed_ratio, params.pitch_semitones)
    }

    pub fn handle(&mut self, command: Command) -> EngineResult<Flow> {
        match command {
            Command::Play => self.engine.start_playback()?,
            Command::Stop => self.engine.stop_playback(),
            Command::Seek(seconds) => {
                let landed = self.engine.set_position_seconds(seconds);
                println!("Position {}", format_time(landed));
            }
            Command::Volume(stem, volume) => {
                let applied = self.mute.set_volume(&self.engine, stem, volume);
                println!("{} volume {:.0}%", stem, applied * 100.0);
            }
            Command::Master(volume) => {
                let applied = self.engine.set_master_volume(volume);
                println!("Master volume {:.0}%", applied * 100.0);
            }
            Command::Mute(stem) => {
                let muted = self.mute.toggle(&self.engine, stem);
                println!("{} {}", stem, if muted { "muted" } else { "unmuted" });
            }
            Command::MuteAll => {
                let muted = self.mute.toggle_all(&self.engine);
                println!("All stems {}", if muted { "muted" } else { "restored" });
            }
            Command::Speed(percent) => {
                self.desired.speed_ratio = f64::from(percent) / 100.0;
                self.schedule_effects();
            }
            Command::Pitch(semitones) => {
                self.desired.pitch_semitones = semitones;
                self.schedule_effects();
            }
            Command::Reset => {
                self.apply_effects_now(EffectParams::default())?;
                println!("Speed and pitch reset");
            }
            Command::Status => println!("{}", self.status_line()),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn schedule_effects(&mut self) {
        self.debouncer.schedule(self.desired);
        println!(
            "Rendering speed {:.0}%, pitch {:+} ...",
            self.desired.speed_ratio * 100.0,
            self.desired.pitch_semitones
        );
    }

    /// Forward debounced effects and install finished ones
    ///
    /// Returns the parameters installed during this tick, if any.
    pub fn tick(&mut self) -> EngineResult<Option<EffectParams>> {
        if let Some(params) = self.debouncer.try_recv() {
            if self.engine.song_id().is_some() {
                self.engine.request_effects(params.speed_ratio, params.pitch_semitones)?;
            }
        }

        match self.engine.poll_effects() {
            Some(Ok(params)) => Ok(Some(params)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// One-line summary: state, position, effects and stem gains
    pub fn status_line(&self) -> String {
        let state = match self.engine.play_state() {
            PlayState::Playing => "playing",
            PlayState::Stopped => "stopped",
        };
        let params = self.engine.effect_params();
        let gains: Vec<String> = Stem::ALL
            .iter()
            .map(|&stem| {
                if self.mute.is_muted(stem) {
                    format!("{stem} muted")
                } else {
                    format!("{stem} {:.0}%", self.engine.volume(stem) * 100.0)
                }
            })
            .collect();

        format!(
            "[{}] {} {} / {} | speed {:.0}% pitch {:+}{} | master {:.0}% | {}",
            self.engine.song_id().unwrap_or("no song"),
            state,
            format_time(self.engine.get_position_seconds()),
            format_time(self.engine.get_duration_seconds()),
            params.speed_ratio * 100.0,
            params.pitch_semitones,
            if self.engine.effects_pending() || self.desired != params {
                format!(" (-> {:.0}% {:+})", self.desired.speed_ratio * 100.0, self.desired.pitch_semitones)
            } else {
                String::new()
            },
            self.engine.master_volume() * 100.0,
            gains.join(", ")
        )
    }

    /// Release the output stream and the stems
    pub fn shutdown(mut self) {
        self.debouncer.cancel();
        self.engine.cleanup();
    }
}

/// `m:ss.t`
pub fn format_time(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}
