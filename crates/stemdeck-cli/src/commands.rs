//! Interactive command parsing

use std::str::FromStr;

use stemdeck_core::types::Stem;
use thiserror::Error;

/// Accepted speed range in percent
pub const SPEED_RANGE: std::ops::RangeInclusive<u32> = 50..=200;

/// Accepted pitch range in semitones
pub const PITCH_RANGE: std::ops::RangeInclusive<i32> = -12..=12;

/// Accepted volume range in percent
pub const VOLUME_RANGE: std::ops::RangeInclusive<f32> = 0.0..=200.0;

pub const HELP: &str = "\
Commands:
  play                  start playback
  stop                  stop playback
  seek <seconds>        jump to a position
  vol <stem> <0-200>    stem volume in percent (vocals, drums, bass, other)
  master <0-200>        master volume in percent
  mute <stem>           toggle mute of one stem
  muteall (or 0)        mute the stems still playing; unmute all if all are muted
  speed <50-200>        playback speed in percent
  pitch <-12..12>       pitch shift in semitones
  reset                 back to 100% speed, no pitch shift
  status                show the player state
  help                  show this help
  quit                  exit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Stop,
    Seek(f64),
    /// Stem gain as a factor (percent / 100)
    Volume(Stem, f32),
    Master(f32),
    Mute(Stem),
    MuteAll,
    /// Speed in percent
    Speed(u32),
    Pitch(i32),
    Reset,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("{what} must be within {range}")]
    OutOfRange { what: &'static str, range: &'static str },
    #[error(transparent)]
    Stem(#[from] stemdeck_core::types::UnknownStem),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("play" | "p", []) => Command::Play,
            ("stop" | "s", []) => Command::Stop,
            ("seek", [secs]) => Command::Seek(number(secs, "seek <seconds>")?),
            ("vol" | "volume", [stem, pct]) => {
                let pct: f32 = number(pct, "vol <stem> <0-200>")?;
                Command::Volume(stem.parse()?, percent(pct, "volume")?)
            }
            ("master", [pct]) => Command::Master(percent(number(pct, "master <0-200>")?, "master volume")?),
            ("mute", [stem]) => Command::Mute(stem.parse()?),
            ("muteall" | "0", []) => Command::MuteAll,
            ("speed", [pct]) => {
                let pct: u32 = number(pct, "speed <50-200>")?;
                if !SPEED_RANGE.contains(&pct) {
                    return Err(ParseError::OutOfRange {
                        what: "speed",
                        range: "50..200 %",
                    });
                }
                Command::Speed(pct)
            }
            ("pitch", [semitones]) => {
                let semitones: i32 = number(semitones, "pitch <-12..12>")?;
                if !PITCH_RANGE.contains(&semitones) {
                    return Err(ParseError::OutOfRange {
                        what: "pitch",
                        range: "-12..12 semitones",
                    });
                }
                Command::Pitch(semitones)
            }
            ("reset", []) => Command::Reset,
            ("status", []) => Command::Status,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            ("seek", _) => return Err(ParseError::Usage("seek <seconds>")),
            ("vol" | "volume", _) => return Err(ParseError::Usage("vol <stem> <0-200>")),
            ("master", _) => return Err(ParseError::Usage("master <0-200>")),
            ("mute", _) => return Err(ParseError::Usage("mute <stem>")),
            ("speed", _) => return Err(ParseError::Usage("speed <50-200>")),
            ("pitch", _) => return Err(ParseError::Usage("pitch <-12..12>")),
            _ => return Err(ParseError::Unknown(line.trim().to_string())),
        };
        Ok(command)
    }
}

fn number<T: FromStr>(word: &str, usage: &'static str) -> Result<T, ParseError> {
    word.parse().map_err(|_| ParseError::Usage(usage))
}

/// Percent to gain factor, range-checked
fn percent(pct: f32, what: &'static str) -> Result<f32, ParseError> {
    if VOLUME_RANGE.contains(&pct) {
        Ok(pct / 100.0)
    } else {
        Err(ParseError::OutOfRange {
            what,
            range: "0..200 %",
        })
    }
}
