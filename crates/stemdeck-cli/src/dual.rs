//! Two-deck player
//!
//! One `Session` per deck, each with its own engine and output stream.
//! Deck commands take an `a`/`b` prefix; the crossfader owns both master
//! volumes, so `master` is not accepted per deck.

use std::fmt;
use std::str::FromStr;

use stemdeck_core::effects::EffectParams;
use stemdeck_core::engine::Crossfader;
use stemdeck_core::EngineResult;

use crate::commands::{Command, ParseError};
use crate::session::{Flow, Session};

pub const DUAL_HELP: &str = "\
Commands:
  a <command>           send a player command to deck A (e.g. 'a play', 'a speed 90')
  b <command>           same for deck B
  xfade <0-100>         crossfader, 0 = deck A only, 50 = both, 100 = deck B only
  status                show both decks
  help                  show this help
  quit                  exit
Deck commands: play, stop, seek, vol, mute, muteall, speed, pitch, reset, status, help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deck {
    A,
    B,
}

impl Deck {
    fn index(self) -> usize {
        match self {
            Deck::A => 0,
            Deck::B => 1,
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Deck::A => "A",
            Deck::B => "B",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DualCommand {
    Deck(Deck, Command),
    /// Crossfader in percent, 0 = deck A only
    Crossfade(u32),
    Status,
    Help,
    Quit,
}

impl FromStr for DualCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match (head.to_ascii_lowercase().as_str(), rest) {
            ("", _) => return Err(ParseError::Empty),
            ("a" | "b", _) => {
                let deck = if head.eq_ignore_ascii_case("a") { Deck::A } else { Deck::B };
                match rest.parse::<Command>() {
                    Ok(Command::Master(_)) => {
                        return Err(ParseError::Usage("deck master volume follows the crossfader, use xfade <0-100>"))
                    }
                    Ok(Command::Quit) => return Err(ParseError::Usage("quit (closes both decks)")),
                    Ok(command) => DualCommand::Deck(deck, command),
                    Err(ParseError::Empty) => return Err(ParseError::Usage("a|b <command>")),
                    Err(e) => return Err(e),
                }
            }
            ("xfade" | "x", _) => {
                let percent: u32 = rest.parse().map_err(|_| ParseError::Usage("xfade <0-100>"))?;
                if percent > 100 {
                    return Err(ParseError::OutOfRange {
                        what: "crossfader",
                        range: "0..100 %",
                    });
                }
                DualCommand::Crossfade(percent)
            }
            ("status", "") => DualCommand::Status,
            ("help" | "?", "") => DualCommand::Help,
            ("quit" | "exit" | "q", "") => DualCommand::Quit,
            _ => return Err(ParseError::Unknown(line.to_string())),
        };
        Ok(command)
    }
}

pub struct DualSession {
    decks: [Session; 2],
    crossfader: Crossfader,
}

impl DualSession {
    /// Pair two sessions; the crossfader starts centered
    pub fn new(deck_a: Session, deck_b: Session) -> Self {
        let session = Self {
            decks: [deck_a, deck_b],
            crossfader: Crossfader::new(),
        };
        session.apply_crossfader();
        session
    }

    pub fn deck(&self, deck: Deck) -> &Session {
        &self.decks[deck.index()]
    }

    pub fn deck_mut(&mut self, deck: Deck) -> &mut Session {
        &mut self.decks[deck.index()]
    }

    pub fn crossfader(&self) -> Crossfader {
        self.crossfader
    }

    /// Move the crossfader (0.0 = A, 1.0 = B); returns the deck gains
    pub fn set_crossfader(&mut self, position: f32) -> (f32, f32) {
        self.crossfader.set_position(position);
        self.apply_crossfader()
    }

    fn apply_crossfader(&self) -> (f32, f32) {
        let [deck_a, deck_b] = &self.decks;
        self.crossfader.apply(deck_a.engine(), deck_b.engine())
    }

    pub fn handle(&mut self, command: DualCommand) -> EngineResult<Flow> {
        match command {
            DualCommand::Deck(deck, Command::Status) => println!("{}: {}", deck, self.deck(deck).status_line()),
            DualCommand::Deck(deck, command) => {
                self.deck_mut(deck).handle(command)?;
            }
            DualCommand::Crossfade(percent) => {
                let (a, b) = self.set_crossfader(percent as f32 / 100.0);
                println!(
                    "Crossfader {} ({}%): A {:.0}% / B {:.0}%",
                    self.crossfader.label(),
                    percent,
                    a * 100.0,
                    b * 100.0
                );
            }
            DualCommand::Status => println!("{}", self.status_line()),
            DualCommand::Help => println!("{DUAL_HELP}"),
            DualCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Tick both decks; results come back in deck order
    pub fn tick(&mut self) -> [(Deck, EngineResult<Option<EffectParams>>); 2] {
        let [deck_a, deck_b] = &mut self.decks;
        [(Deck::A, deck_a.tick()), (Deck::B, deck_b.tick())]
    }

    pub fn status_line(&self) -> String {
        let (a, b) = self.crossfader.gains();
        format!(
            "A: {}\nB: {}\nCrossfader {} ({:.0}%): A {:.0}% / B {:.0}%",
            self.decks[0].status_line(),
            self.decks[1].status_line(),
            self.crossfader.label(),
            self.crossfader.position() * 100.0,
            a * 100.0,
            b * 100.0
        )
    }

    pub fn shutdown(self) {
        let [deck_a, deck_b] = self.decks;
        deck_a.shutdown();
        deck_b.shutdown();
    }
}
