//! Two-deck crossfader
//!
//! Each deck runs its own `StemEngine`; the crossfader only drives the two
//! master volumes. Both decks stay at full level across the middle half of
//! the travel and fade out linearly towards the opposite end.

use super::StemEngine;

/// Crossfader position at rest
pub const CENTER: f32 = 0.5;

/// Master gains for deck A and deck B at `position`
///
/// 0.0 is deck A only, 1.0 deck B only; out-of-range positions are clamped
/// and a non-finite one is treated as center.
pub fn crossfade_gains(position: f32) -> (f32, f32) {
    let x = if position.is_finite() { position.clamp(0.0, 1.0) } else { CENTER };
    ((2.0 * (1.0 - x)).min(1.0), (2.0 * x).min(1.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossfader {
    position: f32,
}

impl Default for Crossfader {
    fn default() -> Self {
        Self { position: CENTER }
    }
}

impl Crossfader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    /// Move the fader; returns the position actually used
    pub fn set_position(&mut self, position: f32) -> f32 {
        self.position = if position.is_finite() { position.clamp(0.0, 1.0) } else { CENTER };
        self.position
    }

    pub fn gains(&self) -> (f32, f32) {
        crossfade_gains(self.position)
    }

    /// Short label for the fader side
    pub fn label(&self) -> &'static str {
        if self.position < 0.1 {
            "Deck A"
        } else if self.position > 0.9 {
            "Deck B"
        } else {
            "Mix"
        }
    }

    /// Push the gains into the decks' master volumes
    pub fn apply(&self, deck_a: &StemEngine, deck_b: &StemEngine) -> (f32, f32) {
        let (a, b) = self.gains();
        (deck_a.set_master_volume(a), deck_b.set_master_volume(b))
    }
}
