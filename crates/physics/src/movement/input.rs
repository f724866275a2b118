//! Per-tick input records.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation tick number.
pub type Tick = u32;

/// Discrete action flags carried by an [`InputRecord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButtons(pub u8);

impl CommandButtons {
    /// Jump was pressed since the previous tick.
    pub const JUMP: u8 = 1 << 0;

    /// Sprint was held since the previous tick.
    pub const SPRINT: u8 = 1 << 1;

    /// Crouch was held since the previous tick.
    pub const CROUCH: u8 = 1 << 2;

    /// Check if a button is pressed.
    #[inline]
    pub fn pressed(self, button: u8) -> bool {
        (self.0 & button) != 0
    }

    /// Press a button.
    #[inline]
    pub fn press(&mut self, button: u8) {
        self.0 |= button;
    }

    /// Release a button.
    #[inline]
    pub fn release(&mut self, button: u8) {
        self.0 &= !button;
    }
}

/// Input for one simulation tick of one entity.
///
/// Built once per tick (by the sampler on the controlling side, from the
/// network or a prediction elsewhere) and never mutated afterwards except
/// for the tick tag, which the simulation loop assigns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Strafe axis (-1.0 to 1.0). Positive = right.
    pub horizontal: f32,

    /// Forward axis (-1.0 to 1.0). Positive = forward.
    pub vertical: f32,

    /// Action flags.
    pub buttons: CommandButtons,

    /// Look delta accumulated since the previous tick (yaw, pitch) in radians.
    pub look: Vec2,

    /// Tick this record belongs to.
    pub tick: Tick,
}

impl InputRecord {
    /// Create a record from raw values. Out-of-range values are clamped.
    pub fn new(horizontal: f32, vertical: f32, buttons: CommandButtons, look: Vec2) -> Self {
        Self {
            horizontal,
            vertical,
            buttons,
            look,
            tick: 0,
        }
        .sanitized()
    }

    /// Same record tagged with `tick`.
    pub fn with_tick(mut self, tick: Tick) -> Self {
        self.tick = tick;
        self
    }

    /// Clamp axes into [-1, 1] and zero out non-finite values.
    pub fn sanitized(mut self) -> Self {
        self.horizontal = clamp_axis(self.horizontal);
        self.vertical = clamp_axis(self.vertical);
        if !self.look.is_finite() {
            self.look = Vec2::ZERO;
        }
        self
    }

    /// Check if jump is requested.
    #[inline]
    pub fn wants_jump(&self) -> bool {
        self.buttons.pressed(CommandButtons::JUMP)
    }

    /// Check if sprint is requested.
    #[inline]
    pub fn wants_sprint(&self) -> bool {
        self.buttons.pressed(CommandButtons::SPRINT)
    }

    /// Check if crouch is requested.
    #[inline]
    pub fn wants_crouch(&self) -> bool {
        self.buttons.pressed(CommandButtons::CROUCH)
    }

    /// Prediction for a tick whose real input has not arrived: keeps the
    /// continuous axes and held intents, drops the one-shot jump and the look.
    pub fn predicted_from(last: &InputRecord, tick: Tick) -> Self {
        let mut buttons = last.buttons;
        buttons.release(CommandButtons::JUMP);
        Self {
            horizontal: last.horizontal,
            vertical: last.vertical,
            buttons,
            look: Vec2::ZERO,
            tick,
        }
    }

    /// Neutral record for `tick`.
    pub fn neutral(tick: Tick) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
