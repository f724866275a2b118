//! Controlling-side input sampling.
//!
//! Raw input arrives once per rendered frame; the simulation consumes one
//! [`InputRecord`] per tick. The sampler sits in between: it accumulates
//! look deltas and one-shot buttons across frames and packages them when the
//! tick fires.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use vantage_physics::{CommandButtons, InputRecord, LookRotation, MovementConfig};

/// Look sensitivity and inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookSettings {
    /// Multiplier for raw (yaw, pitch) look input.
    pub sensitivity: Vec2,

    /// Invert vertical look.
    pub invert: bool,
}

impl Default for LookSettings {
    fn default() -> Self {
        Self {
            sensitivity: Vec2::new(1.5, 1.25),
            invert: false,
        }
    }
}

impl LookSettings {
    /// Scale a raw look delta into a (yaw, pitch) delta in radians.
    pub fn scale(&self, raw: Vec2) -> Vec2 {
        let pitch_sign = if self.invert { -1.0 } else { 1.0 };
        Vec2::new(raw.x * self.sensitivity.x, raw.y * self.sensitivity.y * pitch_sign)
    }
}

/// Raw input for a single rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Strafe axis this frame.
    pub horizontal: f32,

    /// Forward axis this frame.
    pub vertical: f32,

    /// Raw look delta this frame (x = yaw, y = pitch).
    pub look_delta: Vec2,

    pub jump: bool,
    pub sprint: bool,
    pub crouch: bool,
}

/// Accumulates per-frame input into one record per tick.
#[derive(Debug, Clone)]
pub struct InputSampler {
    settings: LookSettings,
    min_pitch: f32,
    max_pitch: f32,

    horizontal: f32,
    vertical: f32,
    buttons: CommandButtons,
    look_accumulator: Vec2,

    /// Look applied locally every frame for the first-person camera.
    local_look: LookRotation,
}

impl InputSampler {
    pub fn new(settings: LookSettings, config: &MovementConfig) -> Self {
        Self {
            settings,
            min_pitch: config.min_pitch,
            max_pitch: config.max_pitch,
            horizontal: 0.0,
            vertical: 0.0,
            buttons: CommandButtons::default(),
            look_accumulator: Vec2::ZERO,
            local_look: LookRotation::default(),
        }
    }

    /// Fold one frame of raw input into the pending record.
    ///
    /// Axes are overwritten, buttons stay set until the next sample and look
    /// deltas are summed.
    pub fn record_frame(&mut self, frame: &FrameInput) {
        self.horizontal = frame.horizontal;
        self.vertical = frame.vertical;

        if frame.jump {
            self.buttons.press(CommandButtons::JUMP);
        }
        if frame.sprint {
            self.buttons.press(CommandButtons::SPRINT);
        }
        if frame.crouch {
            self.buttons.press(CommandButtons::CROUCH);
        }

        let delta = self.settings.scale(frame.look_delta);
        if delta.is_finite() {
            self.look_accumulator += delta;
            self.local_look = self.local_look.rotated(delta, self.min_pitch, self.max_pitch);
        }
    }

    /// Package everything since the previous sample and reset the
    /// accumulators. The tick tag is left for the simulation to assign.
    pub fn sample(&mut self) -> InputRecord {
        let record = InputRecord::new(self.horizontal, self.vertical, self.buttons, self.look_accumulator);

        self.buttons = CommandButtons::default();
        self.look_accumulator = Vec2::ZERO;

        record
    }

    /// Look the camera should show right now.
    pub fn local_look(&self) -> LookRotation {
        self.local_look
    }

    /// Re-align the local look, e.g. after spawning.
    pub fn set_local_look(&mut self, look: LookRotation) {
        self.local_look = look;
    }

    pub fn settings(&self) -> &LookSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> InputSampler {
        let settings = LookSettings {
            sensitivity: Vec2::ONE,
            invert: false,
        };
        InputSampler::new(settings, &MovementConfig::default())
    }

    #[test]
    fn test_look_accumulates_across_frames() {
        let mut sampler = sampler();
        for _ in 0..4 {
            sampler.record_frame(&FrameInput {
                look_delta: Vec2::new(0.01, 0.02),
                ..Default::default()
            });
        }

        let record = sampler.sample();
        assert!((record.look.x - 0.04).abs() < 1e-6);
        assert!((record.look.y - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_sample_clears_one_shot_input() {
        let mut sampler = sampler();
        sampler.record_frame(&FrameInput {
            horizontal: 1.0,
            jump: true,
            sprint: true,
            crouch: true,
            look_delta: Vec2::new(0.1, 0.0),
            ..Default::default()
        });
        // Button released on a later frame in the same tick still counts
        sampler.record_frame(&FrameInput {
            horizontal: 1.0,
            ..Default::default()
        });

        let first = sampler.sample();
        assert!(first.wants_jump());
        assert!(first.wants_sprint());
        assert!(first.wants_crouch());
        assert_eq!(first.horizontal, 1.0);

        let second = sampler.sample();
        assert!(!second.wants_jump());
        assert!(!second.wants_sprint());
        assert!(!second.wants_crouch());
        assert_eq!(second.look, Vec2::ZERO);
        assert_eq!(second.horizontal, 1.0);
    }

    #[test]
    fn test_axes_are_clamped() {
        let mut sampler = sampler();
        sampler.record_frame(&FrameInput {
            horizontal: 4.0,
            vertical: f32::NAN,
            ..Default::default()
        });

        let record = sampler.sample();
        assert_eq!(record.horizontal, 1.0);
        assert_eq!(record.vertical, 0.0);
    }

    #[test]
    fn test_sensitivity_and_invert() {
        let settings = LookSettings {
            sensitivity: Vec2::new(2.0, 3.0),
            invert: true,
        };
        let mut sampler = InputSampler::new(settings, &MovementConfig::default());
        sampler.record_frame(&FrameInput {
            look_delta: Vec2::new(0.1, 0.1),
            ..Default::default()
        });

        let record = sampler.sample();
        assert!((record.look.x - 0.2).abs() < 1e-6);
        assert!((record.look.y + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_local_look_is_clamped() {
        let config = MovementConfig::default();
        let mut sampler = sampler();
        for _ in 0..100 {
            sampler.record_frame(&FrameInput {
                look_delta: Vec2::new(0.0, 0.5),
                ..Default::default()
            });
        }

        assert!(sampler.local_look().pitch <= config.max_pitch);
        assert!((sampler.local_look().pitch - config.max_pitch).abs() < 1e-6);
    }
}
