use bevy::prelude::*;
use serde::Serialize;

/// Camera shake request for the presentation layer.
#[derive(Event, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraShake {
    pub duration_ms: u32,
    pub intensity: f32,
}

/// Optional presentation effects the director may ask for. Implementations are free to
/// ignore any of them.
pub trait Feedback {
    fn camera_shake(&mut self, duration_ms: u32, intensity: f32);
}

pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn camera_shake(&mut self, _duration_ms: u32, _intensity: f32) {}
}

/// Collects requests so they can be forwarded (or asserted on) after the tick.
#[derive(Default, Debug)]
pub struct RecordedFeedback {
    pub shakes: Vec<CameraShake>,
}

impl Feedback for RecordedFeedback {
    fn camera_shake(&mut self, duration_ms: u32, intensity: f32) {
        self.shakes.push(CameraShake {
            duration_ms,
            intensity,
        });
    }
}
