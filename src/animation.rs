//! Idle animation of the avatar.

use crate::{
    config::{AnimationConfig, ModelConfig},
    data_structures::instance::Instance,
};

/// Slow bob up and down with a hint of sway, advanced once per frame.
#[derive(Clone, Debug)]
pub struct Breathing {
    time: f32,
    speed: f32,
    amount: f32,
    sway: f32,
    base_y: f32,
    scale: f32,
}

impl Breathing {
    pub fn new(animation: &AnimationConfig, model: &ModelConfig) -> Self {
        Self {
            time: 0.0,
            speed: animation.speed,
            amount: animation.amount,
            sway: animation.sway,
            base_y: model.y_position,
            scale: model.scale,
        }
    }

    /// Transform of the model before the first frame.
    pub fn rest(&self) -> Instance {
        Instance::placed(self.scale, self.base_y, 0.0)
    }

    /// Advances one frame and returns the model's new root transform.
    pub fn step(&mut self) -> Instance {
        self.time += self.speed;
        let y = self.base_y + self.time.sin() * self.amount;
        let yaw = (self.time * 0.5).sin() * self.sway;
        Instance::placed(self.scale, y, yaw)
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}
