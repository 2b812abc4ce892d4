//! Velocity component for entities that move in 3D space

use super::transform::Transform;
use crate::ecs::{Component, ComponentKind};
use crate::foundation::math::{Quat, Vec3};

/// Linear and angular velocity
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity {
    /// Linear velocity in units per second
    pub linear: Vec3,

    /// Angular velocity as a scaled rotation axis, in radians per second
    pub angular: Vec3,

    /// Maximum speed limit (0 = no limit)
    pub max_speed: f32,
}

impl Component for Velocity {
    const KIND: ComponentKind = ComponentKind::Velocity;
}

impl Default for Velocity {
    fn default() -> Self {
        Self {
            linear: Vec3::zeros(),
            angular: Vec3::zeros(),
            max_speed: 0.0,
        }
    }
}

impl Velocity {
    /// Create with a linear velocity only
    pub fn linear(linear: Vec3) -> Self {
        Self {
            linear,
            ..Default::default()
        }
    }

    /// Builder pattern: Set angular velocity
    pub fn with_angular(mut self, angular: Vec3) -> Self {
        self.angular = angular;
        self
    }

    /// Builder pattern: Set the speed limit
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Linear velocity after applying the speed limit
    pub fn clamped_linear(&self) -> Vec3 {
        let speed = self.linear.magnitude();
        if self.max_speed > 0.0 && speed > self.max_speed {
            self.linear * (self.max_speed / speed)
        } else {
            self.linear
        }
    }

    /// Integrate this velocity into `transform` over `dt` seconds
    pub fn apply(&self, transform: &mut Transform, dt: f32) {
        transform.position += self.clamped_linear() * dt;
        if self.angular.magnitude_squared() > 0.0 {
            transform.rotation = Quat::from_scaled_axis(self.angular * dt) * transform.rotation;
        }
    }
}
