//! Lifetime Component
//!
//! Tracks how long an entity has left before it is despawned.

use crate::ecs::{Component, ComponentKind};

/// Remaining lifetime of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// Seconds left; infinite lifetimes never expire
    pub remaining: f32,
}

impl Component for Lifetime {
    const KIND: ComponentKind = ComponentKind::Lifetime;
}

impl Lifetime {
    /// Create a lifetime of `seconds`; zero or less means infinite
    pub fn new(seconds: f32) -> Self {
        if seconds <= 0.0 {
            Self::infinite()
        } else {
            Self { remaining: seconds }
        }
    }

    /// A lifetime that never expires
    pub fn infinite() -> Self {
        Self { remaining: f32::INFINITY }
    }

    /// Count down by `dt` seconds, returning whether the lifetime is now over
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.is_expired()
    }

    /// Check if this entity's lifetime has expired
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}
