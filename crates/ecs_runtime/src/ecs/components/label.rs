//! Human-readable entity name

use crate::ecs::{Component, ComponentKind};
use std::fmt;

/// Display name of an entity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Label(pub String);

impl Component for Label {
    const KIND: ComponentKind = ComponentKind::Label;
}

impl Label {
    /// Create a label
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Label text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
