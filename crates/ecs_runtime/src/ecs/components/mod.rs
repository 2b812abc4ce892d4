//! ECS Components module
//!
//! Built-in components shared by the runtime and loaded modules.

pub mod label;
pub mod lifetime;
pub mod transform;
pub mod velocity;

pub use label::Label;
pub use lifetime::Lifetime;
pub use transform::Transform;
pub use velocity::Velocity;
