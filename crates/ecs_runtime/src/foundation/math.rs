//! Math type aliases
//!
//! The runtime treats vector math as an external concern; these aliases pin
//! the nalgebra types used by the built-in components.

pub use nalgebra::{Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;
