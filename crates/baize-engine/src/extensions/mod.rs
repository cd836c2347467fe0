// Optional helpers decoupled from the physics and rules core.

pub mod easing;

pub use easing::{ease_vec2, lerp_vec2, Easing};
