//! Data shared between the billiards host and its front ends.

pub mod config;
pub mod protocol;
pub mod vec2;
