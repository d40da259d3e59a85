//! Exposed OpenGL constants and types

pub use ::glow::*;
