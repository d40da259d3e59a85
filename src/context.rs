/// OpenGL function context
pub type Context = crate::glowx::ContextEx;

pub use glow::HasContext;
