//! Typed, RAII-style wrappers over OpenGL 4.5+ direct state access buffer objects
//!
//! ```ignore
//! let mut gl = unsafe { dsagl::Context::from_loader_function(loader) };
//! dsagl::debug::install_debug_logger(&mut gl);
//! let gl = Rc::new(gl);
//! let targets = dsagl::wrappers::BufferTargets::new();
//!
//! let params = GlHandle::new(&gl, StructuredBuffer::<[f32; 4]>::new(gl.as_ref())?);
//! params.allocate_immutable(gl.as_ref(), &[[0.0; 4]; 16], DEFAULT_STORAGE_FLAGS);
//!
//! let binding = targets.uniform.binding(gl.as_ref(), 1);
//! binding.bind(&params);
//! ```

pub(crate) mod glowx;

mod context;
pub use context::*;

pub mod debug;
pub mod driver;
pub mod errors;
pub mod gl;
pub mod log;
pub mod recording;
pub mod wrappers;

pub use errors::{check_error, Error, Result};

pub use glow;

pub mod prelude {
    pub use super::driver::BufferDriver;
    pub use super::glow::HasContext;

    pub use super::wrappers::GlDrop;
    pub use super::wrappers::{BufferTarget, BufferTargets, UnbindPolicy};
    pub use super::wrappers::{ByteBuffer, StructuredBuffer};
    pub use super::wrappers::{DEFAULT_STORAGE_FLAGS, DEFAULT_USAGE};

    pub use bytemuck;
}
