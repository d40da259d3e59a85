//! OpenGL buffer object wrappers

use std::rc::Rc;

mod buffer;
pub use buffer::*;

mod structured_buffer;
pub use structured_buffer::*;

mod binding;
pub use binding::*;

/// Trait for GL objects that can be dropped
pub trait GlDrop<D = crate::Context> {
    fn drop(&mut self, gl: &D);
}

/// Handle to a GL object that will be cleaned up when this handle is dropped
///
/// This keeps a RC reference to the context, so it is best used as a long-lived handle.
pub struct GlHandle<T, D = crate::Context>
where
    T: GlDrop<D>,
{
    gl: Rc<D>,
    res: T,
}

impl<T: GlDrop<D>, D> GlHandle<T, D> {
    pub fn new(gl: &Rc<D>, res: T) -> Self {
        Self {
            gl: gl.clone(),
            res,
        }
    }
}

impl<T: GlDrop<D>, D> Drop for GlHandle<T, D> {
    fn drop(&mut self) {
        self.res.drop(self.gl.as_ref());
    }
}

impl<T: GlDrop<D>, D> std::ops::Deref for GlHandle<T, D> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.res
    }
}

impl<T: GlDrop<D>, D> std::ops::DerefMut for GlHandle<T, D> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.res
    }
}

impl<T: GlDrop<D>, D> std::convert::AsRef<T> for GlHandle<T, D> {
    fn as_ref(&self) -> &T {
        &self.res
    }
}

impl<T: GlDrop<D>, D> std::convert::AsMut<T> for GlHandle<T, D> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.res
    }
}

/// Handle to a GL object that will be cleaned up when this handle is dropped
///
/// This keeps a reference to the context, so it is best used as a temporary handle.
pub struct GlRefHandle<'gl, T, D = crate::Context>
where
    T: GlDrop<D>,
{
    gl: &'gl D,
    res: T,
}

impl<'gl, T: GlDrop<D>, D> GlRefHandle<'gl, T, D> {
    pub fn new(gl: &'gl D, res: T) -> Self {
        Self { gl, res }
    }
}

impl<'gl, T: GlDrop<D>, D> Drop for GlRefHandle<'gl, T, D> {
    fn drop(&mut self) {
        self.res.drop(self.gl);
    }
}

impl<'gl, T: GlDrop<D>, D> std::convert::AsRef<T> for GlRefHandle<'gl, T, D> {
    fn as_ref(&self) -> &T {
        &self.res
    }
}

impl<'gl, T: GlDrop<D>, D> std::convert::AsMut<T> for GlRefHandle<'gl, T, D> {
    fn as_mut(&mut self) -> &mut T {
        &mut self.res
    }
}

impl<'gl, T: GlDrop<D>, D> std::ops::Deref for GlRefHandle<'gl, T, D> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.res
    }
}

impl<'gl, T: GlDrop<D>, D> std::ops::DerefMut for GlRefHandle<'gl, T, D> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DriverCall, RecordingDriver};

    #[test]
    fn gl_handle_releases_on_drop() {
        let gl = Rc::new(RecordingDriver::new());

        let name = {
            let buffer = GlHandle::new(&gl, StructuredBuffer::<f32>::new(&*gl).unwrap());
            buffer.write_all(&*gl, &[1.0, 2.0], DEFAULT_USAGE);
            assert!(gl.is_buffer(buffer.raw_id()));
            buffer.raw_id()
        };

        assert!(!gl.is_buffer(name));
        assert_eq!(gl.calls_to(DriverCall::DeleteBuffers), 1);
    }

    #[test]
    fn gl_ref_handle_releases_on_drop() {
        let gl = RecordingDriver::new();

        let names: Vec<u32> = {
            let buffers = GlRefHandle::new(&gl, StructuredBuffer::<u16>::create(&gl, 3).unwrap());
            buffers.iter().map(|b| b.raw_id()).collect()
        };

        assert!(names.iter().all(|&name| !gl.is_buffer(name)));
        // The whole batch goes in a single call
        assert_eq!(gl.calls_to(DriverCall::DeleteBuffers), 1);
    }
}
