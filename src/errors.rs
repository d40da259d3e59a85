use std::error;
use std::fmt;

use crate::driver::BufferDriver;
use crate::gl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    CreateFailed,
    Gl(u32),
    LengthMismatch {
        buffers: usize,
        offsets: usize,
        sizes: usize,
    },
}

/// Name of a `glGetError` code
pub fn error_name(code: u32) -> Option<&'static str> {
    Some(match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => return None,
    })
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CreateFailed => write!(f, "the driver did not return a buffer name"),
            Self::Gl(code) => match error_name(*code) {
                Some(name) => write!(f, "driver error: {}", name),
                None => write!(f, "driver error: 0x{:04x}", code),
            },
            Self::LengthMismatch {
                buffers,
                offsets,
                sizes,
            } => write!(
                f,
                "ranged binding of {} buffers got {} offsets and {} sizes",
                buffers, offsets, sizes
            ),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Read the driver's error flag
///
/// Wrapper operations never check for errors themselves, this is the out-of-band query callers
/// use after a sequence of calls.
pub fn check_error<D: BufferDriver>(gl: &D) -> Result<()> {
    match unsafe { gl.get_error() } {
        gl::NO_ERROR => Ok(()),
        code => {
            log::debug!("driver reported {}", Error::Gl(code));
            Err(Error::Gl(code))
        }
    }
}
