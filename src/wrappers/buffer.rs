use crate::driver::BufferDriver;
use crate::errors::{Error, Result};
use crate::gl;

/// Name held by a buffer that was released
pub const INVALID_NAME: u32 = u32::MAX;

/// Usage hint for mutable storage when the caller has no preference
pub const DEFAULT_USAGE: u32 = gl::STATIC_DRAW;

/// Flags for immutable storage when the caller has no preference
pub const DEFAULT_STORAGE_FLAGS: u32 = gl::DYNAMIC_STORAGE_BIT;

/// Untyped buffer object, all sizes and offsets are in bytes
///
/// The buffer does not keep a reference to the context: it must be released through
/// [`GlDrop`](super::GlDrop), usually by wrapping it in a [`GlHandle`](super::GlHandle).
#[derive(Debug, PartialEq, Eq)]
pub struct Buffer {
    name: u32,
}

impl Buffer {
    pub fn new<D: BufferDriver>(gl: &D) -> Result<Self> {
        let mut names = [0];
        unsafe { gl.create_buffers(&mut names) };

        match names[0] {
            0 => Err(Error::CreateFailed),
            name => {
                log::trace!("created buffer {}", name);
                Ok(Self { name })
            }
        }
    }

    /// Adopt a buffer name allocated elsewhere, usually by a batched `glCreateBuffers` call
    ///
    /// The returned buffer owns the name: it will be deleted when the buffer is released.
    pub fn from_raw(name: u32) -> Self {
        Self { name }
    }

    pub fn raw_id(&self) -> u32 {
        self.name
    }

    pub fn is_valid(&self) -> bool {
        self.name != INVALID_NAME
    }

    /// Take the name out of this buffer, leaving the invalid name behind
    pub(super) fn release_name(&mut self) -> Option<u32> {
        if self.is_valid() {
            Some(std::mem::replace(&mut self.name, INVALID_NAME))
        } else {
            None
        }
    }

    /// Read `data.len()` bytes starting at `offset`
    pub fn read_range<D: BufferDriver>(&self, gl: &D, offset: usize, data: &mut [u8]) {
        log::trace!(
            "buffer {}: read {} bytes at {}",
            self.name,
            data.len(),
            offset
        );
        unsafe { gl.get_named_buffer_sub_data(self.name, offset, data) }
    }

    /// (Re)allocate mutable storage initialized from `data`
    pub fn write_all<D: BufferDriver>(&self, gl: &D, data: &[u8], usage: u32) {
        log::trace!("buffer {}: data {} bytes", self.name, data.len());
        unsafe { gl.named_buffer_data(self.name, data.len(), Some(data), usage) }
    }

    /// (Re)allocate `size` bytes of uninitialized mutable storage
    pub fn write_all_uninit<D: BufferDriver>(&self, gl: &D, size: usize, usage: u32) {
        log::trace!("buffer {}: data {} bytes, uninitialized", self.name, size);
        unsafe { gl.named_buffer_data(self.name, size, None, usage) }
    }

    /// Overwrite part of the existing storage
    pub fn write_range<D: BufferDriver>(&self, gl: &D, offset: usize, data: &[u8]) {
        log::trace!(
            "buffer {}: write {} bytes at {}",
            self.name,
            data.len(),
            offset
        );
        unsafe { gl.named_buffer_sub_data(self.name, offset, data) }
    }

    /// Allocate immutable storage initialized from `data`
    ///
    /// Immutable storage can only be allocated once, the driver rejects later calls.
    pub fn allocate_immutable<D: BufferDriver>(&self, gl: &D, data: &[u8], flags: u32) {
        log::trace!(
            "buffer {}: storage {} bytes, flags 0x{:x}",
            self.name,
            data.len(),
            flags
        );
        unsafe { gl.named_buffer_storage(self.name, data.len(), Some(data), flags) }
    }

    /// Allocate `size` bytes of uninitialized immutable storage
    pub fn allocate_immutable_uninit<D: BufferDriver>(&self, gl: &D, size: usize, flags: u32) {
        log::trace!(
            "buffer {}: storage {} bytes, flags 0x{:x}, uninitialized",
            self.name,
            size,
            flags
        );
        unsafe { gl.named_buffer_storage(self.name, size, None, flags) }
    }

    /// Copy `size` bytes from this buffer into `dest`
    pub fn copy_to<D: BufferDriver>(
        &self,
        gl: &D,
        dest: &Buffer,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        log::trace!(
            "buffer {}: copy {} bytes at {} to buffer {} at {}",
            self.name,
            size,
            read_offset,
            dest.name,
            write_offset
        );
        unsafe {
            gl.copy_named_buffer_sub_data(self.name, dest.name, read_offset, write_offset, size)
        }
    }
}

impl AsRef<Buffer> for Buffer {
    fn as_ref(&self) -> &Buffer {
        self
    }
}

impl<D: BufferDriver> super::GlDrop<D> for Buffer {
    fn drop(&mut self, gl: &D) {
        if let Some(name) = self.release_name() {
            log::trace!("deleting buffer {}", name);
            unsafe { gl.delete_buffers(&[name]) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::check_error;
    use crate::recording::{DriverCall, RecordingDriver};
    use crate::wrappers::GlDrop;

    #[test]
    fn new_allocates_one_name() {
        let gl = RecordingDriver::new();
        let a = Buffer::new(&gl).unwrap();
        let b = Buffer::new(&gl).unwrap();

        assert_ne!(a.raw_id(), b.raw_id());
        assert!(gl.is_buffer(a.raw_id()));
        assert_eq!(gl.calls_to(DriverCall::CreateBuffers), 2);
    }

    #[test]
    fn from_raw_adopts_without_driver_call() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::from_raw(42);

        assert_eq!(buffer.raw_id(), 42);
        assert_eq!(gl.call_count(), 0);
    }

    #[test]
    fn release_resets_to_invalid_name() {
        let gl = RecordingDriver::new();
        let mut buffer = Buffer::new(&gl).unwrap();
        let name = buffer.raw_id();

        buffer.drop(&gl);
        assert_eq!(buffer.raw_id(), INVALID_NAME);
        assert!(!buffer.is_valid());
        assert!(!gl.is_buffer(name));

        // Released names are never deleted twice
        buffer.drop(&gl);
        assert_eq!(buffer.raw_id(), INVALID_NAME);
        assert_eq!(gl.calls_to(DriverCall::DeleteBuffers), 1);
    }

    #[test]
    fn write_all_then_read_range() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.write_all(&gl, &[1, 2, 3, 4, 5, 6], gl::DYNAMIC_DRAW);
        let mut data = [0u8; 3];
        buffer.read_range(&gl, 2, &mut data);

        assert_eq!(data, [3, 4, 5]);
        assert_eq!(check_error(&gl), Ok(()));
    }

    #[test]
    fn write_all_uninit_sizes_storage() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.write_all_uninit(&gl, 16, gl::STREAM_DRAW);
        assert_eq!(gl.storage(buffer.raw_id()).map(|s| s.len()), Some(16));

        // Reallocation replaces the storage
        buffer.write_all(&gl, &[7; 4], DEFAULT_USAGE);
        assert_eq!(gl.storage(buffer.raw_id()), Some(vec![7; 4]));
    }

    #[test]
    fn write_range_in_bounds() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.write_all(&gl, &[0; 8], DEFAULT_USAGE);
        buffer.write_range(&gl, 4, &[1, 2, 3, 4]);

        assert_eq!(
            gl.storage(buffer.raw_id()),
            Some(vec![0, 0, 0, 0, 1, 2, 3, 4])
        );
        assert_eq!(check_error(&gl), Ok(()));
    }

    #[test]
    fn write_range_out_of_bounds_is_rejected() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.write_all(&gl, &[0; 8], DEFAULT_USAGE);
        buffer.write_range(&gl, 6, &[1, 2, 3, 4]);

        assert_eq!(gl.storage(buffer.raw_id()), Some(vec![0; 8]));
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));
    }

    #[test]
    fn read_range_out_of_bounds_is_rejected() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.write_all(&gl, &[1; 4], DEFAULT_USAGE);
        let mut data = [0u8; 4];
        buffer.read_range(&gl, 2, &mut data);

        assert_eq!(data, [0; 4]);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));
    }

    #[test]
    fn read_range_without_storage_is_rejected() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        let mut data = [7u8; 4];
        buffer.read_range(&gl, 0, &mut data);

        assert_eq!(data, [7; 4]);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));
    }

    #[test]
    fn overflowing_offsets_are_rejected() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();
        buffer.write_all(&gl, &[0; 8], DEFAULT_USAGE);

        buffer.write_range(&gl, usize::MAX, &[1]);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));

        let mut data = [0u8; 2];
        buffer.read_range(&gl, usize::MAX - 1, &mut data);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));

        assert_eq!(gl.storage(buffer.raw_id()), Some(vec![0; 8]));
    }

    #[test]
    fn allocate_immutable_twice_is_rejected() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.allocate_immutable(&gl, &[1, 2], DEFAULT_STORAGE_FLAGS);
        assert_eq!(check_error(&gl), Ok(()));

        buffer.allocate_immutable_uninit(&gl, 64, DEFAULT_STORAGE_FLAGS);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_OPERATION)));
        assert_eq!(gl.storage(buffer.raw_id()), Some(vec![1, 2]));

        // Mutable reallocation is rejected as well
        buffer.write_all(&gl, &[0; 4], DEFAULT_USAGE);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_OPERATION)));
    }

    #[test]
    fn immutable_storage_without_dynamic_bit_rejects_writes() {
        let gl = RecordingDriver::new();
        let buffer = Buffer::new(&gl).unwrap();

        buffer.allocate_immutable(&gl, &[1, 2, 3, 4], gl::MAP_READ_BIT);
        buffer.write_range(&gl, 0, &[9]);

        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_OPERATION)));
        assert_eq!(gl.storage(buffer.raw_id()), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn copy_to_other_buffer() {
        let gl = RecordingDriver::new();
        let src = Buffer::new(&gl).unwrap();
        let dst = Buffer::new(&gl).unwrap();

        src.write_all(&gl, &[1, 2, 3, 4], DEFAULT_USAGE);
        dst.allocate_immutable(&gl, &[0; 6], DEFAULT_STORAGE_FLAGS);
        src.copy_to(&gl, &dst, 1, 2, 3);

        assert_eq!(gl.storage(dst.raw_id()), Some(vec![0, 0, 2, 3, 4, 0]));
        assert_eq!(check_error(&gl), Ok(()));

        src.copy_to(&gl, &dst, 0, 4, 4);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));
    }

    #[test]
    fn operations_on_released_buffer_are_driver_errors() {
        let gl = RecordingDriver::new();
        let mut buffer = Buffer::new(&gl).unwrap();
        buffer.drop(&gl);

        buffer.write_all(&gl, &[1], DEFAULT_USAGE);
        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_OPERATION)));
    }
}
