//! Buffer object entry points of the GL driver

use crate::glowx::ContextEx;

/// The GL buffer-object API family, as called by the wrappers
///
/// Every method maps to exactly one GL entry point. Errors are never returned from these calls:
/// the driver records them in its global error flag, which is read with
/// [`get_error`](BufferDriver::get_error) (see [`crate::check_error`]).
///
/// # Safety
///
/// As with glow's `HasContext`, the methods are unsafe because they call into the driver. The
/// context must be current on the calling thread. Host slices bound the number of bytes or names
/// the driver reads or writes; implementations must not access memory past them.
pub trait BufferDriver {
    /// `glCreateBuffers`: allocate `names.len()` new buffer names
    unsafe fn create_buffers(&self, names: &mut [u32]);

    /// `glDeleteBuffers`
    unsafe fn delete_buffers(&self, names: &[u32]);

    /// `glNamedBufferData`, `data` is either `None` or at least `size` bytes long
    unsafe fn named_buffer_data(&self, buffer: u32, size: usize, data: Option<&[u8]>, usage: u32);

    /// `glNamedBufferSubData`
    unsafe fn named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]);

    /// `glNamedBufferStorage`, `data` is either `None` or at least `size` bytes long
    unsafe fn named_buffer_storage(&self, buffer: u32, size: usize, data: Option<&[u8]>, flags: u32);

    /// `glGetNamedBufferSubData`
    unsafe fn get_named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &mut [u8]);

    /// `glCopyNamedBufferSubData`
    unsafe fn copy_named_buffer_sub_data(
        &self,
        read_buffer: u32,
        write_buffer: u32,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    );

    /// `glBindBuffer`, name 0 unbinds
    unsafe fn bind_buffer(&self, target: u32, buffer: u32);

    /// `glBindBufferBase`, name 0 unbinds
    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: u32);

    /// `glBindBufferRange`
    unsafe fn bind_buffer_range(
        &self,
        target: u32,
        index: u32,
        buffer: u32,
        offset: usize,
        size: usize,
    );

    /// `glBindBuffersBase`
    unsafe fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]);

    /// `glBindBuffersRange`, the three slices have the same length
    unsafe fn bind_buffers_range(
        &self,
        target: u32,
        first: u32,
        buffers: &[u32],
        offsets: &[usize],
        sizes: &[usize],
    );

    /// `glGetError`: return and clear the current error flag
    unsafe fn get_error(&self) -> u32;
}

impl BufferDriver for ContextEx {
    unsafe fn create_buffers(&self, names: &mut [u32]) {
        ContextEx::create_buffers(self, names)
    }

    unsafe fn delete_buffers(&self, names: &[u32]) {
        ContextEx::delete_buffers(self, names)
    }

    unsafe fn named_buffer_data(&self, buffer: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        ContextEx::named_buffer_data(self, buffer, size, data, usage)
    }

    unsafe fn named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]) {
        ContextEx::named_buffer_sub_data(self, buffer, offset, data)
    }

    unsafe fn named_buffer_storage(&self, buffer: u32, size: usize, data: Option<&[u8]>, flags: u32) {
        ContextEx::named_buffer_storage(self, buffer, size, data, flags)
    }

    unsafe fn get_named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &mut [u8]) {
        ContextEx::get_named_buffer_sub_data(self, buffer, offset, data)
    }

    unsafe fn copy_named_buffer_sub_data(
        &self,
        read_buffer: u32,
        write_buffer: u32,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        ContextEx::copy_named_buffer_sub_data(
            self,
            read_buffer,
            write_buffer,
            read_offset,
            write_offset,
            size,
        )
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: u32) {
        self.glx().BindBuffer(target, buffer)
    }

    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: u32) {
        self.glx().BindBufferBase(target, index, buffer)
    }

    unsafe fn bind_buffer_range(
        &self,
        target: u32,
        index: u32,
        buffer: u32,
        offset: usize,
        size: usize,
    ) {
        self.glx()
            .BindBufferRange(target, index, buffer, offset as isize, size as isize)
    }

    unsafe fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]) {
        ContextEx::bind_buffers_base(self, target, first, buffers)
    }

    unsafe fn bind_buffers_range(
        &self,
        target: u32,
        first: u32,
        buffers: &[u32],
        offsets: &[usize],
        sizes: &[usize],
    ) {
        ContextEx::bind_buffers_range(self, target, first, buffers, offsets, sizes)
    }

    unsafe fn get_error(&self) -> u32 {
        self.glx().GetError()
    }
}
