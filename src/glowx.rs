//! Extensions to glow for the direct state access buffer API

// glow::Context has its own loader generated using gl_generator, and we add ours for the DSA
// buffer functions glow does not wrap. This means loaders for most GL functions are duplicated but
// actually unused.

pub mod gl {
    include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
}

use std::os::raw::c_void;

pub struct ContextEx {
    ctx: glow::Context,
    glx: gl::Gl,
}

impl ContextEx {
    /// Load the GL function pointers from the current context
    ///
    /// # Safety
    ///
    /// A GL context must be current on the calling thread and `loader_function` must return
    /// pointers from that context.
    pub unsafe fn from_loader_function<F>(loader_function: F) -> Self
    where
        F: FnMut(&str) -> *const c_void + Clone,
    {
        Self {
            ctx: glow::Context::from_loader_function(loader_function.clone()),
            glx: gl::Gl::load_with(loader_function),
        }
    }

    pub(crate) fn glx(&self) -> &gl::Gl {
        &self.glx
    }

    pub unsafe fn create_buffers(&self, names: &mut [u32]) {
        self.glx
            .CreateBuffers(names.len() as i32, names.as_mut_ptr())
    }

    pub unsafe fn delete_buffers(&self, names: &[u32]) {
        self.glx.DeleteBuffers(names.len() as i32, names.as_ptr())
    }

    pub unsafe fn named_buffer_data(
        &self,
        buffer: u32,
        size: usize,
        data: Option<&[u8]>,
        usage: u32,
    ) {
        assert!(data.map(|d| d.len() >= size).unwrap_or(true));

        self.glx
            .NamedBufferData(buffer, size as isize, data_ptr(data), usage)
    }

    pub unsafe fn named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]) {
        self.glx.NamedBufferSubData(
            buffer,
            offset as isize,
            data.len() as isize,
            data.as_ptr() as *const _,
        )
    }

    pub unsafe fn named_buffer_storage(
        &self,
        buffer: u32,
        size: usize,
        data: Option<&[u8]>,
        flags: u32,
    ) {
        assert!(data.map(|d| d.len() >= size).unwrap_or(true));

        self.glx
            .NamedBufferStorage(buffer, size as isize, data_ptr(data), flags)
    }

    pub unsafe fn get_named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &mut [u8]) {
        self.glx.GetNamedBufferSubData(
            buffer,
            offset as isize,
            data.len() as isize,
            data.as_mut_ptr() as *mut _,
        )
    }

    pub unsafe fn copy_named_buffer_sub_data(
        &self,
        read_buffer: u32,
        write_buffer: u32,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        self.glx.CopyNamedBufferSubData(
            read_buffer,
            write_buffer,
            read_offset as isize,
            write_offset as isize,
            size as isize,
        )
    }

    pub unsafe fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]) {
        self.glx
            .BindBuffersBase(target, first, buffers.len() as i32, buffers.as_ptr())
    }

    pub unsafe fn bind_buffers_range(
        &self,
        target: u32,
        first: u32,
        buffers: &[u32],
        offsets: &[usize],
        sizes: &[usize],
    ) {
        assert!(buffers.len() == offsets.len() && buffers.len() == sizes.len());

        let offsets: Vec<isize> = offsets.iter().map(|&o| o as isize).collect();
        let sizes: Vec<isize> = sizes.iter().map(|&s| s as isize).collect();

        self.glx.BindBuffersRange(
            target,
            first,
            buffers.len() as i32,
            buffers.as_ptr(),
            offsets.as_ptr(),
            sizes.as_ptr(),
        )
    }
}

fn data_ptr(data: Option<&[u8]>) -> *const c_void {
    data.map(|d| d.as_ptr() as *const c_void)
        .unwrap_or(std::ptr::null())
}

impl std::ops::Deref for ContextEx {
    type Target = glow::Context;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl std::ops::DerefMut for ContextEx {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

impl std::convert::AsRef<glow::Context> for ContextEx {
    fn as_ref(&self) -> &glow::Context {
        &self.ctx
    }
}
