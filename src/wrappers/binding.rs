use std::mem::size_of;

use bytemuck::Pod;

use super::StructuredBuffer;
use crate::driver::BufferDriver;
use crate::errors::{Error, Result};
use crate::gl;

/// Slot cleared when a [`BufferBinding`] is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbindPolicy {
    /// Always clear slot 0 of the target, whatever slot the binding was created for
    SlotZero,
    /// Clear the slot the binding was created for
    OwnSlot,
}

impl Default for UnbindPolicy {
    fn default() -> Self {
        Self::SlotZero
    }
}

/// Buffer binding target (`GL_UNIFORM_BUFFER`, `GL_SHADER_STORAGE_BUFFER`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTarget {
    target: u32,
    unbind_policy: UnbindPolicy,
}

impl BufferTarget {
    pub const fn new(target: u32) -> Self {
        Self {
            target,
            unbind_policy: UnbindPolicy::SlotZero,
        }
    }

    pub fn with_unbind_policy(self, unbind_policy: UnbindPolicy) -> Self {
        Self {
            unbind_policy,
            ..self
        }
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn unbind_policy(&self) -> UnbindPolicy {
        self.unbind_policy
    }

    /// Start using the indexed binding point `index` of this target
    ///
    /// Nothing is bound until one of the `bind` methods of the returned binding is called.
    /// Only indexed targets (`uniform`, `shader_storage`, atomic counter and transform feedback
    /// buffers) have indexed binding points: the driver raises `GL_INVALID_ENUM` for a binding
    /// on `array` or `element_array`, at the latest when it is dropped. Use [`bind`](Self::bind)
    /// and [`unbind`](Self::unbind) for those.
    pub fn binding<'a, D: BufferDriver>(&'a self, gl: &'a D, index: u32) -> BufferBinding<'a, D> {
        BufferBinding {
            gl,
            target: self,
            index,
        }
    }

    /// Shorthand for [`binding`](Self::binding) at index 0
    pub fn default_binding<'a, D: BufferDriver>(&'a self, gl: &'a D) -> BufferBinding<'a, D> {
        self.binding(gl, 0)
    }

    /// Bind `buffer` to the non-indexed binding point of this target
    pub fn bind<T: Pod, D: BufferDriver>(&self, gl: &D, buffer: &StructuredBuffer<T>) {
        log::trace!("target 0x{:x}: bind buffer {}", self.target, buffer.raw_id());
        unsafe { gl.bind_buffer(self.target, buffer.raw_id()) }
    }

    /// Clear the non-indexed binding point of this target
    pub fn unbind<D: BufferDriver>(&self, gl: &D) {
        log::trace!("target 0x{:x}: unbind", self.target);
        unsafe { gl.bind_buffer(self.target, 0) }
    }
}

/// Buffer targets, created once with the context and passed to its users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTargets {
    pub array: BufferTarget,
    pub element_array: BufferTarget,
    pub shader_storage: BufferTarget,
    pub uniform: BufferTarget,
}

impl BufferTargets {
    pub const fn new() -> Self {
        Self {
            array: BufferTarget::new(gl::ARRAY_BUFFER),
            element_array: BufferTarget::new(gl::ELEMENT_ARRAY_BUFFER),
            shader_storage: BufferTarget::new(gl::SHADER_STORAGE_BUFFER),
            uniform: BufferTarget::new(gl::UNIFORM_BUFFER),
        }
    }

    pub fn with_unbind_policy(self, unbind_policy: UnbindPolicy) -> Self {
        Self {
            array: self.array.with_unbind_policy(unbind_policy),
            element_array: self.element_array.with_unbind_policy(unbind_policy),
            shader_storage: self.shader_storage.with_unbind_policy(unbind_policy),
            uniform: self.uniform.with_unbind_policy(unbind_policy),
        }
    }
}

impl Default for BufferTargets {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexed binding point of a [`BufferTarget`], cleared when dropped
///
/// Which slot gets cleared depends on the [`UnbindPolicy`] of the target: with the default
/// [`UnbindPolicy::SlotZero`], a binding created for slot 3 clears slot 0 and leaves slot 3 bound.
pub struct BufferBinding<'a, D: BufferDriver> {
    gl: &'a D,
    target: &'a BufferTarget,
    index: u32,
}

impl<'a, D: BufferDriver> BufferBinding<'a, D> {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn target(&self) -> &BufferTarget {
        self.target
    }

    /// Bind the whole of `buffer` to this slot
    pub fn bind<T: Pod>(&self, buffer: &StructuredBuffer<T>) {
        log::trace!(
            "target 0x{:x}[{}]: bind buffer {}",
            self.target.target,
            self.index,
            buffer.raw_id()
        );
        unsafe {
            self.gl
                .bind_buffer_base(self.target.target, self.index, buffer.raw_id())
        }
    }

    /// Bind `count` elements of `buffer` starting at element `offset` to this slot
    pub fn bind_range<T: Pod>(&self, buffer: &StructuredBuffer<T>, offset: usize, count: usize) {
        log::trace!(
            "target 0x{:x}[{}]: bind buffer {} range {}+{}",
            self.target.target,
            self.index,
            buffer.raw_id(),
            offset,
            count
        );
        unsafe {
            self.gl.bind_buffer_range(
                self.target.target,
                self.index,
                buffer.raw_id(),
                offset * size_of::<T>(),
                count * size_of::<T>(),
            )
        }
    }

    /// Bind `buffers` to consecutive slots starting at this one, in a single call
    pub fn bind_many<T: Pod>(&self, buffers: &[StructuredBuffer<T>]) {
        let names: Vec<u32> = buffers.iter().map(|b| b.raw_id()).collect();

        log::trace!(
            "target 0x{:x}[{}..{}]: bind buffers {:?}",
            self.target.target,
            self.index,
            self.index as usize + names.len(),
            names
        );
        unsafe {
            self.gl
                .bind_buffers_base(self.target.target, self.index, &names)
        }
    }

    /// Bind ranges of `buffers` to consecutive slots starting at this one, in a single call
    ///
    /// `offsets` and `counts` are in elements and need one entry per buffer.
    pub fn bind_ranges<T: Pod>(
        &self,
        buffers: &[StructuredBuffer<T>],
        offsets: &[usize],
        counts: &[usize],
    ) -> Result<()> {
        if buffers.len() != offsets.len() || buffers.len() != counts.len() {
            return Err(Error::LengthMismatch {
                buffers: buffers.len(),
                offsets: offsets.len(),
                sizes: counts.len(),
            });
        }

        let names: Vec<u32> = buffers.iter().map(|b| b.raw_id()).collect();
        let offsets: Vec<usize> = offsets.iter().map(|o| o * size_of::<T>()).collect();
        let sizes: Vec<usize> = counts.iter().map(|c| c * size_of::<T>()).collect();

        log::trace!(
            "target 0x{:x}[{}..{}]: bind buffer ranges {:?}",
            self.target.target,
            self.index,
            self.index as usize + names.len(),
            names
        );
        unsafe {
            self.gl.bind_buffers_range(
                self.target.target,
                self.index,
                &names,
                &offsets,
                &sizes,
            )
        }

        Ok(())
    }
}

impl<'a, D: BufferDriver> Drop for BufferBinding<'a, D> {
    fn drop(&mut self) {
        let index = match self.target.unbind_policy {
            UnbindPolicy::SlotZero => {
                if self.index != 0 {
                    log::debug!(
                        "target 0x{:x}: binding {} released, clearing slot 0",
                        self.target.target,
                        self.index
                    );
                }

                0
            }
            UnbindPolicy::OwnSlot => self.index,
        };

        unsafe { self.gl.bind_buffer_base(self.target.target, index, 0) }
    }
}
