//! In-process emulation of the GL buffer object state
//!
//! [`RecordingDriver`] implements [`BufferDriver`] without a GL context. It keeps buffer contents
//! and binding points in memory, raises the errors a GL 4.6 driver would raise in its error flag,
//! and records every call so tests can count driver round-trips.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::TryFrom;

use crate::driver::BufferDriver;
use crate::gl;

/// Driver entry point, as recorded by [`RecordingDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCall {
    CreateBuffers,
    DeleteBuffers,
    NamedBufferData,
    NamedBufferSubData,
    NamedBufferStorage,
    GetNamedBufferSubData,
    CopyNamedBufferSubData,
    BindBuffer,
    BindBufferBase,
    BindBufferRange,
    BindBuffersBase,
    BindBuffersRange,
    GetError,
}

/// Buffer bound to an indexed binding point, `range` is `(offset, size)` in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedBinding {
    pub buffer: u32,
    pub range: Option<(usize, usize)>,
}

#[derive(Debug, Default)]
struct BufferObject {
    storage: Option<Vec<u8>>,
    immutable: bool,
    flags: u32,
}

impl BufferObject {
    fn len(&self) -> usize {
        self.storage.as_ref().map(|s| s.len()).unwrap_or(0)
    }

    fn contains(&self, offset: usize, size: usize) -> bool {
        fits(offset, size, self.len())
    }
}

/// `offset..offset + size` lies within `len` bytes, without overflowing
fn fits(offset: usize, size: usize, len: usize) -> bool {
    offset.checked_add(size).map_or(false, |end| end <= len)
}

/// Slots `first..first + count` exist
fn slots_fit(first: u32, count: usize) -> bool {
    u32::try_from(count)
        .ok()
        .and_then(|count| first.checked_add(count))
        .is_some()
}

#[derive(Debug, Default)]
struct State {
    last_name: u32,
    buffers: HashMap<u32, BufferObject>,
    bound: HashMap<u32, u32>,
    indexed: HashMap<(u32, u32), IndexedBinding>,
    error: u32,
    calls: Vec<DriverCall>,
}

impl State {
    fn raise(&mut self, code: u32) {
        log::debug!(
            "recorded driver error 0x{:04x} in {:?}",
            code,
            self.calls.last()
        );

        // Like GL, keep the first error until it is read
        if self.error == gl::NO_ERROR {
            self.error = code;
        }
    }

    fn is_indexed_target(target: u32) -> bool {
        matches!(
            target,
            gl::UNIFORM_BUFFER
                | gl::SHADER_STORAGE_BUFFER
                | gl::ATOMIC_COUNTER_BUFFER
                | gl::TRANSFORM_FEEDBACK_BUFFER
        )
    }

    fn is_usage(usage: u32) -> bool {
        matches!(
            usage,
            gl::STREAM_DRAW
                | gl::STREAM_READ
                | gl::STREAM_COPY
                | gl::STATIC_DRAW
                | gl::STATIC_READ
                | gl::STATIC_COPY
                | gl::DYNAMIC_DRAW
                | gl::DYNAMIC_READ
                | gl::DYNAMIC_COPY
        )
    }

    /// Check that `name` is a live buffer or 0, for binding calls
    fn check_bindable(&mut self, name: u32) -> bool {
        if name == 0 || self.buffers.contains_key(&name) {
            true
        } else {
            self.raise(gl::INVALID_OPERATION);
            false
        }
    }

    fn set_indexed(&mut self, target: u32, index: u32, binding: Option<IndexedBinding>) {
        match binding {
            Some(binding) if binding.buffer != 0 => {
                self.indexed.insert((target, index), binding);
            }
            _ => {
                self.indexed.remove(&(target, index));
            }
        }
    }
}

/// [`BufferDriver`] emulating GL buffer objects in memory
#[derive(Debug, Default)]
pub struct RecordingDriver {
    state: RefCell<State>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: DriverCall) -> std::cell::RefMut<State> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        state
    }

    /// True if `name` was created and not deleted since
    pub fn is_buffer(&self, name: u32) -> bool {
        self.state.borrow().buffers.contains_key(&name)
    }

    /// Contents of the storage of buffer `name`, if it has any
    pub fn storage(&self, name: u32) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&name)
            .and_then(|buffer| buffer.storage.clone())
    }

    pub fn is_immutable(&self, name: u32) -> bool {
        self.state
            .borrow()
            .buffers
            .get(&name)
            .map(|buffer| buffer.immutable)
            .unwrap_or(false)
    }

    /// Buffer bound to the non-indexed binding point of `target`
    pub fn bound_buffer(&self, target: u32) -> Option<u32> {
        self.state.borrow().bound.get(&target).copied()
    }

    /// Buffer bound to the indexed binding point `index` of `target`
    pub fn indexed_binding(&self, target: u32, index: u32) -> Option<IndexedBinding> {
        self.state.borrow().indexed.get(&(target, index)).copied()
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_to(&self, call: DriverCall) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|&&c| c == call)
            .count()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }
}

impl BufferDriver for RecordingDriver {
    unsafe fn create_buffers(&self, names: &mut [u32]) {
        let mut state = self.record(DriverCall::CreateBuffers);

        for name in names.iter_mut() {
            state.last_name += 1;
            *name = state.last_name;
            state.buffers.insert(*name, BufferObject::default());
        }
    }

    unsafe fn delete_buffers(&self, names: &[u32]) {
        let mut state = self.record(DriverCall::DeleteBuffers);

        for name in names {
            // Unknown names and 0 are silently ignored
            if state.buffers.remove(name).is_some() {
                state.bound.retain(|_, bound| bound != name);
                state.indexed.retain(|_, binding| binding.buffer != *name);
            }
        }
    }

    unsafe fn named_buffer_data(&self, buffer: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        let mut state = self.record(DriverCall::NamedBufferData);

        if !State::is_usage(usage) {
            return state.raise(gl::INVALID_ENUM);
        }

        let error = match state.buffers.get_mut(&buffer) {
            Some(object) if !object.immutable => {
                object.storage = Some(match data {
                    Some(data) => data[..size].to_vec(),
                    None => vec![0; size],
                });
                None
            }
            _ => Some(gl::INVALID_OPERATION),
        };

        if let Some(error) = error {
            state.raise(error);
        }
    }

    unsafe fn named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &[u8]) {
        let mut state = self.record(DriverCall::NamedBufferSubData);

        let error = match state.buffers.get_mut(&buffer) {
            None => Some(gl::INVALID_OPERATION),
            Some(object) if !object.contains(offset, data.len()) => Some(gl::INVALID_VALUE),
            Some(object) if object.immutable && object.flags & gl::DYNAMIC_STORAGE_BIT == 0 => {
                Some(gl::INVALID_OPERATION)
            }
            Some(object) => {
                if let Some(storage) = object.storage.as_mut() {
                    storage[offset..offset + data.len()].copy_from_slice(data);
                }
                None
            }
        };

        if let Some(error) = error {
            state.raise(error);
        }
    }

    unsafe fn named_buffer_storage(&self, buffer: u32, size: usize, data: Option<&[u8]>, flags: u32) {
        let mut state = self.record(DriverCall::NamedBufferStorage);

        let error = match state.buffers.get_mut(&buffer) {
            None => Some(gl::INVALID_OPERATION),
            Some(object) if object.immutable => Some(gl::INVALID_OPERATION),
            Some(_) if size == 0 => Some(gl::INVALID_VALUE),
            Some(object) => {
                object.storage = Some(match data {
                    Some(data) => data[..size].to_vec(),
                    None => vec![0; size],
                });
                object.immutable = true;
                object.flags = flags;
                None
            }
        };

        if let Some(error) = error {
            state.raise(error);
        }
    }

    unsafe fn get_named_buffer_sub_data(&self, buffer: u32, offset: usize, data: &mut [u8]) {
        let mut state = self.record(DriverCall::GetNamedBufferSubData);

        let error = match state.buffers.get(&buffer) {
            None => Some(gl::INVALID_OPERATION),
            Some(object) if !object.contains(offset, data.len()) => Some(gl::INVALID_VALUE),
            Some(object) => {
                if let Some(storage) = object.storage.as_ref() {
                    data.copy_from_slice(&storage[offset..offset + data.len()]);
                }
                None
            }
        };

        if let Some(error) = error {
            state.raise(error);
        }
    }

    unsafe fn copy_named_buffer_sub_data(
        &self,
        read_buffer: u32,
        write_buffer: u32,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        let mut state = self.record(DriverCall::CopyNamedBufferSubData);

        let lengths = match (
            state.buffers.get(&read_buffer),
            state.buffers.get(&write_buffer),
        ) {
            (Some(read), Some(write)) => Some((read.len(), write.len())),
            _ => None,
        };

        let (read_len, write_len) = match lengths {
            Some(lengths) => lengths,
            None => return state.raise(gl::INVALID_OPERATION),
        };

        if !fits(read_offset, size, read_len) || !fits(write_offset, size, write_len) {
            return state.raise(gl::INVALID_VALUE);
        }

        if read_buffer == write_buffer {
            let overlap = read_offset < write_offset + size && write_offset < read_offset + size;
            if overlap {
                return state.raise(gl::INVALID_VALUE);
            }

            if let Some(storage) = state
                .buffers
                .get_mut(&read_buffer)
                .and_then(|object| object.storage.as_mut())
            {
                storage.copy_within(read_offset..read_offset + size, write_offset);
            }
        } else {
            let source: Vec<u8> = state.buffers[&read_buffer]
                .storage
                .as_ref()
                .map(|storage| storage[read_offset..read_offset + size].to_vec())
                .unwrap_or_default();

            if let Some(storage) = state
                .buffers
                .get_mut(&write_buffer)
                .and_then(|object| object.storage.as_mut())
            {
                storage[write_offset..write_offset + size].copy_from_slice(&source);
            }
        }
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: u32) {
        let mut state = self.record(DriverCall::BindBuffer);

        if state.check_bindable(buffer) {
            if buffer == 0 {
                state.bound.remove(&target);
            } else {
                state.bound.insert(target, buffer);
            }
        }
    }

    unsafe fn bind_buffer_base(&self, target: u32, index: u32, buffer: u32) {
        let mut state = self.record(DriverCall::BindBufferBase);

        if !State::is_indexed_target(target) {
            return state.raise(gl::INVALID_ENUM);
        }

        if state.check_bindable(buffer) {
            state.set_indexed(
                target,
                index,
                Some(IndexedBinding {
                    buffer,
                    range: None,
                }),
            );
        }
    }

    unsafe fn bind_buffer_range(
        &self,
        target: u32,
        index: u32,
        buffer: u32,
        offset: usize,
        size: usize,
    ) {
        let mut state = self.record(DriverCall::BindBufferRange);

        if !State::is_indexed_target(target) {
            return state.raise(gl::INVALID_ENUM);
        }

        if buffer != 0 && size == 0 {
            return state.raise(gl::INVALID_VALUE);
        }

        if state.check_bindable(buffer) {
            state.set_indexed(
                target,
                index,
                Some(IndexedBinding {
                    buffer,
                    range: Some((offset, size)),
                }),
            );
        }
    }

    unsafe fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]) {
        let mut state = self.record(DriverCall::BindBuffersBase);

        if !State::is_indexed_target(target) {
            return state.raise(gl::INVALID_ENUM);
        }

        if !slots_fit(first, buffers.len()) {
            return state.raise(gl::INVALID_OPERATION);
        }

        // Invalid entries are skipped, the other ones are still bound
        for (i, &buffer) in buffers.iter().enumerate() {
            if state.check_bindable(buffer) {
                state.set_indexed(
                    target,
                    first + i as u32,
                    Some(IndexedBinding {
                        buffer,
                        range: None,
                    }),
                );
            }
        }
    }

    unsafe fn bind_buffers_range(
        &self,
        target: u32,
        first: u32,
        buffers: &[u32],
        offsets: &[usize],
        sizes: &[usize],
    ) {
        let mut state = self.record(DriverCall::BindBuffersRange);

        if !State::is_indexed_target(target) {
            return state.raise(gl::INVALID_ENUM);
        }

        if !slots_fit(first, buffers.len()) {
            return state.raise(gl::INVALID_OPERATION);
        }

        for (i, ((&buffer, &offset), &size)) in
            buffers.iter().zip(offsets).zip(sizes).enumerate()
        {
            if buffer != 0 && size == 0 {
                state.raise(gl::INVALID_VALUE);
            } else if state.check_bindable(buffer) {
                state.set_indexed(
                    target,
                    first + i as u32,
                    Some(IndexedBinding {
                        buffer,
                        range: Some((offset, size)),
                    }),
                );
            }
        }
    }

    unsafe fn get_error(&self) -> u32 {
        let mut state = self.record(DriverCall::GetError);
        std::mem::replace(&mut state.error, gl::NO_ERROR)
    }
}
