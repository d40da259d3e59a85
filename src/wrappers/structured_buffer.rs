use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

use super::Buffer;
use crate::driver::BufferDriver;
use crate::errors::{Error, Result};

/// Buffer object holding elements of type `T`
///
/// Sizes and offsets are counted in elements and converted to bytes before reaching the driver.
/// Nothing checks that the storage actually holds `T`s, nor that the byte conversions do not
/// overflow.
pub struct StructuredBuffer<T> {
    buffer: Buffer,
    _element: PhantomData<T>,
}

/// Structured buffer of raw bytes
pub type ByteBuffer = StructuredBuffer<u8>;

/// Allocate `n` names in a single driver call
fn create_names<D: BufferDriver>(gl: &D, n: usize) -> Result<Vec<u32>> {
    let mut names = vec![0; n];
    unsafe { gl.create_buffers(&mut names) };

    if names.contains(&0) {
        let allocated: Vec<u32> = names.into_iter().filter(|&name| name != 0).collect();
        unsafe { gl.delete_buffers(&allocated) };
        return Err(Error::CreateFailed);
    }

    log::debug!("created {} buffers: {:?}", n, names);
    Ok(names)
}

impl<T: Pod> StructuredBuffer<T> {
    pub fn new<D: BufferDriver>(gl: &D) -> Result<Self> {
        Ok(Self::from_buffer(Buffer::new(gl)?))
    }

    /// Adopt a buffer name allocated elsewhere, see [`Buffer::from_raw`]
    pub fn from_raw(name: u32) -> Self {
        Self::from_buffer(Buffer::from_raw(name))
    }

    pub fn from_buffer(buffer: Buffer) -> Self {
        Self {
            buffer,
            _element: PhantomData,
        }
    }

    /// Create `n` buffers with a single `glCreateBuffers` call
    pub fn create<D: BufferDriver>(gl: &D, n: usize) -> Result<Vec<Self>> {
        Ok(create_names(gl, n)?
            .into_iter()
            .map(Self::from_raw)
            .collect())
    }

    pub fn raw_id(&self) -> u32 {
        self.buffer.raw_id()
    }

    pub fn as_untyped(&self) -> &Buffer {
        &self.buffer
    }

    pub fn into_untyped(self) -> Buffer {
        self.buffer
    }

    /// Size in bytes of `count` elements
    pub fn byte_size(count: usize) -> usize {
        count * size_of::<T>()
    }

    /// Read `data.len()` elements starting at element `offset`
    pub fn read_range<D: BufferDriver>(&self, gl: &D, offset: usize, data: &mut [T]) {
        self.buffer.read_range(
            gl,
            Self::byte_size(offset),
            bytemuck::cast_slice_mut(data),
        )
    }

    /// Read `count` elements starting at element `offset` into a new vector
    pub fn read_vec<D: BufferDriver>(&self, gl: &D, offset: usize, count: usize) -> Vec<T> {
        let mut data = vec![T::zeroed(); count];
        self.read_range(gl, offset, &mut data);
        data
    }

    pub fn write_all<D: BufferDriver>(&self, gl: &D, data: &[T], usage: u32) {
        self.buffer.write_all(gl, bytemuck::cast_slice(data), usage)
    }

    pub fn write_all_uninit<D: BufferDriver>(&self, gl: &D, count: usize, usage: u32) {
        self.buffer
            .write_all_uninit(gl, Self::byte_size(count), usage)
    }

    /// Overwrite elements starting at element `offset`
    pub fn write_range<D: BufferDriver>(&self, gl: &D, offset: usize, data: &[T]) {
        self.buffer
            .write_range(gl, Self::byte_size(offset), bytemuck::cast_slice(data))
    }

    pub fn allocate_immutable<D: BufferDriver>(&self, gl: &D, data: &[T], flags: u32) {
        self.buffer
            .allocate_immutable(gl, bytemuck::cast_slice(data), flags)
    }

    pub fn allocate_immutable_uninit<D: BufferDriver>(&self, gl: &D, count: usize, flags: u32) {
        self.buffer
            .allocate_immutable_uninit(gl, Self::byte_size(count), flags)
    }

    /// Copy `count` elements into `dest`
    pub fn copy_to<D: BufferDriver>(
        &self,
        gl: &D,
        dest: &StructuredBuffer<T>,
        read_offset: usize,
        write_offset: usize,
        count: usize,
    ) {
        self.buffer.copy_to(
            gl,
            &dest.buffer,
            Self::byte_size(read_offset),
            Self::byte_size(write_offset),
            Self::byte_size(count),
        )
    }
}

impl<T> AsRef<Buffer> for StructuredBuffer<T> {
    fn as_ref(&self) -> &Buffer {
        &self.buffer
    }
}

impl<T> std::fmt::Debug for StructuredBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("StructuredBuffer")
            .field("name", &self.buffer.raw_id())
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T, D: BufferDriver> super::GlDrop<D> for StructuredBuffer<T> {
    fn drop(&mut self, gl: &D) {
        super::GlDrop::drop(&mut self.buffer, gl)
    }
}

/// Buffers of a batch are deleted with a single `glDeleteBuffers` call
impl<T, D: BufferDriver> super::GlDrop<D> for Vec<StructuredBuffer<T>> {
    fn drop(&mut self, gl: &D) {
        let names: Vec<u32> = self
            .iter_mut()
            .filter_map(|buffer| buffer.buffer.release_name())
            .collect();

        if !names.is_empty() {
            log::debug!("deleting {} buffers: {:?}", names.len(), names);
            unsafe { gl.delete_buffers(&names) }
        }
    }
}

/// Tuple of element types whose buffers are created together
///
/// Implemented for tuples of 1 to 8 [`Pod`] types, see [`create_group`].
pub trait BufferGroup {
    /// Tuple of structured buffers, one per element type
    type Buffers;

    const LEN: usize;

    /// Wrap `names`, which holds exactly `LEN` names, in order
    fn from_names(names: &[u32]) -> Self::Buffers;

    /// Element size in bytes of every member, in order
    fn strides() -> Vec<usize>;
}

macro_rules! impl_buffer_group {
    ($len:expr; $($t:ident $i:tt),+) => {
        impl<$($t: Pod),+> BufferGroup for ($($t,)+) {
            type Buffers = ($(StructuredBuffer<$t>,)+);

            const LEN: usize = $len;

            fn from_names(names: &[u32]) -> Self::Buffers {
                ($(StructuredBuffer::<$t>::from_raw(names[$i]),)+)
            }

            fn strides() -> Vec<usize> {
                vec![$(size_of::<$t>()),+]
            }
        }
    };
}

impl_buffer_group!(1; A 0);
impl_buffer_group!(2; A 0, B 1);
impl_buffer_group!(3; A 0, B 1, C 2);
impl_buffer_group!(4; A 0, B 1, C 2, E 3);
impl_buffer_group!(5; A 0, B 1, C 2, E 3, F 4);
impl_buffer_group!(6; A 0, B 1, C 2, E 3, F 4, G 5);
impl_buffer_group!(7; A 0, B 1, C 2, E 3, F 4, G 5, H 6);
impl_buffer_group!(8; A 0, B 1, C 2, E 3, F 4, G 5, H 6, I 7);

/// Create buffers of different element types with a single `glCreateBuffers` call
///
/// ```ignore
/// let (positions, indices) = create_group::<([f32; 3], u32), _>(&gl)?;
/// ```
pub fn create_group<G: BufferGroup, D: BufferDriver>(gl: &D) -> Result<G::Buffers> {
    let names = create_names(gl, G::LEN)?;
    log::debug!("buffer group {:?}, element sizes {:?}", names, G::strides());
    Ok(G::from_names(&names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::check_error;
    use crate::gl;
    use crate::recording::{DriverCall, RecordingDriver};
    use crate::wrappers::{GlDrop, DEFAULT_STORAGE_FLAGS, DEFAULT_USAGE};

    #[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Vertex {
        position: [f32; 3],
        id: u32,
    }

    #[test]
    fn write_range_in_elements() {
        let gl = RecordingDriver::new();
        let buffer = StructuredBuffer::<u32>::new(&gl).unwrap();

        buffer.allocate_immutable(&gl, &[1, 2, 3, 4], DEFAULT_STORAGE_FLAGS);
        buffer.write_range(&gl, 1, &[9, 9]);

        assert_eq!(buffer.read_vec(&gl, 0, 4), vec![1, 9, 9, 4]);
        assert_eq!(check_error(&gl), Ok(()));
    }

    #[test]
    fn byte_offsets_on_untyped_buffer() {
        let gl = RecordingDriver::new();
        let buffer = StructuredBuffer::<u32>::new(&gl).unwrap();

        buffer.write_all(&gl, &[1, 2, 3, 4], DEFAULT_USAGE);
        buffer
            .as_untyped()
            .write_range(&gl, 4, bytemuck::cast_slice(&[9u32, 9][..]));

        assert_eq!(buffer.read_vec(&gl, 0, 4), vec![1, 9, 9, 4]);
    }

    #[test]
    fn struct_elements_round_trip() {
        let gl = RecordingDriver::new();
        let buffer = StructuredBuffer::<Vertex>::new(&gl).unwrap();
        let vertices: Vec<Vertex> = (0..5)
            .map(|i| Vertex {
                position: [i as f32, 0.5, -1.0],
                id: i,
            })
            .collect();

        buffer.write_all_uninit(&gl, 8, gl::DYNAMIC_DRAW);
        buffer.write_range(&gl, 2, &vertices);

        let mut read = vec![Vertex::default(); 5];
        buffer.read_range(&gl, 2, &mut read);
        assert_eq!(read, vertices);
        assert_eq!(
            gl.storage(buffer.raw_id()).map(|s| s.len()),
            Some(8 * size_of::<Vertex>())
        );
    }

    #[test]
    fn empty_round_trip() {
        let gl = RecordingDriver::new();
        let buffer = StructuredBuffer::<f64>::new(&gl).unwrap();

        buffer.write_all(&gl, &[0.25; 3], DEFAULT_USAGE);
        buffer.write_range(&gl, 3, &[]);

        assert_eq!(buffer.read_vec(&gl, 3, 0), Vec::<f64>::new());
        assert_eq!(check_error(&gl), Ok(()));
    }

    #[test]
    fn write_range_past_end_is_rejected() {
        let gl = RecordingDriver::new();
        let buffer = StructuredBuffer::<u32>::new(&gl).unwrap();

        buffer.write_all(&gl, &[1, 2, 3, 4], DEFAULT_USAGE);
        buffer.write_range(&gl, 3, &[7, 7]);

        assert_eq!(check_error(&gl), Err(Error::Gl(gl::INVALID_VALUE)));
        assert_eq!(buffer.read_vec(&gl, 0, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn copy_to_in_elements() {
        let gl = RecordingDriver::new();
        let src = StructuredBuffer::<u16>::new(&gl).unwrap();
        let dst = StructuredBuffer::<u16>::new(&gl).unwrap();

        src.write_all(&gl, &[10, 20, 30, 40], DEFAULT_USAGE);
        dst.write_all(&gl, &[0; 4], DEFAULT_USAGE);
        src.copy_to(&gl, &dst, 1, 0, 3);

        assert_eq!(dst.read_vec(&gl, 0, 4), vec![20, 30, 40, 0]);
    }

    #[test]
    fn create_uses_one_driver_call() {
        let gl = RecordingDriver::new();
        let buffers = StructuredBuffer::<f32>::create(&gl, 4).unwrap();

        assert_eq!(buffers.len(), 4);
        assert_eq!(gl.calls_to(DriverCall::CreateBuffers), 1);

        let mut names: Vec<u32> = buffers.iter().map(|b| b.raw_id()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
        assert!(names.iter().all(|&name| gl.is_buffer(name)));
    }

    #[test]
    fn create_group_uses_one_driver_call() {
        let gl = RecordingDriver::new();
        let (a, b, c) = create_group::<(u32, f32, Vertex), _>(&gl).unwrap();

        assert_eq!(gl.calls_to(DriverCall::CreateBuffers), 1);
        assert_ne!(a.raw_id(), b.raw_id());
        assert_ne!(b.raw_id(), c.raw_id());
        assert_ne!(a.raw_id(), c.raw_id());

        // Each member keeps its own element type
        c.write_all(&gl, &[Vertex::default(); 2], DEFAULT_USAGE);
        assert_eq!(
            gl.storage(c.raw_id()).map(|s| s.len()),
            Some(2 * size_of::<Vertex>())
        );
        a.write_all(&gl, &[1, 2], DEFAULT_USAGE);
        b.write_all(&gl, &[1.5], DEFAULT_USAGE);
        assert_eq!(b.read_vec(&gl, 0, 1), vec![1.5]);
    }

    #[test]
    fn group_strides() {
        assert_eq!(<(u8, u32, Vertex) as BufferGroup>::strides(), vec![1, 4, 16]);
        assert_eq!(<([f32; 2],) as BufferGroup>::LEN, 1);
    }

    #[test]
    fn batch_release_uses_one_driver_call() {
        let gl = RecordingDriver::new();
        let mut buffers = ByteBuffer::create(&gl, 3).unwrap();
        let names: Vec<u32> = buffers.iter().map(|b| b.raw_id()).collect();

        GlDrop::drop(&mut buffers, &gl);
        assert_eq!(gl.calls_to(DriverCall::DeleteBuffers), 1);
        assert!(names.iter().all(|&name| !gl.is_buffer(name)));
        assert!(buffers.iter().all(|b| !b.as_untyped().is_valid()));

        GlDrop::drop(&mut buffers, &gl);
        assert_eq!(gl.calls_to(DriverCall::DeleteBuffers), 1);
    }
}
