//! The seam between a layer and the renderer that hosts it.

use crate::buffer::layout::VertexLayout;
use crate::foundation::error::FxResult;
use crate::shader::uniforms::Uniforms;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Program compilation, buffer management and draw submission.
///
/// Buffers are uploaded as raw bytes: `f32` vertices and `u32` indices, little-endian.
pub trait RenderHost {
    fn compile_program(&mut self, vertex: &str, fragment: &str) -> FxResult<ProgramHandle>;

    fn create_buffer(&mut self, kind: BufferKind) -> FxResult<BufferHandle>;

    fn upload_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]);

    /// Bind every attribute of `layout` from `buffer` at its fixed byte offset.
    fn bind_attributes(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        layout: &'static VertexLayout,
    );

    fn set_uniforms(&mut self, program: ProgramHandle, uniforms: &Uniforms);

    fn draw_indexed(&mut self, program: ProgramHandle, indices: BufferHandle, count: usize);

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn delete_program(&mut self, program: ProgramHandle);
}

/// Per-frame values from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Shared animation clock in seconds.
    pub time: f64,
    pub delta_time: f64,
    /// Column-major world-to-clip matrix for `[0,1]²` world coordinates.
    pub matrix: [f32; 16],
    pub zoom: f64,
    /// Drawing buffer size in pixels.
    pub resolution: [f32; 2],
}

impl FrameContext {
    pub const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    pub fn at(time: f64, delta_time: f64) -> Self {
        Self {
            time,
            delta_time,
            ..Self::default()
        }
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            time: 0.0,
            delta_time: 0.0,
            matrix: Self::IDENTITY,
            zoom: 0.0,
            resolution: [1.0, 1.0],
        }
    }
}
