//! Pre-recorded draw and dispatch commands carried by tasks.
//!
//! Buffers and images are referenced by their bound resource names and resolved by the executor
//! through the compiled graph.

use derive_more::{Deref, From, IntoIterator};
use zenith_core::collections::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetViewport { x: f32, y: f32, width: f32, height: f32 },
    SetScissor { x: i32, y: i32, width: u32, height: u32 },
    PushConstants { offset: u32, data: SmallVec<[u8; 128]> },
    BindVertexBuffers { first_binding: u32, buffers: SmallVec<[String; 4]> },
    BindIndexBuffer { buffer: String, offset: u64, index_type: IndexType },
    Draw { vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32 },
    DrawIndexed { index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32 },
    DrawIndirect { buffer: String, offset: u64, draw_count: u32, stride: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    DispatchIndirect { buffer: String, offset: u64 },
    CopyImage { src: String, dst: String },
    CopyBuffer { src: String, dst: String, size: u64 },
}

#[derive(Clone, Debug, Default, PartialEq, Deref, From, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct CommandList(Vec<Command>);

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) -> &mut Self {
        self.0.push(command);
        self
    }

    pub fn draw(mut self, vertex_count: u32, instance_count: u32) -> Self {
        self.0.push(Command::Draw { vertex_count, instance_count, first_vertex: 0, first_instance: 0 });
        self
    }

    pub fn draw_indexed(mut self, index_count: u32, instance_count: u32) -> Self {
        self.0.push(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index: 0,
            vertex_offset: 0,
            first_instance: 0,
        });
        self
    }

    pub fn dispatch(mut self, x: u32, y: u32, z: u32) -> Self {
        self.0.push(Command::Dispatch { x, y, z });
        self
    }

    pub fn push_constants(mut self, offset: u32, data: &[u8]) -> Self {
        self.0.push(Command::PushConstants { offset, data: SmallVec::from_slice(data) });
        self
    }

    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.0.push(Command::SetViewport { x: 0.0, y: 0.0, width, height });
        self
    }
}
