//! Render pass systems
//!
//! One system per pass: shadow and geometry walk the registry and draw
//! meshes, lighting composes the G-buffer, transparency draws light
//! billboards and the GUI pass draws overlay quads. Each system owns its
//! pipeline and records into an [`ActiveRenderPass`] scope opened by the
//! renderer; none of them begin or end passes themselves.

pub mod geometry;
pub mod gui;
pub mod lighting;
pub mod shadow;
pub mod transparency;

pub use geometry::GeometryPass;
pub use gui::{GuiPass, Overlay, OverlayQuad};
pub use lighting::LightingPass;
pub use shadow::ShadowPass;
pub use transparency::TransparencyPass;

use crate::render::mesh::{MeshData, MeshHandle, Vertex};
use crate::render::vulkan::{
    ActiveRenderPass, CommandPool, IndexBuffer, LogicalDevice, VertexBuffer, VulkanResult,
};
use ash::vk;
use std::collections::HashMap;

/// Vertex input state for [`Vertex`]
///
/// Lives here rather than on the mesh type so the mesh module stays free
/// of Vulkan types.
pub fn vertex_layout() -> (
    Vec<vk::VertexInputBindingDescription>,
    Vec<vk::VertexInputAttributeDescription>,
) {
    let bindings = vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<Vertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }];
    let attributes = vec![
        // position
        vk::VertexInputAttributeDescription {
            binding: 0,
            location: 0,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: 0,
        },
        // color
        vk::VertexInputAttributeDescription {
            binding: 0,
            location: 1,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: 12,
        },
        // normal
        vk::VertexInputAttributeDescription {
            binding: 0,
            location: 2,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: 24,
        },
        // uv
        vk::VertexInputAttributeDescription {
            binding: 0,
            location: 3,
            format: vk::Format::R32G32_SFLOAT,
            offset: 36,
        },
    ];
    (bindings, attributes)
}

/// GPU-resident copy of one mesh
pub struct GpuMesh {
    vertex: VertexBuffer,
    index: IndexBuffer,
}

impl GpuMesh {
    /// Uploads a mesh into device-local buffers.
    pub fn upload(device: &LogicalDevice, pool: &CommandPool, mesh: &MeshData) -> VulkanResult<Self> {
        Ok(Self {
            vertex: VertexBuffer::new(device, pool, mesh.vertices())?,
            index: IndexBuffer::new(device, pool, mesh.indices())?,
        })
    }

    /// Binds the vertex and index buffers.
    pub fn bind(&self, pass: &mut ActiveRenderPass) {
        pass.cmd_bind_vertex_buffers(0, &[self.vertex.handle()], &[0]);
        pass.cmd_bind_index_buffer(self.index.handle(), 0, vk::IndexType::UINT32);
    }

    /// Issues the indexed draw. Call after [`bind`](Self::bind).
    pub fn draw(&self, pass: &mut ActiveRenderPass) {
        pass.cmd_draw_indexed(self.index.index_count(), 1, 0, 0, 0);
    }
}

/// Device-local meshes keyed by their library handle
pub type GpuMeshCache = HashMap<MeshHandle, GpuMesh>;
