//! GPU-visible data layouts
//!
//! These structs mirror the std140/std430 blocks in the shaders byte for
//! byte: `#[repr(C, align(16))]`, vec3s widened to `[f32; 4]`, matrices as
//! column-major `[[f32; 4]; 4]`, explicit trailing padding. All of them
//! cross the CPU/GPU boundary through bytemuck casts.

use crate::foundation::math::{Mat3, Mat4, Vec3};
use bytemuck::Zeroable;

/// Capacity of the point-light array in [`GlobalUbo`]
pub const MAX_LIGHTS: usize = 128;

/// Number of shadow maps, one per shadow-casting directional light
pub const MAX_SHADOW_CASTERS: usize = 2;

/// One point light as the lighting shader sees it
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct PointLightUbo {
    /// XYZ world position, W unused
    pub position: [f32; 4], // 16 bytes
    /// RGB color, A carries the intensity
    pub color: [f32; 4], // 16 bytes
}

unsafe impl bytemuck::Pod for PointLightUbo {}
unsafe impl bytemuck::Zeroable for PointLightUbo {}

/// One directional light as the lighting shader sees it
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLightUbo {
    /// XYZ direction the light travels, W unused
    pub direction: [f32; 4], // 16 bytes
    /// RGB color, A carries the intensity
    pub color: [f32; 4], // 16 bytes
}

unsafe impl bytemuck::Pod for DirectionalLightUbo {}
unsafe impl bytemuck::Zeroable for DirectionalLightUbo {}

/// Per-frame uniform block shared by every pass
///
/// Uploaded once per frame into the per-frame-in-flight uniform buffer and
/// bound at set 0, binding 0. The point-light array is pre-sorted farthest
/// first; only the first `num_point_lights` entries are meaningful.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct GlobalUbo {
    /// Camera projection, Vulkan depth conventions
    pub projection: [[f32; 4]; 4], // 64 bytes
    /// Camera view matrix
    pub view: [[f32; 4]; 4], // 64 bytes
    /// Inverse view matrix; last column is the camera world position
    pub inverse_view: [[f32; 4]; 4], // 64 bytes
    /// Light-space view-projection per shadow caster
    pub shadow_view_projection: [[[f32; 4]; 4]; MAX_SHADOW_CASTERS], // 128 bytes
    /// RGB ambient light, A carries the intensity
    pub ambient_color: [f32; 4], // 16 bytes
    /// Directional lights, slot index = shadow caster index
    pub directional_lights: [DirectionalLightUbo; MAX_SHADOW_CASTERS], // 64 bytes
    /// Point lights, sorted by descending camera distance
    pub point_lights: [PointLightUbo; MAX_LIGHTS], // 4096 bytes
    /// Number of live entries in `point_lights`
    pub num_point_lights: i32, // 4 bytes
    /// Number of live entries in `directional_lights`
    pub num_directional_lights: i32, // 4 bytes
    _padding: [i32; 2], // 8 bytes
}

unsafe impl bytemuck::Pod for GlobalUbo {}
unsafe impl bytemuck::Zeroable for GlobalUbo {}

impl Default for GlobalUbo {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Mat4::identity().into();
        Self {
            projection: identity,
            view: identity,
            inverse_view: identity,
            shadow_view_projection: [identity; MAX_SHADOW_CASTERS],
            ambient_color: [1.0, 1.0, 1.0, 0.02],
            directional_lights: [DirectionalLightUbo::zeroed(); MAX_SHADOW_CASTERS],
            point_lights: [PointLightUbo::zeroed(); MAX_LIGHTS],
            num_point_lights: 0,
            num_directional_lights: 0,
            _padding: [0; 2],
        }
    }
}

impl GlobalUbo {
    /// Copies the camera matrices in.
    pub fn set_camera(&mut self, projection: Mat4, view: Mat4, inverse_view: Mat4) {
        self.projection = projection.into();
        self.view = view.into();
        self.inverse_view = inverse_view.into();
    }
}

/// Per-draw parameters for the geometry pass
///
/// The normal matrix is widened to a full mat4; std430 aligns mat3 columns
/// to 16 bytes anyway, and the shaders declare it as mat4.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PushConstantData {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4], // 64 bytes
    /// Normal matrix, upper-left 3x3 meaningful
    pub normal: [[f32; 4]; 4], // 64 bytes
}

unsafe impl bytemuck::Pod for PushConstantData {}
unsafe impl bytemuck::Zeroable for PushConstantData {}

impl PushConstantData {
    /// Builds per-draw data from a model matrix and its normal matrix.
    pub fn new(model: Mat4, normal: Mat3) -> Self {
        Self {
            model: model.into(),
            normal: normal.to_homogeneous().into(),
        }
    }
}

/// Per-draw parameters for the shadow pass
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ShadowPushConstant {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4], // 64 bytes
    /// Which entry of `shadow_view_projection` this draw uses
    pub caster_index: u32, // 4 bytes
    _padding: [u32; 3], // 12 bytes
}

unsafe impl bytemuck::Pod for ShadowPushConstant {}
unsafe impl bytemuck::Zeroable for ShadowPushConstant {}

impl ShadowPushConstant {
    /// Builds shadow-draw data for one caster.
    pub fn new(model: Mat4, caster_index: u32) -> Self {
        Self {
            model: model.into(),
            caster_index,
            _padding: [0; 3],
        }
    }
}

/// Per-draw parameters for a point-light billboard
///
/// The vertex shader expands these into a camera-facing quad from
/// `gl_VertexIndex` alone; no vertex buffer is bound.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BillboardPushConstant {
    /// XYZ world center of the billboard, W unused
    pub position: [f32; 4], // 16 bytes
    /// RGB color, A carries the intensity
    pub color: [f32; 4], // 16 bytes
    /// Half-extent of the quad in world units
    pub radius: f32, // 4 bytes
    _padding: [f32; 3], // 12 bytes
}

unsafe impl bytemuck::Pod for BillboardPushConstant {}
unsafe impl bytemuck::Zeroable for BillboardPushConstant {}

impl BillboardPushConstant {
    /// Builds billboard-draw data for one point light.
    pub fn new(position: Vec3, color: Vec3, intensity: f32, radius: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z, 0.0],
            color: [color.x, color.y, color.z, intensity],
            radius,
            _padding: [0.0; 3],
        }
    }
}

/// Per-draw parameters for one overlay quad in the GUI pass
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GuiPushConstant {
    /// Orthographic projection for the overlay space
    pub projection: [[f32; 4]; 4], // 64 bytes
    /// Quad rectangle as x, y, width, height in overlay units
    pub rect: [f32; 4], // 16 bytes
    /// RGBA fill color
    pub color: [f32; 4], // 16 bytes
}

unsafe impl bytemuck::Pod for GuiPushConstant {}
unsafe impl bytemuck::Zeroable for GuiPushConstant {}

impl GuiPushConstant {
    /// Builds overlay-draw data for one quad.
    pub fn new(projection: Mat4, rect: [f32; 4], color: [f32; 4]) -> Self {
        Self {
            projection: projection.into(),
            rect,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::mem::size_of;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_ubo_sizes_match_shader_blocks() {
        assert_eq!(size_of::<PointLightUbo>(), 32);
        assert_eq!(size_of::<DirectionalLightUbo>(), 32);
        assert_eq!(size_of::<GlobalUbo>(), 4512);
        assert_eq!(size_of::<GlobalUbo>() % 16, 0);
    }

    #[test]
    fn test_push_constant_sizes_fit_the_minimum_limit() {
        // 128 bytes is the smallest maxPushConstantsSize Vulkan guarantees.
        assert_eq!(size_of::<PushConstantData>(), 128);
        assert_eq!(size_of::<ShadowPushConstant>(), 80);
        assert_eq!(size_of::<BillboardPushConstant>(), 48);
        assert_eq!(size_of::<GuiPushConstant>(), 96);
        assert!(size_of::<PushConstantData>() <= 128);
        assert!(size_of::<GuiPushConstant>() <= 128);
    }

    #[test]
    fn test_model_matrix_lands_column_major() {
        let push = PushConstantData::new(
            Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)),
            Mat3::identity(),
        );

        // Translation lives in the fourth column.
        assert_relative_eq!(push.model[3][0], 1.0, epsilon = EPSILON);
        assert_relative_eq!(push.model[3][1], 2.0, epsilon = EPSILON);
        assert_relative_eq!(push.model[3][2], 3.0, epsilon = EPSILON);
        assert_relative_eq!(push.model[3][3], 1.0, epsilon = EPSILON);
        assert_relative_eq!(push.normal[0][0], 1.0, epsilon = EPSILON);
        assert_relative_eq!(push.normal[3][3], 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_billboard_packs_intensity_into_alpha() {
        let push = BillboardPushConstant::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 0.4, 0.1), 3.0, 0.25);
        assert_relative_eq!(push.position[1], 2.0, epsilon = EPSILON);
        assert_relative_eq!(push.color[3], 3.0, epsilon = EPSILON);
        assert_relative_eq!(push.radius, 0.25, epsilon = EPSILON);
    }

    #[test]
    fn test_default_ubo_is_identity_with_no_lights() {
        let ubo = GlobalUbo::default();
        assert_eq!(ubo.num_point_lights, 0);
        assert_eq!(ubo.num_directional_lights, 0);
        assert_relative_eq!(ubo.projection[0][0], 1.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.projection[3][3], 1.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.projection[1][0], 0.0, epsilon = EPSILON);
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), size_of::<GlobalUbo>());
    }
}
