//! Vertex layouts written into mapped buffer memory.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// Index width for index buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexElementType {
    /// 16-bit unsigned indices (max 65535 vertices).
    U16,
    /// 32-bit unsigned indices.
    #[default]
    U32,
}

impl IndexElementType {
    /// Size in bytes of one index.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Vertex layout selector for vertex buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexElementType {
    /// Bare positions ([`PositionVertex`]), used by curves and markers.
    Position,
    /// Position + normal + packed color + UV ([`StandardVertex`]), used by meshes.
    #[default]
    Standard,
}

impl VertexElementType {
    /// Size in bytes of one vertex.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Position => std::mem::size_of::<PositionVertex>(),
            Self::Standard => std::mem::size_of::<StandardVertex>(),
        }
    }
}

/// A position-only vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    /// Local-space position.
    pub position: [f32; 3],
}

impl PositionVertex {
    /// Creates a vertex from a position.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
        }
    }
}

/// The standard mesh vertex: position, normal, packed diffuse color, base UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StandardVertex {
    /// Local-space position.
    pub position: [f32; 3],
    /// Lighting normal.
    pub normal: [f32; 3],
    /// Diffuse color packed as 0xAARRGGBB.
    pub diffuse: u32,
    /// Base texture coordinate.
    pub base_uv: [f32; 2],
}

impl StandardVertex {
    /// Creates a vertex with zero normal, white diffuse, zero UV.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: [0.0; 3],
            diffuse: pack_color(Vec4::ONE),
            base_uv: [0.0; 2],
        }
    }

    /// Sets the base UV with V flipped to texture convention.
    pub fn set_base_uv(&mut self, uv: Vec2) {
        self.base_uv = [uv.x, 1.0 - uv.y];
    }
}

/// Packs an RGBA color (components in `[0, 1]`) into 0xAARRGGBB.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn pack_color(color: Vec4) -> u32 {
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    (quantize(color.w) << 24) | (quantize(color.x) << 16) | (quantize(color.y) << 8) | quantize(color.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(IndexElementType::U16.size(), 2);
        assert_eq!(IndexElementType::U32.size(), 4);
        assert_eq!(VertexElementType::Position.size(), 12);
        assert_eq!(VertexElementType::Standard.size(), 36);
    }

    #[test]
    fn test_pack_color() {
        assert_eq!(pack_color(Vec4::new(1.0, 0.0, 0.0, 1.0)), 0xFF_FF_00_00);
        assert_eq!(pack_color(Vec4::new(0.0, 1.0, 0.0, 1.0)), 0xFF_00_FF_00);
        assert_eq!(pack_color(Vec4::new(0.0, 0.0, 0.0, 0.0)), 0x00_00_00_00);
    }

    #[test]
    fn test_uv_flip() {
        let mut v = StandardVertex::at(Vec3::ZERO);
        v.set_base_uv(Vec2::new(0.25, 0.25));
        assert_eq!(v.base_uv, [0.25, 0.75]);
    }
}
