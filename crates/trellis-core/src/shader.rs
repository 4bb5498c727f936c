//! Shader identifiers and the shader/material registry contract.
//!
//! Shader and material setup is owned by the rendering layer; the geometry
//! core only tracks which shader each triangle range consumes, keyed by a
//! stable identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A stable identifier referencing a shader owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderId(pub u64);

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Facts about a shader that affect how geometry referencing it is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderInfo {
    /// The shader blends with alpha.
    pub has_alpha: bool,
    /// The shader samples a base texture (geometry must carry UVs).
    pub has_texture: bool,
}

/// Scene-side shader lookup, an external collaborator.
pub trait ShaderRegistry {
    /// Resolves a shader id, or `None` if the scene does not know it.
    fn shader_info(&self, id: ShaderId) -> Option<ShaderInfo>;

    /// Registers ownership of a shader with the scene if not already owned.
    fn register(&mut self, id: ShaderId);
}
