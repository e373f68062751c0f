pub mod binder;
pub mod lights;
pub mod material;
pub mod wind;

pub use binder::{BindContext, BindReport, MaterialBinder};
pub use lights::{Flicker, FlickerParams, LightRig};
pub use material::{Material, StandardMaterial, TranslucentParams, WindPatch};

use glam::{Mat4, Vec3};

/// CPU copy of one glTF primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Axis-aligned bounds as `(center, half_extent)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(((min + max) * 0.5, (max - min) * 0.5))
    }
}

/// Decoded RGBA8 texture, sRGB encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A named mesh in the loaded still-life. Nodes live for the whole session;
/// only their material and shadow flags change after load.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub mesh: MeshData,
    pub world: Mat4,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, mesh: MeshData, world: Mat4, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            world,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    textures: Vec<TextureImage>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn with_textures(textures: Vec<TextureImage>) -> Self {
        Self {
            nodes: Vec::new(),
            textures,
        }
    }

    pub fn textures(&self) -> &[TextureImage] {
        &self.textures
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SceneNode] {
        &mut self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.iter().any(|node| node.name == name)
    }

    /// First node carrying `name`; glTF does not require unique names.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    /// Pushes `time` into every material that carries a wind time uniform.
    /// Returns how many materials were updated.
    pub fn set_shader_time(&mut self, time: f32) -> usize {
        let mut updated = 0;
        for node in &mut self.nodes {
            if let Some(wind) = node.material.wind_mut() {
                wind.time = time;
                updated += 1;
            }
        }
        updated
    }

    /// Combined world-space bounds as `(center, half_extent)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for node in &self.nodes {
            for p in &node.mesh.positions {
                let world = node.world.transform_point3(Vec3::from_array(*p));
                min = min.min(world);
                max = max.max(world);
                any = true;
            }
        }
        any.then(|| ((min + max) * 0.5, (max - min) * 0.5))
    }
}

#[cfg(test)]
pub(crate) fn test_node(name: &str) -> SceneNode {
    let mesh = MeshData {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        indices: vec![0, 1, 2],
    };
    SceneNode::new(name, mesh, Mat4::IDENTITY, Material::default())
}
