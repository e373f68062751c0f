use std::path::Path;

use glam::Mat4;

use super::{AssetError, DRACO_EXTENSION};
use crate::scene::{Material, MeshData, SceneGraph, SceneNode, StandardMaterial, TextureImage};

/// Imports every triangle primitive reachable from the default scene. All
/// primitives of a node carry the node's name so the material binder sees
/// them as one object.
pub fn load_scene(path: &Path) -> Result<SceneGraph, AssetError> {
    let display = path.display().to_string();
    reject_unsupported_extensions(path, &display)?;

    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: display.clone(),
        source,
    })?;

    let textures = images.iter().map(to_rgba8).collect();
    let mut graph = SceneGraph::with_textures(textures);

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, Mat4::IDENTITY, &buffers, &mut graph);
            }
        }
        None => {
            // Scene-less files: treat every root node as part of the still-life.
            for node in document.nodes() {
                visit_node(&node, Mat4::IDENTITY, &buffers, &mut graph);
            }
        }
    }

    if graph.is_empty() {
        return Err(AssetError::NoMeshes { path: display });
    }
    log::info!(
        "Loaded {} primitive(s), {} texture(s) from {}",
        graph.len(),
        graph.textures().len(),
        display
    );
    log::debug!("Scene nodes: {:?}", graph.node_names());
    Ok(graph)
}

fn reject_unsupported_extensions(path: &Path, display: &str) -> Result<(), AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Gltf {
        path: display.to_string(),
        source: gltf::Error::Io(source),
    })?;
    let gltf = gltf::Gltf::from_slice_without_validation(&bytes).map_err(|source| {
        AssetError::Gltf {
            path: display.to_string(),
            source,
        }
    })?;
    let draco = gltf
        .document
        .extensions_required()
        .chain(gltf.document.extensions_used())
        .any(|extension| extension == DRACO_EXTENSION);
    if draco {
        return Err(AssetError::DracoCompressed {
            path: display.to_string(),
        });
    }
    Ok(())
}

fn visit_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    graph: &mut SceneGraph,
) {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {:?} primitive {} of '{}'",
                    primitive.mode(),
                    primitive.index(),
                    name
                );
                continue;
            }
            let Some(data) = read_primitive(&primitive, buffers, &name) else {
                continue;
            };
            let material = standard_material(&primitive.material());
            graph.push(SceneNode::new(name.clone(), data, world, Material::Standard(material)));
        }
    }

    for child in node.children() {
        visit_node(&child, world, buffers, graph);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let normals = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => {
            log::warn!("'{}' has no normals; shading will be flat", name);
            vec![[0.0, 1.0, 0.0]; positions.len()]
        }
    };
    let uvs = match reader.read_tex_coords(0) {
        Some(uvs) => uvs.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        log::warn!("'{}' has a truncated index list; skipped", name);
        return None;
    }

    Some(MeshData {
        positions,
        normals,
        uvs,
        indices,
    })
}

fn standard_material(material: &gltf::Material<'_>) -> StandardMaterial {
    let pbr = material.pbr_metallic_roughness();
    StandardMaterial {
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
        double_sided: material.double_sided(),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
        ..StandardMaterial::default()
    }
}

fn to_rgba8(image: &gltf::image::Data) -> TextureImage {
    use gltf::image::Format;

    let texel_count = (image.width * image.height) as usize;
    let rgba = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => expand(&image.pixels, 3, |p| [p[0], p[1], p[2], 255]),
        Format::R8G8 => expand(&image.pixels, 2, |p| [p[0], p[0], p[0], p[1]]),
        Format::R8 => expand(&image.pixels, 1, |p| [p[0], p[0], p[0], 255]),
        // 16-bit little-endian channels: keep the high byte.
        Format::R16G16B16A16 => expand(&image.pixels, 8, |p| [p[1], p[3], p[5], p[7]]),
        Format::R16G16B16 => expand(&image.pixels, 6, |p| [p[1], p[3], p[5], 255]),
        Format::R16G16 => expand(&image.pixels, 4, |p| [p[1], p[1], p[1], p[3]]),
        Format::R16 => expand(&image.pixels, 2, |p| [p[1], p[1], p[1], 255]),
        other => {
            log::warn!("Unsupported texture format {:?}; using white", other);
            vec![255; texel_count * 4]
        }
    };
    TextureImage {
        width: image.width,
        height: image.height,
        rgba,
    }
}

fn expand(pixels: &[u8], stride: usize, texel: impl Fn(&[u8]) -> [u8; 4]) -> Vec<u8> {
    pixels.chunks_exact(stride).flat_map(texel).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("candlelight_{}_{}_{}", std::process::id(), nonce, name))
    }

    /// One triangle under a parent node translated along x; the buffer is an
    /// embedded data URI.
    fn triangle_gltf(extensions: &str) -> String {
        // positions (0,0,0) (1,0,0) (0,1,0) as little-endian f32, base64.
        let buffer = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  {extensions}
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "Table", "translation": [2.0, 0.0, 0.0], "children": [1] }},
    {{ "name": "Wax", "mesh": 0 }}
  ],
  "meshes": [{{ "name": "WaxMesh", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
  "buffers": [{{ "byteLength": 36, "uri": "data:application/octet-stream;base64,{buffer}" }}],
  "bufferViews": [{{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }}],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }}]
}}"#
        )
    }

    #[test]
    fn nodes_keep_names_and_world_transforms() {
        let path = temp_path("triangle.gltf");
        std::fs::write(&path, triangle_gltf("")).unwrap();

        let graph = load_scene(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(graph.node_names(), vec!["Wax"]);
        let wax = graph.find("Wax").unwrap();
        assert_eq!(wax.mesh.indices, vec![0, 1, 2]);
        assert_eq!(wax.mesh.normals.len(), 3);
        let origin = wax.world.transform_point3(glam::Vec3::ZERO);
        assert_eq!(origin, glam::Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn draco_compressed_files_are_rejected() {
        let path = temp_path("draco.gltf");
        let extensions = r#""extensionsUsed": ["KHR_draco_mesh_compression"],
  "extensionsRequired": ["KHR_draco_mesh_compression"],"#;
        std::fs::write(&path, triangle_gltf(extensions)).unwrap();

        let err = load_scene(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, AssetError::DracoCompressed { .. }));
        assert!(err.to_string().contains("without mesh compression"));
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load_scene(Path::new("/no/such/scene.glb")).unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn rgb_textures_gain_an_opaque_alpha() {
        let image = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let texture = to_rgba8(&image);
        assert_eq!(texture.rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }
}
