//! GPU copies of the scene meshes and the per-frame/per-node uniforms the
//! lit shader reads.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::camera::PerspectiveCamera;
use crate::scene::lights::SpotLight;
use crate::scene::material::srgb_to_linear;
use crate::scene::{LightRig, Material, SceneGraph, SceneNode, TextureImage};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const KIND_STANDARD: f32 = 0.0;
const KIND_TRANSLUCENT: f32 = 1.0;
const KIND_FLAME: f32 = 2.0;
const FLAG_RECEIVE_SHADOW: u32 = 2;
const FLAG_HAS_TEXTURE: u32 = 4;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Matches `Frame` in `scene.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub point_position_range: [[f32; 4]; 3],
    pub point_color_decay: [[f32; 4]; 3],
    pub spot_position_range: [f32; 4],
    pub spot_direction_decay: [f32; 4],
    pub spot_color: [f32; 4],
    pub spot_cone: [f32; 4],
    pub spot_view_proj: [[f32; 4]; 4],
    pub environment: [f32; 4],
}

/// What the frame uniform needs to know about the loaded textures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvironmentState {
    pub max_mip: f32,
    pub has_environment: bool,
    pub has_mask: bool,
}

impl FrameUniform {
    pub fn new(
        camera: &PerspectiveCamera,
        lights: &LightRig,
        spot_view_proj: Mat4,
        environment: EnvironmentState,
        elapsed: f32,
    ) -> Self {
        let mut point_position_range = [[0.0; 4]; 3];
        let mut point_color_decay = [[0.0; 4]; 3];
        for (index, light) in lights.points.iter().enumerate() {
            point_position_range[index] = light.position.extend(light.distance).to_array();
            let [r, g, b] = light.color;
            point_color_decay[index] = [
                r * light.intensity,
                g * light.intensity,
                b * light.intensity,
                light.decay,
            ];
        }
        let spot = &lights.spot;
        let [r, g, b] = spot.color;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.extend(elapsed).to_array(),
            point_position_range,
            point_color_decay,
            spot_position_range: spot.position.extend(spot.distance).to_array(),
            spot_direction_decay: spot.direction().extend(spot.decay).to_array(),
            spot_color: [
                r * spot.intensity,
                g * spot.intensity,
                b * spot.intensity,
                if spot.cast_shadow { 1.0 } else { 0.0 },
            ],
            spot_cone: spot_cone(spot),
            spot_view_proj: spot_view_proj.to_cols_array_2d(),
            environment: [
                environment.max_mip,
                if environment.has_environment { 1.0 } else { 0.0 },
                if environment.has_mask { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// Outer/inner cone cosines, depth bias and shadow texel size.
fn spot_cone(spot: &SpotLight) -> [f32; 4] {
    let outer = spot.angle.cos();
    let inner = (spot.angle * (1.0 - spot.penumbra)).cos();
    [
        outer,
        inner,
        spot.shadow.bias,
        1.0 / spot.shadow.map_size.max(1) as f32,
    ]
}

/// Matches `Node` in `scene.wgsl` and `shadow.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive_env: [f32; 4],
    pub surface: [f32; 4],
    pub wind: [f32; 4],
    pub wax_a: [f32; 4],
    pub wax_b: [f32; 4],
    pub wax_c: [f32; 4],
}

impl NodeUniform {
    pub fn from_node(node: &SceneNode, texture_count: usize) -> Self {
        let normal_matrix = node.world.inverse().transpose();
        let mut uniform = Self {
            model: node.world.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            ..Self::zeroed()
        };
        let mut flags = 0u32;
        if node.receive_shadow {
            flags |= FLAG_RECEIVE_SHADOW;
        }

        match &node.material {
            Material::Standard(base) | Material::Flame { base, .. } => {
                let [r, g, b] = base.emissive;
                uniform.base_color = base.base_color;
                uniform.emissive_env = [r, g, b, base.env_intensity];
                if base
                    .base_color_texture
                    .is_some_and(|index| index < texture_count)
                {
                    flags |= FLAG_HAS_TEXTURE;
                }
                let kind = match node.material {
                    Material::Flame { .. } => KIND_FLAME,
                    _ => KIND_STANDARD,
                };
                uniform.surface = [base.metallic, base.roughness, kind, flags as f32];
            }
            Material::Translucent(params) => {
                let [r, g, b] = srgb_to_linear(params.attenuation_color);
                uniform.base_color = [r, g, b, 1.0];
                uniform.emissive_env = [0.0, 0.0, 0.0, 1.0];
                uniform.surface = [0.0, params.roughness, KIND_TRANSLUCENT, flags as f32];
                uniform.wax_a = [
                    params.transmission,
                    params.internal_roughness,
                    params.ior,
                    params.thickness,
                ];
                uniform.wax_b = [r, g, b, params.attenuation_distance];
                uniform.wax_c = [
                    params.scattering,
                    params.scattering_absorption,
                    params.roughness_blur_scale,
                    if params.dithering { 1.0 } else { 0.0 },
                ];
            }
        }

        if let Some(wind) = node.material.wind() {
            uniform.wind = [wind.time, wind.amplitude, wind.frequency, 1.0];
        }
        uniform
    }
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// One uploaded primitive. Index `i` mirrors `SceneGraph::nodes()[i]`.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pub cast_shadow: bool,
    pub double_sided: bool,
}

impl GpuMesh {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Bind group layouts, pipelines and uploaded meshes for the lit pass.
pub struct GpuScene {
    frame_layout: wgpu::BindGroupLayout,
    node_layout: wgpu::BindGroupLayout,
    single_sided: wgpu::RenderPipeline,
    double_sided: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: Option<wgpu::BindGroup>,
    texture_sampler: wgpu::Sampler,
    white_texture: wgpu::TextureView,
    textures: Vec<wgpu::TextureView>,
    meshes: Vec<GpuMesh>,
}

impl GpuScene {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureSampleType::Float { filterable: true }),
                sampler_entry(2, wgpu::SamplerBindingType::Filtering),
                texture_entry(3, wgpu::TextureSampleType::Float { filterable: true }),
                texture_entry(4, wgpu::TextureSampleType::Depth),
                sampler_entry(5, wgpu::SamplerBindingType::Comparison),
            ],
        });
        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, wgpu::TextureSampleType::Float { filterable: true }),
                sampler_entry(2, wgpu::SamplerBindingType::Filtering),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &node_layout],
            push_constant_ranges: &[],
        });
        let single_sided = scene_pipeline(device, &layout, &shader, Some(wgpu::Face::Back));
        let double_sided = scene_pipeline(device, &layout, &shader, None);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = TextureImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        };
        let white_texture = upload_srgb_texture(device, queue, "White", &white);

        Self {
            frame_layout,
            node_layout,
            single_sided,
            double_sided,
            frame_buffer,
            frame_bind_group: None,
            texture_sampler,
            white_texture,
            textures: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn node_layout(&self) -> &wgpu::BindGroupLayout {
        &self.node_layout
    }

    pub fn meshes(&self) -> &[GpuMesh] {
        &self.meshes
    }

    /// Rebuilds the frame bind group; called whenever one of the sampled
    /// textures is replaced.
    pub fn bind_frame_resources(
        &mut self,
        device: &wgpu::Device,
        environment: &wgpu::TextureView,
        environment_sampler: &wgpu::Sampler,
        mask: &wgpu::TextureView,
        shadow: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
    ) {
        self.frame_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(environment),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(environment_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(mask),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(shadow),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
            ],
        }));
    }

    /// Uploads geometry and material textures. Replaces anything uploaded
    /// before.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, graph: &SceneGraph) {
        self.textures = graph
            .textures()
            .iter()
            .enumerate()
            .map(|(index, image)| {
                upload_srgb_texture(device, queue, &format!("Material Texture {index}"), image)
            })
            .collect();

        self.meshes = graph
            .nodes()
            .iter()
            .map(|node| self.upload_mesh(device, node, graph.textures().len()))
            .collect();
        log::info!(
            "Uploaded {} mesh(es) and {} texture(s)",
            self.meshes.len(),
            self.textures.len()
        );
    }

    fn upload_mesh(&self, device: &wgpu::Device, node: &SceneNode, texture_count: usize) -> GpuMesh {
        let mesh = &node.mesh;
        let vertices: Vec<Vertex> = (0..mesh.vertex_count())
            .map(|index| Vertex {
                position: mesh.positions[index],
                normal: mesh.normals.get(index).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: mesh.uvs.get(index).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", node.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", node.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform = NodeUniform::from_node(node, texture_count);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Uniform", node.name)),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let texture = match &node.material {
            Material::Standard(base) | Material::Flame { base, .. } => base
                .base_color_texture
                .and_then(|index| self.textures.get(index)),
            Material::Translucent(_) => None,
        }
        .unwrap_or(&self.white_texture);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", node.name)),
            layout: &self.node_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.texture_sampler),
                },
            ],
        });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
            cast_shadow: node.cast_shadow,
            double_sided: node.material.is_double_sided(),
        }
    }

    /// Pushes this frame's uniforms: camera and lights, plus every node's
    /// material (wind time, edited wax parameters, shadow flags).
    pub fn update(&mut self, queue: &wgpu::Queue, frame: &FrameUniform, graph: Option<&SceneGraph>) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));
        let Some(graph) = graph else {
            return;
        };
        let texture_count = graph.textures().len();
        for (mesh, node) in self.meshes.iter_mut().zip(graph.nodes()) {
            let uniform = NodeUniform::from_node(node, texture_count);
            queue.write_buffer(&mesh.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
            mesh.cast_shadow = node.cast_shadow;
            mesh.double_sided = node.material.is_double_sided();
        }
    }

    /// Records the lit pass into an already-begun HDR render pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(frame_bind_group) = &self.frame_bind_group else {
            return;
        };
        pass.set_bind_group(0, frame_bind_group, &[]);
        for mesh in &self.meshes {
            let pipeline = if mesh.double_sided {
                &self.double_sided
            } else {
                &self.single_sided
            };
            pass.set_pipeline(pipeline);
            mesh.draw(pass);
        }
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if cull_mode.is_some() {
            "Scene Pipeline"
        } else {
            "Scene Pipeline (double sided)"
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub(super) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(super) fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(super) fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

fn upload_srgb_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &TextureImage,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width.max(1),
        height: image.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{test_node, StandardMaterial, TranslucentParams, WindPatch};

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 320);
        assert_eq!(std::mem::size_of::<NodeUniform>(), 240);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn flame_uniform_enables_wind() {
        let mut node = test_node("flame");
        node.material = Material::Flame {
            base: StandardMaterial::default(),
            wind: WindPatch {
                time: 2.5,
                ..WindPatch::default()
            },
        };
        let uniform = NodeUniform::from_node(&node, 0);
        assert_eq!(uniform.wind, [2.5, 0.2, 0.2, 1.0]);
        assert_eq!(uniform.surface[2], KIND_FLAME);

        let plain = NodeUniform::from_node(&test_node("Circle"), 0);
        assert_eq!(plain.wind[3], 0.0);
    }

    #[test]
    fn translucent_uniform_carries_wax_parameters() {
        let mut node = test_node("Wax");
        node.receive_shadow = true;
        node.material = Material::Translucent(TranslucentParams::default());
        let uniform = NodeUniform::from_node(&node, 0);
        assert_eq!(uniform.surface[2], KIND_TRANSLUCENT);
        assert_eq!(uniform.wax_a, [0.6, 0.72, 2.9, 2.0]);
        assert_eq!(uniform.wax_b[3], 0.03);
        assert_eq!(uniform.wax_c, [0.63, 1.0, 30.0, 1.0]);
        let flags = uniform.surface[3] as u32;
        assert_ne!(flags & FLAG_RECEIVE_SHADOW, 0);
    }

    #[test]
    fn texture_flag_requires_a_loaded_texture() {
        let mut node = test_node("Leaves_Mat1_0001");
        node.material = Material::Standard(StandardMaterial {
            base_color_texture: Some(2),
            ..StandardMaterial::default()
        });
        let missing = NodeUniform::from_node(&node, 1).surface[3] as u32;
        let present = NodeUniform::from_node(&node, 3).surface[3] as u32;
        assert_eq!(missing & FLAG_HAS_TEXTURE, 0);
        assert_ne!(present & FLAG_HAS_TEXTURE, 0);
    }

    #[test]
    fn frame_uniform_scales_light_colors_by_intensity() {
        let camera = PerspectiveCamera::new(35.0, 1.0, 0.1, 1000.0);
        let lights = LightRig::default();
        let frame = FrameUniform::new(
            &camera,
            &lights,
            Mat4::IDENTITY,
            EnvironmentState::default(),
            1.5,
        );
        assert_eq!(frame.camera_position[3], 1.5);
        let light = &lights.points[1];
        assert!((frame.point_color_decay[1][0] - light.color[0] * light.intensity).abs() < 1e-6);
        assert_eq!(frame.point_position_range[2][3], 3.0);
        assert!(frame.spot_cone[0] < frame.spot_cone[1]);
        assert_eq!(frame.spot_cone[3], 1.0 / 256.0);
    }
}
