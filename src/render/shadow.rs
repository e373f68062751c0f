//! Depth map rendered from the spot light, sampled with PCF by the lit pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::gpu_scene::{uniform_entry, GpuScene, Vertex, DEPTH_FORMAT};
use crate::scene::lights::SpotLight;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ShadowUniform {
    light_view_proj: [[f32; 4]; 4],
}

/// World to light clip space for a spot light. The frustum covers the full
/// cone with the light's shadow near/far planes.
pub fn spot_light_matrix(spot: &SpotLight) -> Mat4 {
    let direction = spot.direction();
    let up = if direction.abs().dot(Vec3::Y) > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(spot.position, spot.position + direction, up);
    let fov = (spot.angle * 2.0).clamp(0.01, std::f32::consts::PI - 0.01);
    let projection = Mat4::perspective_rh(fov, 1.0, spot.shadow.near, spot.shadow.far);
    projection * view
}

pub struct SpotShadowMap {
    depth_view: wgpu::TextureView,
    sampled_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SpotShadowMap {
    pub fn new(device: &wgpu::Device, resolution: u32, node_layout: &wgpu::BindGroupLayout) -> Self {
        let resolution = resolution.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Spot Shadow Map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Spot Shadow Depth View"),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });
        let sampled_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Spot Shadow Sampled View"),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Spot Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Frame Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Uniform"),
            size: std::mem::size_of::<ShadowUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Frame Bind Group"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&shadow_layout, node_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!("Spot shadow map {}x{}", resolution, resolution);
        Self {
            depth_view,
            sampled_view,
            sampler,
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn sampled_view(&self) -> &wgpu::TextureView {
        &self.sampled_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn update(&self, queue: &wgpu::Queue, light_view_proj: Mat4) {
        let uniform = ShadowUniform {
            light_view_proj: light_view_proj.to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Renders every shadow-casting mesh. Always clears, so a scene without
    /// casters leaves the map fully lit.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, scene: &GpuScene) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Spot Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        for mesh in scene.meshes().iter().filter(|mesh| mesh.cast_shadow) {
            mesh.draw(&mut pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LightRig;

    fn to_light_ndc(matrix: Mat4, point: Vec3) -> Vec3 {
        let clip = matrix * point.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn spot_target_projects_to_the_map_center() {
        let rig = LightRig::default();
        let matrix = spot_light_matrix(&rig.spot);
        let ndc = to_light_ndc(matrix, rig.spot.target);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn points_outside_the_far_plane_are_clipped() {
        let rig = LightRig::default();
        let matrix = spot_light_matrix(&rig.spot);
        let far_point = rig.spot.position + rig.spot.direction() * (rig.spot.shadow.far + 5.0);
        assert!(to_light_ndc(matrix, far_point).z > 1.0);
    }

    #[test]
    fn straight_down_spot_uses_a_fallback_up_axis() {
        let mut rig = LightRig::default();
        rig.spot.target = rig.spot.position - Vec3::Y * 10.0;
        let matrix = spot_light_matrix(&rig.spot);
        assert!(matrix.is_finite());
    }
}
