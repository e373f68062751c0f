//! HDR target plus the post chain: half-resolution bloom (bright pass and a
//! separable blur), then a composite that tone maps, saturates, vignettes and
//! writes the swapchain.

use bytemuck::{Pod, Zeroable};

use super::gpu_scene::{sampler_entry, texture_entry, uniform_entry, HDR_FORMAT};
use crate::config::PostConfig;

/// Matches `Post` in `post.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PostUniform {
    pub bloom: [f32; 4],
    pub grade: [f32; 4],
    pub texel: [f32; 4],
}

impl PostUniform {
    pub fn new(config: &PostConfig, encode_srgb: bool, texel: [f32; 2], direction: [f32; 2]) -> Self {
        Self {
            bloom: [
                config.bloom_threshold,
                config.bloom_smoothing,
                config.bloom_intensity,
                config.exposure,
            ],
            grade: [
                config.saturation,
                config.vignette_offset,
                config.vignette_darkness,
                if encode_srgb { 1.0 } else { 0.0 },
            ],
            texel: [texel[0], texel[1], direction[0], direction[1]],
        }
    }
}

/// Bloom targets are half the viewport, never smaller than one texel.
pub fn bloom_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct Target {
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// One fullscreen draw: its uniform buffer and its bind group.
struct Stage {
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct PostChain {
    config: PostConfig,
    encode_srgb: bool,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    hdr: Target,
    bloom_a: Target,
    bloom_b: Target,
    black: Target,
    bright: Stage,
    blur_horizontal: Stage,
    blur_vertical: Stage,
    composite: Stage,
}

impl PostChain {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: PostConfig,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureSampleType::Float { filterable: true }),
                sampler_entry(2, wgpu::SamplerBindingType::Filtering),
                texture_entry(3, wgpu::TextureSampleType::Float { filterable: true }),
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/post.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let bright_pipeline =
            fullscreen_pipeline(device, &pipeline_layout, &shader, "fs_bright", HDR_FORMAT);
        let blur_pipeline =
            fullscreen_pipeline(device, &pipeline_layout, &shader, "fs_blur", HDR_FORMAT);
        let composite_pipeline =
            fullscreen_pipeline(device, &pipeline_layout, &shader, "fs_composite", surface_format);

        let encode_srgb = !surface_format.is_srgb();
        let hdr = Target::new(device, "HDR Scene", width, height);
        let (bloom_width, bloom_height) = bloom_size(width, height);
        let bloom_a = Target::new(device, "Bloom A", bloom_width, bloom_height);
        let bloom_b = Target::new(device, "Bloom B", bloom_width, bloom_height);
        let black = Target::new(device, "Post Placeholder", 1, 1);

        let stage = |label: &str, source: &Target, bloom: &Target| {
            let uniform = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<PostUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = post_bind_group(device, &layout, &sampler, &uniform, source, bloom);
            Stage { uniform, bind_group }
        };
        let bright = stage("Bloom Bright", &hdr, &black);
        let blur_horizontal = stage("Bloom Blur H", &bloom_a, &black);
        let blur_vertical = stage("Bloom Blur V", &bloom_b, &black);
        let composite = stage("Composite", &hdr, &bloom_a);

        Self {
            config,
            encode_srgb,
            layout,
            sampler,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            hdr,
            bloom_a,
            bloom_b,
            black,
            bright,
            blur_horizontal,
            blur_vertical,
            composite,
        }
    }

    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr.view
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.hdr = Target::new(device, "HDR Scene", width, height);
        let (bloom_width, bloom_height) = bloom_size(width, height);
        self.bloom_a = Target::new(device, "Bloom A", bloom_width, bloom_height);
        self.bloom_b = Target::new(device, "Bloom B", bloom_width, bloom_height);

        let rebind = |stage: &mut Stage, source: &Target, bloom: &Target| {
            stage.bind_group =
                post_bind_group(device, &self.layout, &self.sampler, &stage.uniform, source, bloom);
        };
        rebind(&mut self.bright, &self.hdr, &self.black);
        rebind(&mut self.blur_horizontal, &self.bloom_a, &self.black);
        rebind(&mut self.blur_vertical, &self.bloom_b, &self.black);
        rebind(&mut self.composite, &self.hdr, &self.bloom_a);
    }

    /// Writes the per-stage uniforms for a `width` x `height` viewport.
    pub fn update(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        let full_texel = [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32];
        let (bloom_width, bloom_height) = bloom_size(width, height);
        let bloom_texel = [1.0 / bloom_width as f32, 1.0 / bloom_height as f32];
        let write = |stage: &Stage, texel: [f32; 2], direction: [f32; 2]| {
            let uniform = PostUniform::new(&self.config, self.encode_srgb, texel, direction);
            queue.write_buffer(&stage.uniform, 0, bytemuck::bytes_of(&uniform));
        };
        write(&self.bright, full_texel, [0.0, 0.0]);
        write(&self.blur_horizontal, bloom_texel, [1.0, 0.0]);
        write(&self.blur_vertical, bloom_texel, [0.0, 1.0]);
        write(&self.composite, full_texel, [0.0, 0.0]);
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        self.fullscreen(encoder, "Bloom Bright Pass", &self.bright_pipeline, &self.bright, &self.bloom_a.view);
        self.fullscreen(encoder, "Bloom Blur H Pass", &self.blur_pipeline, &self.blur_horizontal, &self.bloom_b.view);
        self.fullscreen(encoder, "Bloom Blur V Pass", &self.blur_pipeline, &self.blur_vertical, &self.bloom_a.view);
        self.fullscreen(encoder, "Composite Pass", &self.composite_pipeline, &self.composite, output);
    }

    fn fullscreen(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        stage: &Stage,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &stage.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    uniform: &wgpu::Buffer,
    source: &Target,
    bloom: &Target,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Post Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&source.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&bloom.view),
            },
        ],
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_runs_at_half_resolution() {
        assert_eq!(bloom_size(1280, 720), (640, 360));
        assert_eq!(bloom_size(1, 1), (1, 1));
        assert_eq!(bloom_size(3, 0), (1, 1));
    }

    #[test]
    fn post_uniform_packs_the_grading_settings() {
        let uniform = PostUniform::new(&PostConfig::default(), true, [0.5, 0.25], [1.0, 0.0]);
        assert_eq!(uniform.bloom, [0.9, 0.025, 2.0, 1.0]);
        assert_eq!(uniform.grade, [0.3, 0.3, 0.7, 1.0]);
        assert_eq!(uniform.texel, [0.5, 0.25, 1.0, 0.0]);
        assert_eq!(std::mem::size_of::<PostUniform>(), 48);
    }
}
