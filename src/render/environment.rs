//! Environment map and spot mask textures. Both start as 1x1 placeholders
//! so the lit pass can bind them before the loaders finish.

use crate::assets::{EnvironmentLevel, EnvironmentMap, MaskImage};

use super::gpu_scene::EnvironmentState;

pub struct GpuEnvironment {
    environment_view: wgpu::TextureView,
    mask_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    state: EnvironmentState,
}

impl GpuEnvironment {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let black = EnvironmentLevel {
            width: 1,
            height: 1,
            texels: vec![[0.0, 0.0, 0.0, 1.0]],
        };
        let environment_view = upload_environment_levels(device, queue, &[black]);
        let mask_view = upload_mask(
            device,
            queue,
            &MaskImage {
                width: 1,
                height: 1,
                luma: vec![255],
            },
        );
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            environment_view,
            mask_view,
            sampler,
            state: EnvironmentState::default(),
        }
    }

    pub fn environment_view(&self) -> &wgpu::TextureView {
        &self.environment_view
    }

    pub fn mask_view(&self) -> &wgpu::TextureView {
        &self.mask_view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn state(&self) -> EnvironmentState {
        self.state
    }

    pub fn set_environment(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, map: &EnvironmentMap) {
        if map.levels.is_empty() {
            log::warn!("Environment map has no levels; keeping placeholder");
            return;
        }
        self.environment_view = upload_environment_levels(device, queue, &map.levels);
        self.state.has_environment = true;
        self.state.max_mip = (map.levels.len() - 1) as f32;
    }

    pub fn set_mask(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mask: &MaskImage) {
        self.mask_view = upload_mask(device, queue, mask);
        self.state.has_mask = true;
    }
}

fn upload_environment_levels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    levels: &[EnvironmentLevel],
) -> wgpu::TextureView {
    let base = &levels[0];
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Map"),
        size: wgpu::Extent3d {
            width: base.width,
            height: base.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba16Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (mip_level, level) in levels.iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: mip_level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &level.to_f16_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(8 * level.width),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_mask(device: &wgpu::Device, queue: &wgpu::Queue, mask: &MaskImage) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: mask.width.max(1),
        height: mask.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Spot Mask"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
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
        &mask.luma,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
