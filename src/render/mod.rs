pub mod camera;
mod egui_overlay;
mod environment;
mod gpu_scene;
mod post;
mod shadow;
pub mod tween;

pub use camera::{CameraPose, OrbitControls, OrbitSettings, PerspectiveCamera};
pub use tween::{CameraAnimator, TransitionTiming, TransitionUpdate};

use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::app::egui_host::EguiFrameOutput;
use crate::assets::{EnvironmentMap, MaskImage};
use crate::config::AppConfig;
use crate::scene::material::{parse_hex_rgb, srgb_to_linear};
use crate::scene::{LightRig, SceneGraph};
use egui_overlay::EguiOverlay;
use environment::GpuEnvironment;
use gpu_scene::{create_depth_texture, FrameUniform, GpuScene};
use post::PostChain;
use shadow::{spot_light_matrix, SpotShadowMap};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Everything the renderer reads for one frame.
pub struct FrameState<'a> {
    pub camera: &'a PerspectiveCamera,
    pub lights: &'a LightRig,
    /// `None` until the model has loaded.
    pub scene: Option<&'a SceneGraph>,
    pub elapsed: f32,
}

pub struct RenderContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    depth_view: wgpu::TextureView,
    scene: GpuScene,
    shadow: SpotShadowMap,
    environment: GpuEnvironment,
    post: PostChain,
    egui: EguiOverlay,
}

impl RenderContext {
    pub fn new(window: Arc<Window>, app_config: &AppConfig, shadow_map_size: u32) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Candlelight Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface {}x{} {:?}", config.width, config.height, format);

        let clear_color = background_color(&app_config.background);
        let depth_view = create_depth_texture(&device, config.width, config.height);
        let mut scene = GpuScene::new(&device, &queue);
        let shadow = SpotShadowMap::new(&device, shadow_map_size, scene.node_layout());
        let environment = GpuEnvironment::new(&device, &queue);
        scene.bind_frame_resources(
            &device,
            environment.environment_view(),
            environment.sampler(),
            environment.mask_view(),
            shadow.sampled_view(),
            shadow.sampler(),
        );
        let post = PostChain::new(
            &device,
            format,
            config.width,
            config.height,
            app_config.post,
        );
        let egui = EguiOverlay::new(&device, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            clear_color,
            depth_view,
            scene,
            shadow,
            environment,
            post,
            egui,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Minimized windows report a zero size; those are ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_texture(&self.device, new_size.width, new_size.height);
        self.post.resize(&self.device, new_size.width, new_size.height);
    }

    pub fn upload_scene(&mut self, graph: &SceneGraph) {
        self.scene.upload(&self.device, &self.queue, graph);
    }

    pub fn set_environment(&mut self, map: &EnvironmentMap) {
        self.environment.set_environment(&self.device, &self.queue, map);
        self.rebind_frame_resources();
    }

    pub fn set_spot_mask(&mut self, mask: &MaskImage) {
        self.environment.set_mask(&self.device, &self.queue, mask);
        self.rebind_frame_resources();
    }

    fn rebind_frame_resources(&mut self) {
        self.scene.bind_frame_resources(
            &self.device,
            self.environment.environment_view(),
            self.environment.sampler(),
            self.environment.mask_view(),
            self.shadow.sampled_view(),
            self.shadow.sampler(),
        );
    }

    /// Shadow map, lit HDR pass, bloom/composite into the swapchain, then
    /// the egui overlay. A lost or outdated surface is reconfigured and the
    /// frame skipped.
    pub fn render(&mut self, frame: FrameState<'_>, ui: Option<&EguiFrameOutput>) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout; skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let spot_matrix = spot_light_matrix(&frame.lights.spot);
        self.shadow.update(&self.queue, spot_matrix);
        let uniform = FrameUniform::new(
            frame.camera,
            frame.lights,
            spot_matrix,
            self.environment.state(),
            frame.elapsed,
        );
        self.scene.update(&self.queue, &uniform, frame.scene);
        self.post.update(&self.queue, self.config.width, self.config.height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.shadow.encode(&mut encoder, &self.scene);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.hdr_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.scene.draw(&mut pass);
        }
        self.post.encode(&mut encoder, &target);
        if let Some(ui) = ui {
            self.egui
                .render(&self.device, &self.queue, &mut encoder, &target, ui);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Parses the configured `#rrggbb` background into a linear clear color.
fn background_color(value: &str) -> wgpu::Color {
    let rgb = parse_hex_rgb(value).unwrap_or_else(|| {
        log::warn!("Invalid background color {value:?}; using black");
        [0.0, 0.0, 0.0]
    });
    let [r, g, b] = srgb_to_linear(rgb);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
