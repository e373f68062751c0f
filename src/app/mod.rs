pub mod egui_host;
mod input;
mod navigation;
mod timing;

use crate::assets::{self, AssetEvent};
use crate::config::AppConfig;
use crate::render::{FrameState, RenderContext, RenderError};
use crate::scene::{BindContext, Flicker, LightRig, MaterialBinder, SceneGraph};
use crate::ui::{UiActions, UiState};
use egui_host::EguiHost;
use input::{InputAction, InputState};
use navigation::Navigation;
use timing::FrameTiming;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes, WindowId};

/// Node whose material drives the flicker and wind updates.
const FLAME_NODE: &str = "flame";
/// Node the wax tuning panel edits.
const WAX_PANEL_NODE: &str = "Wax001";
/// Pixel-delta wheel events are divided by this to get "lines".
const PIXELS_PER_WHEEL_STEP: f32 = 50.0;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Events posted to the UI thread from elsewhere.
#[derive(Debug)]
pub enum AppEvent {
    Asset(AssetEvent),
}

/// The window plus everything bound to its lifetime.
struct Viewer {
    window: Arc<Window>,
    render: RenderContext,
    egui: EguiHost,
}

/// All mutable state of a session, owned by the event loop.
pub struct AppContext {
    config: AppConfig,
    proxy: EventLoopProxy<AppEvent>,
    viewer: Option<Viewer>,
    scene: Option<SceneGraph>,
    binder: MaterialBinder,
    lights: LightRig,
    flicker: Flicker,
    rng: StdRng,
    navigation: Navigation,
    ui: UiState,
    input: InputState,
    timing: FrameTiming,
    fatal: Option<AppError>,
}

impl AppContext {
    pub fn new(config: AppConfig, proxy: EventLoopProxy<AppEvent>) -> Self {
        let aspect = config.window.width.max(1) as f32 / config.window.height.max(1) as f32;
        let navigation = Navigation::new(&config.camera, aspect);

        let binder = MaterialBinder::new(BindContext {
            wax: config.wax,
            ..BindContext::default()
        });

        Self {
            proxy,
            viewer: None,
            scene: None,
            binder,
            lights: LightRig::default(),
            flicker: Flicker::new(config.flicker),
            rng: StdRng::from_entropy(),
            navigation,
            ui: UiState::new(),
            input: InputState::default(),
            timing: FrameTiming::new(config.window.title.clone()),
            fatal: None,
            config,
        }
    }

    fn elapsed(&self) -> Duration {
        self.timing.elapsed(Instant::now())
    }

    fn create_viewer(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_config = &self.config.window;
        let window_attrs = WindowAttributes::default()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let render = RenderContext::new(
            window.clone(),
            &self.config,
            self.lights.spot.shadow.map_size,
        )?;
        let size = render.size();
        self.navigation
            .camera
            .set_viewport_size(size.width, size.height);
        let egui = EguiHost::new(&window);

        self.viewer = Some(Viewer {
            window,
            render,
            egui,
        });
        Ok(())
    }

    fn start_loaders(&self) {
        let proxy = self.proxy.clone();
        assets::spawn_loaders(&self.config.assets, move |event| {
            let _ = proxy.send_event(AppEvent::Asset(event));
        });
    }

    fn handle_asset(&mut self, event: AssetEvent) {
        let label = event.label();
        match event {
            AssetEvent::Scene(Ok(mut graph)) => {
                let report = self.binder.bind(&mut graph);
                if !report.is_complete() {
                    self.ui.push_status(format!(
                        "Model is missing node(s): {}",
                        report.missing.join(", ")
                    ));
                }
                if let Some(viewer) = &mut self.viewer {
                    viewer.render.upload_scene(&graph);
                }
                let reveal_delay = Duration::from_millis(self.config.reveal_delay_ms);
                self.ui.schedule_reveal(self.elapsed() + reveal_delay);
                if let Some((center, extent)) = graph.bounds() {
                    log::debug!("Scene bounds: center {center}, half extent {extent}");
                }
                log::info!("Scene ready with {} node(s)", graph.len());
                self.scene = Some(graph);
            }
            AssetEvent::Environment(Ok(map)) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.render.set_environment(&map);
                }
                log::info!("Environment ready ({}x{})", map.width(), map.height());
            }
            AssetEvent::SpotMask(Ok(mask)) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.render.set_spot_mask(&mask);
                }
                log::info!("Spot mask ready ({}x{})", mask.width, mask.height);
            }
            AssetEvent::Scene(Err(err))
            | AssetEvent::Environment(Err(err))
            | AssetEvent::SpotMask(Err(err)) => {
                log::error!("Failed to load {}: {}", label, err);
                self.ui.push_status(format!("Failed to load {label}: {err}"));
            }
        }
    }

    fn explore(&mut self, now: Duration) {
        if !self.navigation.explore(&mut self.ui, now) {
            log::debug!("Explore ignored; intro container is hidden");
        }
    }

    fn exit(&mut self, now: Duration) {
        if !self.navigation.exit(&mut self.ui, now) {
            log::debug!("Exit ignored; not exploring");
        }
    }

    fn apply_actions(&mut self, actions: UiActions, now: Duration) {
        if actions.explore {
            self.explore(now);
        }
        if actions.exit {
            self.exit(now);
        }
        if actions.wax_changed {
            log::debug!("Wax parameters edited");
        }
    }

    /// One frame, in a fixed order: clock, flicker, wind time, render,
    /// orbit damping, camera tweens, then the next redraw request.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let frame_start = Instant::now();
        let elapsed = self.timing.elapsed(frame_start);
        let seconds = elapsed.as_secs_f32();
        if self.ui.tick(elapsed) {
            log::info!("Overlay revealed");
        }

        animate_scene(
            self.scene.as_mut(),
            &self.flicker,
            &mut self.lights,
            &mut self.rng,
            seconds,
        );

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let ui = &mut self.ui;
        let mut wax = self
            .scene
            .as_mut()
            .and_then(|graph| graph.find_mut(WAX_PANEL_NODE))
            .and_then(|node| node.material.translucent_mut());
        let (egui_output, actions) = viewer
            .egui
            .run_ui(&viewer.window, |ctx| ui.draw(ctx, wax.as_deref_mut()));

        let frame = FrameState {
            camera: &self.navigation.camera,
            lights: &self.lights,
            scene: self.scene.as_ref(),
            elapsed: seconds,
        };
        if let Err(err) = viewer.render.render(frame, Some(&egui_output)) {
            log::error!("Render failed: {}", err);
            self.fatal = Some(err.into());
            event_loop.exit();
            return;
        }
        self.timing
            .set_render_ms(frame_start.elapsed().as_secs_f32() * 1000.0);
        self.timing.update(Some(&viewer.window), Instant::now());

        let transitions = self.navigation.update(elapsed);
        if transitions.completed > 0 {
            log::debug!(
                "{} camera transition(s) finished, {} in flight",
                transitions.completed,
                transitions.in_flight
            );
        }

        self.apply_actions(actions, elapsed);
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }

    fn handle_key_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        let now = self.elapsed();
        match action {
            InputAction::Explore => self.explore(now),
            InputAction::Exit => self.exit(now),
            InputAction::Quit => event_loop.exit(),
            InputAction::ToggleWaxPanel => self.ui.toggle_wax_panel(),
            InputAction::None => {}
        }
    }
}

/// Flicker and wind time for one frame. Both only run when the scene has a
/// flame; returns whether it did.
fn animate_scene<R: Rng + ?Sized>(
    scene: Option<&mut SceneGraph>,
    flicker: &Flicker,
    lights: &mut LightRig,
    rng: &mut R,
    seconds: f32,
) -> bool {
    let Some(graph) = scene.filter(|graph| graph.contains(FLAME_NODE)) else {
        return false;
    };
    flicker.update(seconds, lights, rng);
    graph.set_shader_time(seconds);
    true
}

impl ApplicationHandler<AppEvent> for AppContext {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        if let Err(err) = self.create_viewer(event_loop) {
            log::error!("Startup failed: {}", err);
            self.fatal = Some(err);
            event_loop.exit();
            return;
        }
        self.start_loaders();
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Asset(asset) => self.handle_asset(asset),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let consumed = viewer.egui.on_window_event(&viewer.window, &event);
        let egui_wants_pointer = viewer.egui.wants_pointer_input();
        let egui_wants_keyboard = viewer.egui.wants_keyboard_input();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => {
                viewer.render.resize(new_size);
                self.navigation
                    .camera
                    .set_viewport_size(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if consumed || egui_wants_keyboard {
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                let action = self.input.handle_key(event.physical_key, pressed);
                self.handle_key_action(action, event_loop);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.input.dragging = state == ElementState::Pressed && !egui_wants_pointer;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let height = viewer.render.size().height as f32;
                if let Some((dx, dy)) = self.input.cursor_moved(position.x as f32, position.y as f32)
                {
                    self.navigation.controls.rotate_by_pixels(dx, dy, height);
                }
            }
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                if consumed || egui_wants_pointer {
                    return;
                }
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                self.navigation.controls.zoom(steps);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = AppContext::new(config, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_without_flame_skips_flicker_and_wind() {
        let mut graph = SceneGraph::new();
        graph.push(crate::scene::test_node("Wax"));
        let mut lights = LightRig::default();
        let before = lights.clone();
        let mut rng = StdRng::seed_from_u64(3);
        let flicker = Flicker::new(Default::default());

        assert!(!animate_scene(Some(&mut graph), &flicker, &mut lights, &mut rng, 1.0));
        assert!(!animate_scene(None, &flicker, &mut lights, &mut rng, 1.0));
        assert_eq!(lights, before);
    }

    #[test]
    fn flame_receives_elapsed_time() {
        let mut graph = SceneGraph::new();
        graph.push(crate::scene::test_node(FLAME_NODE));
        crate::scene::MaterialBinder::default().bind(&mut graph);
        let mut lights = LightRig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let flicker = Flicker::new(Default::default());

        assert!(animate_scene(Some(&mut graph), &flicker, &mut lights, &mut rng, 4.5));
        let flame = graph.find(FLAME_NODE).unwrap();
        assert_eq!(flame.material.wind().unwrap().time, 4.5);
        assert_ne!(lights.points[0].intensity, LightRig::default().points[0].intensity);
    }
}
