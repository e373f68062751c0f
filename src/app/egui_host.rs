use egui_winit::winit::event::WindowEvent;
use winit::window::Window;

/// Tessellated egui output for one frame, ready for the renderer.
pub struct EguiFrameOutput {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub screen_size_px: [u32; 2],
}

pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
    wants_pointer_input: bool,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Self {
            context,
            winit_state,
            wants_pointer_input: false,
        }
    }

    /// Feeds a window event to egui. Returns `true` when egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// Whether the pointer was over an egui widget or being used by one
    /// during the last frame; orbit input is ignored while it is.
    pub fn wants_pointer_input(&self) -> bool {
        self.wants_pointer_input
    }

    pub fn wants_keyboard_input(&self) -> bool {
        self.context.wants_keyboard_input()
    }

    /// Runs one egui pass and hands back both the tessellated output and
    /// whatever the UI closure returned.
    pub fn run_ui<R, F>(&mut self, window: &Window, mut build: F) -> (EguiFrameOutput, R)
    where
        R: Default,
        F: FnMut(&egui::Context) -> R,
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let mut result = R::default();
        let full_output = self.context.run(raw_input, |ctx| {
            result = build(ctx);
        });
        self.winit_state
            .handle_platform_output(window, full_output.platform_output);
        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, pixels_per_point);
        self.wants_pointer_input =
            self.context.wants_pointer_input() || self.context.is_pointer_over_area();
        let size = window.inner_size();

        let output = EguiFrameOutput {
            clipped_primitives,
            textures_delta: full_output.textures_delta,
            pixels_per_point,
            screen_size_px: [size.width.max(1), size.height.max(1)],
        };
        (output, result)
    }
}
