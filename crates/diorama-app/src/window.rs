//! Window creation, winit event handling and the per-frame driver.
//!
//! [`App`] implements winit's [`ApplicationHandler`]. Input events are
//! accumulated in [`KeyboardState`] and [`MouseState`] as they arrive and
//! routed into the [`Diorama`] at the start of each redraw, followed by the
//! simulation step and the GPU frame.

use std::sync::Arc;

use diorama_config::{Config, ConfigError};
use diorama_input::{KeyboardState, MouseState};
use diorama_render::{
    RenderContext, SceneRenderer, SurfaceError, init_render_context_blocking,
};
use diorama_world::Diorama;
use glam::Vec2;
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::frame_clock::FrameClock;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// What one call to [`route_input`] delivered to the diorama.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoutedInput {
    pub keys: usize,
    pub clicks: u32,
    pub dragged: bool,
    pub scrolled: bool,
}

/// Feed the input gathered since the last frame into the diorama and clear
/// the per-frame mouse state. Failed bridge toggles are logged and skipped.
pub fn route_input(
    diorama: &mut Diorama,
    keyboard: &mut KeyboardState,
    mouse: &mut MouseState,
    viewport_height: f32,
) -> RoutedInput {
    let mut routed = RoutedInput::default();

    for key in keyboard.drain() {
        diorama.on_key(key);
        routed.keys += 1;
    }

    for _ in 0..mouse.clicks() {
        match diorama.on_click() {
            Ok(state) => {
                info!(?state, "drawbridge toggled");
                routed.clicks += 1;
            }
            Err(e) => warn!("{e}"),
        }
    }

    let drag = mouse.drag();
    if drag != Vec2::ZERO {
        diorama.on_drag(drag, viewport_height);
        routed.dragged = true;
    }

    let lines = mouse.wheel_lines();
    if lines != 0.0 {
        diorama.on_scroll(lines);
        routed.scrolled = true;
    }

    mouse.clear_transients();
    routed
}

/// `<base> | Phase: <name> | <fps> FPS`
pub fn window_title(base: &str, label: &str, fps: f64) -> String {
    if label.is_empty() {
        format!("{base} | {fps:.0} FPS")
    } else {
        format!("{base} | {label} | {fps:.0} FPS")
    }
}

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.window.title.clone())
        .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
}

pub struct App {
    config: Config,
    diorama: Diorama,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<SceneRenderer>,
    keyboard: KeyboardState,
    mouse: MouseState,
    clock: FrameClock,
    title: String,
}

impl App {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let diorama = Diorama::new(&config)?;
        Ok(Self {
            title: config.window.title.clone(),
            config,
            diorama,
            window: None,
            gpu: None,
            renderer: None,
            keyboard: KeyboardState::new(),
            mouse: MouseState::new(),
            clock: FrameClock::new(),
        })
    }

    pub fn diorama(&self) -> &Diorama {
        &self.diorama
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(gpu);
            }
        }
        if let Err(e) = self.diorama.on_resize(width, height) {
            warn!("{e}");
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let viewport_height = self.gpu.as_ref().map_or(self.config.window.height, |g| g.size().1);
        route_input(
            &mut self.diorama,
            &mut self.keyboard,
            &mut self.mouse,
            viewport_height as f32,
        );

        let frame = self.diorama.frame();
        self.clock.tick();

        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            match renderer.render(
                gpu,
                self.diorama.scene(),
                self.diorama.camera(),
                self.diorama.clear_color(),
            ) {
                Ok(stats) => {
                    if self.clock.should_report(self.config.debug.stats_interval_frames) {
                        debug!(
                            frame = self.clock.frame_count(),
                            fps = self.clock.fps(),
                            draw_calls = stats.draw_calls,
                            triangles = stats.triangles,
                            phase = %frame.phase,
                            time_of_day = frame.time_of_day,
                            "frame stats"
                        );
                    }
                }
                Err(SurfaceError::Timeout) => debug!("surface timeout, skipping frame"),
                Err(SurfaceError::Lost) => warn!("surface lost, skipping frame"),
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory, exiting");
                    event_loop.exit();
                    return;
                }
            }
        }

        let title = window_title(
            &self.config.window.title,
            self.diorama.label().text(),
            self.clock.fps(),
        );
        if let Some(window) = &self.window {
            if title != self.title {
                window.set_title(&title);
                self.title = title;
            }
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        info!(width = size.width, height = size.height, "window created");

        match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => {
                self.renderer = Some(SceneRenderer::new(&gpu));
                self.gpu = Some(gpu);
            }
            Err(e) => {
                error!("Failed to initialize GPU: {e}");
                event_loop.exit();
                return;
            }
        }
        if let Err(e) = self.diorama.on_resize(size.width, size.height) {
            warn!("{e}");
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!(frames = self.clock.frame_count(), "close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.keyboard.process_event(&event),
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { button, state, .. } => self.mouse.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.mouse.on_scroll(delta),
            WindowEvent::CursorEntered { .. } => self.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.mouse.on_cursor_left(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open the window and run the diorama until it is closed.
pub fn run(config: Config) -> Result<(), AppError> {
    let mut app = App::new(config)?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app)?;
    info!(frames = app.clock.frame_count(), "event loop exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diorama_input::RawKeyEvent;
    use diorama_world::{BridgeState, SeasonAssets};
    use glam::Vec3;
    use winit::event::{ElementState, MouseButton};
    use winit::keyboard::{Key, NamedKey};

    fn diorama() -> Diorama {
        let mut config = Config::default();
        config.scene.seed = Some(3);
        Diorama::with_assets(&config, SeasonAssets::default(), None).unwrap()
    }

    fn press(keyboard: &mut KeyboardState, key: Key) {
        keyboard.process_raw(RawKeyEvent {
            key,
            state: ElementState::Pressed,
            repeat: false,
        });
    }

    fn click(mouse: &mut MouseState) {
        mouse.on_button(MouseButton::Left, ElementState::Pressed);
        mouse.on_button(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn test_keys_move_camera() {
        let mut d = diorama();
        let mut keyboard = KeyboardState::new();
        let mut mouse = MouseState::new();
        let start = d.camera().position;
        press(&mut keyboard, Key::Named(NamedKey::ArrowLeft));
        press(&mut keyboard, Key::Named(NamedKey::ArrowUp));

        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert_eq!(routed.keys, 2);
        assert_eq!(keyboard.pending_len(), 0);
        assert!((d.camera().position - start - Vec3::new(-2.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn test_clicks_toggle_bridge_once_each() {
        let mut d = diorama();
        let mut keyboard = KeyboardState::new();
        let mut mouse = MouseState::new();

        click(&mut mouse);
        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert_eq!(routed.clicks, 1);
        assert_eq!(d.bridge_state(), BridgeState::Raised);

        // transients were cleared, so the same click is not replayed
        route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert_eq!(d.bridge_state(), BridgeState::Raised);

        click(&mut mouse);
        click(&mut mouse);
        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert_eq!(routed.clicks, 2);
        assert_eq!(d.bridge_state(), BridgeState::Raised);
    }

    #[test]
    fn test_drag_rotates_only_with_button_held() {
        let mut d = diorama();
        let mut keyboard = KeyboardState::new();
        let mut mouse = MouseState::new();

        mouse.on_cursor_moved(100.0, 100.0);
        mouse.on_cursor_moved(150.0, 100.0);
        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert!(!routed.dragged);

        mouse.on_button(MouseButton::Left, ElementState::Pressed);
        mouse.on_cursor_moved(200.0, 100.0);
        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert!(routed.dragged);
        assert_eq!(mouse.drag(), Vec2::ZERO);
    }

    #[test]
    fn test_scroll_is_forwarded() {
        let mut d = diorama();
        let mut keyboard = KeyboardState::new();
        let mut mouse = MouseState::new();
        mouse.on_scroll(winit::event::MouseScrollDelta::LineDelta(0.0, 1.0));
        let routed = route_input(&mut d, &mut keyboard, &mut mouse, 720.0);
        assert!(routed.scrolled);
        assert_eq!(mouse.wheel_lines(), 0.0);
    }

    #[test]
    fn test_window_title() {
        assert_eq!(
            window_title("Castle Diorama", "Phase: Dawn", 59.6),
            "Castle Diorama | Phase: Dawn | 60 FPS"
        );
        assert_eq!(window_title("Castle Diorama", "", 30.0), "Castle Diorama | 30 FPS");
    }

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.width = 1024;
        config.window.height = 600;
        config.window.title = "Keep".into();
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Keep");
        assert_eq!(
            attrs.inner_size,
            Some(LogicalSize::new(1024, 600).into())
        );
    }
}
