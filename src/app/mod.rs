pub mod context;
pub mod egui_host;
pub mod frame;
pub mod input;
pub mod session;
pub mod timing;
pub mod viewport;

use crate::config::{ConfigError, SandboxConfig};
use crate::render::{RenderError, SurfaceRenderer};
use crate::scene::SceneError;
use crate::ui::{self, BindingError};
use context::SandboxContext;
use egui_host::EguiHost;
use frame::FrameLoop;
use input::PointerInput;
use session::{Subscription, ViewSession};
use viewport::ViewportManager;

use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Pixel scroll deltas per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scene setup failed: {0}")]
    Scene(#[from] SceneError),
    #[error("parameter panel: {0}")]
    Panel(#[from] BindingError),
    #[error("renderer: {0}")]
    Render(#[from] RenderError),
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}

pub struct App {
    config: SandboxConfig,
    ctx: SandboxContext,
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    renderer: Option<SurfaceRenderer>,
    viewport: Option<ViewportManager>,
    session: Option<ViewSession>,
    pointer: PointerInput,
    frame: FrameLoop,
    error: Option<AppError>,
}

impl App {
    fn new(config: SandboxConfig) -> Result<Self, AppError> {
        let ctx = SandboxContext::new(&config)?;
        Ok(Self {
            config,
            ctx,
            window: None,
            egui: None,
            renderer: None,
            viewport: None,
            session: None,
            pointer: PointerInput::default(),
            frame: FrameLoop::default(),
            error: None,
        })
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_config = &self.config.window;
        let window_attrs = WindowAttributes::default()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let egui = EguiHost::new(&window);
        let renderer = SurfaceRenderer::new(window.clone(), egui.context(), self.config.background()?)?;
        let size = window.inner_size();
        self.viewport = Some(ViewportManager::new(size.width, size.height, &mut self.ctx.camera));
        log::info!("window: {}x{}", size.width, size.height);

        self.egui = Some(egui);
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{}", err);
        self.error = Some(err);
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.as_mut() {
            session.close(&mut self.ctx);
        }
        event_loop.exit();
    }

    fn listens_to(&self, subscription: Subscription) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.listens_to(subscription))
    }

    fn ui_wants_pointer(&self) -> bool {
        self.egui
            .as_ref()
            .is_some_and(|egui| egui.wants_pointer_input())
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport.map(|viewport| viewport.size()).unwrap_or((1, 1))
    }

    fn handle_pointer(&mut self, event: &WindowEvent) {
        if !self.listens_to(Subscription::Pointer) {
            return;
        }
        let size = self.viewport_size();
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let client = Vec2::new(position.x as f32, position.y as f32);
                self.pointer.pointer_move(client, size, &mut self.ctx);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !self.ui_wants_pointer() => {
                    self.pointer.pointer_down(size, &mut self.ctx);
                }
                ElementState::Pressed => {}
                ElementState::Released => self.pointer.pointer_up(&mut self.ctx),
            },
            WindowEvent::MouseWheel { delta, .. } if !self.ui_wants_pointer() => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.pointer.wheel(lines, &mut self.ctx);
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.listens_to(Subscription::Resize) {
            return;
        }
        if let (Some(viewport), Some(renderer)) = (self.viewport.as_mut(), self.renderer.as_mut()) {
            viewport.resize(new_size.width, new_size.height, &mut self.ctx.camera, renderer);
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui), Some(renderer)) = (
            self.window.clone(),
            self.egui.as_mut(),
            self.renderer.as_mut(),
        ) else {
            return;
        };

        let mut changes = Vec::new();
        let session = &mut self.session;
        let stats = &self.ctx.stats;
        let layer = egui.run_ui(&window, |ctx| {
            if let Some(panel) = session.as_mut().and_then(|session| session.panel_mut()) {
                changes.extend(panel.show(ctx));
            }
            ui::stats_overlay(ctx, stats);
        });

        for change in &changes {
            if let Err(err) = ui::apply(change, &mut self.ctx.scene, &mut self.ctx.orbit) {
                log::error!("panel: {}", err);
            }
        }

        let report = self
            .frame
            .tick(&mut self.ctx, renderer, &layer, Instant::now());
        if report.loaded > 0 {
            log::info!("frame {}: {} asset(s) placed", self.frame.frames(), report.loaded);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init_window(event_loop) {
                self.fail(event_loop, err);
                return;
            }
        }
        if self.session.is_none() {
            match ViewSession::open(&mut self.ctx) {
                Ok(session) => self.session = Some(session),
                Err(err) => self.fail(event_loop, err.into()),
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut session) = self.session.take() {
            session.close(&mut self.ctx);
        }
        self.pointer.left();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(egui)) = (self.window.as_ref(), self.egui.as_mut()) {
            egui.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::KeyboardInput { event, .. }
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.close(event_loop);
            }
            WindowEvent::Resized(new_size) => self.handle_resize(new_size),
            WindowEvent::RedrawRequested => self.render(),
            WindowEvent::CursorMoved { .. }
            | WindowEvent::CursorLeft { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. } => self.handle_pointer(&event),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let scheduling = self
            .session
            .as_ref()
            .is_some_and(|session| session.is_scheduling());
        if scheduling {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session = None;
        log::info!("👋 Goodbye!");
    }
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("🚀 shadebox");
    log::info!("   Drag a box or the spotlight marker; drag empty space to orbit, ESC to exit");

    let config = SandboxConfig::resolve()?;
    let mut app = App::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
