use super::{PerspectiveCamera, RenderError, SceneRenderer, ScenePainter, UiLayer};
use crate::scene::{Color, SceneGraph};
use std::sync::Arc;
use winit::window::Window;

/// Presents the painted scene and the egui layer to the window surface.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
    egui_ctx: egui::Context,
    painter: ScenePainter,
    clear: wgpu::Color,
}

impl SurfaceRenderer {
    pub fn new(
        window: Arc<Window>,
        egui_ctx: egui::Context,
        background: Color,
    ) -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async(window, egui_ctx, background))
    }

    async fn new_async(
        window: Arc<Window>,
        egui_ctx: egui::Context,
        background: Color,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterUnavailable)?;
        let info = adapter.get_info();
        log::info!("render: adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("shadebox device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        // egui expects a gamma-space target.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "render: surface {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);
        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
            egui_ctx,
            painter: ScenePainter::default(),
            clear: wgpu::Color {
                r: background.r as f64,
                g: background.g as f64,
                b: background.b as f64,
                a: 1.0,
            },
        })
    }

    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("render: surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl SceneRenderer for SurfaceRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    fn draw(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        ui: &UiLayer,
    ) -> Result<(), RenderError> {
        // Texture uploads happen even when the frame is skipped so the font
        // atlas never falls out of sync.
        for (id, delta) in &ui.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let frame = self.acquire()?;
        if let Some(frame) = frame {
            let pixels_per_point = if ui.pixels_per_point > 0.0 {
                ui.pixels_per_point
            } else {
                1.0
            };
            let screen = egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(
                    self.config.width as f32 / pixels_per_point,
                    self.config.height as f32 / pixels_per_point,
                ),
            );
            let scene_shapes = self.painter.paint_clipped(scene, camera, screen);
            let mut paint_jobs = self.egui_ctx.tessellate(scene_shapes, pixels_per_point);
            paint_jobs.extend(ui.clipped_primitives.iter().cloned());

            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point,
            };
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("shadebox frame"),
                });
            let callbacks = self.egui_renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("shadebox scene"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                let mut pass = pass.forget_lifetime();
                self.egui_renderer
                    .render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            self.queue
                .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
            frame.present();
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        Ok(())
    }
}
