use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::app::SceneAssets;
use crate::error::ViewerError;
use crate::render::frame::{FramePlan, ProgramId, SurfaceTexture};
use crate::render::resources::{DepthBuffer, GpuMesh, GpuProgram, GpuTexture};
use crate::texture::WrapMode;

/// GPU renderer backed by wgpu that executes frame plans.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    mesh: GpuMesh,
    programs: HashMap<ProgramId, GpuProgram>,
    textures: HashMap<SurfaceTexture, GpuTexture>,
}

impl Renderer {
    /// Initializes the device for `window` and uploads every scene asset.
    pub async fn new(window: Arc<Window>, assets: &SceneAssets) -> Result<Self, ViewerError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(ViewerError::context("window", "window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|err| ViewerError::context("surface", err))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| ViewerError::context("GPU adapter", err))?;
        let adapter_info = adapter.get_info();
        info!(
            "using {} ({:?}, driver {} {})",
            adapter_info.name, adapter_info.backend, adapter_info.driver, adapter_info.driver_info
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|err| ViewerError::context("GPU device", err))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(ViewerError::context("surface", "no supported surface formats"));
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or(first_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth = DepthBuffer::create(&device, config.width, config.height);

        let mesh = GpuMesh::new(&device, &assets.mesh);
        info!("uploaded {} scene vertices", mesh.vertex_count);

        let mut programs = HashMap::new();
        for (id, program) in &assets.programs {
            programs.insert(*id, GpuProgram::new(&device, surface_format, program).await?);
        }

        let mut textures = HashMap::new();
        for (surface_texture, program) in [
            (SurfaceTexture::Object, ProgramId::Object),
            (SurfaceTexture::Plane, ProgramId::Plane),
        ] {
            let layout = programs
                .get(&program)
                .and_then(|p: &GpuProgram| p.texture_layout.as_ref())
                .ok_or_else(|| ViewerError::ShaderLink {
                    program: program.name().to_string(),
                    log: "lit program has no texture bindings".to_string(),
                })?;
            let texture = GpuTexture::new(
                &device,
                &queue,
                assets.texture(surface_texture),
                layout,
                program.name(),
            )?;
            textures.insert(surface_texture, texture);
        }

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth,
            mesh,
            programs,
            textures,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain and depth buffer. The projection keeps the
    /// initial aspect ratio.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Applies a wrap mode to one surface texture. Returns false when the
    /// mode was already active.
    pub fn set_wrap_mode(&mut self, surface: SurfaceTexture, mode: WrapMode) -> bool {
        let program = match surface {
            SurfaceTexture::Object => ProgramId::Object,
            SurfaceTexture::Plane => ProgramId::Plane,
        };
        let (Some(texture), Some(layout)) = (
            self.textures.get_mut(&surface),
            self.programs.get(&program).and_then(|p| p.texture_layout.as_ref()),
        ) else {
            return false;
        };
        let changed = texture.set_wrap_mode(&self.device, &self.queue, layout, mode);
        if changed {
            info!("{surface:?} texture now samples with {}", texture.wrap_mode());
        }
        changed
    }

    /// Clears, draws every call in `plan` and presents.
    pub fn render(&mut self, plan: &FramePlan) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let mut bind_groups = Vec::with_capacity(plan.draws.len());
        for draw in &plan.draws {
            let Some(program) = self.programs.get(&draw.program) else {
                continue;
            };
            let buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("draw-uniforms"),
                    contents: draw.uniforms.bytes(),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("draw-bind-group"),
                layout: &program.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            bind_groups.push(bind_group);
        }

        {
            let [r, g, b, a] = plan.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_vertex_buffer(0, self.mesh.buffer.slice(..));
            let draws = plan
                .draws
                .iter()
                .filter(|draw| self.programs.contains_key(&draw.program));
            for (draw, bind_group) in draws.zip(&bind_groups) {
                let Some(program) = self.programs.get(&draw.program) else {
                    continue;
                };
                pass.set_pipeline(&program.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                if let Some(texture) = draw.texture.and_then(|t| self.textures.get(&t)) {
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                pass.draw(draw.vertices.clone(), 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
