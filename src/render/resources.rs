use std::num::NonZeroU64;

use bytemuck::bytes_of;
use log::info;
use wgpu::util::DeviceExt;

use crate::error::ViewerError;
use crate::mesh::{MeshData, VERTEX_STRIDE};
use crate::render::uniforms::SamplerBorder;
use crate::shader::{LinkedProgram, ResourceKind};
use crate::texture::{SamplerState, TextureImage, WrapMode};

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

/// Interleaved position/normal/uv layout shared by every program.
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: VERTEX_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

pub(crate) struct DepthBuffer {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl DepthBuffer {
    pub(crate) const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    pub(crate) fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// The scene's vertex buffer. Dropping it releases the GPU allocation.
pub(crate) struct GpuMesh {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) vertex_count: u32,
}

impl GpuMesh {
    pub(crate) fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-vertices"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            vertex_count: mesh.vertex_count(),
        }
    }
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        // the fragment stage substitutes the border color itself
        WrapMode::ClampToEdge | WrapMode::ClampToBorder => wgpu::AddressMode::ClampToEdge,
    }
}

fn create_sampler(device: &wgpu::Device, state: &SamplerState) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("surface-sampler"),
        address_mode_u: address_mode(state.wrap_s),
        address_mode_v: address_mode(state.wrap_t),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        lod_max_clamp: 0.0,
        ..Default::default()
    })
}

/// A surface texture with its sampler and border parameters bound as one
/// group.
pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    border: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    state: SamplerState,
}

impl GpuTexture {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> Result<Self, ViewerError> {
        image.check_fits(device.limits().max_texture_dimension_2d)?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: image.levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip_level, level) in image.levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let state = SamplerState::default();
        let sampler = create_sampler(device, &state);
        let border = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("surface-border"),
            contents: bytes_of(&SamplerBorder::from_state(&state)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = texture_bind_group(device, layout, &view, &sampler, &border);

        Ok(Self {
            _texture: texture,
            view,
            sampler,
            border,
            bind_group,
            state,
        })
    }

    pub(crate) fn wrap_mode(&self) -> WrapMode {
        self.state.wrap_s
    }

    /// Switches both axes to `mode`. Returns false without touching the GPU
    /// when `mode` is already active.
    pub(crate) fn set_wrap_mode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        mode: WrapMode,
    ) -> bool {
        let updates = self.state.wrap_updates(mode);
        if updates.is_empty() {
            return false;
        }
        for update in updates {
            self.state.apply(update);
        }
        queue.write_buffer(&self.border, 0, bytes_of(&SamplerBorder::from_state(&self.state)));
        self.sampler = create_sampler(device, &self.state);
        self.bind_group = texture_bind_group(device, layout, &self.view, &self.sampler, &self.border);
        true
    }
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    border: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("surface-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: border.as_entire_binding(),
            },
        ],
    })
}

/// Render pipeline built from a linked program, with bind group layouts
/// derived from its reflected interface.
pub(crate) struct GpuProgram {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) uniform_layout: wgpu::BindGroupLayout,
    pub(crate) texture_layout: Option<wgpu::BindGroupLayout>,
}

impl GpuProgram {
    pub(crate) async fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        program: &LinkedProgram,
    ) -> Result<Self, ViewerError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let layouts: Vec<wgpu::BindGroupLayout> = [0u32, 1]
            .into_iter()
            .map(|group| {
                let entries: Vec<_> = program
                    .interface
                    .resources_in_group(group)
                    .map(|(binding, kind)| layout_entry(binding, kind))
                    .collect();
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{}-group{group}-layout", program.name)),
                    entries: &entries,
                })
            })
            .collect();
        let has_textures = program.interface.resources_in_group(1).next().is_some();
        let used_layouts = if has_textures { &layouts[..] } else { &layouts[..1] };
        let layout_refs: Vec<&wgpu::BindGroupLayout> = used_layouts.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}-pipeline-layout", program.name)),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}-vertex", program.name)),
            source: wgpu::ShaderSource::Wgsl(program.vertex.source.as_str().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}-fragment", program.name)),
            source: wgpu::ShaderSource::Wgsl(program.fragment.source.as_str().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{}-pipeline", program.name)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(program.vertex.entry_point()),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(program.fragment.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(ViewerError::ShaderLink {
                program: program.name.clone(),
                log: err.to_string(),
            });
        }
        info!("created pipeline for program `{}`", program.name);

        let mut layouts = layouts.into_iter();
        let (Some(uniform_layout), texture_layout) = (layouts.next(), layouts.next()) else {
            return Err(ViewerError::ShaderLink {
                program: program.name.clone(),
                log: "program has no uniform group".to_string(),
            });
        };
        Ok(Self {
            pipeline,
            uniform_layout,
            texture_layout: texture_layout.filter(|_| has_textures),
        })
    }
}

fn layout_entry(binding: u32, kind: ResourceKind) -> wgpu::BindGroupLayoutEntry {
    let ty = match kind {
        ResourceKind::Uniform { size } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        ResourceKind::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        ResourceKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    };
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty,
        count: None,
    }
}
