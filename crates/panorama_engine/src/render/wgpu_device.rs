//! wgpu graphics device
//!
//! Presents to a GLFW window through a wgpu surface. Programs are pairs of
//! WGSL modules: the vertex module's entry point is `vs_main`, the fragment
//! module's is `fs_main`. Shaders see one uniform block at group 0
//!
//! ```wgsl
//! struct Transforms { model: mat4x4<f32>, view: mat4x4<f32>, projection: mat4x4<f32> };
//! @group(0) @binding(0) var<uniform> transforms: Transforms;
//! ```
//!
//! and the texture bound to unit 0 (2D or cube) with a sampler at group 1,
//! bindings 0 and 1. Projections arrive with OpenGL depth (-1..1) and are
//! remapped to wgpu's 0..1 on upload.
//!
//! Draw calls are recorded with a snapshot of their uniforms and replayed in
//! one render pass by [`GraphicsDevice::present`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::assets::PixelFormat;
use crate::foundation::math::Mat4;
use crate::render::device::{
    GpuTextureHandle, GraphicsDevice, PolygonMode, ProgramHandle, RenderError, RenderResult, TextureTarget,
    TextureUpload, VertexArrayHandle,
};
use crate::render::mesh::Vertex;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Floats in the `Transforms` uniform block
const UNIFORM_FLOATS: usize = 48;
const UNIFORM_BYTES: u64 = (UNIFORM_FLOATS * std::mem::size_of::<f32>()) as u64;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // normal
    2 => Float32x2, // tex_coord
];

/// Matrices a program has been given
#[derive(Debug, Clone, Copy)]
struct Transforms {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
}

impl Default for Transforms {
    fn default() -> Self {
        Self {
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

type PipelineKey = (PolygonMode, Option<TextureTarget>);

struct Program {
    name: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    transforms: Transforms,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

struct GpuTexture {
    target: TextureTarget,
    bind_group: wgpu::BindGroup,
}

struct GpuVertexArray {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

/// One recorded draw
struct DrawCall {
    program: ProgramHandle,
    vertex_array: VertexArrayHandle,
    texture: Option<GpuTextureHandle>,
    key: PipelineKey,
    index_count: u32,
    uniforms: [f32; UNIFORM_FLOATS],
}

/// Graphics device backed by wgpu
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: wgpu::TextureView,
    adapter: wgpu::AdapterInfo,
    line_mode_supported: bool,
    uniform_stride: u64,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout_2d: wgpu::BindGroupLayout,
    texture_layout_cube: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    next_handle: u32,
    programs: HashMap<ProgramHandle, Program>,
    textures: HashMap<GpuTextureHandle, GpuTexture>,
    vertex_arrays: HashMap<VertexArrayHandle, GpuVertexArray>,

    current_program: Option<ProgramHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
    texture_units: HashMap<u32, GpuTextureHandle>,
    polygon_mode: PolygonMode,
    clear_color: [f32; 4],
    frame: Vec<DrawCall>,

    // Dropped after the surface created from it
    _window: Rc<RefCell<glfw::PWindow>>,
}

impl WgpuDevice {
    /// Create a device presenting to `window`
    pub fn for_window(window: Rc<RefCell<glfw::PWindow>>, width: u32, height: u32, vsync: bool) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = create_surface(&instance, &window.borrow())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Device("no compatible graphics adapter".to_string()))?;

        let line_mode_supported = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if line_mode_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Panorama Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| log::error!("wgpu: {}", error)));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::Device("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = create_depth_view(&device, config.width, config.height);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_BYTES),
                },
                count: None,
            }],
        });
        let texture_layout_2d = texture_layout(&device, wgpu::TextureViewDimension::D2);
        let texture_layout_cube = texture_layout(&device, wgpu::TextureViewDimension::Cube);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_stride = align_to(
            UNIFORM_BYTES,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        log::info!("wgpu surface {:?}, {}x{}", format, config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            adapter: adapter.get_info(),
            line_mode_supported,
            uniform_stride,
            uniform_layout,
            texture_layout_2d,
            texture_layout_cube,
            sampler,
            next_handle: 1,
            programs: HashMap::new(),
            textures: HashMap::new(),
            vertex_arrays: HashMap::new(),
            current_program: None,
            current_vertex_array: None,
            texture_units: HashMap::new(),
            polygon_mode: PolygonMode::Fill,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            frame: Vec::new(),
            _window: window,
        })
    }

    fn next_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn texture_layout(&self, target: TextureTarget) -> &wgpu::BindGroupLayout {
        match target {
            TextureTarget::Texture2D => &self.texture_layout_2d,
            TextureTarget::CubeMap => &self.texture_layout_cube,
        }
    }

    /// Validation errors raised by `build` become a [`RenderError`]
    fn scoped<T>(&self, build: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = build(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }

    fn ensure_pipeline(&mut self, program: ProgramHandle, key: PipelineKey) -> RenderResult<()> {
        let Some(entry) = self.programs.get(&program) else {
            return Err(RenderError::InvalidHandle {
                kind: "program",
                id: format!("{program:?}"),
            });
        };
        if entry.pipelines.contains_key(&key) {
            return Ok(());
        }

        let mut layouts = vec![&self.uniform_layout];
        if let Some(target) = key.1 {
            layouts.push(self.texture_layout(target));
        }
        let polygon_mode = match key.0 {
            PolygonMode::Fill => wgpu::PolygonMode::Fill,
            PolygonMode::Line => wgpu::PolygonMode::Line,
        };

        let pipeline = self
            .scoped(|device| {
                let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(&entry.name),
                    bind_group_layouts: &layouts,
                    push_constant_ranges: &[],
                });
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&entry.name),
                    layout: Some(&layout),
                    vertex: wgpu::VertexState {
                        module: &entry.vertex,
                        entry_point: Some("vs_main"),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &VERTEX_ATTRIBUTES,
                        }],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &entry.fragment,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: self.config.format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|log| RenderError::ShaderCompile {
                name: entry.name.clone(),
                log,
            })?;

        if let Some(entry) = self.programs.get_mut(&program) {
            entry.pipelines.insert(key, pipeline);
        }
        Ok(())
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth = create_depth_view(&self.device, self.config.width, self.config.height);
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_program(&mut self, name: &str, vertex_src: &str, fragment_src: &str) -> RenderResult<ProgramHandle> {
        let (vertex, fragment) = self
            .scoped(|device| {
                let module = |stage: &str, source: &str| {
                    device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(&format!("{name} ({stage})")),
                        source: wgpu::ShaderSource::Wgsl(source.into()),
                    })
                };
                (module("vertex", vertex_src), module("fragment", fragment_src))
            })
            .map_err(|log| RenderError::ShaderCompile {
                name: name.to_string(),
                log,
            })?;

        let program = ProgramHandle(self.next_handle());
        self.programs.insert(
            program,
            Program {
                name: name.to_string(),
                vertex,
                fragment,
                transforms: Transforms::default(),
                pipelines: HashMap::new(),
            },
        );
        log::debug!("Compiled program {} as {:?}", name, program);
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
    }

    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4) {
        let Some(entry) = self.programs.get_mut(&program) else {
            return;
        };
        match name {
            "model" => entry.transforms.model = *value,
            "view" => entry.transforms.view = *value,
            "projection" => entry.transforms.projection = *value,
            _ => log::trace!("{} has no matrix uniform {}", entry.name, name),
        }
    }

    fn set_uniform_i32(&mut self, _program: ProgramHandle, _name: &str, _value: i32) {
        // Samplers are bound by group, not by unit number
    }

    fn create_texture(&mut self, target: TextureTarget, faces: &[TextureUpload<'_>]) -> RenderResult<GpuTextureHandle> {
        let (width, height) = face_extent(target, faces)?;
        let layers = u32::try_from(faces.len()).map_err(|_| RenderError::InvalidTexture("too many faces".to_string()))?;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, upload) in (0..layers).zip(faces) {
            let pixels = rgba_pixels(upload)?;
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                    aspect: wgpu::TextureAspect::All,
                },
                &pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let dimension = match target {
            TextureTarget::Texture2D => wgpu::TextureViewDimension::D2,
            TextureTarget::CubeMap => wgpu::TextureViewDimension::Cube,
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(dimension),
            ..Default::default()
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: self.texture_layout(target),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = GpuTextureHandle(self.next_handle());
        self.textures.insert(handle, GpuTexture { target, bind_group });
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: GpuTextureHandle) {
        self.textures.remove(&texture);
        self.texture_units.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, unit: u32, _target: TextureTarget, texture: GpuTextureHandle) {
        self.texture_units.insert(unit, texture);
    }

    fn create_vertex_array(&mut self, vertices: &[Vertex], indices: &[u32]) -> RenderResult<VertexArrayHandle> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::Device(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let handle = VertexArrayHandle(self.next_handle());
        self.vertex_arrays.insert(
            handle,
            GpuVertexArray {
                vertices: vertex_buffer,
                indices: index_buffer,
            },
        );
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.vertex_arrays.remove(&vertex_array);
        if self.current_vertex_array == Some(vertex_array) {
            self.current_vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.current_vertex_array = Some(vertex_array);
    }

    fn draw_elements(&mut self, index_count: u32) {
        let (Some(program), Some(vertex_array)) = (self.current_program, self.current_vertex_array) else {
            log::warn!("draw_elements without a program and vertex array bound");
            return;
        };
        let Some(entry) = self.programs.get(&program) else {
            return;
        };

        let texture = self.texture_units.get(&0).copied();
        let target = texture.and_then(|t| self.textures.get(&t)).map(|t| t.target);
        let mode = if self.line_mode_supported {
            self.polygon_mode
        } else {
            PolygonMode::Fill
        };
        self.frame.push(DrawCall {
            program,
            vertex_array,
            texture,
            key: (mode, target),
            index_count,
            uniforms: uniform_block(&entry.transforms),
        });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.frame.clear();
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if mode == PolygonMode::Line && !self.line_mode_supported && self.polygon_mode != mode {
            log::warn!("Adapter has no wireframe support; drawing filled");
        }
        self.polygon_mode = mode;
    }

    fn set_vsync(&mut self, enabled: bool) {
        let mode = present_mode(enabled);
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.reconfigure();
        }
    }

    fn present(&mut self) -> RenderResult<()> {
        let draws = std::mem::take(&mut self.frame);
        for draw in &draws {
            self.ensure_pipeline(draw.program, draw.key)?;
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface out of date; reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the next surface texture");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Device(e.to_string())),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let stride = usize::try_from(self.uniform_stride).map_err(|e| RenderError::Device(e.to_string()))?;
        let mut uniform_bytes = vec![0u8; stride * draws.len().max(1)];
        for (i, draw) in draws.iter().enumerate() {
            let bytes: &[u8] = bytemuck::cast_slice(&draw.uniforms);
            uniform_bytes[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Transforms"),
            contents: &uniform_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Transforms"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_BYTES),
                }),
            }],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        {
            let [r, g, b, a] = self.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (i, draw) in draws.iter().enumerate() {
                let pipeline = self.programs.get(&draw.program).and_then(|p| p.pipelines.get(&draw.key));
                let (Some(pipeline), Some(buffers)) = (pipeline, self.vertex_arrays.get(&draw.vertex_array)) else {
                    continue;
                };
                let offset = u32::try_from(i as u64 * self.uniform_stride)
                    .map_err(|e| RenderError::Device(e.to_string()))?;

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &uniform_group, &[offset]);
                if draw.key.1.is_some() {
                    if let Some(texture) = draw.texture.and_then(|t| self.textures.get(&t)) {
                        pass.set_bind_group(1, &texture.bind_group, &[]);
                    }
                }
                pass.set_vertex_buffer(0, buffers.vertices.slice(..));
                pass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn info(&self) -> Vec<(String, String)> {
        vec![
            ("Adapter".to_string(), self.adapter.name.clone()),
            ("Backend".to_string(), format!("{:?}", self.adapter.backend)),
            ("Driver".to_string(), format!("{} {}", self.adapter.driver, self.adapter.driver_info)),
        ]
    }
}

#[allow(unsafe_code)]
fn create_surface(instance: &wgpu::Instance, window: &glfw::PWindow) -> RenderResult<wgpu::Surface<'static>> {
    // SAFETY: `WgpuDevice` holds a reference to the window and drops it only
    // after the surface.
    unsafe {
        let target =
            wgpu::SurfaceTargetUnsafe::from_window(window).map_err(|e| RenderError::Device(e.to_string()))?;
        instance
            .create_surface_unsafe(target)
            .map_err(|e| RenderError::Device(e.to_string()))
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn texture_layout(device: &wgpu::Device, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Texture Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: dimension,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

const fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

const fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        size
    } else {
        size.div_ceil(alignment) * alignment
    }
}

/// Maps OpenGL clip depth (-1..1) onto wgpu's (0..1)
fn depth_remap() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.5, 0.5, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// `Transforms` block contents: column-major model, view, projection
fn uniform_block(transforms: &Transforms) -> [f32; UNIFORM_FLOATS] {
    let projection = depth_remap() * transforms.projection;
    let mut block = [0.0; UNIFORM_FLOATS];
    block[..16].copy_from_slice(transforms.model.as_slice());
    block[16..32].copy_from_slice(transforms.view.as_slice());
    block[32..].copy_from_slice(projection.as_slice());
    block
}

/// Common size of the faces; a cubemap needs six equal square faces
fn face_extent(target: TextureTarget, faces: &[TextureUpload<'_>]) -> RenderResult<(u32, u32)> {
    let expected = match target {
        TextureTarget::Texture2D => 1,
        TextureTarget::CubeMap => 6,
    };
    let Some(first) = faces.first().filter(|_| faces.len() == expected) else {
        return Err(RenderError::InvalidTexture(format!(
            "{target:?} needs {expected} images, got {}",
            faces.len()
        )));
    };

    let size = (first.image.width, first.image.height);
    if size.0 == 0 || size.1 == 0 {
        return Err(RenderError::InvalidTexture("empty image".to_string()));
    }
    if faces.iter().any(|f| (f.image.width, f.image.height) != size) {
        return Err(RenderError::InvalidTexture("faces differ in size".to_string()));
    }
    if target == TextureTarget::CubeMap && size.0 != size.1 {
        return Err(RenderError::InvalidTexture(format!(
            "cubemap faces must be square, got {}x{}",
            size.0, size.1
        )));
    }
    Ok(size)
}

/// Pixels as tightly packed RGBA8
fn rgba_pixels(upload: &TextureUpload<'_>) -> RenderResult<Vec<u8>> {
    let image = upload.image;
    let channels = match upload.format {
        PixelFormat::Rgb => 3,
        PixelFormat::Rgba => 4,
    };
    let expected = image.width as usize * image.height as usize * channels;
    if image.data.len() != expected {
        return Err(RenderError::InvalidTexture(format!(
            "{}x{} {:?} image carries {} bytes",
            image.width,
            image.height,
            upload.format,
            image.data.len()
        )));
    }

    Ok(match upload.format {
        PixelFormat::Rgba => image.data.clone(),
        PixelFormat::Rgb => image
            .data
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;
    use crate::foundation::math::{Mat4Ext, Vec4};
    use approx::assert_relative_eq;

    fn image(width: u32, height: u32, channels: u8) -> ImageData {
        ImageData {
            data: vec![7; (width * height) as usize * usize::from(channels)],
            width,
            height,
            channels,
        }
    }

    #[test]
    fn test_uniform_stride_respects_alignment() {
        assert_eq!(UNIFORM_BYTES, 192);
        assert_eq!(align_to(UNIFORM_BYTES, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(UNIFORM_BYTES, 0), UNIFORM_BYTES);
    }

    #[test]
    fn test_projection_depth_lands_in_zero_to_one() {
        let transforms = Transforms {
            projection: Mat4::perspective(1.0, 1.0, 0.5, 50.0),
            ..Transforms::default()
        };
        let block = uniform_block(&transforms);
        let projection = Mat4::from_column_slice(&block[32..]);

        let near = projection * Vec4::new(0.0, 0.0, -0.5, 1.0);
        let far = projection * Vec4::new(0.0, 0.0, -50.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_uniform_block_is_column_major() {
        let mut model = Mat4::identity();
        model[(0, 3)] = 4.0;
        let transforms = Transforms {
            model,
            ..Transforms::default()
        };
        let block = uniform_block(&transforms);
        // Translation sits in the fourth column
        assert_eq!(block[12], 4.0);
        assert_eq!(&block[16..32], Mat4::identity().as_slice());
    }

    #[test]
    fn test_rgb_expands_to_opaque_rgba() {
        let rgb = ImageData {
            data: vec![1, 2, 3, 4, 5, 6],
            width: 2,
            height: 1,
            channels: 3,
        };
        let pixels = rgba_pixels(&TextureUpload {
            image: &rgb,
            format: PixelFormat::Rgb,
        })
        .unwrap();
        assert_eq!(pixels, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_short_pixel_data_rejected() {
        let mut short = image(2, 2, 4);
        short.data.pop();
        let result = rgba_pixels(&TextureUpload {
            image: &short,
            format: PixelFormat::Rgba,
        });
        assert!(matches!(result, Err(RenderError::InvalidTexture(_))));
    }

    #[test]
    fn test_cubemap_faces_must_match_and_be_square() {
        let square = image(4, 4, 3);
        let wide = image(8, 4, 3);
        let upload = |image| TextureUpload {
            image,
            format: PixelFormat::Rgb,
        };

        let six: Vec<_> = (0..6).map(|_| upload(&square)).collect();
        assert_eq!(face_extent(TextureTarget::CubeMap, &six).unwrap(), (4, 4));

        let mut mixed = six.clone();
        mixed[3] = upload(&wide);
        assert!(face_extent(TextureTarget::CubeMap, &mixed).is_err());

        let all_wide: Vec<_> = (0..6).map(|_| upload(&wide)).collect();
        assert!(face_extent(TextureTarget::CubeMap, &all_wide).is_err());
        assert!(face_extent(TextureTarget::CubeMap, &six[..5]).is_err());
        assert_eq!(face_extent(TextureTarget::Texture2D, &[upload(&wide)]).unwrap(), (8, 4));
    }
}
