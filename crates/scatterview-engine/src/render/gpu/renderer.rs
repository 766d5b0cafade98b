use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::annotation::AxisLabel;
use crate::config::GpuInit;
use crate::coords::Viewport;
use crate::pipeline::FrameState;
use crate::render::{DrawTarget, RenderStates, Renderer};
use crate::vertex::{BufferUsage, PrimitiveType, Vertex, VertexBuffer};

use super::GpuContext;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    transform: [[f32; 4]; 4],
}

/// Offscreen texture plus its readback buffer.
struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    viewport: Viewport,
    padded_bytes_per_row: u32,
}

/// Device-side copy of a `Dynamic` or `Static` vertex buffer.
struct CachedVertices {
    revision: u64,
    buffer: wgpu::Buffer,
    topology: wgpu::PrimitiveTopology,
    /// Vertices currently uploaded (after primitive expansion).
    len: u32,
    /// Vertices the device buffer can hold.
    capacity: u32,
    /// Drawn during the current frame.
    used: bool,
}

/// Headless wgpu renderer.
///
/// Each draw is recorded as its own render pass on the frame encoder;
/// `finalize` submits, copies the texture out and waits for the map.
/// `Stream` vertex buffers are uploaded per draw. `Dynamic` and `Static`
/// ones stay on the device until a frame finishes without drawing them.
pub struct WgpuRenderer {
    ctx: GpuContext,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<wgpu::PrimitiveTopology, wgpu::RenderPipeline>,
    cached: HashMap<u64, CachedVertices>,

    target: Option<Target>,
    encoder: Option<wgpu::CommandEncoder>,
    pixels: Vec<u8>,
    has_pixels: bool,
    released: bool,
    warned_outside_frame: bool,
}

impl WgpuRenderer {
    /// Creates the device and shared pipeline state. Call on the GPU thread.
    pub fn new(init: &GpuInit) -> Result<Self> {
        let ctx = GpuContext::new(init)?;
        let device = ctx.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scatterview shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scatter.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scatterview bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scatterview pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Ok(Self {
            ctx,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            cached: HashMap::new(),
            target: None,
            encoder: None,
            pixels: Vec::new(),
            has_pixels: false,
            released: false,
            warned_outside_frame: false,
        })
    }

    #[inline]
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    fn ensure_pipeline(&mut self, topology: wgpu::PrimitiveTopology) {
        if self.pipelines.contains_key(&topology) {
            return;
        }
        let pipeline = self.ctx.device().create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scatterview pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(topology, pipeline);
    }

    fn in_frame(&mut self) -> bool {
        if self.encoder.is_some() && self.target.is_some() {
            return true;
        }
        if !self.warned_outside_frame {
            log::warn!("draw called outside a frame; ignored");
            self.warned_outside_frame = true;
        }
        false
    }

    fn record(&mut self, kind: PrimitiveType, vertices: &[Vertex], states: &RenderStates) {
        let vertices = kind.expand(vertices);
        if vertices.is_empty() || !self.in_frame() {
            return;
        }
        let vbo = self.ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scatterview vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.encode(kind.topology(), &vbo, vertices.len() as u32, states);
    }

    /// Draws a `Dynamic`/`Static` buffer from its device copy, uploading
    /// first if the copy is missing or out of date.
    fn record_cached(&mut self, buffer: &VertexBuffer, states: &RenderStates) {
        if buffer.is_empty() || !self.in_frame() {
            return;
        }
        let mut entry = match self.cached.remove(&buffer.id()) {
            Some(entry) if entry.revision == buffer.revision() => entry,
            stale => match self.upload(buffer, stale) {
                Some(entry) => entry,
                None => return,
            },
        };
        entry.used = true;
        if entry.len > 0 {
            self.encode(entry.topology, &entry.buffer, entry.len, states);
        }
        self.cached.insert(buffer.id(), entry);
    }

    fn upload(&self, buffer: &VertexBuffer, previous: Option<CachedVertices>) -> Option<CachedVertices> {
        let kind = buffer.kind();
        let vertices = kind.expand(buffer.as_slice());
        let len = u32::try_from(vertices.len()).ok()?;
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);

        // Dynamic buffers are rewritten in place while they fit. Queue writes
        // land before the frame's passes run, so a copy already drawn this
        // frame is replaced instead.
        let in_place = |e: &CachedVertices| buffer.usage() == BufferUsage::Dynamic && !e.used && len <= e.capacity;
        if let Some(mut entry) = previous.filter(in_place) {
            if !bytes.is_empty() {
                self.ctx.queue().write_buffer(&entry.buffer, 0, bytes);
            }
            entry.revision = buffer.revision();
            entry.topology = kind.topology();
            entry.len = len;
            return Some(entry);
        }

        let mut usage = wgpu::BufferUsages::VERTEX;
        if buffer.usage() == BufferUsage::Dynamic {
            usage |= wgpu::BufferUsages::COPY_DST;
        }
        let device_buffer = self.ctx.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scatterview cached vbo"),
            contents: bytes,
            usage,
        });
        log::trace!("uploaded vertex buffer {} ({len} vertices)", buffer.id());
        Some(CachedVertices {
            revision: buffer.revision(),
            buffer: device_buffer,
            topology: kind.topology(),
            len,
            capacity: len,
            used: false,
        })
    }

    /// Records one render pass drawing `count` vertices from `vbo`.
    fn encode(
        &mut self,
        topology: wgpu::PrimitiveTopology,
        vbo: &wgpu::Buffer,
        count: u32,
        states: &RenderStates,
    ) {
        self.ensure_pipeline(topology);

        let device = self.ctx.device();
        let uniform = DrawUniform { transform: states.transform.to_cols_array_2d() };
        let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scatterview draw ubo"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scatterview draw bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }],
        });

        let (Some(encoder), Some(target), Some(pipeline)) =
            (self.encoder.as_mut(), self.target.as_ref(), self.pipelines.get(&topology))
        else {
            return;
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scatterview draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..count, 0..1);
    }

    fn clear(&mut self, color: wgpu::Color) {
        let (Some(encoder), Some(target)) = (self.encoder.as_mut(), self.target.as_ref()) else {
            return;
        };
        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scatterview clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(color), store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn read_back(&mut self) -> Result<()> {
        let target = self.target.as_ref().ok_or_else(|| anyhow!("no render target"))?;
        let Viewport { width, height } = target.viewport;

        let slice = target.readback.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.ctx
            .device()
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed")?;
        pollster::block_on(rx)
            .context("readback map callback dropped")?
            .context("failed to map readback buffer")?;

        let row = width as usize * 4;
        self.pixels.clear();
        self.pixels.reserve(row * height as usize);
        {
            let data = slice.get_mapped_range();
            for y in 0..height as usize {
                let start = y * target.padded_bytes_per_row as usize;
                self.pixels.extend_from_slice(&data[start..start + row]);
            }
        }
        target.readback.unmap();
        Ok(())
    }
}

impl DrawTarget for WgpuRenderer {
    fn draw_vertices(&mut self, kind: PrimitiveType, vertices: &[Vertex], states: &RenderStates) {
        self.record(kind, vertices, states);
    }

    fn draw_buffer(&mut self, buffer: &VertexBuffer, states: &RenderStates) {
        match buffer.usage() {
            BufferUsage::Stream => self.record(buffer.kind(), buffer.as_slice(), states),
            BufferUsage::Dynamic | BufferUsage::Static => self.record_cached(buffer, states),
        }
    }
}

impl Renderer for WgpuRenderer {
    fn create_target(&mut self, viewport: Viewport, is_3d: bool) -> Result<()> {
        anyhow::ensure!(!self.released, "renderer was released");
        anyhow::ensure!(viewport.is_valid(), "target has zero size");

        let device = self.ctx.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scatterview target"),
            size: wgpu::Extent3d {
                width: viewport.width,
                height: viewport.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded = viewport.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded.div_ceil(align) * align;

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scatterview readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(viewport.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!(
            "render target {}x{} ({})",
            viewport.width,
            viewport.height,
            if is_3d { "3d" } else { "2d" }
        );

        self.target = Some(Target { texture, view, readback, viewport, padded_bytes_per_row });
        self.encoder = None;
        self.has_pixels = false;
        Ok(())
    }

    fn draw(&mut self, frame: &FrameState) -> Result<()> {
        let target = self.target.as_ref().ok_or_else(|| anyhow!("no render target"))?;
        anyhow::ensure!(
            target.viewport == frame.viewport,
            "frame is {}x{} but target is {}x{}",
            frame.viewport.width,
            frame.viewport.height,
            target.viewport.width,
            target.viewport.height
        );

        self.has_pixels = false;
        self.encoder = Some(self.ctx.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scatterview frame encoder"),
        }));
        self.clear(frame.background.into());

        let grid_states = RenderStates::grid_space(frame);
        if frame.is_3d {
            let (kind, lines) = frame.grid.box_vertices();
            self.record(kind, &lines, &grid_states);
            // Marker positions are already transformed into box space.
            let (kind, markers) = frame.markers.vertices(&frame.transform);
            self.record(kind, &markers, &grid_states);
        } else {
            let (kind, lines) = frame.grid.line_vertices();
            self.record(kind, &lines, &grid_states);
        }
        Ok(())
    }

    fn target(&mut self) -> &mut dyn DrawTarget {
        self
    }

    fn draw_annotation(&mut self, frame: &FrameState, labels: &[AxisLabel]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let states = RenderStates::overlay_space(frame);
        let color = frame.annotation.color.to_array();
        let r = frame.annotation.font_size / 2.0;
        let mut ticks = Vec::with_capacity(labels.len() * 4);
        for label in labels {
            let [x, y] = label.anchor;
            ticks.push(Vertex::new([x - r, y, 0.0], color));
            ticks.push(Vertex::new([x + r, y, 0.0], color));
            ticks.push(Vertex::new([x, y - r, 0.0], color));
            ticks.push(Vertex::new([x, y + r, 0.0], color));
        }
        self.record(PrimitiveType::Lines, &ticks, &states);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let mut encoder = self.encoder.take().ok_or_else(|| anyhow!("finalize without draw"))?;
        let target = self.target.as_ref().ok_or_else(|| anyhow!("no render target"))?;

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(target.padded_bytes_per_row),
                    rows_per_image: Some(target.viewport.height),
                },
            },
            wgpu::Extent3d {
                width: target.viewport.width,
                height: target.viewport.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue().submit(std::iter::once(encoder.finish()));

        // Drop device copies of buffers this frame did not draw.
        self.cached.retain(|_, entry| std::mem::replace(&mut entry.used, false));

        self.read_back()?;
        self.has_pixels = true;
        Ok(())
    }

    fn pixels(&self) -> Option<&[u8]> {
        self.has_pixels.then_some(self.pixels.as_slice())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.encoder = None;
        self.target = None;
        self.pipelines.clear();
        self.cached.clear();
        self.pixels = Vec::new();
        self.has_pixels = false;
        log::debug!("wgpu renderer released");
    }
}
