//! Rendering system with wgpu pipeline, depth buffer and one viewport per eye.

use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::frame::EyeRender;
use crate::params::RenderConfig;
use crate::scene::{Scene, Vertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Direction the light travels (world space)
const LIGHT_DIRECTION: Vec3 = Vec3::new(-0.4, -1.0, -0.3);

/// Fraction of the base color visible in full shadow
const AMBIENT: f32 = 0.35;

/// Errors raised while setting up the renderer
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface supports no texture formats")]
    NoSurfaceFormat,
}

/// Uniform buffer for one eye (view-projection matrix + lighting)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct EyeUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub eye_pos: [f32; 4],
    /// xyz: light direction, w: ambient level
    pub light: [f32; 4],
}

impl EyeUniforms {
    pub fn new(eye: &EyeRender) -> Self {
        Self {
            view_proj: eye.view_projection().to_cols_array_2d(),
            eye_pos: eye.position.extend(1.0).to_array(),
            light: LIGHT_DIRECTION.normalize().extend(AMBIENT).to_array(),
        }
    }
}

/// Pixel rectangle of one eye inside the window (x, y, width, height)
///
/// The left eye gets the left half; an odd pixel column goes to the right eye.
pub fn eye_viewport(eye_index: usize, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let half = width / 2;
    match eye_index {
        0 => (0, 0, half, height),
        _ => (half, 0, width - half, height),
    }
}

/// Rendering system managing wgpu device, pipeline, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    /// Per-object translation offsets, one instance each
    instance_buffer: wgpu::Buffer,
    eye_buffers: [wgpu::Buffer; 2],
    eye_bind_groups: [wgpu::BindGroup; 2],
    depth_view: wgpu::TextureView,
    /// Index range of every object, by object index
    object_ranges: Vec<Range<u32>>,
    clear_color: wgpu::Color,
}

impl RenderSystem {
    /// Create new rendering system for `scene`
    pub async fn new(
        window: Arc<winit::window::Window>,
        scene: &Scene,
        render_config: &RenderConfig,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::info!("GPU: {}", adapter.get_info().name);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: render_config.max_frame_latency,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Room Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("room.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&scene.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&scene.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let offsets = object_offsets(scene.positions());
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Offset Buffer"),
            contents: bytemuck::cast_slice(&offsets),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Eye Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let eye_buffers = ["Left Eye Uniforms", "Right Eye Uniforms"].map(|label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<EyeUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let eye_bind_groups = [0, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Eye Bind Group"),
                layout: &uniform_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: eye_buffers[i].as_entire_binding(),
                }],
            })
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Room Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                            wgpu::VertexAttribute {
                                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                            wgpu::VertexAttribute {
                                offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 3,
                            format: wgpu::VertexFormat::Float32x4,
                        }],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
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
        });

        let depth_view = create_depth_view(&device, &config);

        let [r, g, b, a] = render_config.clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            eye_buffers,
            eye_bind_groups,
            depth_view,
            object_ranges: scene.objects().iter().map(|o| o.indices.clone()).collect(),
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    /// Upload the object position table
    pub fn update_object_positions(&self, positions: &[Vec3]) {
        let offsets = object_offsets(positions);
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&offsets));
    }

    /// Reconfigure the surface and depth buffer for a new window size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    /// Current surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Draw the room once per eye, side by side, and present
    pub fn render(&self, eyes: &[EyeRender; 2]) -> Result<(), wgpu::SurfaceError> {
        for (buffer, eye) in self.eye_buffers.iter().zip(eyes) {
            self.queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(&[EyeUniforms::new(eye)]));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Room Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for (eye_index, bind_group) in self.eye_bind_groups.iter().enumerate() {
                let (x, y, w, h) = eye_viewport(eye_index, self.config.width, self.config.height);
                render_pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
                render_pass.set_scissor_rect(x, y, w, h);
                render_pass.set_bind_group(0, bind_group, &[]);

                for (object, indices) in self.object_ranges.iter().enumerate() {
                    if indices.is_empty() {
                        continue;
                    }
                    let instance = object as u32;
                    render_pass.draw_indexed(indices.clone(), 0, instance..instance + 1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Position table as instance data
fn object_offsets(positions: &[Vec3]) -> Vec<[f32; 4]> {
    positions.iter().map(|p| p.extend(0.0).to_array()).collect()
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
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

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::hmd::Eye;

    #[test]
    fn test_eye_viewports_split_window() {
        assert_eq!(eye_viewport(0, 1920, 1080), (0, 0, 960, 1080));
        assert_eq!(eye_viewport(1, 1920, 1080), (960, 0, 960, 1080));

        // Odd width: right eye takes the extra column
        assert_eq!(eye_viewport(1, 1921, 1080), (960, 0, 961, 1080));
    }

    #[test]
    fn test_uniforms_layout() {
        // mat4 + two vec4, no padding needed for WGSL uniform layout
        assert_eq!(std::mem::size_of::<EyeUniforms>(), 96);
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }

    #[test]
    fn test_eye_uniforms_from_render() {
        let eye = EyeRender {
            eye: Eye::Left,
            position: Vec3::new(1.0, 2.0, 3.0),
            view: Mat4::IDENTITY,
            projection: Mat4::from_scale(Vec3::splat(2.0)),
        };
        let uniforms = EyeUniforms::new(&eye);
        assert_eq!(uniforms.eye_pos, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniforms.view_proj[0][0], 2.0);
        assert_eq!(uniforms.light[3], AMBIENT);
    }

    #[test]
    fn test_object_offsets_pad_to_vec4() {
        let offsets = object_offsets(&[Vec3::new(0.0, -10.0, 0.0), Vec3::ZERO]);
        assert_eq!(offsets, vec![[0.0, -10.0, 0.0, 0.0], [0.0; 4]]);
    }
}
