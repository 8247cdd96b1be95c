//! # GPU Backend
//!
//! [`SceneBackend`] implementation drawing the attached asset with wgpu.
//!
//! Every mesh of a renderable node gets its own vertex/index buffers and a
//! node uniform (world matrix, normal matrix, RGBA). Setters only record
//! state; [`GpuBackend::render_frame`] uploads what changed and draws in two
//! passes over one render pass: opaque meshes with depth writes, then
//! translucent meshes back to front with alpha blending.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use explodeview::gfx::GpuBackend;
//! # async fn run(window: Arc<winit::window::Window>) -> Result<(), explodeview::ViewerError> {
//! let size = window.inner_size();
//! let mut backend = GpuBackend::new(window, size.width, size.height).await?;
//! backend.render_frame().ok();
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use cgmath::{EuclideanSpace, InnerSpace, Matrix, Matrix4, SquareMatrix};
use log::{debug, info};
use wgpu::util::DeviceExt;

use super::globals::{GlobalUniform, LightSetup};
use super::texture_resource::DepthTexture;
use super::vertex::Vertex;
use crate::asset::{LoadedAsset, NodeId};
use crate::backend::SceneBackend;
use crate::camera::CameraView;
use crate::config::LightRig;
use crate::error::ViewerError;
use crate::wgpu_utils::binding_types::uniform_entry;
use crate::wgpu_utils::UniformBuffer;

/// Alpha at or above which a mesh is drawn in the opaque pass.
const OPAQUE_ALPHA: f32 = 0.999;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.93,
    g: 0.94,
    b: 0.95,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    pub world: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl NodeUniform {
    pub fn new(world: Matrix4<f32>, color: [f32; 4]) -> Self {
        let normal_matrix = world.invert().map(|m| m.transpose()).unwrap_or(world);
        Self {
            world: world.into(),
            normal_matrix: normal_matrix.into(),
            color,
        }
    }
}

/// Last state the viewer pushed for a node.
#[derive(Debug, Clone, Copy)]
struct NodeState {
    world: Matrix4<f32>,
    opacity: Option<f32>,
    visible: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            world: Matrix4::identity(),
            opacity: None,
            visible: true,
        }
    }
}

struct GpuMesh {
    node: NodeId,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    base_color: [f32; 4],
    uniform: UniformBuffer<NodeUniform>,
    bind_group: wgpu::BindGroup,
}

/// One mesh as seen by the draw sorter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCandidate {
    pub alpha: f32,
    pub visible: bool,
    /// Squared distance from the eye to the mesh origin.
    pub depth: f32,
}

/// Splits candidates into opaque indices (in input order) and translucent
/// indices sorted far to near. Hidden and fully transparent meshes are
/// dropped.
pub fn draw_order(candidates: &[DrawCandidate]) -> (Vec<usize>, Vec<usize>) {
    let mut opaque = Vec::new();
    let mut blended = Vec::new();
    for (i, c) in candidates.iter().enumerate() {
        if !c.visible || c.alpha <= 0.0 {
            continue;
        }
        if c.alpha >= OPAQUE_ALPHA {
            opaque.push(i);
        } else {
            blended.push(i);
        }
    }
    blended.sort_by(|&a, &b| candidates[b].depth.total_cmp(&candidates[a].depth));
    (opaque, blended)
}

pub struct GpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,

    globals: UniformBuffer<GlobalUniform>,
    globals_bind_group: wgpu::BindGroup,
    node_layout: wgpu::BindGroupLayout,
    opaque_pipeline: wgpu::RenderPipeline,
    blended_pipeline: wgpu::RenderPipeline,

    meshes: Vec<GpuMesh>,
    nodes: HashMap<NodeId, NodeState>,
    camera: Option<CameraView>,
    exposure: f32,
    lighting: LightSetup,
}

impl GpuBackend {
    /// Creates the device and surface for `window` and builds both pipelines.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::Backend(format!("failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| ViewerError::Backend(format!("no suitable adapter: {e}")))?;
        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| ViewerError::Backend(format!("failed to request device: {e}")))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| ViewerError::Backend("surface reports no formats".into()))?;
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "depth_texture");

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[uniform_entry(0)],
        });
        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Layout"),
            entries: &[uniform_entry(0)],
        });

        let lighting = LightSetup::for_rig(LightRig::Studio, 1.0);
        let globals = UniformBuffer::new_with_data(
            &device,
            &GlobalUniform::new(None, 1.0, &lighting, 1.0),
        );
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals.binding_resource(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewer Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Viewer Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &node_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, format, "Opaque", false);
        let blended_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, format, "Blended", true);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            globals,
            globals_bind_group,
            node_layout,
            opaque_pipeline,
            blended_pipeline,
            meshes: Vec::new(),
            nodes: HashMap::new(),
            camera: None,
            exposure: 1.0,
            lighting,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = DepthTexture::new(&self.device, &self.config, "depth_texture");
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn node_state(&self, node: NodeId) -> NodeState {
        self.nodes.get(&node).copied().unwrap_or_default()
    }

    /// Uploads pending state and draws one frame.
    ///
    /// Surface loss is returned to the caller, which usually reconfigures
    /// via [`GpuBackend::resize`] and tries again next frame.
    pub fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let globals = GlobalUniform::new(
            self.camera.as_ref(),
            self.aspect(),
            &self.lighting,
            self.exposure,
        );
        self.globals.update_content(&self.queue, globals);

        let eye = self.camera.map(|c| c.eye);
        let mut candidates = Vec::with_capacity(self.meshes.len());
        for i in 0..self.meshes.len() {
            let state = self.node_state(self.meshes[i].node);
            let mesh = &mut self.meshes[i];
            let alpha = state.opacity.unwrap_or(mesh.base_color[3]);
            let color = [mesh.base_color[0], mesh.base_color[1], mesh.base_color[2], alpha];
            mesh.uniform
                .update_content(&self.queue, NodeUniform::new(state.world, color));

            let origin = state.world.w.truncate();
            let depth = eye.map_or(0.0, |e| (origin - e.to_vec()).magnitude2());
            candidates.push(DrawCandidate {
                alpha,
                visible: state.visible,
                depth,
            });
        }
        let (opaque, blended) = draw_order(&candidates);

        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

            for (pipeline, order) in [
                (&self.opaque_pipeline, &opaque),
                (&self.blended_pipeline, &blended),
            ] {
                if order.is_empty() {
                    continue;
                }
                render_pass.set_pipeline(pipeline);
                for &i in order {
                    let mesh = &self.meshes[i];
                    render_pass.set_bind_group(1, &mesh.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn upload_mesh(
        &self,
        node: NodeId,
        vertices: &[Vertex],
        indices: &[u32],
        base_color: [f32; 4],
    ) -> GpuMesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let uniform = UniformBuffer::new_with_data(
            &self.device,
            &NodeUniform::new(Matrix4::identity(), base_color),
        );
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Node Bind Group"),
            layout: &self.node_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.binding_resource(),
            }],
        });

        GpuMesh {
            node,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            base_color,
            uniform,
            bind_group,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    blended: bool,
) -> wgpu::RenderPipeline {
    let blend = if blended {
        Some(wgpu::BlendState::ALPHA_BLENDING)
    } else {
        Some(wgpu::BlendState::REPLACE)
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Exported assets are not reliably closed or consistently wound.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthTexture::FORMAT,
            depth_write_enabled: !blended,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl SceneBackend for GpuBackend {
    fn attach_asset(&mut self, asset: &LoadedAsset) -> Result<(), ViewerError> {
        let mut meshes = Vec::new();
        for (node, scene_node) in asset.graph.nodes().iter().enumerate() {
            for mesh in &scene_node.meshes {
                if mesh.positions.is_empty() || mesh.indices.is_empty() {
                    continue;
                }
                let vertex_count = mesh.positions.len();
                if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(ViewerError::Backend(format!(
                        "mesh on node '{}' references vertex {bad} of {}",
                        scene_node.name, vertex_count
                    )));
                }
                let vertices = Vertex::from_mesh(mesh);
                meshes.push(self.upload_mesh(node, &vertices, &mesh.indices, mesh.base_color));
            }
        }
        info!("uploaded {} meshes to the GPU", meshes.len());
        self.meshes = meshes;
        Ok(())
    }

    fn detach_asset(&mut self) {
        debug!("releasing {} GPU meshes", self.meshes.len());
        self.meshes.clear();
        self.nodes.clear();
    }

    fn set_camera(&mut self, view: &CameraView) {
        self.camera = Some(*view);
    }

    fn set_node_transform(&mut self, node: NodeId, world: Matrix4<f32>) {
        self.nodes.entry(node).or_default().world = world;
    }

    fn set_node_opacity(&mut self, node: NodeId, opacity: f32) {
        self.nodes.entry(node).or_default().opacity = Some(opacity.clamp(0.0, 1.0));
    }

    fn set_node_visible(&mut self, node: NodeId, visible: bool) {
        self.nodes.entry(node).or_default().visible = visible;
    }

    fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    fn set_lighting(&mut self, light_rig: LightRig, environment_intensity: f32) {
        self.lighting = LightSetup::for_rig(light_rig, environment_intensity);
    }
}
