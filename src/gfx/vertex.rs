//! # Vertex Layout
//!
//! GPU vertex format for asset meshes: position plus normal, matching
//! locations 0 and 1 in `shader.wgsl`.

use crate::asset::MeshData;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
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
            ],
        }
    }

    /// Interleaves a mesh's attributes. Missing normals are recomputed from
    /// the triangle list.
    pub fn from_mesh(mesh: &MeshData) -> Vec<Vertex> {
        let computed;
        let normals = if mesh.normals.len() == mesh.positions.len() {
            &mesh.normals
        } else {
            computed = MeshData::calculate_vertex_normals(&mesh.positions, &mesh.indices);
            &computed
        };
        mesh.positions
            .iter()
            .zip(normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mesh_fills_missing_normals() {
        let mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2],
            [1.0; 4],
        );
        let vertices = Vertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), 3);
        for v in vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_layout_stride_matches_struct() {
        assert_eq!(Vertex::desc().array_stride, 24);
    }
}
