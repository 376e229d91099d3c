//! Mesh geometry and GPU meshes
//!
//! [`MeshData`] is plain geometry on the CPU side. [`Mesh`] is the uploaded
//! form: a device vertex array, its index count and the textures it samples.
//! A mesh is immutable once created; its vertex array is released through
//! [`Mesh::release`] when the owning component is destroyed.

use bytemuck::{Pod, Zeroable};

use crate::render::device::{GraphicsDevice, ProgramHandle, RenderError, RenderResult, VertexArrayHandle};
use crate::render::texture_manager::{TextureId, TextureManager};

/// Vertex layout shared by every mesh: position, normal, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Number of floats per vertex in the interleaved buffer
    pub const FLOATS: usize = 8;

    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// How a mesh samples a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRole {
    /// Surface color, bound to `diffuse{n}`
    Diffuse,
    /// Environment cubemap, bound to `skybox`
    Skybox,
}

/// Texture binding on a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTexture {
    /// Texture to bind
    pub texture: TextureId,
    /// Sampler it feeds
    pub role: TextureRole,
}

impl MeshTexture {
    /// Create a binding
    pub const fn new(texture: TextureId, role: TextureRole) -> Self {
        Self { texture, role }
    }
}

/// CPU-side geometry
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create geometry from vertices and triangle indices
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit cube centered at the origin, faces wound to be seen from outside
    ///
    /// Each face has its own four vertices so normals and texture coordinates
    /// stay per-face: 24 vertices, 36 indices.
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face; corners are n ± u ± v
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv, uv) in [(-1.0, -1.0, [0.0, 0.0]), (1.0, -1.0, [1.0, 0.0]), (1.0, 1.0, [1.0, 1.0]), (-1.0, 1.0, [0.0, 1.0])] {
                let position = [
                    n[0] + su * u[0] + sv * v[0],
                    n[1] + su * u[1] + sv * v[1],
                    n[2] + su * u[2] + sv * v[2],
                ];
                vertices.push(Vertex::new(position, n, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self { vertices, indices }
    }

    /// Cube seen from the inside, for sky boxes
    pub fn skybox() -> Self {
        let mut data = Self::cube();
        for triangle in data.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
        for vertex in &mut data.vertices {
            vertex.normal = vertex.normal.map(|c| -c);
        }
        data
    }
}

/// Indices per draw call; a draw takes a 32-bit count
fn index_count(len: usize) -> RenderResult<u32> {
    u32::try_from(len).map_err(|_| RenderError::TooManyIndices(len))
}

/// Geometry uploaded to the device
#[derive(Debug, PartialEq)]
pub struct Mesh {
    vertex_array: VertexArrayHandle,
    index_count: u32,
    textures: Vec<MeshTexture>,
}

impl Mesh {
    /// Upload geometry and remember its texture bindings
    pub fn new(device: &mut dyn GraphicsDevice, data: &MeshData, textures: Vec<MeshTexture>) -> RenderResult<Self> {
        let index_count = index_count(data.indices.len())?;
        let vertex_array = device.create_vertex_array(&data.vertices, &data.indices)?;
        log::trace!("Created mesh {:?} ({} indices)", vertex_array, index_count);
        Ok(Self {
            vertex_array,
            index_count,
            textures,
        })
    }

    /// Bind textures and the vertex array, then draw with `program`
    ///
    /// The program must already be current.
    pub fn draw(&self, device: &mut dyn GraphicsDevice, textures: &TextureManager, program: ProgramHandle) -> RenderResult<()> {
        let mut diffuse = 0;
        for (unit, binding) in self.textures.iter().enumerate() {
            let texture = textures.texture(binding.texture)?;
            let unit = unit as u32;
            let sampler = match binding.role {
                TextureRole::Diffuse => {
                    diffuse += 1;
                    format!("diffuse{}", diffuse - 1)
                }
                TextureRole::Skybox => "skybox".to_string(),
            };
            device.set_uniform_i32(program, &sampler, unit as i32);
            device.bind_texture(unit, texture.target(), texture.handle());
        }

        device.bind_vertex_array(self.vertex_array);
        device.draw_elements(self.index_count);
        Ok(())
    }

    /// Free the vertex array
    pub fn release(&self, device: &mut dyn GraphicsDevice) {
        device.delete_vertex_array(self.vertex_array);
    }

    /// Device vertex array
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    /// Number of indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Texture bindings in unit order
    pub fn textures(&self) -> &[MeshTexture] {
        &self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn test_cube_corners_on_unit_box() {
        for vertex in MeshData::cube().vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn test_index_count_rejects_counts_past_u32() {
        assert_eq!(index_count(36).unwrap(), 36);
        assert_eq!(index_count(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            index_count(u32::MAX as usize + 1),
            Err(RenderError::TooManyIndices(n)) if n == u32::MAX as usize + 1
        ));
    }

    #[test]
    fn test_skybox_flips_winding() {
        let cube = MeshData::cube();
        let sky = MeshData::skybox();
        assert_eq!(cube.indices[0], sky.indices[0]);
        assert_eq!(cube.indices[1], sky.indices[2]);
        assert_eq!(cube.indices[2], sky.indices[1]);
        assert_eq!(sky.vertices[0].normal, [-1.0, 0.0, 0.0]);
    }
}
