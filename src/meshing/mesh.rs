/// Mesh data structures handed to the external renderer and collider
use glam::{IVec3, Vec2, Vec3};

/// Axis-aligned face direction. The variant order is the mesher's sweep
/// order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceDir {
    PosY,
    NegY,
    PosX,
    NegX,
    PosZ,
    NegZ,
}

impl FaceDir {
    pub const ALL: [FaceDir; 6] = [
        FaceDir::PosY,
        FaceDir::NegY,
        FaceDir::PosX,
        FaceDir::NegX,
        FaceDir::PosZ,
        FaceDir::NegZ,
    ];

    /// Index of the primary axis (0 = X, 1 = Y, 2 = Z).
    #[inline]
    pub const fn axis(self) -> usize {
        match self {
            FaceDir::PosX | FaceDir::NegX => 0,
            FaceDir::PosY | FaceDir::NegY => 1,
            FaceDir::PosZ | FaceDir::NegZ => 2,
        }
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, FaceDir::PosX | FaceDir::PosY | FaceDir::PosZ)
    }

    /// Unit step from a voxel to its across-face neighbor.
    #[inline]
    pub const fn offset(self) -> IVec3 {
        match self {
            FaceDir::PosX => IVec3::new(1, 0, 0),
            FaceDir::NegX => IVec3::new(-1, 0, 0),
            FaceDir::PosY => IVec3::new(0, 1, 0),
            FaceDir::NegY => IVec3::new(0, -1, 0),
            FaceDir::PosZ => IVec3::new(0, 0, 1),
            FaceDir::NegZ => IVec3::new(0, 0, -1),
        }
    }

    #[inline]
    pub const fn normal(self) -> Vec3 {
        match self {
            FaceDir::PosX => Vec3::X,
            FaceDir::NegX => Vec3::NEG_X,
            FaceDir::PosY => Vec3::Y,
            FaceDir::NegY => Vec3::NEG_Y,
            FaceDir::PosZ => Vec3::Z,
            FaceDir::NegZ => Vec3::NEG_Z,
        }
    }

    /// Tangent axis indices `(u, v)` spanning the face plane, chosen so
    /// that `e_u x e_v` equals the face normal. With the fixed corner
    /// order `(0,0) (w,0) (w,h) (0,h)` and index pattern `0,1,2 / 0,2,3`
    /// this makes every emitted triangle wind outward.
    #[inline]
    pub const fn tangent_axes(self) -> (usize, usize) {
        match self {
            FaceDir::PosX => (1, 2),
            FaceDir::NegX => (2, 1),
            FaceDir::PosY => (2, 0),
            FaceDir::NegY => (0, 2),
            FaceDir::PosZ => (0, 1),
            FaceDir::NegZ => (1, 0),
        }
    }
}

/// Triangle mesh as five parallel per-vertex arrays plus an index list.
/// Positions are chunk-local; the chunk's world origin is a plain
/// translation applied by the renderer at submit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<[u8; 4]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Append one rectangular face: four vertices, two triangles
    /// (`0,1,2` and `0,2,3`). UV magnitudes are the quad's tangent sizes
    /// so a tiled texture repeats once per block.
    pub fn add_quad(&mut self, corners: [Vec3; 4], normal: Vec3, width: f32, height: f32, color: [u8; 4]) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.normals.extend_from_slice(&[normal; 4]);
        self.uvs.extend_from_slice(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(width, 0.0),
            Vec2::new(width, height),
            Vec2::new(0.0, height),
        ]);
        self.colors.extend_from_slice(&[color; 4]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Triangles with positions dereferenced through the index list.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

/// Concave triangle soup handed to the external collider. No
/// simplification is performed beyond the greedy merge already present in
/// the render mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionSurface {
    pub triangles: Vec<[Vec3; 3]>,
}

impl CollisionSurface {
    pub fn from_mesh(mesh: &MeshData) -> Self {
        Self {
            triangles: mesh.triangles().collect(),
        }
    }
}
