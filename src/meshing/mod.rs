/// Meshing algorithms for converting voxel data to renderable geometry
pub mod greedy;
pub mod mesh;

pub use greedy::{default_block_color, BlockColorFn, BlockView, GreedyMesher};
pub use mesh::{CollisionSurface, FaceDir, MeshData};
