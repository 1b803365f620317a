/// Voxel World - streaming voxel world engine
/// Sparse paged chunk grid, greedy meshing, run-length persistence
pub mod coords;
pub mod error;
pub mod events;
pub mod meshing;
pub mod persistence;
pub mod voxel;
pub mod world;

pub use error::WorldError;
pub use events::WorldEvent;
pub use meshing::{
    default_block_color, BlockColorFn, BlockView, CollisionSurface, FaceDir, GreedyMesher, MeshData,
};
pub use persistence::ChunkStore;
pub use voxel::{Block, Chunk, ChunkDataError};
pub use world::{BlockWrite, World, WorldConfig};
