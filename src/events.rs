/// Notifications emitted by the world. The host drains them once per tick;
/// they are queued in emission order.
use crate::voxel::Block;
use glam::IVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A chunk is resident and has produced its initial mesh.
    ChunkLoaded { position: IVec3 },
    /// A chunk is no longer resident.
    ChunkUnloaded { position: IVec3 },
    /// The cell at a world position now holds the given id.
    BlockModified { position: IVec3, id: Block },
    /// Persistence of a chunk completed.
    ChunkSaved { position: IVec3 },
    /// A chunk mesh was rebuilt, initial or subsequent.
    ChunkMeshGenerated { position: IVec3 },
}
