/// Chunk data structure: a dense box of block ids plus the bookkeeping that
/// ties it to meshing and persistence.
use super::rle::{self, RleError};
use super::Block;
use crate::meshing::{CollisionSurface, MeshData};
use glam::IVec3;
use std::fmt;

/// Serialized header: position then size, six little-endian i32 fields.
pub const HEADER_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkDataError {
    /// Serialized form is shorter than the fixed header.
    TruncatedHeader,
    /// Header position or size disagrees with the receiving chunk.
    HeaderMismatch {
        expected: (IVec3, IVec3),
        found: (IVec3, IVec3),
    },
    /// Run-length payload failed to decode; the block array was zero-filled.
    Payload(RleError),
    /// `bulk_replace` input does not cover the whole block array.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for ChunkDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkDataError::TruncatedHeader => write!(f, "chunk data shorter than header"),
            ChunkDataError::HeaderMismatch { expected, found } => write!(
                f,
                "chunk header mismatch: expected position {} size {}, found position {} size {}",
                expected.0, expected.1, found.0, found.1
            ),
            ChunkDataError::Payload(err) => write!(f, "chunk payload invalid: {err}"),
            ChunkDataError::SizeMismatch { expected, actual } => {
                write!(f, "block array replacement has {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for ChunkDataError {}

impl From<RleError> for ChunkDataError {
    fn from(err: RleError) -> Self {
        ChunkDataError::Payload(err)
    }
}

/// A fixed-size cuboid of blocks. The unit of mesh generation, persistence
/// and streaming.
///
/// Blocks are indexed as `x + z * size.x + y * size.x * size.z` (x varies
/// fastest, y slowest). Serialization and mask construction both rely on
/// this order.
pub struct Chunk {
    position: IVec3,
    size: IVec3,
    blocks: Vec<u8>,
    is_modified: bool,
    is_mesh_dirty: bool,
    mesh: Option<MeshData>,
    collision: Option<CollisionSurface>,
    mesh_revision: u32,
}

impl Chunk {
    /// Create an all-air chunk. A fresh chunk is unmodified but mesh-dirty:
    /// it has never produced a mesh.
    pub fn new(position: IVec3, size: IVec3) -> Self {
        let volume = (size.x * size.y * size.z) as usize;
        Self {
            position,
            size,
            blocks: vec![0; volume],
            is_modified: false,
            is_mesh_dirty: true,
            mesh: None,
            collision: None,
            mesh_revision: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> IVec3 {
        self.size
    }

    /// World coordinate of this chunk's minimum corner.
    #[inline]
    pub fn world_origin(&self) -> IVec3 {
        self.position * self.size
    }

    #[inline]
    pub fn volume(&self) -> usize {
        (self.size.x * self.size.y * self.size.z) as usize
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    #[inline]
    pub fn is_mesh_dirty(&self) -> bool {
        self.is_mesh_dirty
    }

    /// Number of meshes this chunk has produced. Revision 1 is the initial
    /// mesh.
    #[inline]
    pub fn mesh_revision(&self) -> u32 {
        self.mesh_revision
    }

    /// Current render surface, if the last mesh build produced any geometry.
    #[inline]
    pub fn mesh(&self) -> Option<&MeshData> {
        self.mesh.as_ref()
    }

    /// Current collision surface, when collision emission is enabled.
    #[inline]
    pub fn collision(&self) -> Option<&CollisionSurface> {
        self.collision.as_ref()
    }

    /// Raw block array in canonical index order.
    #[inline]
    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    #[inline]
    fn index(&self, local: IVec3) -> Option<usize> {
        if local.x < 0
            || local.y < 0
            || local.z < 0
            || local.x >= self.size.x
            || local.y >= self.size.y
            || local.z >= self.size.z
        {
            return None;
        }
        Some((local.x + local.z * self.size.x + local.y * self.size.x * self.size.z) as usize)
    }

    /// Whether a local coordinate lies inside the chunk box.
    #[inline]
    pub fn contains(&self, local: IVec3) -> bool {
        self.index(local).is_some()
    }

    /// Block at a local coordinate. Out-of-range coordinates read as air so
    /// that mask construction can probe across boundaries without failing.
    #[inline]
    pub fn get(&self, local: IVec3) -> Block {
        match self.index(local) {
            Some(idx) => Block(self.blocks.get(idx).copied().unwrap_or(0)),
            None => Block::AIR,
        }
    }

    /// Write a block at a local coordinate. Out-of-range writes are silent
    /// no-ops; writing the current id touches nothing. Returns whether the
    /// cell changed.
    pub fn set(&mut self, local: IVec3, id: Block) -> bool {
        let Some(idx) = self.index(local) else {
            return false;
        };
        let Some(cell) = self.blocks.get_mut(idx) else {
            return false;
        };
        if *cell == id.0 {
            return false;
        }
        *cell = id.0;
        self.is_modified = true;
        self.is_mesh_dirty = true;
        true
    }

    /// Replace the entire block array. The input must cover every cell.
    pub fn bulk_replace(&mut self, bytes: &[u8]) -> Result<(), ChunkDataError> {
        let expected = self.volume();
        if bytes.len() != expected {
            return Err(ChunkDataError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        self.blocks.clear();
        self.blocks.extend_from_slice(bytes);
        self.is_modified = true;
        self.is_mesh_dirty = true;
        Ok(())
    }

    /// Flag the mesh as stale without modifying content. Used for
    /// cross-chunk invalidation after a neighbor mutates a boundary cell on
    /// its side.
    #[inline]
    pub fn mark_mesh_dirty(&mut self) {
        self.is_mesh_dirty = true;
    }

    pub(crate) fn clear_modified(&mut self) {
        self.is_modified = false;
    }

    /// Install a freshly built mesh, swapping the render surface (or
    /// clearing it when the mesh is empty) and rebuilding the collision
    /// soup from the same triangles when requested. Clears the dirty flag
    /// but never touches `is_modified`. Returns true when this was the
    /// chunk's initial mesh.
    pub fn install_mesh(&mut self, mesh: MeshData, with_collision: bool) -> bool {
        if mesh.is_empty() {
            self.mesh = None;
            self.collision = None;
        } else {
            self.collision = if with_collision {
                Some(CollisionSurface::from_mesh(&mesh))
            } else {
                None
            };
            self.mesh = Some(mesh);
        }
        self.is_mesh_dirty = false;
        self.mesh_revision += 1;
        self.mesh_revision == 1
    }

    /// Serialize to the on-disk form: 24-byte header followed by the
    /// run-length payload.
    pub fn serialize(&self) -> Vec<u8> {
        let payload = rle::encode(&self.blocks);
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        for field in [
            self.position.x,
            self.position.y,
            self.position.z,
            self.size.x,
            self.size.y,
            self.size.z,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&payload);
        out
    }

    /// Restore block content from serialized bytes.
    ///
    /// The header must name this chunk's position and size; on mismatch the
    /// chunk is left untouched. A payload that does not decode to the exact
    /// block count zero-fills the array before reporting failure. On
    /// success the chunk is clean with respect to persistence but needs a
    /// new mesh.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), ChunkDataError> {
        if bytes.len() < HEADER_LEN {
            return Err(ChunkDataError::TruncatedHeader);
        }
        let mut fields = [0i32; 6];
        for (i, field) in fields.iter_mut().enumerate() {
            let at = i * 4;
            let raw: [u8; 4] = match bytes[at..at + 4].try_into() {
                Ok(raw) => raw,
                Err(_) => return Err(ChunkDataError::TruncatedHeader),
            };
            *field = i32::from_le_bytes(raw);
        }
        let position = IVec3::new(fields[0], fields[1], fields[2]);
        let size = IVec3::new(fields[3], fields[4], fields[5]);
        if position != self.position || size != self.size {
            return Err(ChunkDataError::HeaderMismatch {
                expected: (self.position, self.size),
                found: (position, size),
            });
        }
        match rle::decode(&bytes[HEADER_LEN..], self.volume()) {
            Ok(blocks) => {
                self.blocks = blocks;
                self.is_modified = false;
                self.is_mesh_dirty = true;
                Ok(())
            }
            Err(err) => {
                self.blocks = vec![0; self.volume()];
                Err(ChunkDataError::Payload(err))
            }
        }
    }

    /// Release render and collision surfaces and empty the block array.
    /// Idempotent; the chunk reads as all-air afterwards.
    pub fn cleanup(&mut self) {
        self.mesh = None;
        self.collision = None;
        self.blocks.clear();
        self.blocks.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: IVec3 = IVec3::new(16, 32, 16);

    fn chunk() -> Chunk {
        Chunk::new(IVec3::new(2, -1, 3), SIZE)
    }

    #[test]
    fn fresh_chunk_is_air_unmodified_and_dirty() {
        let c = chunk();
        assert!(c.blocks().iter().all(|&b| b == 0));
        assert!(!c.is_modified());
        assert!(c.is_mesh_dirty());
        assert_eq!(c.mesh_revision(), 0);
    }

    #[test]
    fn index_order_is_x_fastest_y_slowest() {
        let mut c = chunk();
        c.set(IVec3::new(1, 0, 0), Block(9));
        c.set(IVec3::new(0, 0, 1), Block(8));
        c.set(IVec3::new(0, 1, 0), Block(7));
        assert_eq!(c.blocks()[1], 9);
        assert_eq!(c.blocks()[16], 8);
        assert_eq!(c.blocks()[16 * 16], 7);
    }

    #[test]
    fn out_of_range_reads_are_air_and_writes_are_ignored() {
        let mut c = chunk();
        assert_eq!(c.get(IVec3::new(-1, 0, 0)), Block::AIR);
        assert_eq!(c.get(IVec3::new(0, 32, 0)), Block::AIR);
        assert!(!c.set(IVec3::new(16, 0, 0), Block(5)));
        assert!(!c.is_modified());
    }

    #[test]
    fn setting_the_current_id_touches_no_flags() {
        let mut c = chunk();
        assert!(c.set(IVec3::new(3, 4, 5), Block(2)));
        assert!(c.is_modified());
        c.clear_modified();
        let mesh = MeshData::new();
        c.install_mesh(mesh, false);
        assert!(!c.is_mesh_dirty());

        assert!(!c.set(IVec3::new(3, 4, 5), Block(2)));
        assert!(!c.is_modified());
        assert!(!c.is_mesh_dirty());
    }

    #[test]
    fn bulk_replace_validates_length() {
        let mut c = chunk();
        let err = c.bulk_replace(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ChunkDataError::SizeMismatch { .. }));

        let bytes = vec![4u8; c.volume()];
        c.bulk_replace(&bytes).unwrap();
        assert!(c.is_modified());
        assert!(c.is_mesh_dirty());
        assert_eq!(c.get(IVec3::new(5, 5, 5)), Block(4));
    }

    #[test]
    fn serialize_round_trips_into_equal_chunk() {
        let mut c = chunk();
        for i in 0..c.volume() {
            let local = IVec3::new(
                (i % 16) as i32,
                ((i / 256) % 32) as i32,
                ((i / 16) % 16) as i32,
            );
            c.set(local, Block((i % 7) as u8));
        }
        let bytes = c.serialize();

        let mut restored = Chunk::new(c.position(), c.size());
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored.blocks(), c.blocks());
        assert!(!restored.is_modified());
        assert!(restored.is_mesh_dirty());
    }

    #[test]
    fn header_mismatch_leaves_chunk_untouched() {
        let donor = Chunk::new(IVec3::new(9, 9, 9), SIZE);
        let bytes = donor.serialize();

        let mut c = chunk();
        c.set(IVec3::new(0, 0, 0), Block(3));
        let err = c.deserialize(&bytes).unwrap_err();
        assert!(matches!(err, ChunkDataError::HeaderMismatch { .. }));
        assert_eq!(c.get(IVec3::new(0, 0, 0)), Block(3));
        assert!(c.is_modified());
    }

    #[test]
    fn bad_payload_zero_fills() {
        let mut c = chunk();
        c.set(IVec3::new(0, 0, 0), Block(3));

        let mut bytes = c.serialize();
        bytes.truncate(HEADER_LEN + 2);
        let err = c.deserialize(&bytes).unwrap_err();
        assert!(matches!(err, ChunkDataError::Payload(_)));
        assert!(c.blocks().iter().all(|&b| b == 0));
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut c = chunk();
        c.set(IVec3::new(1, 1, 1), Block(1));
        c.cleanup();
        assert_eq!(c.get(IVec3::new(1, 1, 1)), Block::AIR);
        assert!(c.mesh().is_none());
        c.cleanup();
        assert!(c.blocks().is_empty());
    }
}
