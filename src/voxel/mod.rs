/// Core voxel data structures: block ids, chunk storage, run-length codec
pub mod chunk;
pub mod rle;

pub use chunk::{Chunk, ChunkDataError};

/// A single voxel cell identifier. Zero is air; every other value is an
/// opaque solid cube distinguished only by id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Block(pub u8);

impl Block {
    pub const AIR: Block = Block(0);

    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 != 0
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::AIR
    }
}
