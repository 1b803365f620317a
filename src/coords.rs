/// Conversions between world, chunk and chunk-local coordinates.
///
/// All three functions are total over signed integers. For every world
/// coordinate `w` and chunk size `s`:
/// `chunk_to_world(world_to_chunk(w, s), s) + world_to_local(w, s) == w`.
use glam::IVec3;

/// Chunk lattice coordinate containing the given world coordinate.
/// Uses floored division, so negative inputs round toward -infinity.
#[inline]
pub fn world_to_chunk(world: IVec3, chunk_size: IVec3) -> IVec3 {
    IVec3::new(
        world.x.div_euclid(chunk_size.x),
        world.y.div_euclid(chunk_size.y),
        world.z.div_euclid(chunk_size.z),
    )
}

/// Position within the owning chunk. Every component lies in `[0, size)`.
#[inline]
pub fn world_to_local(world: IVec3, chunk_size: IVec3) -> IVec3 {
    IVec3::new(
        world.x.rem_euclid(chunk_size.x),
        world.y.rem_euclid(chunk_size.y),
        world.z.rem_euclid(chunk_size.z),
    )
}

/// World coordinate of a chunk's minimum corner.
#[inline]
pub fn chunk_to_world(chunk: IVec3, chunk_size: IVec3) -> IVec3 {
    chunk * chunk_size
}
