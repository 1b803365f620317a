/// Greedy mesher: turns a chunk's dense block array (plus its six neighbor
/// boundaries) into a minimal set of axis-aligned rectangular quads.
use super::{FaceDir, MeshData};
use crate::voxel::{Block, Chunk};
use glam::{IVec3, Vec3};

/// Read-through accessor over the world, used to cull faces against blocks
/// in adjacent chunks. Reads outside any resident chunk are air.
pub trait BlockView {
    fn block_at(&self, world: IVec3) -> Block;
}

/// Per-vertex color hook supplied by the host. Pure function of the id.
pub type BlockColorFn = fn(Block) -> [u8; 4];

/// Fallback palette: a deterministic spread over the id space. Air is
/// fully transparent.
pub fn default_block_color(block: Block) -> [u8; 4] {
    if block.is_air() {
        return [0, 0, 0, 0];
    }
    let id = block.0;
    [
        id.wrapping_mul(97),
        id.wrapping_mul(57).wrapping_add(64),
        id.wrapping_mul(23).wrapping_add(128),
        255,
    ]
}

/// Mask cell meaning "nothing to draw here".
const EMPTY: i16 = -1;

pub struct GreedyMesher;

impl GreedyMesher {
    /// Mesh one chunk. When `world` is provided, faces at the chunk
    /// boundary are culled against the neighboring chunks' blocks; without
    /// it every boundary face is drawn.
    ///
    /// Sweeps the six face directions in a fixed order. For each slice
    /// orthogonal to the direction's primary axis, a 2D mask of block ids
    /// is built with hidden faces removed, then merged into maximal
    /// rectangles (width before height). Two distinct ids never merge.
    pub fn mesh_chunk(chunk: &Chunk, world: Option<&dyn BlockView>, color_of: BlockColorFn) -> MeshData {
        let mut mesh = MeshData::new();
        let size = chunk.size();
        let origin = chunk.world_origin();

        for dir in FaceDir::ALL {
            let p_axis = dir.axis();
            let (u_axis, v_axis) = dir.tangent_axes();
            let width = size[u_axis] as usize;
            let height = size[v_axis] as usize;
            let depth = size[p_axis];
            let mut mask = vec![EMPTY; width * height];

            for s in 0..depth {
                Self::build_mask(chunk, world, origin, dir, s, &mut mask);
                Self::merge_mask(&mut mask, width, height, |u0, v0, w, h, id| {
                    Self::emit_quad(&mut mesh, dir, s, u0, v0, w, h, id, color_of);
                });
            }
        }

        mesh
    }

    /// Fill the slice mask for direction `dir` at primary coordinate `s`.
    /// A cell holds the block id when the face is exposed, `EMPTY` when
    /// the voxel is air or the across-face neighbor hides it.
    fn build_mask(
        chunk: &Chunk,
        world: Option<&dyn BlockView>,
        origin: IVec3,
        dir: FaceDir,
        s: i32,
        mask: &mut [i16],
    ) {
        let size = chunk.size();
        let p_axis = dir.axis();
        let (u_axis, v_axis) = dir.tangent_axes();
        let width = size[u_axis] as usize;
        let height = size[v_axis] as usize;

        for v in 0..height {
            for u in 0..width {
                let mut local = IVec3::ZERO;
                local[p_axis] = s;
                local[u_axis] = u as i32;
                local[v_axis] = v as i32;

                let block = chunk.get(local);
                let cell = if block.is_air() {
                    EMPTY
                } else {
                    let neighbor = local + dir.offset();
                    let hidden = if chunk.contains(neighbor) {
                        chunk.get(neighbor).is_solid()
                    } else {
                        match world {
                            Some(view) => view.block_at(origin + neighbor).is_solid(),
                            None => false,
                        }
                    };
                    if hidden {
                        EMPTY
                    } else {
                        block.0 as i16
                    }
                };
                mask[v * width + u] = cell;
            }
        }
    }

    /// Merge a mask into maximal rectangles. Rows are scanned in
    /// increasing tangent order; each run grows horizontally first, then
    /// row by row while the full horizontal extent matches. Merged cells
    /// are cleared so they are emitted exactly once.
    fn merge_mask(
        mask: &mut [i16],
        width: usize,
        height: usize,
        mut emit: impl FnMut(usize, usize, usize, usize, Block),
    ) {
        for v0 in 0..height {
            for u0 in 0..width {
                let id = mask[v0 * width + u0];
                if id < 0 {
                    continue;
                }
                let mut w = 1;
                while u0 + w < width && mask[v0 * width + u0 + w] == id {
                    w += 1;
                }
                let mut h = 1;
                'grow: while v0 + h < height {
                    for i in 0..w {
                        if mask[(v0 + h) * width + u0 + i] != id {
                            break 'grow;
                        }
                    }
                    h += 1;
                }
                emit(u0, v0, w, h, Block(id as u8));
                for dv in 0..h {
                    for du in 0..w {
                        mask[(v0 + dv) * width + u0 + du] = EMPTY;
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_quad(
        mesh: &mut MeshData,
        dir: FaceDir,
        s: i32,
        u0: usize,
        v0: usize,
        w: usize,
        h: usize,
        id: Block,
        color_of: BlockColorFn,
    ) {
        let p_axis = dir.axis();
        let (u_axis, v_axis) = dir.tangent_axes();
        let plane = if dir.is_positive() { s + 1 } else { s };

        let corner = |du: usize, dv: usize| {
            let mut p = Vec3::ZERO;
            p[p_axis] = plane as f32;
            p[u_axis] = (u0 + du) as f32;
            p[v_axis] = (v0 + dv) as f32;
            p
        };
        let corners = [corner(0, 0), corner(w, 0), corner(w, h), corner(0, h)];
        mesh.add_quad(corners, dir.normal(), w as f32, h as f32, color_of(id));
    }
}
