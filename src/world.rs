/// World management system: sparse chunk table, viewer-driven streaming,
/// paced mesh generation, and mutation routing with cross-chunk
/// invalidation.
use crate::coords;
use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::meshing::{default_block_color, BlockColorFn, BlockView, GreedyMesher};
use crate::persistence::ChunkStore;
use crate::voxel::{Block, Chunk};
use glam::{IVec3, Vec3};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// World configuration parameters. Chunk dimensions are fixed once the
/// world is constructed.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Horizontal chunk dimension (Cx = Cz). 8..=64, multiple of 8.
    pub chunk_size_xz: i32,
    /// Vertical chunk dimension. 8..=256, multiple of 8.
    pub chunk_size_y: i32,
    /// Horizontal residency radius in chunks. 2..=32.
    pub render_distance_xz: i32,
    /// Vertical residency radius in chunks. 0..=16.
    pub render_distance_y: i32,
    /// Generation queue drain cap per update; 0 means unbounded.
    pub max_chunks_per_frame: usize,
    /// Whether mesh builds also emit a collision surface.
    pub generate_collision: bool,
    /// Persist modified chunks when they leave the residency window.
    pub auto_save_chunks: bool,
    /// Root directory of the per-chunk files.
    pub save_directory: PathBuf,
    /// Wrap chunk files in the length-prefixed lz4 frame.
    pub compress_chunks: bool,
    /// Per-vertex color hook, a pure function of the block id.
    pub block_color: BlockColorFn,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size_xz: 16,
            chunk_size_y: 128,
            render_distance_xz: 8,
            render_distance_y: 4,
            max_chunks_per_frame: 4,
            generate_collision: true,
            auto_save_chunks: true,
            save_directory: PathBuf::from("world/chunks"),
            compress_chunks: true,
            block_color: default_block_color,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(8..=64).contains(&self.chunk_size_xz) || self.chunk_size_xz % 8 != 0 {
            return Err(format!(
                "chunk_size_xz must be a multiple of 8 in 8..=64, got {}",
                self.chunk_size_xz
            ));
        }
        if !(8..=256).contains(&self.chunk_size_y) || self.chunk_size_y % 8 != 0 {
            return Err(format!(
                "chunk_size_y must be a multiple of 8 in 8..=256, got {}",
                self.chunk_size_y
            ));
        }
        if !(2..=32).contains(&self.render_distance_xz) {
            return Err(format!(
                "render_distance_xz must lie in 2..=32, got {}",
                self.render_distance_xz
            ));
        }
        if !(0..=16).contains(&self.render_distance_y) {
            return Err(format!(
                "render_distance_y must lie in 0..=16, got {}",
                self.render_distance_y
            ));
        }
        if self.max_chunks_per_frame > 10 {
            return Err(format!(
                "max_chunks_per_frame must lie in 0..=10, got {}",
                self.max_chunks_per_frame
            ));
        }
        Ok(())
    }
}

/// Outcome of a block write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockWrite {
    /// The cell changed and invalidation ran.
    Applied,
    /// The cell already held the requested id; nothing happened.
    Unchanged,
}

/// A chunk position is in range of the viewer when its horizontal
/// (Euclidean) distance is within `r_xz` and its vertical offset within
/// `r_y`. Compared squared to stay exact in integers.
fn in_range(position: IVec3, viewer: IVec3, r_xz: i32, r_y: i32) -> bool {
    let dx = (position.x - viewer.x) as i64;
    let dz = (position.z - viewer.z) as i64;
    let r = r_xz as i64;
    dx * dx + dz * dz <= r * r && (position.y - viewer.y).abs() <= r_y
}

/// Owns every live chunk and all streaming state. Chunks never outlive
/// their removal from the table.
pub struct World {
    config: WorldConfig,
    chunk_size: IVec3,
    chunks: HashMap<IVec3, Chunk>,
    generation_queue: VecDeque<IVec3>,
    viewer_chunk: Option<IVec3>,
    store: ChunkStore,
    events: VecDeque<WorldEvent>,
}

impl World {
    /// Validate the configuration and open the persistence directory.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate().map_err(WorldError::InvalidConfig)?;
        let store = ChunkStore::open(&config.save_directory, config.compress_chunks)?;
        let chunk_size = IVec3::new(config.chunk_size_xz, config.chunk_size_y, config.chunk_size_xz);
        Ok(Self {
            config,
            chunk_size,
            chunks: HashMap::new(),
            generation_queue: VecDeque::new(),
            viewer_chunk: None,
            store,
            events: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Dimensions every chunk in this world is created with.
    pub fn chunk_size(&self) -> IVec3 {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn contains_chunk(&self, position: IVec3) -> bool {
        self.chunks.contains_key(&position)
    }

    pub fn chunk(&self, position: IVec3) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    pub fn chunk_positions(&self) -> Vec<IVec3> {
        self.chunks.keys().copied().collect()
    }

    pub fn viewer_chunk(&self) -> Option<IVec3> {
        self.viewer_chunk
    }

    /// Positions still waiting for mesh generation.
    pub fn pending_generation(&self) -> usize {
        self.generation_queue.len()
    }

    /// Take all events emitted since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.events.drain(..).collect()
    }

    /// Advance one tick: track the viewer, stream chunks in and out when
    /// its chunk coordinate changed, then drain a bounded amount of the
    /// generation queue.
    pub fn update(&mut self, viewer_position: Vec3) {
        let viewer_world = viewer_position.floor().as_ivec3();
        let viewer_chunk = coords::world_to_chunk(viewer_world, self.chunk_size);
        if self.viewer_chunk != Some(viewer_chunk) {
            self.viewer_chunk = Some(viewer_chunk);
            self.stream_around(viewer_chunk);
        }
        self.drain_generation_queue();
    }

    /// Block at a world coordinate; air when the owning chunk is not
    /// resident.
    pub fn get_block(&self, world_pos: IVec3) -> Block {
        let chunk_pos = coords::world_to_chunk(world_pos, self.chunk_size);
        match self.chunks.get(&chunk_pos) {
            Some(chunk) => chunk.get(coords::world_to_local(world_pos, self.chunk_size)),
            None => Block::AIR,
        }
    }

    /// Write a block at a world coordinate.
    ///
    /// Auto-creates the owning chunk when its position lies inside the
    /// residency window (before any viewer has been observed, the window
    /// is unconstrained). Writing the current id is a no-op. A change
    /// re-meshes the edited chunk immediately; when the cell sits on a
    /// chunk face, the across-face neighbors are invalidated and
    /// re-meshed in the same call so stale geometry never shows.
    pub fn set_block(&mut self, world_pos: IVec3, id: Block) -> Result<BlockWrite, WorldError> {
        let chunk_pos = coords::world_to_chunk(world_pos, self.chunk_size);
        let local = coords::world_to_local(world_pos, self.chunk_size);

        if !self.chunks.contains_key(&chunk_pos) {
            if !self.position_in_window(chunk_pos) {
                return Err(WorldError::ChunkNotResident(chunk_pos));
            }
            self.load_chunk(chunk_pos);
        }
        let Some(chunk) = self.chunks.get_mut(&chunk_pos) else {
            return Err(WorldError::ChunkNotResident(chunk_pos));
        };
        if !chunk.set(local, id) {
            return Ok(BlockWrite::Unchanged);
        }
        self.events.push_back(WorldEvent::BlockModified { position: world_pos, id });

        self.rebuild_chunk_mesh(chunk_pos);
        for offset in self.boundary_neighbor_offsets(local) {
            let neighbor = chunk_pos + offset;
            let Some(neighbor_chunk) = self.chunks.get_mut(&neighbor) else {
                continue;
            };
            neighbor_chunk.mark_mesh_dirty();
            self.rebuild_chunk_mesh(neighbor);
        }
        Ok(BlockWrite::Applied)
    }

    /// Apply a batch of edits, coalescing invalidation: each touched chunk
    /// is marked dirty once and queued for the next drain, and boundary
    /// neighbors are only marked, not re-meshed synchronously. Returns the
    /// number of cells that changed; edits outside the residency window
    /// are skipped.
    pub fn bulk_set<I>(&mut self, edits: I) -> usize
    where
        I: IntoIterator<Item = (IVec3, Block)>,
    {
        let mut touched: HashSet<IVec3> = HashSet::new();
        let mut neighbor_marks: HashSet<IVec3> = HashSet::new();
        let mut applied = 0;

        for (world_pos, id) in edits {
            let chunk_pos = coords::world_to_chunk(world_pos, self.chunk_size);
            let local = coords::world_to_local(world_pos, self.chunk_size);

            if !self.chunks.contains_key(&chunk_pos) {
                if !self.position_in_window(chunk_pos) {
                    log::debug!("bulk edit at {world_pos} skipped: chunk {chunk_pos} out of range");
                    continue;
                }
                self.load_chunk(chunk_pos);
            }
            let Some(chunk) = self.chunks.get_mut(&chunk_pos) else {
                continue;
            };
            if !chunk.set(local, id) {
                continue;
            }
            applied += 1;
            self.events.push_back(WorldEvent::BlockModified { position: world_pos, id });
            touched.insert(chunk_pos);
            for offset in self.boundary_neighbor_offsets(local) {
                neighbor_marks.insert(chunk_pos + offset);
            }
        }

        for position in touched.iter() {
            self.generation_queue.push_back(*position);
        }
        for neighbor in neighbor_marks {
            if touched.contains(&neighbor) {
                continue;
            }
            let Some(chunk) = self.chunks.get_mut(&neighbor) else {
                continue;
            };
            chunk.mark_mesh_dirty();
            self.generation_queue.push_back(neighbor);
        }
        applied
    }

    /// Persist every modified resident chunk, clearing its modified flag
    /// on success. Returns the number of chunks written.
    pub fn save_modified_chunks(&mut self) -> usize {
        let mut positions: Vec<IVec3> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.is_modified())
            .map(|(position, _)| *position)
            .collect();
        positions.sort_by_key(|p| (p.x, p.y, p.z));

        let mut saved = 0;
        for position in positions {
            let Some(chunk) = self.chunks.get_mut(&position) else {
                continue;
            };
            match self.store.save(chunk) {
                Ok(()) => {
                    chunk.clear_modified();
                    self.events.push_back(WorldEvent::ChunkSaved { position });
                    saved += 1;
                }
                Err(err) => log::error!("failed to save chunk {position}: {err}"),
            }
        }
        saved
    }

    /// Drain the generation queue and unload every resident chunk, saving
    /// modified ones first when auto-save is enabled. Synchronous; this is
    /// the only way to cancel pending generation.
    pub fn clear(&mut self) {
        self.generation_queue.clear();
        let mut positions: Vec<IVec3> = self.chunks.keys().copied().collect();
        positions.sort_by_key(|p| (p.x, p.y, p.z));
        for position in positions {
            self.unload_chunk(position);
        }
        self.viewer_chunk = None;
    }

    fn position_in_window(&self, chunk_pos: IVec3) -> bool {
        match self.viewer_chunk {
            Some(viewer) => in_range(
                chunk_pos,
                viewer,
                self.config.render_distance_xz,
                self.config.render_distance_y,
            ),
            // No viewer observed yet; mutations may land anywhere.
            None => true,
        }
    }

    /// Up to three unit offsets toward chunks whose meshes cull against
    /// this cell (the corner block of a chunk touches three faces).
    fn boundary_neighbor_offsets(&self, local: IVec3) -> Vec<IVec3> {
        let mut offsets = Vec::new();
        for axis in 0..3 {
            let mut offset = IVec3::ZERO;
            if local[axis] == 0 {
                offset[axis] = -1;
                offsets.push(offset);
            } else if local[axis] == self.chunk_size[axis] - 1 {
                offset[axis] = 1;
                offsets.push(offset);
            }
        }
        offsets
    }

    fn stream_around(&mut self, viewer: IVec3) {
        let r_xz = self.config.render_distance_xz;
        let r_y = self.config.render_distance_y;

        let to_unload: Vec<IVec3> = self
            .chunks
            .keys()
            .filter(|position| !in_range(**position, viewer, r_xz, r_y))
            .copied()
            .collect();
        for position in to_unload {
            self.unload_chunk(position);
        }

        // Closest columns first so the area around the viewer fills in
        // before the fringe.
        let mut to_load: Vec<(i64, IVec3)> = Vec::new();
        for dx in -r_xz..=r_xz {
            for dz in -r_xz..=r_xz {
                let d2 = (dx as i64) * (dx as i64) + (dz as i64) * (dz as i64);
                if d2 > (r_xz as i64) * (r_xz as i64) {
                    continue;
                }
                for dy in -r_y..=r_y {
                    let position = viewer + IVec3::new(dx, dy, dz);
                    if !self.chunks.contains_key(&position) {
                        to_load.push((d2, position));
                    }
                }
            }
        }
        to_load.sort_by_key(|&(d2, _)| d2);
        for (_, position) in to_load {
            self.load_chunk(position);
        }
    }

    /// Bring a chunk into residency. A persisted chunk is decoded and
    /// meshed synchronously; otherwise it stays all-air and waits in the
    /// generation queue.
    fn load_chunk(&mut self, position: IVec3) {
        let mut chunk = Chunk::new(position, self.chunk_size);
        match self.store.load_into(&mut chunk) {
            Ok(true) => {
                self.chunks.insert(position, chunk);
                self.rebuild_chunk_mesh(position);
            }
            Ok(false) => {
                self.chunks.insert(position, chunk);
                self.generation_queue.push_back(position);
            }
            Err(err) => {
                // The chunk is zero-filled on payload corruption; treat it
                // like a miss so the position still gets meshed.
                log::error!("loading chunk {position} failed: {err}");
                self.chunks.insert(position, chunk);
                self.generation_queue.push_back(position);
            }
        }
    }

    fn unload_chunk(&mut self, position: IVec3) {
        let Some(mut chunk) = self.chunks.remove(&position) else {
            return;
        };
        if self.config.auto_save_chunks && chunk.is_modified() {
            match self.store.save(&chunk) {
                Ok(()) => {
                    chunk.clear_modified();
                    self.events.push_back(WorldEvent::ChunkSaved { position });
                }
                Err(err) => log::error!("failed to save chunk {position} on unload: {err}"),
            }
        }
        chunk.cleanup();
        self.events.push_back(WorldEvent::ChunkUnloaded { position });
    }

    /// Pop up to `max_chunks_per_frame` queued positions and mesh the ones
    /// still resident. Positions unloaded between enqueue and drain are
    /// discarded without counting toward the cap.
    fn drain_generation_queue(&mut self) {
        let cap = self.config.max_chunks_per_frame;
        let mut processed = 0usize;
        while let Some(position) = self.generation_queue.pop_front() {
            if !self.chunks.contains_key(&position) {
                continue;
            }
            self.rebuild_chunk_mesh(position);
            processed += 1;
            if cap != 0 && processed >= cap {
                break;
            }
        }
    }

    /// Rebuild a chunk's mesh if it is dirty. Emits `ChunkLoaded` the
    /// first time a chunk produces a mesh result and `ChunkMeshGenerated`
    /// on every build.
    fn rebuild_chunk_mesh(&mut self, position: IVec3) -> bool {
        let mesh = {
            let Some(chunk) = self.chunks.get(&position) else {
                return false;
            };
            if !chunk.is_mesh_dirty() {
                return false;
            }
            GreedyMesher::mesh_chunk(chunk, Some(&*self as &dyn BlockView), self.config.block_color)
        };
        let with_collision = self.config.generate_collision;
        let Some(chunk) = self.chunks.get_mut(&position) else {
            return false;
        };
        let initial = chunk.install_mesh(mesh, with_collision);
        if initial {
            self.events.push_back(WorldEvent::ChunkLoaded { position });
        }
        self.events.push_back(WorldEvent::ChunkMeshGenerated { position });
        true
    }
}

impl BlockView for World {
    fn block_at(&self, world: IVec3) -> Block {
        self.get_block(world)
    }
}
