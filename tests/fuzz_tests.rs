//! Seeded randomized suites: codec round-trips, the coordinate identity,
//! and a verifier pass over the greedy mesher's output.
use glam::{IVec3, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use voxel_world::*;

#[test]
fn fuzz_rle_round_trip_and_pair_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0DEC);

    for _ in 0..200 {
        let len = rng.gen_range(1..=4096);
        // Mix long runs with noise so both encoder paths are exercised.
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            if rng.gen_bool(0.5) {
                let run = rng.gen_range(1..=600).min(len - data.len());
                let value = rng.gen_range(0..4u8);
                data.extend(std::iter::repeat(value).take(run));
            } else {
                data.push(rng.gen::<u8>());
            }
        }

        let payload = voxel_world::voxel::rle::encode(&data);
        assert_eq!(payload.len() % 2, 0);

        let pairs: Vec<(u8, u8)> = payload.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        for (i, &(value, count)) in pairs.iter().enumerate() {
            assert!(count >= 1, "count must be at least 1");
            if i > 0 && pairs[i - 1].0 == value {
                assert_eq!(
                    pairs[i - 1].1,
                    255,
                    "adjacent pairs share a value only across a capped run"
                );
            }
        }

        let decoded = voxel_world::voxel::rle::decode(&payload, data.len()).unwrap();
        assert_eq!(decoded, data);
    }
}

#[test]
fn fuzz_coordinate_round_trip_identity() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0C00D);

    for _ in 0..2000 {
        let size = IVec3::new(
            rng.gen_range(1..=8) * 8,
            rng.gen_range(1..=32) * 8,
            rng.gen_range(1..=8) * 8,
        );
        let world = IVec3::new(
            rng.gen_range(-1_000_000..1_000_000),
            rng.gen_range(-1_000_000..1_000_000),
            rng.gen_range(-1_000_000..1_000_000),
        );
        let local = coords::world_to_local(world, size);
        let rebuilt = coords::chunk_to_world(coords::world_to_chunk(world, size), size) + local;
        assert_eq!(rebuilt, world);
        for axis in 0..3 {
            assert!(local[axis] >= 0 && local[axis] < size[axis]);
        }
    }
}

#[test]
fn fuzz_chunk_serialize_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5AFE);
    let sizes = [IVec3::new(8, 8, 8), IVec3::new(16, 32, 16), IVec3::new(32, 8, 32)];

    for round in 0..40 {
        let size = sizes[round % sizes.len()];
        let position = IVec3::new(
            rng.gen_range(-100..100),
            rng.gen_range(-100..100),
            rng.gen_range(-100..100),
        );
        let mut chunk = Chunk::new(position, size);
        for _ in 0..rng.gen_range(0..500) {
            let local = IVec3::new(
                rng.gen_range(0..size.x),
                rng.gen_range(0..size.y),
                rng.gen_range(0..size.z),
            );
            chunk.set(local, Block(rng.gen::<u8>()));
        }

        let bytes = chunk.serialize();
        let mut restored = Chunk::new(position, size);
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored.blocks(), chunk.blocks(), "round {round} lost data");
    }
}

/// Rectangle of one emitted quad in its face plane.
struct QuadRect {
    dir: FaceDir,
    plane: i32,
    id: u8,
    u0: i32,
    v0: i32,
    w: i32,
    h: i32,
}

fn quad_rects(mesh: &MeshData) -> Vec<QuadRect> {
    (0..mesh.quad_count())
        .map(|q| {
            let base = q * 4;
            let normal = mesh.normals[base];
            let dir = FaceDir::ALL
                .into_iter()
                .find(|d| d.normal() == normal)
                .expect("axis-aligned normal");
            let corners: Vec<Vec3> = mesh.positions[base..base + 4].to_vec();
            let (u_axis, v_axis) = dir.tangent_axes();
            let u_min = corners.iter().map(|c| c[u_axis]).fold(f32::MAX, f32::min);
            let u_max = corners.iter().map(|c| c[u_axis]).fold(f32::MIN, f32::max);
            let v_min = corners.iter().map(|c| c[v_axis]).fold(f32::MAX, f32::min);
            let v_max = corners.iter().map(|c| c[v_axis]).fold(f32::MIN, f32::max);
            QuadRect {
                dir,
                plane: corners[0][dir.axis()] as i32,
                id: mesh.colors[base][0],
                u0: u_min as i32,
                v0: v_min as i32,
                w: (u_max - u_min) as i32,
                h: (v_max - v_min) as i32,
            }
        })
        .collect()
}

/// Color hook that stores the raw id in the red channel so the verifier
/// can recover it from the mesh.
fn id_color(block: Block) -> [u8; 4] {
    [block.0, 0, 0, 255]
}

fn random_chunk(rng: &mut ChaCha8Rng, fill: f64) -> Chunk {
    let size = IVec3::new(16, 16, 16);
    let mut chunk = Chunk::new(IVec3::ZERO, size);
    for x in 0..size.x {
        for y in 0..size.y {
            for z in 0..size.z {
                if rng.gen_bool(fill) {
                    chunk.set(IVec3::new(x, y, z), Block(rng.gen_range(1..=3)));
                }
            }
        }
    }
    chunk
}

#[test]
fn fuzz_greedy_output_is_minimal() {
    // No two emitted quads with the same direction, plane and id may share
    // a full edge; such a pair could have been merged.
    let mut rng = ChaCha8Rng::seed_from_u64(0x6EEE);

    for round in 0..20 {
        let chunk = random_chunk(&mut rng, 0.4);
        let mesh = GreedyMesher::mesh_chunk(&chunk, None, id_color);

        let mut groups: HashMap<(FaceDir, i32, u8), Vec<QuadRect>> = HashMap::new();
        for rect in quad_rects(&mesh) {
            groups.entry((rect.dir, rect.plane, rect.id)).or_default().push(rect);
        }

        for ((dir, plane, id), rects) in groups {
            for (i, a) in rects.iter().enumerate() {
                for b in rects.iter().skip(i + 1) {
                    let horizontal_merge = a.v0 == b.v0
                        && a.h == b.h
                        && (a.u0 + a.w == b.u0 || b.u0 + b.w == a.u0);
                    let vertical_merge = a.u0 == b.u0
                        && a.w == b.w
                        && (a.v0 + a.h == b.v0 || b.v0 + b.h == a.v0);
                    assert!(
                        !horizontal_merge && !vertical_merge,
                        "round {round}: mergeable quads {dir:?} plane {plane} id {id}"
                    );
                }
            }
        }
    }
}

#[test]
fn fuzz_every_emitted_face_is_exposed() {
    // Each covered unit face must sit on a solid cell of the quad's id
    // whose across-face neighbor is air; hidden faces never reach the
    // output.
    let mut rng = ChaCha8Rng::seed_from_u64(0xFACE);

    for _ in 0..20 {
        let chunk = random_chunk(&mut rng, 0.6);
        let mesh = GreedyMesher::mesh_chunk(&chunk, None, id_color);

        for rect in quad_rects(&mesh) {
            let (u_axis, v_axis) = rect.dir.tangent_axes();
            let p_axis = rect.dir.axis();
            let cell_plane = if rect.dir.is_positive() { rect.plane - 1 } else { rect.plane };

            for du in 0..rect.w {
                for dv in 0..rect.h {
                    let mut local = IVec3::ZERO;
                    local[p_axis] = cell_plane;
                    local[u_axis] = rect.u0 + du;
                    local[v_axis] = rect.v0 + dv;

                    assert_eq!(
                        chunk.get(local).0,
                        rect.id,
                        "quad covers {local} which holds a different id"
                    );
                    let neighbor = local + rect.dir.offset();
                    assert!(
                        chunk.get(neighbor).is_air(),
                        "face at {local} toward {:?} is hidden by {neighbor}",
                        rect.dir
                    );
                }
            }
        }
    }
}

#[test]
fn fuzz_mesh_covers_every_exposed_face() {
    // Converse of the verifier above: every solid cell with an air
    // neighbor must be covered by exactly one quad in that direction.
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FE);

    for _ in 0..8 {
        let chunk = random_chunk(&mut rng, 0.5);
        let mesh = GreedyMesher::mesh_chunk(&chunk, None, id_color);

        let mut by_plane: HashMap<(FaceDir, i32), Vec<QuadRect>> = HashMap::new();
        for rect in quad_rects(&mesh) {
            by_plane.entry((rect.dir, rect.plane)).or_default().push(rect);
        }

        let size = chunk.size();
        for dir in FaceDir::ALL {
            for x in 0..size.x {
                for y in 0..size.y {
                    for z in 0..size.z {
                        let local = IVec3::new(x, y, z);
                        let block = chunk.get(local);
                        if block.is_air() || chunk.get(local + dir.offset()).is_solid() {
                            continue;
                        }
                        let (u_axis, v_axis) = dir.tangent_axes();
                        let p_axis = dir.axis();
                        let plane = local[p_axis] + if dir.is_positive() { 1 } else { 0 };
                        let covering = by_plane
                            .get(&(dir, plane))
                            .map(|rects| {
                                rects
                                    .iter()
                                    .filter(|r| {
                                        r.u0 <= local[u_axis]
                                            && local[u_axis] < r.u0 + r.w
                                            && r.v0 <= local[v_axis]
                                            && local[v_axis] < r.v0 + r.h
                                    })
                                    .count()
                            })
                            .unwrap_or(0);
                        assert_eq!(covering, 1, "face of {local} toward {dir:?} covered {covering} times");
                    }
                }
            }
        }
    }
}
