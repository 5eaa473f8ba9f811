//! Procedural room: floor, walls, a ring of riser columns and two rows of bars.

use glam::Vec3;

use super::{MeshBuilder, ObjectRole, Scene, SceneObject};
use crate::params::AnimationParams;

/// Room dimensions (meters)
#[derive(Debug, Clone)]
pub struct RoomLayout {
    /// Half the side length of the square floor
    pub half_extent_m: f32,

    pub wall_height_m: f32,

    pub wall_thickness_m: f32,

    /// Radius of the riser ring around the origin
    pub riser_ring_radius_m: f32,

    pub riser_width_m: f32,

    /// Column height above its offset; fully visible when reset to the origin
    pub riser_height_m: f32,

    /// Distance of each oscillator row from the X axis
    pub oscillator_row_z_m: f32,

    pub oscillator_spacing_m: f32,

    pub oscillator_width_m: f32,

    /// Bar height above its offset; tall enough to poke through the floor
    /// from the default oscillator base
    pub oscillator_height_m: f32,
}

impl Default for RoomLayout {
    fn default() -> Self {
        Self {
            half_extent_m: 12.0,
            wall_height_m: 8.0,
            wall_thickness_m: 0.2,
            riser_ring_radius_m: 4.0,
            riser_width_m: 0.6,
            riser_height_m: 3.0,
            oscillator_row_z_m: 8.0,
            oscillator_spacing_m: 2.0,
            oscillator_width_m: 0.8,
            oscillator_height_m: 12.0,
        }
    }
}

const FLOOR_COLOR: [f32; 4] = [0.35, 0.35, 0.38, 1.0];
const WALL_COLOR: [f32; 4] = [0.22, 0.26, 0.36, 1.0];
const PILLAR_COLOR: [f32; 4] = [0.5, 0.45, 0.4, 1.0];
const RISER_COLOR: [f32; 4] = [1.0, 0.55, 0.15, 1.0];
const OSCILLATOR_COLORS: [[f32; 4]; 2] = [[0.1, 0.85, 0.9, 1.0], [0.9, 0.2, 0.75, 1.0]];

/// A static piece of the room
struct StaticPiece {
    min: Vec3,
    max: Vec3,
    color: [f32; 4],
}

fn static_pieces(layout: &RoomLayout) -> Vec<StaticPiece> {
    let e = layout.half_extent_m;
    let h = layout.wall_height_m;
    let t = layout.wall_thickness_m;

    let mut pieces = vec![
        // Floor
        StaticPiece {
            min: Vec3::new(-e, -0.1, -e),
            max: Vec3::new(e, 0.0, e),
            color: FLOOR_COLOR,
        },
        // Walls: +X, -X, +Z, -Z
        StaticPiece {
            min: Vec3::new(e, 0.0, -e),
            max: Vec3::new(e + t, h, e),
            color: WALL_COLOR,
        },
        StaticPiece {
            min: Vec3::new(-e - t, 0.0, -e),
            max: Vec3::new(-e, h, e),
            color: WALL_COLOR,
        },
        StaticPiece {
            min: Vec3::new(-e, 0.0, e),
            max: Vec3::new(e, h, e + t),
            color: WALL_COLOR,
        },
        StaticPiece {
            min: Vec3::new(-e, 0.0, -e - t),
            max: Vec3::new(e, h, -e),
            color: WALL_COLOR,
        },
    ];

    // Corner pillars
    let p = e - 1.5;
    for (x, z) in [(p, p), (p, -p), (-p, p), (-p, -p)] {
        pieces.push(StaticPiece {
            min: Vec3::new(x - 0.3, 0.0, z - 0.3),
            max: Vec3::new(x + 0.3, h, z + 0.3),
            color: PILLAR_COLOR,
        });
    }

    pieces
}

/// Build the room so that object indices line up with the animation ranges
///
/// Index 0 is the floor. Risers fill `riser_range`, oscillators fill
/// `oscillator_range`, and the remaining static pieces follow the last
/// animated index. Gaps between ranges receive static pieces as well.
pub fn build_room(layout: &RoomLayout, params: &AnimationParams) -> Scene {
    let mut mesh = MeshBuilder::new();
    let mut objects = Vec::new();
    let mut statics = static_pieces(layout).into_iter();

    let riser_count = params.riser_count();
    let animated_end = (*params.riser_range.end()).max(*params.oscillator_range.end()) + 1;

    let mut index = 0;
    loop {
        let start = mesh.index_cursor();

        let role = if params.riser_range.contains(&index) {
            let k = index - params.riser_range.start();
            let angle = std::f32::consts::TAU * k as f32 / riser_count as f32;
            let center = Vec3::new(angle.cos(), 0.0, angle.sin()) * layout.riser_ring_radius_m;
            let half = layout.riser_width_m / 2.0;
            mesh.add_box(
                center - Vec3::new(half, 0.0, half),
                center + Vec3::new(half, layout.riser_height_m, half),
                RISER_COLOR,
            );
            ObjectRole::Riser
        } else if params.oscillator_range.contains(&index) {
            // Rows by parity, so each row moves as one mirrored block
            let row = index % 2;
            let column = (index - params.oscillator_range.start()) / 2;
            let columns = params.oscillator_count().div_ceil(2);
            let x = (column as f32 - (columns as f32 - 1.0) / 2.0) * layout.oscillator_spacing_m;
            let z = if row == 0 {
                layout.oscillator_row_z_m
            } else {
                -layout.oscillator_row_z_m
            };
            let half = layout.oscillator_width_m / 2.0;
            mesh.add_box(
                Vec3::new(x - half, 0.0, z - half),
                Vec3::new(x + half, layout.oscillator_height_m, z + half),
                OSCILLATOR_COLORS[row],
            );
            ObjectRole::Oscillator
        } else {
            match statics.next() {
                Some(piece) => mesh.add_box(piece.min, piece.max, piece.color),
                None if index >= animated_end => break,
                // Out of static pieces inside a gap: keep the index with no geometry
                None => {}
            }
            ObjectRole::Static
        };

        objects.push(SceneObject {
            role,
            indices: mesh.range_from(start),
        });
        index += 1;
    }

    log::debug!(
        "Room built: {} objects, {} vertices, {} indices",
        objects.len(),
        mesh.vertices.len(),
        mesh.indices.len()
    );

    Scene::new(mesh, objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_room_matches_ranges() {
        let params = AnimationParams::default();
        let scene = build_room(&RoomLayout::default(), &params);

        assert_eq!(scene.objects()[0].role, ObjectRole::Static);
        let risers: Vec<usize> = scene.indices_with_role(ObjectRole::Riser).collect();
        let oscillators: Vec<usize> = scene.indices_with_role(ObjectRole::Oscillator).collect();
        assert_eq!(risers, params.riser_range.clone().collect::<Vec<_>>());
        assert_eq!(oscillators, params.oscillator_range.clone().collect::<Vec<_>>());

        // Floor + 10 risers + 20 oscillators + 4 walls + 4 pillars
        assert_eq!(scene.object_count(), 39);
        assert!(params.validate(scene.object_count()).is_ok());
    }

    #[test]
    fn test_every_object_has_geometry() {
        let scene = build_room(&RoomLayout::default(), &AnimationParams::default());
        for object in scene.objects() {
            assert_eq!(object.indices.len(), 36);
        }
        assert_eq!(scene.positions().len(), scene.object_count());
    }

    #[test]
    fn test_gap_between_ranges_is_static() {
        let params = AnimationParams {
            riser_range: 2..=5,
            riser_pair_offset: 2,
            oscillator_range: 8..=11,
            ..AnimationParams::default()
        };
        let scene = build_room(&RoomLayout::default(), &params);
        for index in [0, 1, 6, 7] {
            assert_eq!(scene.objects()[index].role, ObjectRole::Static);
        }
        assert!(params.validate(scene.object_count()).is_ok());
    }
}
