//! The room: static geometry plus a position table for animated objects.
//!
//! Each object owns a slice of the shared index buffer and a translation
//! offset. The animator only ever touches the offsets.

mod mesh;
mod room;

use std::ops::Range;

use glam::Vec3;

pub use mesh::{MeshBuilder, Vertex};
pub use room::{build_room, RoomLayout};

/// What an object is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    /// Floor, walls and furniture
    Static,
    /// Column that pops up on a beat and sinks back
    Riser,
    /// Bar bobbing with the tempo
    Oscillator,
}

/// Geometry slice of one object
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub role: ObjectRole,
    pub indices: Range<u32>,
}

/// Room geometry and the object position table
pub struct Scene {
    pub mesh: MeshBuilder,
    objects: Vec<SceneObject>,
    positions: Vec<Vec3>,
}

impl Scene {
    pub fn new(mesh: MeshBuilder, objects: Vec<SceneObject>) -> Self {
        let positions = vec![Vec3::ZERO; objects.len()];
        Self {
            mesh,
            objects,
            positions,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Translation offset of every object, by index
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Indices of every object with `role`
    pub fn indices_with_role(&self, role: ObjectRole) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(move |(_, o)| o.role == role)
            .map(|(i, _)| i)
    }
}
