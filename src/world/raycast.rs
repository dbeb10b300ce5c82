//! Block picking: 3D-DDA voxel traversal.
//!
//! Walks the ray cell by cell by always advancing across the nearest cell
//! boundary, so thin walls can never be skipped regardless of step size.
//! The face through which the ray entered the hit cell falls out of which
//! axis owned the smallest boundary crossing.

use super::World;
use bevy::math::{IVec3, Vec3};

/// Result of a block raycast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaycastHit {
    /// The first solid cell along the ray.
    pub cell: IVec3,
    /// Unit normal of the face crossed to enter the cell (zero when the
    /// ray origin already sat inside a solid cell).
    pub normal: IVec3,
}

impl RaycastHit {
    /// Cell in which a block would be placed against the hit face.
    #[must_use]
    pub fn adjacent_cell(&self) -> IVec3 {
        self.cell + self.normal
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_i32(v: f32) -> i32 {
    v.floor() as i32
}

impl World {
    /// Cast a ray from `origin` along `direction` for up to `max_distance`
    /// blocks and return the first solid cell with its entry face.
    #[must_use]
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut cell = IVec3::new(floor_i32(origin.x), floor_i32(origin.y), floor_i32(origin.z));
        if self.get_block(cell.x, cell.y, cell.z).kind.is_solid() {
            return Some(RaycastHit { cell, normal: IVec3::ZERO });
        }

        let step = IVec3::new(
            if dir.x > 0.0 { 1 } else { -1 },
            if dir.y > 0.0 { 1 } else { -1 },
            if dir.z > 0.0 { 1 } else { -1 },
        );

        // Distance along the ray to the first boundary, per axis.
        let boundary = |origin: f32, cell: i32, step: i32| -> f32 {
            if step > 0 {
                (cell + 1) as f32 - origin
            } else {
                origin - cell as f32
            }
        };
        let mut t_max = Vec3::new(
            safe_div(boundary(origin.x, cell.x, step.x), dir.x.abs()),
            safe_div(boundary(origin.y, cell.y, step.y), dir.y.abs()),
            safe_div(boundary(origin.z, cell.z, step.z), dir.z.abs()),
        );
        let t_delta = Vec3::new(
            safe_div(1.0, dir.x.abs()),
            safe_div(1.0, dir.y.abs()),
            safe_div(1.0, dir.z.abs()),
        );

        loop {
            // Advance across whichever boundary comes first.
            let (t, axis) = if t_max.x <= t_max.y && t_max.x <= t_max.z {
                (t_max.x, 0)
            } else if t_max.y <= t_max.z {
                (t_max.y, 1)
            } else {
                (t_max.z, 2)
            };
            if t > max_distance {
                return None;
            }
            match axis {
                0 => {
                    cell.x += step.x;
                    t_max.x += t_delta.x;
                }
                1 => {
                    cell.y += step.y;
                    t_max.y += t_delta.y;
                }
                2 => {
                    cell.z += step.z;
                    t_max.z += t_delta.z;
                }
                _ => unreachable!(),
            }
            if self.get_block(cell.x, cell.y, cell.z).kind.is_solid() {
                let mut normal = IVec3::ZERO;
                match axis {
                    0 => normal.x = -step.x,
                    1 => normal.y = -step.y,
                    _ => normal.z = -step.z,
                }
                return Some(RaycastHit { cell, normal });
            }
        }
    }
}

fn safe_div(n: f32, d: f32) -> f32 {
    if d.abs() < f32::EPSILON {
        f32::INFINITY
    } else {
        n / d
    }
}
