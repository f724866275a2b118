//! Reference motor made of infinite planes.
//!
//! Good enough for flat arenas, ramps and walls in tests and demos. Each
//! plane is solid on its back side.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{CharacterMotor, GroundContact, MotorRequest, MotorResult};

/// An infinite plane, solid behind its normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    /// Any point on the plane.
    pub origin: Vec3,
    /// Unit normal pointing out of the solid side.
    pub normal: Vec3,
}

impl GroundPlane {
    /// Create a plane. The normal is normalized.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
        }
    }

    /// Horizontal floor at height `y`.
    pub fn floor(y: f32) -> Self {
        Self::new(Vec3::new(0.0, y, 0.0), Vec3::Y)
    }

    /// Signed distance of `point` in front of the plane.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }
}

/// Collision world built from [`GroundPlane`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneWorld {
    planes: Vec<GroundPlane>,

    /// Minimum `normal · up` for a surface to count as walkable.
    /// 0.7 ≈ 45 degrees.
    pub min_walkable_dot: f32,

    /// How far above the ground a constrained character is snapped down (meters).
    pub snap_distance: f32,
}

impl Default for PlaneWorld {
    fn default() -> Self {
        Self {
            planes: Vec::new(),
            min_walkable_dot: 0.7,
            snap_distance: 0.05,
        }
    }
}

impl PlaneWorld {
    /// Create an empty world (free fall everywhere).
    pub fn new() -> Self {
        Self::default()
    }

    /// A world with a single floor at `y`.
    pub fn flat(y: f32) -> Self {
        let mut world = Self::new();
        world.add_plane(GroundPlane::floor(y));
        world
    }

    /// Add a plane to the world.
    pub fn add_plane(&mut self, plane: GroundPlane) {
        self.planes.push(plane);
    }

    pub fn planes(&self) -> &[GroundPlane] {
        &self.planes
    }
}

impl CharacterMotor for PlaneWorld {
    fn move_character(&self, request: &MotorRequest) -> MotorResult {
        let mut position = request.position + request.velocity * request.delta_time;
        let mut velocity = request.velocity;
        let mut hit_ground = false;
        let mut is_walkable = false;

        for plane in &self.planes {
            let distance = plane.distance(position);
            let approaching = velocity.dot(plane.normal) <= 0.0;
            let snap = request.constrain_to_ground
                && request.was_on_ground
                && approaching
                && distance <= self.snap_distance;

            if distance >= 0.0 && !snap {
                continue;
            }

            // Push out of the plane and remove the velocity into it
            position -= plane.normal * distance;
            let into = velocity.dot(plane.normal);
            if into < 0.0 {
                velocity -= plane.normal * into;
            }

            let facing = plane.normal.dot(request.up);
            if facing > 0.0 {
                hit_ground = true;
                is_walkable |= facing >= self.min_walkable_dot;
            }
        }

        let landed = hit_ground && is_walkable && !request.was_on_ground;
        MotorResult {
            position,
            velocity,
            hit_ground,
            is_walkable,
            landed_velocity: if landed { request.velocity } else { Vec3::ZERO },
        }
    }

    fn find_ground(&self, position: Vec3, up: Vec3, max_distance: f32) -> Option<GroundContact> {
        let mut best: Option<(f32, GroundContact)> = None;

        for plane in &self.planes {
            let facing = plane.normal.dot(up);
            if facing <= 0.0 {
                continue;
            }
            // Distance along -up until the plane is reached
            let along = plane.distance(position) / facing;
            if along < 0.0 || along > max_distance {
                continue;
            }
            if best.as_ref().is_some_and(|(d, _)| *d <= along) {
                continue;
            }
            best = Some((
                along,
                GroundContact {
                    position: position - up * along,
                    normal: plane.normal,
                    walkable: facing >= self.min_walkable_dot,
                },
            ));
        }

        best.map(|(_, contact)| contact)
    }
}
