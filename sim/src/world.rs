/*!
Static geometry index and the narrow-phase queries run against it.

The world is read-only from the simulation's view: the host builds it once
per level and the movement core only ever casts probes into it. Queries
iterate the surface list in insertion order, which keeps hit aggregation
deterministic across runs (a precondition for input-tape replay).
*/

use nalgebra as na;
use parry2d::query::{self, PointQuery, Ray, RayCast, ShapeCastOptions};
use parry2d::shape as pshape;
use parry2d::shape::Shape;

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Point2 = na::Point2<f32>;
pub type Iso = na::Isometry2<f32>;

/// Handle of a static surface; carried on contact results so jumps can
/// notify the surface they launched from.
pub type SurfaceId = u32;

/// Handle of a traversal wire (owned by an external collaborator).
pub type WireHandle = u32;

/// Handle of a localized fluid blob override.
pub type FluidBlobHandle = u32;

/// A rigid pose in world space. Rotation in degrees, converted at the
/// parry boundary.
#[derive(Clone, Copy, Debug)]
pub struct Pose {
    pub translation: Vec2,
    pub rotation_deg: f32,
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec2, rotation_deg: f32) -> Self {
        Self {
            translation,
            rotation_deg,
        }
    }

    #[inline]
    pub fn axis_aligned(translation: Vec2) -> Self {
        Self::new(translation, 0.0)
    }

    /// Convert to a nalgebra `Isometry2` for parry queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::new(self.translation, self.rotation_deg.to_radians())
    }
}

/// Static collision shapes supported by the world.
#[derive(Clone, Copy, Debug)]
pub enum StaticShape {
    Cuboid {
        /// Local-space half-extents.
        half_extents: Vec2,
        /// World-space pose.
        pose: Pose,
    },
    Ball {
        radius: f32,
        /// World-space pose (translation used; rotation irrelevant).
        pose: Pose,
    },
}

impl StaticShape {
    #[inline]
    fn iso(&self) -> Iso {
        match self {
            StaticShape::Cuboid { pose, .. } | StaticShape::Ball { pose, .. } => pose.iso(),
        }
    }
}

/// One static surface: geometry plus the material data the character
/// samples on contact.
#[derive(Clone, Copy, Debug)]
pub struct Surface {
    pub id: SurfaceId,
    pub shape: StaticShape,
    /// Surface friction in `[0, 10]`; 10 is the grippy default, values
    /// below 1 read as ice.
    pub friction: f32,
    /// Whether touching this surface kills the character (spikes).
    pub lethal: bool,
}

/// One fluid volume (water layer).
#[derive(Clone, Copy, Debug)]
pub struct FluidVolume {
    pub id: u32,
    pub shape: StaticShape,
}

/// The static geometry index for one level.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub surfaces: Vec<Surface>,
    pub fluids: Vec<FluidVolume>,
}

/// A single contact result from a shape cast.
#[derive(Clone, Copy, Debug)]
pub struct CastHit {
    /// World-space contact normal on the moving probe.
    pub normal: Vec2,
    /// Fraction (0..1) of the tested translation where the hit occurred.
    pub fraction: f32,
    pub surface: SurfaceId,
    pub friction: f32,
}

/// Result of a directional fluid probe.
#[derive(Clone, Copy, Debug)]
pub struct FluidHit {
    /// Distance along the cast to the fluid boundary; zero means the probe
    /// started inside.
    pub distance: f32,
    /// Boundary normal on the probe.
    pub normal: Vec2,
}

impl World {
    pub fn new(surfaces: Vec<Surface>, fluids: Vec<FluidVolume>) -> Self {
        Self { surfaces, fluids }
    }

    /// Cast a probe shape along `vel` and collect one hit per surface, in
    /// surface order. Lethal surfaces are included; the caller filters.
    pub fn cast_probe(&self, probe: &dyn Shape, probe_iso: Iso, vel: Vec2) -> Vec<CastHit> {
        let mut hits = Vec::new();
        for surface in &self.surfaces {
            if let Some(hit) = cast_probe_against_surface(probe_iso, probe, vel, surface) {
                hits.push(hit);
            }
        }
        hits
    }

    /// Does the probe shape overlap any surface?
    pub fn overlaps_any(&self, probe: &dyn Shape, probe_iso: Iso) -> bool {
        for surface in &self.surfaces {
            let overlap = match surface.shape {
                StaticShape::Cuboid { half_extents, .. } => query::intersection_test(
                    &probe_iso,
                    probe,
                    &surface.shape.iso(),
                    &pshape::Cuboid::new(half_extents),
                ),
                StaticShape::Ball { radius, .. } => query::intersection_test(
                    &probe_iso,
                    probe,
                    &surface.shape.iso(),
                    &pshape::Ball::new(radius),
                ),
            };
            if matches!(overlap, Ok(true)) {
                return true;
            }
        }
        false
    }

    /// Nearest surface hit along a thin ray, if any within `max_dist`.
    pub fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32) -> Option<CastHit> {
        let ray = Ray::new(Point2::from(origin), dir);
        let mut best: Option<CastHit> = None;
        for surface in &self.surfaces {
            let hit = match surface.shape {
                StaticShape::Cuboid { half_extents, .. } => pshape::Cuboid::new(half_extents)
                    .cast_ray_and_get_normal(&surface.shape.iso(), &ray, max_dist, true),
                StaticShape::Ball { radius, .. } => pshape::Ball::new(radius)
                    .cast_ray_and_get_normal(&surface.shape.iso(), &ray, max_dist, true),
            };
            if let Some(hit) = hit {
                let fraction = hit.time_of_impact / max_dist.max(1.0e-6);
                if best.map_or(true, |b| fraction < b.fraction) {
                    best = Some(CastHit {
                        normal: hit.normal,
                        fraction,
                        surface: surface.id,
                        friction: surface.friction,
                    });
                }
            }
        }
        best
    }

    /// Does a cast of `probe` along `vel` touch any lethal surface?
    pub fn hazard_cast(&self, probe: &dyn Shape, probe_iso: Iso, vel: Vec2) -> bool {
        self.surfaces
            .iter()
            .filter(|s| s.lethal)
            .any(|s| cast_probe_against_surface(probe_iso, probe, vel, s).is_some())
    }

    /// Is this world point inside any fluid volume?
    pub fn fluid_at_point(&self, point: Vec2) -> bool {
        let p = Point2::from(point);
        self.fluids.iter().any(|fluid| match fluid.shape {
            StaticShape::Cuboid { half_extents, .. } => {
                pshape::Cuboid::new(half_extents).contains_point(&fluid.shape.iso(), &p)
            }
            StaticShape::Ball { radius, .. } => {
                pshape::Ball::new(radius).contains_point(&fluid.shape.iso(), &p)
            }
        })
    }

    /// Cast a thin box from `center` along `dir` against the fluid layer and
    /// return the earliest boundary hit.
    pub fn fluid_cast(
        &self,
        center: Vec2,
        half_extents: Vec2,
        dir: Vec2,
        max_dist: f32,
    ) -> Option<FluidHit> {
        let probe = pshape::Cuboid::new(half_extents);
        let probe_iso = Iso::new(center, 0.0);
        let vel = dir * max_dist;

        let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
        opts.stop_at_penetration = true;

        let mut best: Option<FluidHit> = None;
        for fluid in &self.fluids {
            let result = match fluid.shape {
                StaticShape::Cuboid { half_extents, .. } => query::cast_shapes(
                    &probe_iso,
                    &vel,
                    &probe as &dyn Shape,
                    &fluid.shape.iso(),
                    &Vec2::zeros(),
                    &pshape::Cuboid::new(half_extents) as &dyn Shape,
                    opts,
                ),
                StaticShape::Ball { radius, .. } => query::cast_shapes(
                    &probe_iso,
                    &vel,
                    &probe as &dyn Shape,
                    &fluid.shape.iso(),
                    &Vec2::zeros(),
                    &pshape::Ball::new(radius) as &dyn Shape,
                    opts,
                ),
            };
            if let Ok(Some(hit)) = result {
                let distance = hit.time_of_impact * max_dist;
                if best.map_or(true, |b| distance < b.distance) {
                    let mut normal = hit.normal1.into_inner();
                    if normal.dot(&dir) > 0.0 {
                        normal = -normal;
                    }
                    best = Some(FluidHit { distance, normal });
                }
            }
        }
        best
    }
}

/// Cast a moving probe against a single static surface and return the
/// earliest hit (if any).
///
/// The impact normal is taken on the moving probe and flipped, if needed,
/// to oppose the motion.
fn cast_probe_against_surface(
    probe_iso: Iso,
    probe: &dyn Shape,
    vel: Vec2,
    surface: &Surface,
) -> Option<CastHit> {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
    opts.stop_at_penetration = true;

    let result = match surface.shape {
        StaticShape::Cuboid { half_extents, .. } => query::cast_shapes(
            &probe_iso,
            &vel,
            probe,
            &surface.shape.iso(),
            &Vec2::zeros(),
            &pshape::Cuboid::new(half_extents) as &dyn Shape,
            opts,
        ),
        StaticShape::Ball { radius, .. } => query::cast_shapes(
            &probe_iso,
            &vel,
            probe,
            &surface.shape.iso(),
            &Vec2::zeros(),
            &pshape::Ball::new(radius) as &dyn Shape,
            opts,
        ),
    };

    if let Ok(Some(hit)) = result {
        let mut normal = hit.normal1.into_inner();
        if normal.dot(&vel) > 0.0 {
            normal = -normal;
        }
        return Some(CastHit {
            normal,
            fraction: hit.time_of_impact,
            surface: surface.id,
            friction: surface.friction,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::DEFAULT_SURFACE_FRICTION;

    /// A 20x1 floor slab with its top face at y = 0.
    fn floor() -> Surface {
        Surface {
            id: 1,
            shape: StaticShape::Cuboid {
                half_extents: Vec2::new(10.0, 0.5),
                pose: Pose::axis_aligned(Vec2::new(0.0, -0.5)),
            },
            friction: DEFAULT_SURFACE_FRICTION,
            lethal: false,
        }
    }

    fn world_with_floor() -> World {
        World::new(vec![floor()], Vec::new())
    }

    #[test]
    fn downward_cast_hits_floor_with_up_normal() {
        let world = world_with_floor();
        let probe = pshape::Ball::new(0.4);
        let hits = world.cast_probe(
            &probe,
            Iso::new(Vec2::new(0.0, 0.5), 0.0),
            Vec2::new(0.0, -0.5),
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].normal.y > 0.9);
        assert_eq!(hits[0].surface, 1);
    }

    #[test]
    fn cast_away_from_geometry_misses() {
        let world = world_with_floor();
        let probe = pshape::Ball::new(0.4);
        let hits = world.cast_probe(
            &probe,
            Iso::new(Vec2::new(0.0, 0.5), 0.0),
            Vec2::new(0.0, 0.5),
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn overlap_respects_probe_size() {
        let world = world_with_floor();
        let near = pshape::Ball::new(0.6);
        let far = pshape::Ball::new(0.3);
        let iso = Iso::new(Vec2::new(0.0, 0.5), 0.0);
        assert!(world.overlaps_any(&near, iso));
        assert!(!world.overlaps_any(&far, iso));
    }

    #[test]
    fn hazard_cast_only_reports_lethal_surfaces() {
        let mut world = world_with_floor();
        world.surfaces.push(Surface {
            id: 2,
            shape: StaticShape::Cuboid {
                half_extents: Vec2::new(0.5, 0.5),
                pose: Pose::axis_aligned(Vec2::new(3.0, 0.5)),
            },
            friction: DEFAULT_SURFACE_FRICTION,
            lethal: true,
        });
        let probe = pshape::Ball::new(0.1);

        // Toward the spikes: hit. Straight down onto the benign floor: miss.
        assert!(world.hazard_cast(
            &probe,
            Iso::new(Vec2::new(2.0, 0.5), 0.0),
            Vec2::new(1.5, 0.0)
        ));
        assert!(!world.hazard_cast(
            &probe,
            Iso::new(Vec2::new(0.0, 0.5), 0.0),
            Vec2::new(0.0, -1.0)
        ));
    }

    #[test]
    fn fluid_point_and_cast_queries() {
        let world = World::new(
            Vec::new(),
            vec![FluidVolume {
                id: 1,
                shape: StaticShape::Cuboid {
                    half_extents: Vec2::new(2.0, 1.0),
                    pose: Pose::axis_aligned(Vec2::new(0.0, -1.0)),
                },
            }],
        );

        assert!(world.fluid_at_point(Vec2::new(0.0, -0.5)));
        assert!(!world.fluid_at_point(Vec2::new(0.0, 0.5)));

        // Probe from above the pool, casting down: boundary at y = 0.
        let hit = world
            .fluid_cast(
                Vec2::new(0.0, 1.0),
                Vec2::new(0.5, 0.05),
                Vec2::new(0.0, -1.0),
                2.0,
            )
            .expect("pool below should be hit");
        assert!(hit.distance > 0.5 && hit.distance < 1.5);
    }

    #[test]
    fn raycast_reports_nearest_surface() {
        let mut world = world_with_floor();
        world.surfaces.push(Surface {
            id: 7,
            shape: StaticShape::Cuboid {
                half_extents: Vec2::new(10.0, 0.5),
                pose: Pose::axis_aligned(Vec2::new(0.0, -3.0)),
            },
            friction: 0.2,
            lethal: false,
        });
        let hit = world
            .raycast(Vec2::new(0.0, 1.0), Vec2::new(0.0, -1.0), 5.0)
            .expect("floor below");
        assert_eq!(hit.surface, 1);
    }
}
