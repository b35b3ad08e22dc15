/*!
Per-tick contact sensing.

Four directional probes (toward gravity, away from gravity, local left and
right) each cast the character's two collision primitives, the round
profile and the oriented square profile, against the static world and
aggregate the results into per-direction contact normals, contacted-surface
handles and a friction sample.

Two variants of the wall contacts exist side by side:
- `frame_*` normals are the raw cast result of this tick;
- the plain normals are debounced: a candidate is dropped while the
  corresponding suppression timer runs (the character deliberately left that
  surface) or when it isn't wall-like enough (alignment with the horizontal
  axis below [`tuning::WALL_NORMAL_MIN_ALIGNMENT`]).

A zero vector is the "no contact" sentinel throughout.
*/

use parry2d::shape as pshape;

use crate::body::Body;
use crate::config::MoverConfig;
use crate::tuning::{
    ALMOST_NEAR_MARGIN, NEAR_MARGIN, ROUND_RADIUS_ROUND, ROUND_RADIUS_SQUARE, SQUARE_SIZE_ROUND,
    SQUARE_SIZE_SQUARE, WALL_NORMAL_MIN_ALIGNMENT, WHISKER_OFFSET, WHISKER_RANGE,
};
use crate::utils::lerp;
use crate::world::{CastHit, Iso, SurfaceId, Vec2, World};

#[derive(Clone, Debug, Default)]
pub struct ContactTracker {
    /// Aggregated ground normal for this tick (zero = airborne).
    pub surface_normal: Vec2,
    /// Last non-zero ground normal; steers the slope-adaptive probe length.
    pub last_surface_normal: Vec2,
    pub ground_surface: Option<SurfaceId>,
    /// Raw down-probe result before coyote filtering.
    pub frame_grounded: bool,

    pub frame_left_normal: Vec2,
    pub last_frame_left_normal: Vec2,
    /// Debounced left-wall normal.
    pub left_normal: Vec2,
    pub last_left_normal: Vec2,
    pub left_surface: Option<SurfaceId>,

    pub frame_right_normal: Vec2,
    pub last_frame_right_normal: Vec2,
    /// Debounced right-wall normal.
    pub right_normal: Vec2,
    pub last_right_normal: Vec2,
    pub right_surface: Option<SurfaceId>,

    pub ceiling_normal: Vec2,
    pub ceiling_surface: Option<SurfaceId>,

    /// Whisker rays: thin probes toward gravity at a horizontal offset,
    /// used by slope-stick and the sharp-turn detector.
    pub whisker_left: bool,
    pub whisker_right: bool,

    /// Proximity flags at two radii, consumed by the ledge roll-over logic.
    pub near_geometry: bool,
    pub almost_near_geometry: bool,
}

/// What the tracker hands back besides its updated fields.
#[derive(Clone, Copy, Debug)]
pub struct TraceResult {
    /// Mean friction over this tick's contact samples, if any were taken.
    pub friction_sample: Option<f32>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every contact (character reset).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn is_left_supported(&self) -> bool {
        self.left_normal != Vec2::zeros()
    }

    #[inline]
    pub fn is_right_supported(&self) -> bool {
        self.right_normal != Vec2::zeros()
    }

    #[inline]
    pub fn is_wall_supported(&self) -> bool {
        self.is_left_supported() || self.is_right_supported()
    }

    #[inline]
    pub fn was_left_supported(&self) -> bool {
        self.last_left_normal != Vec2::zeros()
    }

    #[inline]
    pub fn was_right_supported(&self) -> bool {
        self.last_right_normal != Vec2::zeros()
    }

    #[inline]
    pub fn was_wall_supported(&self) -> bool {
        self.was_left_supported() || self.was_right_supported()
    }

    #[inline]
    pub fn is_frame_left_supported(&self) -> bool {
        self.frame_left_normal != Vec2::zeros()
    }

    #[inline]
    pub fn is_frame_right_supported(&self) -> bool {
        self.frame_right_normal != Vec2::zeros()
    }

    #[inline]
    pub fn was_frame_left_supported(&self) -> bool {
        self.last_frame_left_normal != Vec2::zeros()
    }

    #[inline]
    pub fn was_frame_right_supported(&self) -> bool {
        self.last_frame_right_normal != Vec2::zeros()
    }

    /// Both opposing walls engaged at once (the wedge).
    #[inline]
    pub fn is_wedged(&self) -> bool {
        self.is_frame_left_supported() && self.is_frame_right_supported()
    }

    #[inline]
    pub fn has_ceiling_contact(&self) -> bool {
        self.ceiling_normal != Vec2::zeros()
    }

    /// Run the four directional probes for this tick.
    ///
    /// `shape_blend` interpolates the probe primitives between the square
    /// and round profiles; `suppress_left`/`suppress_right` reflect the
    /// per-side debounce timers; `has_jumped` disables the slope-adaptive
    /// ground-probe extension mid-jump.
    pub fn trace(
        &mut self,
        world: &World,
        body: &Body,
        cfg: &MoverConfig,
        shape_blend: f32,
        suppress_left: bool,
        suppress_right: bool,
        has_jumped: bool,
    ) -> TraceResult {
        let round_radius = lerp(ROUND_RADIUS_SQUARE, ROUND_RADIUS_ROUND, shape_blend);
        let square_size = lerp(SQUARE_SIZE_SQUARE, SQUARE_SIZE_ROUND, shape_blend);

        let ball = pshape::Ball::new((round_radius - cfg.cast_offset).max(0.01));
        let half = ((square_size - 2.0 * cfg.cast_offset) * 0.5).max(0.01);
        let cuboid = pshape::Cuboid::new(Vec2::new(half, half));

        let ball_iso = Iso::new(body.position, 0.0);
        let box_iso = Iso::new(body.position, body.rotation_deg.to_radians());

        // The square probe's effective reach grows as the body rotates off
        // axis (its corner leads the cast instead of its face).
        let corner_lead = lerp(
            1.0,
            1.414,
            (body.rotation_deg.rem_euclid(90.0) * 2.0).to_radians().sin(),
        );

        let gravity_dir = body.gravity_dir();
        let mut friction_sum = 0.0;
        let mut friction_samples = 0u32;

        // Proximity flags at two margins.
        self.near_geometry = self.check_near(world, body, round_radius, square_size, NEAR_MARGIN);
        self.almost_near_geometry =
            self.check_near(world, body, round_radius, square_size, ALMOST_NEAR_MARGIN);

        // Ground probe, with slope-adaptive length: on walkable slopes the
        // probe reaches further so rolling down a slope break keeps contact,
        // but past the walkable limit the extension cuts off so mid-rotation
        // casts don't catch unrelated geometry.
        if self.surface_normal != Vec2::zeros() {
            self.last_surface_normal = self.surface_normal;
        }
        let mut test_distance = cfg.ground_test_distance;
        if !has_jumped && self.last_surface_normal.y > 0.7 {
            test_distance *= crate::utils::remap(0.7, 1.0, 5.0, 1.0, self.last_surface_normal.y);
        }

        let ball_hits = world.cast_probe(
            &ball,
            ball_iso,
            gravity_dir * (cfg.cast_offset + test_distance),
        );
        let box_hits = world.cast_probe(
            &cuboid,
            box_iso,
            gravity_dir * (cfg.cast_offset * corner_lead + test_distance),
        );

        self.frame_grounded = !ball_hits.is_empty() || !box_hits.is_empty();
        if self.frame_grounded {
            let mut normal = Vec2::zeros();
            for hit in ball_hits.iter().chain(box_hits.iter()) {
                normal += hit.normal;
                friction_sum += hit.friction;
                friction_samples += 1;
                if self.ground_surface.is_none() {
                    self.ground_surface = Some(hit.surface);
                }
            }
            if normal.norm_squared() > 0.0 {
                normal.normalize_mut();
            }
            self.surface_normal = normal;
        } else {
            self.surface_normal = Vec2::zeros();
            self.ground_surface = None;
        }
        let sample_wall_friction = self.ground_surface.is_none();

        // Left wall.
        self.last_left_normal = self.left_normal;
        self.left_normal = Vec2::zeros();
        self.last_frame_left_normal = self.frame_left_normal;
        self.frame_left_normal = Vec2::zeros();

        let left = self.trace_wall(
            world,
            &ball,
            ball_iso,
            &cuboid,
            box_iso,
            Vec2::new(-1.0, 0.0),
            cfg.cast_offset,
            corner_lead,
            cfg.wall_test_distance,
        );
        if let Some((normal, surface, sum, count)) = left {
            self.frame_left_normal = normal;
            if self.left_surface.is_none() {
                self.left_surface = Some(surface);
            }
            if sample_wall_friction {
                friction_sum += sum;
                friction_samples += count;
            }
            // Reject anything that isn't wall-like enough, and anything on a
            // side the character just deliberately left.
            if !suppress_left && normal.dot(&Vec2::new(1.0, 0.0)) > WALL_NORMAL_MIN_ALIGNMENT {
                self.left_normal = normal;
            }
        } else {
            self.left_surface = None;
        }

        // Right wall.
        self.last_right_normal = self.right_normal;
        self.right_normal = Vec2::zeros();
        self.last_frame_right_normal = self.frame_right_normal;
        self.frame_right_normal = Vec2::zeros();

        let right = self.trace_wall(
            world,
            &ball,
            ball_iso,
            &cuboid,
            box_iso,
            Vec2::new(1.0, 0.0),
            cfg.cast_offset,
            corner_lead,
            cfg.wall_test_distance,
        );
        if let Some((normal, surface, sum, count)) = right {
            self.frame_right_normal = normal;
            if self.right_surface.is_none() {
                self.right_surface = Some(surface);
            }
            if sample_wall_friction {
                friction_sum += sum;
                friction_samples += count;
            }
            if !suppress_right && normal.dot(&Vec2::new(-1.0, 0.0)) > WALL_NORMAL_MIN_ALIGNMENT {
                self.right_normal = normal;
            }
        } else {
            self.right_surface = None;
        }

        // Ceiling (away from gravity). No angle filter and no debounce; the
        // jump logic gates on it directly.
        let up_hits_ball = world.cast_probe(
            &ball,
            ball_iso,
            -gravity_dir * (cfg.cast_offset + cfg.ceiling_test_distance),
        );
        let up_hits_box = world.cast_probe(
            &cuboid,
            box_iso,
            -gravity_dir * (cfg.cast_offset * corner_lead + cfg.ceiling_test_distance),
        );
        if up_hits_ball.is_empty() && up_hits_box.is_empty() {
            self.ceiling_normal = Vec2::zeros();
            self.ceiling_surface = None;
        } else {
            let mut normal = Vec2::zeros();
            for hit in up_hits_ball.iter().chain(up_hits_box.iter()) {
                normal += hit.normal;
                if self.ceiling_surface.is_none() {
                    self.ceiling_surface = Some(hit.surface);
                }
            }
            if normal.norm_squared() > 0.0 {
                normal.normalize_mut();
            }
            self.ceiling_normal = normal;
        }

        // Whisker rays.
        self.whisker_right = world
            .raycast(
                body.position + Vec2::new(WHISKER_OFFSET, 0.0),
                gravity_dir,
                WHISKER_RANGE,
            )
            .is_some();
        self.whisker_left = world
            .raycast(
                body.position + Vec2::new(-WHISKER_OFFSET, 0.0),
                gravity_dir,
                WHISKER_RANGE,
            )
            .is_some();

        TraceResult {
            friction_sample: (friction_samples > 0)
                .then(|| friction_sum / friction_samples as f32),
        }
    }

    /// Cast both probe primitives sideways and aggregate. Returns the
    /// normalized summed normal, the first contacted surface, and the
    /// friction sum/sample count.
    #[allow(clippy::too_many_arguments)]
    fn trace_wall(
        &self,
        world: &World,
        ball: &pshape::Ball,
        ball_iso: Iso,
        cuboid: &pshape::Cuboid,
        box_iso: Iso,
        dir: Vec2,
        cast_offset: f32,
        corner_lead: f32,
        test_distance: f32,
    ) -> Option<(Vec2, SurfaceId, f32, u32)> {
        let ball_hits = world.cast_probe(ball, ball_iso, dir * (cast_offset + test_distance));
        let box_hits = world.cast_probe(
            cuboid,
            box_iso,
            dir * (cast_offset * corner_lead + test_distance),
        );
        if ball_hits.is_empty() && box_hits.is_empty() {
            return None;
        }

        let mut normal = Vec2::zeros();
        let mut friction_sum = 0.0;
        let mut count = 0u32;
        let mut surface: Option<&CastHit> = None;
        for hit in ball_hits.iter().chain(box_hits.iter()) {
            normal += hit.normal;
            friction_sum += hit.friction;
            count += 1;
            if surface.is_none() {
                surface = Some(hit);
            }
        }
        if normal.norm_squared() > 0.0 {
            normal.normalize_mut();
        }
        surface.map(|hit| (normal, hit.surface, friction_sum, count))
    }

    fn check_near(
        &self,
        world: &World,
        body: &Body,
        round_radius: f32,
        square_size: f32,
        margin: f32,
    ) -> bool {
        let ball = pshape::Ball::new(round_radius + margin);
        let half = (square_size + margin) * 0.5;
        let cuboid = pshape::Cuboid::new(Vec2::new(half, half));
        world.overlaps_any(&ball, Iso::new(body.position, 0.0))
            || world.overlaps_any(
                &cuboid,
                Iso::new(body.position, body.rotation_deg.to_radians()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::DEFAULT_SURFACE_FRICTION;
    use crate::world::{Pose, StaticShape, Surface};

    fn surface(id: SurfaceId, center: Vec2, half: Vec2) -> Surface {
        Surface {
            id,
            shape: StaticShape::Cuboid {
                half_extents: half,
                pose: Pose::axis_aligned(center),
            },
            friction: DEFAULT_SURFACE_FRICTION,
            lethal: false,
        }
    }

    /// Floor top at y=0; body resting with center at y=0.5.
    fn floor_world() -> World {
        World::new(
            vec![surface(1, Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0))],
            Vec::new(),
        )
    }

    fn resting_body() -> Body {
        Body::new(Vec2::new(0.0, 0.5))
    }

    fn trace_default(tracker: &mut ContactTracker, world: &World, body: &Body) -> TraceResult {
        tracker.trace(world, body, &MoverConfig::default(), 0.0, false, false, false)
    }

    #[test]
    fn resting_on_floor_reads_grounded_with_up_normal() {
        let world = floor_world();
        let mut tracker = ContactTracker::new();
        let result = trace_default(&mut tracker, &world, &resting_body());

        assert!(tracker.frame_grounded);
        assert!(tracker.surface_normal.y > 0.99);
        assert_eq!(tracker.ground_surface, Some(1));
        assert_eq!(result.friction_sample, Some(DEFAULT_SURFACE_FRICTION));
        assert!(!tracker.is_wall_supported());
        assert!(!tracker.has_ceiling_contact());
    }

    #[test]
    fn airborne_body_reads_nothing() {
        let world = floor_world();
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 5.0));
        let result = trace_default(&mut tracker, &world, &body);

        assert!(!tracker.frame_grounded);
        assert_eq!(tracker.surface_normal, Vec2::zeros());
        assert!(result.friction_sample.is_none());
        assert!(!tracker.near_geometry);
    }

    #[test]
    fn wall_contact_sets_frame_and_debounced_normals() {
        let mut world = floor_world();
        // Wall face at x = 0.7, to the right of a body at x=0.
        world
            .surfaces
            .push(surface(2, Vec2::new(1.7, 2.0), Vec2::new(1.0, 4.0)));
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        trace_default(&mut tracker, &world, &body);

        assert!(tracker.is_frame_right_supported());
        assert!(tracker.is_right_supported());
        assert!(tracker.right_normal.x < -0.9);
        assert_eq!(tracker.right_surface, Some(2));
        assert!(!tracker.is_left_supported());
    }

    #[test]
    fn suppression_timer_blocks_debounced_wall_only() {
        let mut world = floor_world();
        world
            .surfaces
            .push(surface(2, Vec2::new(1.7, 2.0), Vec2::new(1.0, 4.0)));
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        tracker.trace(&world, &body, &MoverConfig::default(), 0.0, false, true, false);

        assert!(tracker.is_frame_right_supported());
        assert!(!tracker.is_right_supported());
    }

    #[test]
    fn steep_ledge_normal_is_rejected_by_alignment_filter() {
        // A 45-degree ramp to the right: its face normal points up-left at
        // ~(-0.707, 0.707), so the alignment gate must reject it while the
        // frame normal still records the contact.
        let mut world = floor_world();
        world.surfaces.push(Surface {
            id: 3,
            shape: StaticShape::Cuboid {
                half_extents: Vec2::new(1.0, 1.0),
                pose: Pose::new(Vec2::new(1.4, -0.2), 45.0),
            },
            friction: DEFAULT_SURFACE_FRICTION,
            lethal: false,
        });
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        trace_default(&mut tracker, &world, &body);

        assert!(tracker.is_frame_right_supported());
        assert!(!tracker.is_right_supported());
    }

    #[test]
    fn ceiling_probe_sees_overhead_slab() {
        let mut world = floor_world();
        world
            .surfaces
            .push(surface(4, Vec2::new(0.0, 2.0), Vec2::new(20.0, 1.0)));
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        trace_default(&mut tracker, &world, &body);

        assert!(tracker.has_ceiling_contact());
        assert!(tracker.ceiling_normal.y < -0.9);
        assert_eq!(tracker.ceiling_surface, Some(4));
    }

    #[test]
    fn wedge_needs_both_frame_walls() {
        let mut world = floor_world();
        world
            .surfaces
            .push(surface(2, Vec2::new(1.7, 2.0), Vec2::new(1.0, 4.0)));
        world
            .surfaces
            .push(surface(3, Vec2::new(-1.7, 2.0), Vec2::new(1.0, 4.0)));
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        trace_default(&mut tracker, &world, &body);

        assert!(tracker.is_wedged());
        // Debounced wedge: both sides read supported; the state machine's
        // wedge branch owns the exception handling.
        assert!(tracker.is_left_supported() && tracker.is_right_supported());
    }

    #[test]
    fn near_flags_have_two_distinct_radii() {
        let world = floor_world();
        let mut tracker = ContactTracker::new();
        // Hovering: outside the tight margin, inside the loose one.
        let body = Body::new(Vec2::new(0.0, 0.62));
        trace_default(&mut tracker, &world, &body);
        assert!(!tracker.near_geometry);
        assert!(tracker.almost_near_geometry);
    }

    #[test]
    fn whiskers_see_ground_beside_the_body() {
        let world = floor_world();
        let mut tracker = ContactTracker::new();
        let body = Body::new(Vec2::new(0.0, 0.5));
        trace_default(&mut tracker, &world, &body);
        assert!(tracker.whisker_left && tracker.whisker_right);
    }
}
