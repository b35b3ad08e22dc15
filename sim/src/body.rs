//! Kinematic state of the character body and its force integration.
//!
//! The body is exclusively owned and mutated by the movement state machine
//! during its tick; the host only reads it. Collision response and
//! depenetration stay with the underlying physics layer.
//!
//! Conventions
//! - Unit mass; forces and accelerations coincide.
//! - Rotation and spin are tracked in degrees to match the tuned torque
//!   constants; torques pass through the unit-box inertia and are converted
//!   at the integration boundary.
//! - The gravity scale's sign encodes the gravity direction.

use crate::tuning::{GRAVITY, ROTATIONAL_INERTIA};
use crate::world::Vec2;

#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub position: Vec2,
    /// Rotation about the out-of-screen axis, degrees.
    pub rotation_deg: f32,
    pub velocity: Vec2,
    /// Spin, degrees per second.
    pub angular_velocity: f32,
    /// +1 normal gravity, -1 inverted.
    pub gravity_scale: f32,
    /// Spin damping applied at integration (Unity-style `1/(1 + d*dt)`).
    pub angular_drag: f32,

    force: Vec2,
    torque: f32,
}

impl Body {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            rotation_deg: 0.0,
            velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            angular_drag: 0.2,
            force: Vec2::zeros(),
            torque: 0.0,
        }
    }

    /// World gravity acceleration including the scale sign.
    #[inline]
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, -GRAVITY) * self.gravity_scale
    }

    #[inline]
    pub fn gravity_dir(&self) -> Vec2 {
        Vec2::new(0.0, -self.gravity_scale.signum())
    }

    #[inline]
    pub fn gravity_sign(&self) -> f32 {
        self.gravity_scale.signum()
    }

    #[inline]
    pub fn is_gravity_inverted(&self) -> bool {
        self.gravity_scale < 0.0
    }

    /// Accumulate a continuous force for this tick.
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Apply an impulse: velocity changes immediately, within the tick.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    /// Accumulate a continuous torque (N·m equivalent) for this tick.
    #[inline]
    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// Apply a torque impulse: spin changes immediately.
    #[inline]
    pub fn apply_torque_impulse(&mut self, torque: f32) {
        self.angular_velocity += (torque / ROTATIONAL_INERTIA).to_degrees();
    }

    /// Impulse applied at a world-space point; the off-center component
    /// becomes a torque impulse about the center.
    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        self.apply_impulse(impulse);
        let arm = point - self.position;
        self.apply_torque_impulse(arm.x * impulse.y - arm.y * impulse.x);
    }

    /// Continuous force applied at a world-space point.
    pub fn apply_force_at(&mut self, force: Vec2, point: Vec2) {
        self.apply_force(force);
        let arm = point - self.position;
        self.apply_torque(arm.x * force.y - arm.y * force.x);
    }

    /// Zero all motion, keeping the pose.
    pub fn stop(&mut self) {
        self.velocity = Vec2::zeros();
        self.angular_velocity = 0.0;
        self.force = Vec2::zeros();
        self.torque = 0.0;
    }

    /// First half of the semi-implicit Euler step: accumulated forces and
    /// gravity change the velocities, and the accumulators reset. Contact
    /// projection runs between this and [`Body::move_pose`].
    pub fn apply_accumulated_forces(&mut self, dt: f32) {
        self.velocity += (self.force + self.gravity()) * dt;
        self.angular_velocity += (self.torque / ROTATIONAL_INERTIA).to_degrees() * dt;
        self.angular_velocity /= 1.0 + self.angular_drag * dt;

        self.force = Vec2::zeros();
        self.torque = 0.0;
    }

    /// Second half of the step: the velocities move the pose.
    pub fn move_pose(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.rotation_deg += self.angular_velocity * dt;
    }

    /// Full semi-implicit Euler step for callers without a contact stage.
    pub fn integrate(&mut self, dt: f32) {
        self.apply_accumulated_forces(dt);
        self.move_pose(dt);
    }

    /// Local +X axis of the rotated body frame.
    #[inline]
    pub fn local_right(&self) -> Vec2 {
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        Vec2::new(cos, sin)
    }

    /// Local +Y axis of the rotated body frame.
    #[inline]
    pub fn local_up(&self) -> Vec2 {
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        Vec2::new(-sin, cos)
    }

    /// Rotation snapped to the nearest 90-degree increment, optionally
    /// offset by whole steps.
    #[inline]
    pub fn nearest_stable_rotation(&self, step_offset: f32) -> f32 {
        ((self.rotation_deg / 90.0).round() + step_offset) * 90.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    #[test]
    fn gravity_follows_scale_sign() {
        let mut body = Body::new(Vec2::zeros());
        assert!(body.gravity().y < 0.0);
        body.gravity_scale = -1.0;
        assert!(body.gravity().y > 0.0);
        assert_relative_eq!(body.gravity_dir().y, 1.0);
    }

    #[test]
    fn impulse_changes_velocity_immediately_force_at_integration() {
        let mut body = Body::new(Vec2::zeros());
        body.apply_impulse(Vec2::new(1.0, 0.0));
        assert_relative_eq!(body.velocity.x, 1.0);

        body.apply_force(Vec2::new(10.0, 0.0));
        assert_relative_eq!(body.velocity.x, 1.0);
        body.integrate(DT);
        assert_relative_eq!(body.velocity.x, 1.0 + 10.0 * DT);
    }

    #[test]
    fn integrate_applies_gravity_and_moves() {
        let mut body = Body::new(Vec2::new(0.0, 5.0));
        body.integrate(DT);
        assert_relative_eq!(body.velocity.y, -GRAVITY * DT);
        assert!(body.position.y < 5.0);
    }

    #[test]
    fn off_center_impulse_produces_spin() {
        let mut body = Body::new(Vec2::zeros());
        // Upward impulse applied to the right of center spins counter-clockwise.
        body.apply_impulse_at(Vec2::new(0.0, 1.0), Vec2::new(0.5, 0.0));
        assert!(body.angular_velocity > 0.0);
        assert_relative_eq!(body.velocity.y, 1.0);
    }

    #[test]
    fn nearest_stable_rotation_rounds_to_quarter_turns() {
        let mut body = Body::new(Vec2::zeros());
        body.rotation_deg = 93.0;
        assert_relative_eq!(body.nearest_stable_rotation(0.0), 90.0);
        body.rotation_deg = 136.0;
        assert_relative_eq!(body.nearest_stable_rotation(0.0), 180.0);
        assert_relative_eq!(body.nearest_stable_rotation(1.0), 270.0);
    }
}
