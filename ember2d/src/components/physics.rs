use crate::entity::{Bounds, Component, EntityId};
use crate::math::Vec2;

/// Velocity integration with gravity, drag and a per-axis speed limit.
///
/// Each update runs, in order: acceleration, gravity, drag, clamp, and
/// finally moves the owning entity by `velocity * dt`.
#[derive(Clone, Debug)]
pub struct PhysicsComponent {
    owner: Option<EntityId>,
    attached: bool,
    velocity: Vec2,
    acceleration: Vec2,
    gravity: f64,
    max_velocity: Vec2,
    drag: f64,
    use_gravity: bool,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            owner: None,
            attached: false,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            gravity: 0.0,
            max_velocity: Vec2::new(1000.0, 1000.0),
            drag: 1.0,
            use_gravity: true,
        }
    }
}

impl PhysicsComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_max_velocity(mut self, max_x: f64, max_y: f64) -> Self {
        self.set_max_velocity(max_x, max_y);
        self
    }

    pub fn with_drag(mut self, drag: f64) -> Self {
        self.set_drag(drag);
        self
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, vx: f64, vy: f64) {
        self.velocity = Vec2::new(vx, vy);
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, ax: f64, ay: f64) {
        self.acceleration = Vec2::new(ax, ay);
    }

    /// Instantaneous change in velocity.
    pub fn apply_force(&mut self, fx: f64, fy: f64) {
        self.velocity += Vec2::new(fx, fy);
    }

    /// Zero both velocity and acceleration.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: f64) {
        self.gravity = gravity;
    }

    pub fn uses_gravity(&self) -> bool {
        self.use_gravity
    }

    pub fn enable_gravity(&mut self, enabled: bool) {
        self.use_gravity = enabled;
    }

    pub fn max_velocity(&self) -> Vec2 {
        self.max_velocity
    }

    pub fn set_max_velocity(&mut self, max_x: f64, max_y: f64) {
        self.max_velocity = Vec2::new(max_x, max_y);
    }

    pub fn drag(&self) -> f64 {
        self.drag
    }

    /// Velocity multiplier applied each update; 1.0 disables damping.
    pub fn set_drag(&mut self, drag: f64) {
        self.drag = drag.clamp(0.0, 1.0);
    }

    /// Advance velocity by `dt` and return the resulting displacement.
    pub fn integrate(&mut self, dt: f64) -> Vec2 {
        self.velocity += self.acceleration * dt;

        if self.use_gravity {
            self.velocity.y += self.gravity * dt;
        }

        if self.drag < 1.0 {
            self.velocity *= self.drag;
        }

        self.velocity.x = self.velocity.x.min(self.max_velocity.x).max(-self.max_velocity.x);
        self.velocity.y = self.velocity.y.min(self.max_velocity.y).max(-self.max_velocity.y);

        self.velocity * dt
    }
}

impl Component for PhysicsComponent {
    fn on_attach(&mut self, owner: Option<EntityId>) {
        self.owner = owner;
        self.attached = true;
    }

    fn update(&mut self, bounds: &mut Bounds, dt: f64) {
        if !self.attached {
            return;
        }
        bounds.position += self.integrate(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let physics = PhysicsComponent::new();
        assert_eq!(physics.velocity(), Vec2::ZERO);
        assert_eq!(physics.gravity(), 0.0);
        assert_eq!(physics.max_velocity(), Vec2::new(1000.0, 1000.0));
        assert_eq!(physics.drag(), 1.0);
        assert!(physics.uses_gravity());
    }

    #[test]
    fn acceleration_applies_before_clamp() {
        let mut physics = PhysicsComponent::new().with_max_velocity(50.0, 50.0);
        physics.set_acceleration(1000.0, -1000.0);
        let step = physics.integrate(0.1);
        assert_eq!(physics.velocity(), Vec2::new(50.0, -50.0));
        assert_eq!(step, Vec2::new(5.0, -5.0));
    }

    #[test]
    fn gravity_only_when_enabled() {
        let mut physics = PhysicsComponent::new().with_gravity(100.0);
        physics.integrate(0.5);
        assert_eq!(physics.velocity().y, 50.0);

        physics.enable_gravity(false);
        physics.integrate(0.5);
        assert_eq!(physics.velocity().y, 50.0);
    }

    #[test]
    fn drag_is_clamped() {
        let mut physics = PhysicsComponent::new();
        physics.set_drag(1.5);
        assert_eq!(physics.drag(), 1.0);
        physics.set_drag(-0.5);
        assert_eq!(physics.drag(), 0.0);
    }

    #[test]
    fn unattached_component_does_not_move_bounds() {
        let mut physics = PhysicsComponent::new();
        physics.set_velocity(10.0, 0.0);
        let mut bounds = Bounds::default();
        physics.update(&mut bounds, 1.0);
        assert_eq!(bounds.position, Vec2::ZERO);
        assert_eq!(physics.velocity(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn stop_and_impulse() {
        let mut physics = PhysicsComponent::new();
        physics.apply_force(3.0, 4.0);
        assert!(physics.is_moving());
        physics.apply_force(1.0, 0.0);
        assert_eq!(physics.velocity(), Vec2::new(4.0, 4.0));
        physics.stop();
        assert!(!physics.is_moving());
    }
}
