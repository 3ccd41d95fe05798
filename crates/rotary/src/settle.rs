use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest frame delta fed into the integrator. Longer stalls are treated as
/// this long so the spring never explodes after the window was hidden.
const MAX_FRAME: Duration = Duration::from_millis(64);
/// Fixed integration substep, seconds.
const SUBSTEP: f64 = 1.0 / 1000.0;

/// Spring-damper constants for the settle motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Degrees from the target under which the spring may come to rest.
    pub rest_displacement: f64,
    /// Degrees per second under which the spring may come to rest.
    pub rest_velocity: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: 180.0,
            damping: 24.0,
            mass: 1.0,
            rest_displacement: 0.01,
            rest_velocity: 0.05,
        }
    }
}

impl SpringParams {
    /// Replaces non-positive or non-finite constants with the defaults.
    pub fn sanitized(self) -> Self {
        let fallback = Self::default();
        let pick = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        Self {
            stiffness: pick(self.stiffness, fallback.stiffness),
            damping: pick(self.damping, fallback.damping),
            mass: pick(self.mass, fallback.mass),
            rest_displacement: pick(self.rest_displacement, fallback.rest_displacement),
            rest_velocity: pick(self.rest_velocity, fallback.rest_velocity),
        }
    }
}

/// Animates an angle towards a fixed target with a damped spring.
///
/// `position` is always the live rendered angle, so a gesture interrupting the
/// animation can pick up from exactly where the dial is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleAnimation {
    position: f64,
    velocity: f64,
    target: f64,
    params: SpringParams,
    settled: bool,
}

impl SettleAnimation {
    pub fn new(from: f64, target: f64, params: SpringParams) -> Self {
        let mut anim = Self {
            position: from,
            velocity: 0.0,
            target,
            params: params.sanitized(),
            settled: false,
        };
        anim.check_rest();
        anim
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Advances by `dt` and returns the new position. Once at rest the position
    /// is pinned to the target exactly.
    pub fn advance(&mut self, dt: Duration) -> f64 {
        if self.settled {
            return self.position;
        }

        let mut remaining = dt.min(MAX_FRAME).as_secs_f64();
        let SpringParams {
            stiffness,
            damping,
            mass,
            ..
        } = self.params;

        // semi-implicit euler
        while remaining > 0.0 {
            let h = remaining.min(SUBSTEP);
            let force = -stiffness * (self.position - self.target) - damping * self.velocity;
            self.velocity += force / mass * h;
            self.position += self.velocity * h;
            remaining -= h;
        }

        self.check_rest();
        self.position
    }

    fn check_rest(&mut self) {
        let at_rest = (self.position - self.target).abs() <= self.params.rest_displacement
            && self.velocity.abs() <= self.params.rest_velocity;
        if at_rest || !self.position.is_finite() {
            self.position = self.target;
            self.velocity = 0.0;
            self.settled = true;
        }
    }
}
