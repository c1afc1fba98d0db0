//! Trapezoidal motion profile.
//!
//! A profile node has no inputs. Each epoch it advances its clock by the
//! node's period and outputs the position reference of a trapezoidal velocity
//! plan: constant acceleration up to the cruise velocity, cruise, then
//! constant deceleration down to rest at the goal. Goals that are too close
//! to reach the maximum velocity produce a triangular plan instead.
//!
//! Setting a new goal replans from the current position reference, starting
//! at rest.

use cg_core::{Tolerances, ensure_finite, nearly_equal};
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};

/// Profile limits and initial goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidProfile {
    /// Cruise velocity, units per second.
    pub max_velocity: f64,
    /// Time to accelerate from rest to `max_velocity`, seconds.
    pub time_to_max_velocity: f64,
    /// Position reference before any motion.
    #[serde(default)]
    pub start: f64,
    /// Goal planned toward at construction and after a reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
}

impl TrapezoidProfile {
    /// Profile at rest at 0 with the given limits.
    pub fn new(max_velocity: f64, time_to_max_velocity: f64) -> Self {
        Self {
            max_velocity,
            time_to_max_velocity,
            start: 0.0,
            goal: None,
        }
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Acceleration magnitude, units per second squared.
    pub fn acceleration(&self) -> f64 {
        self.max_velocity / self.time_to_max_velocity
    }

    pub(crate) fn validate(&self) -> NodeResult<()> {
        ensure_finite(self.max_velocity, "profile max velocity")?;
        ensure_finite(self.time_to_max_velocity, "profile time to max velocity")?;
        ensure_finite(self.start, "profile start")?;
        if let Some(goal) = self.goal {
            ensure_finite(goal, "profile goal")?;
        }
        if !(self.max_velocity > 0.0 && self.time_to_max_velocity > 0.0) {
            return Err(NodeError::InvalidArg {
                what: "profile max velocity and time to max velocity must be positive",
            });
        }
        Ok(())
    }

    /// Plan a move from rest at `from` to rest at `goal`.
    pub fn plan(&self, from: f64, goal: f64) -> ProfilePlan {
        let distance = (goal - from).abs();
        if nearly_equal(from, goal, Tolerances::default()) {
            return ProfilePlan::hold(goal);
        }

        let acceleration = self.acceleration();
        let full_ramp = self.max_velocity * self.time_to_max_velocity;
        let (cruise_velocity, accel_end, decel_start) = if distance < full_ramp {
            // Triangle: accelerate for half the distance, then decelerate.
            let t = (distance / acceleration).sqrt();
            (acceleration * t, t, t)
        } else {
            let v = self.max_velocity;
            (v, self.time_to_max_velocity, distance / v)
        };

        ProfilePlan {
            from,
            goal,
            sign: (goal - from).signum(),
            distance,
            acceleration,
            cruise_velocity,
            accel_end,
            decel_start,
            end: decel_start + accel_end,
        }
    }
}

/// Position and velocity reference at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    pub position: f64,
    pub velocity: f64,
}

/// A planned move. Times are seconds since the goal was set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePlan {
    from: f64,
    goal: f64,
    sign: f64,
    distance: f64,
    acceleration: f64,
    cruise_velocity: f64,
    accel_end: f64,
    decel_start: f64,
    end: f64,
}

impl ProfilePlan {
    /// Stay at `position`.
    pub fn hold(position: f64) -> Self {
        Self {
            from: position,
            goal: position,
            sign: 0.0,
            distance: 0.0,
            acceleration: 0.0,
            cruise_velocity: 0.0,
            accel_end: 0.0,
            decel_start: 0.0,
            end: 0.0,
        }
    }

    pub fn goal(&self) -> f64 {
        self.goal
    }

    pub fn cruise_velocity(&self) -> f64 {
        self.cruise_velocity
    }

    /// Total duration of the move.
    pub fn duration(&self) -> f64 {
        self.end
    }

    /// Reference `t` seconds into the move.
    pub fn sample(&self, t: f64) -> ProfileSample {
        if t >= self.end {
            return ProfileSample {
                position: self.goal,
                velocity: 0.0,
            };
        }

        let a = self.acceleration;
        let (travelled, speed) = if t < self.accel_end {
            (0.5 * a * t * t, a * t)
        } else if t < self.decel_start {
            let ramp = 0.5 * a * self.accel_end * self.accel_end;
            (ramp + self.cruise_velocity * (t - self.accel_end), self.cruise_velocity)
        } else {
            let left = self.end - t;
            (self.distance - 0.5 * a * left * left, a * left)
        };
        ProfileSample {
            position: self.from + self.sign * travelled,
            velocity: self.sign * speed,
        }
    }
}

/// Retained state of a profile node.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    pub(crate) plan: ProfilePlan,
    /// Epochs stepped since the goal was set.
    pub(crate) steps: u64,
    pub(crate) sample: ProfileSample,
}

impl ProfileState {
    pub(crate) fn new(config: &TrapezoidProfile) -> Self {
        let plan = match config.goal {
            Some(goal) => config.plan(config.start, goal),
            None => ProfilePlan::hold(config.start),
        };
        Self {
            plan,
            steps: 0,
            sample: ProfileSample {
                position: config.start,
                velocity: 0.0,
            },
        }
    }

    pub fn plan(&self) -> &ProfilePlan {
        &self.plan
    }

    /// Reference from the latest epoch.
    pub fn sample(&self) -> ProfileSample {
        self.sample
    }

    /// Whether the reference has arrived at the goal.
    pub fn at_goal(&self) -> bool {
        self.sample.velocity == 0.0 && self.sample.position == self.plan.goal
    }

    pub(crate) fn step(&mut self, dt: f64) -> f64 {
        self.steps += 1;
        // Elapsed time from the step count, not a running sum, so it does not drift.
        self.sample = self.plan.sample(self.steps as f64 * dt);
        self.sample.position
    }

    pub(crate) fn set_goal(&mut self, config: &TrapezoidProfile, goal: f64) {
        self.plan = config.plan(self.sample.position, goal);
        self.steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(profile: &TrapezoidProfile, dt: f64, ticks: usize) -> Vec<ProfileSample> {
        let mut state = ProfileState::new(profile);
        (0..ticks)
            .map(|_| {
                state.step(dt);
                state.sample()
            })
            .collect()
    }

    #[test]
    fn trapezoid_shape() {
        // a = 4, ramp covers 0.5 on each side, cruise 2.0 for 1 s.
        let profile = TrapezoidProfile::new(2.0, 0.5).with_goal(3.0);
        let plan = profile.plan(0.0, 3.0);
        assert_eq!(plan.cruise_velocity(), 2.0);
        assert!((plan.duration() - 2.0).abs() < 1e-12);

        let samples = run(&profile, 0.05, 50);

        // Accelerating: velocity grows linearly.
        assert!((samples[4].velocity - 1.0).abs() < 1e-9);
        assert!((samples[9].position - 0.5).abs() < 1e-9);
        // Cruising at max velocity.
        for s in &samples[10..29] {
            assert!((s.velocity - 2.0).abs() < 1e-9, "{s:?}");
        }
        assert!((samples[29].position - 2.5).abs() < 1e-9);
        // Decelerating symmetrically.
        assert!((samples[34].velocity - 1.0).abs() < 1e-9);
        // At rest on the goal, and it stays there.
        for s in &samples[39..] {
            assert_eq!(s.position, 3.0);
            assert_eq!(s.velocity, 0.0);
        }
        for pair in samples.windows(2) {
            assert!(pair[1].position >= pair[0].position);
            assert!(pair[1].velocity <= 2.0 + 1e-12);
        }
    }

    #[test]
    fn short_move_is_triangular() {
        let profile = TrapezoidProfile::new(2.0, 0.5);
        let plan = profile.plan(1.0, 1.25);
        assert!((plan.cruise_velocity() - 1.0).abs() < 1e-12);
        assert!((plan.duration() - 0.5).abs() < 1e-12);

        let peak = plan.sample(0.25);
        assert!((peak.velocity - 1.0).abs() < 1e-12);
        assert!((peak.position - 1.125).abs() < 1e-12);
        assert_eq!(plan.sample(0.5).position, 1.25);
    }

    #[test]
    fn negative_moves_mirror() {
        let profile = TrapezoidProfile::new(2.0, 0.5);
        let up = profile.plan(0.0, 3.0);
        let down = profile.plan(0.0, -3.0);
        for t in [0.1, 0.7, 1.6, 2.5] {
            let (u, d) = (up.sample(t), down.sample(t));
            assert!((u.position + d.position).abs() < 1e-12);
            assert!((u.velocity + d.velocity).abs() < 1e-12);
        }
    }

    #[test]
    fn new_goal_replans_from_reference() {
        let profile = TrapezoidProfile::new(1.0, 0.1).with_start(2.0);
        let mut state = ProfileState::new(&profile);
        assert_eq!(state.step(0.1), 2.0);
        assert!(state.at_goal());

        state.set_goal(&profile, 1.0);
        for _ in 0..20 {
            state.step(0.1);
        }
        assert_eq!(state.sample().position, 1.0);
        assert!(state.at_goal());
    }

    #[test]
    fn invalid_limits() {
        assert!(TrapezoidProfile::new(0.0, 1.0).validate().is_err());
        assert!(TrapezoidProfile::new(1.0, -1.0).validate().is_err());
        assert!(TrapezoidProfile::new(f64::NAN, 1.0).validate().is_err());
        assert!(TrapezoidProfile::new(1.0, 1.0).with_goal(f64::INFINITY).validate().is_err());
    }
}
