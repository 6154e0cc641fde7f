//! Critically damped scalar smoothing

/// Time constant shared by every damper, in milliseconds.
///
/// All controlled values converge at the same rate regardless of their scale.
pub const DECAY_MILLISECONDS: f32 = 50.0;

const NATURAL_FREQUENCY: f32 = 1.0 / DECAY_MILLISECONDS;

/// Settle thresholds, as fractions of the caller's normalization scale.
const NIL_SPEED: f32 = 0.0002 * NATURAL_FREQUENCY;
const NIL_DISTANCE: f32 = 0.0002;

/// Steps longer than this have fully decayed in single precision.
const MAX_TIME_STEP_MILLISECONDS: f32 = 1000.0 * DECAY_MILLISECONDS;

/// A second-order critically damped system advanced one step at a time.
///
/// Each step evaluates the closed-form solution of
/// `a = ω²(goal - x) - 2ωv` with `ω = 1 / DECAY_MILLISECONDS`, so arbitrarily
/// long frames never destabilize it. Starting at rest, the value approaches the
/// goal monotonically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Damper {
    velocity: f32,
}

impl Damper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rate of change, in units per millisecond.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_at_rest(&self) -> bool {
        self.velocity == 0.0
    }

    /// Drop any accumulated motion.
    pub fn reset(&mut self) {
        self.velocity = 0.0;
    }

    /// Advance `x` toward `x_goal` by `time_step_ms` and return the new value.
    ///
    /// `x_normalization` is the rough scale of `x`; once both the remaining
    /// distance and the speed fall below a small fraction of it, the value
    /// snaps to the goal and the velocity is zeroed.
    pub fn update(&mut self, x: f32, x_goal: f32, time_step_ms: f32, x_normalization: f32) -> f32 {
        if x == x_goal && self.velocity == 0.0 {
            return x_goal;
        }
        if time_step_ms.is_nan() || time_step_ms <= 0.0 {
            return x;
        }
        let time_step_ms = f64::from(time_step_ms.min(MAX_TIME_STEP_MILLISECONDS));

        // Stepped in f64: the intermediate terms grow by up to `1 + ωt` and
        // would overflow f32 for large distances.
        let omega = f64::from(NATURAL_FREQUENCY);
        let delta_x = f64::from(x) - f64::from(x_goal);
        let intermediate_velocity = f64::from(self.velocity) + omega * delta_x;
        let intermediate_x = delta_x + time_step_ms * intermediate_velocity;
        let decay = (-omega * time_step_ms).exp();
        let new_velocity = ((intermediate_velocity - omega * intermediate_x) * decay) as f32;
        let new_delta_x = intermediate_x * decay;

        let scale = x_normalization.abs();
        if new_velocity.abs() < NIL_SPEED * scale
            && new_delta_x.abs() < f64::from(NIL_DISTANCE * scale)
        {
            self.velocity = 0.0;
            x_goal
        } else {
            self.velocity = new_velocity;
            (f64::from(x_goal) + new_delta_x) as f32
        }
    }
}
