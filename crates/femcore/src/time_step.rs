//! Solution steps and the time functions used to switch elements on and off.

use serde::{Deserialize, Serialize};

/// A solution step as seen by the element layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    /// Step number, strictly increasing over a run
    pub number: i32,
    /// Time at the end of the step
    pub target_time: f64,
    /// Time at which time functions are evaluated
    pub intrinsic_time: f64,
    /// Step length
    pub time_increment: f64,
}

impl TimeStep {
    /// Create a step ending at `target_time`
    pub fn new(number: i32, target_time: f64, time_increment: f64) -> Self {
        Self {
            number,
            target_time,
            intrinsic_time: target_time,
            time_increment,
        }
    }

    /// The step following this one with the same increment
    pub fn next(&self) -> Self {
        Self::new(
            self.number + 1,
            self.target_time + self.time_increment,
            self.time_increment,
        )
    }
}

/// Scalar function of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeFunction {
    /// Same value at every time
    Constant { value: f64 },
    /// Linear interpolation between samples, clamped outside the sampled range
    PiecewiseLinear { times: Vec<f64>, values: Vec<f64> },
    /// Zero before `origin`, `value` from `origin` on
    Heaviside { origin: f64, value: f64 },
    /// One inside `[start, end)`, zero elsewhere
    Window { start: f64, end: f64 },
}

impl TimeFunction {
    /// Evaluate the function at `time`
    pub fn evaluate(&self, time: f64) -> f64 {
        match self {
            TimeFunction::Constant { value } => *value,
            TimeFunction::PiecewiseLinear { times, values } => {
                piecewise_linear(times, values, time)
            }
            TimeFunction::Heaviside { origin, value } => {
                if time < *origin {
                    0.0
                } else {
                    *value
                }
            }
            TimeFunction::Window { start, end } => {
                if time >= *start && time < *end {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn piecewise_linear(times: &[f64], values: &[f64], time: f64) -> f64 {
    let n = times.len().min(values.len());
    if n == 0 {
        return 0.0;
    }
    if time <= times[0] {
        return values[0];
    }
    if time >= times[n - 1] {
        return values[n - 1];
    }
    for i in 1..n {
        if time <= times[i] {
            let span = times[i] - times[i - 1];
            if span <= 0.0 {
                return values[i];
            }
            let s = (time - times[i - 1]) / span;
            return values[i - 1] + s * (values[i] - values[i - 1]);
        }
    }
    values[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn next_step_advances_time() {
        let step = TimeStep::new(1, 0.5, 0.5);
        let next = step.next();
        assert_eq!(next.number, 2);
        assert_relative_eq!(next.target_time, 1.0);
        assert_relative_eq!(next.intrinsic_time, 1.0);
    }

    #[test]
    fn piecewise_linear_interpolates_and_clamps() {
        let f = TimeFunction::PiecewiseLinear {
            times: vec![0.0, 1.0, 3.0],
            values: vec![0.0, 2.0, 2.0],
        };
        assert_relative_eq!(f.evaluate(-1.0), 0.0);
        assert_relative_eq!(f.evaluate(0.5), 1.0);
        assert_relative_eq!(f.evaluate(2.0), 2.0);
        assert_relative_eq!(f.evaluate(10.0), 2.0);
    }

    #[test]
    fn heaviside_and_window() {
        let h = TimeFunction::Heaviside {
            origin: 1.0,
            value: 3.0,
        };
        assert_eq!(h.evaluate(0.99), 0.0);
        assert_eq!(h.evaluate(1.0), 3.0);

        let w = TimeFunction::Window {
            start: 1.0,
            end: 2.0,
        };
        assert_eq!(w.evaluate(0.5), 0.0);
        assert_eq!(w.evaluate(1.5), 1.0);
        assert_eq!(w.evaluate(2.0), 0.0);
    }

    #[test]
    fn empty_table_evaluates_to_zero() {
        let f = TimeFunction::PiecewiseLinear {
            times: vec![],
            values: vec![],
        };
        assert_eq!(f.evaluate(1.0), 0.0);
    }
}
