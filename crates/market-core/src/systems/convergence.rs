//! Convergence Monitor
//!
//! Watches the per-step human feed quality and decides when it has settled.
//! At every window boundary the latest `window` observations are compared
//! with the `window` before them; the run has converged once the relative
//! change between the two means stays below `epsilon` for `patience`
//! consecutive checks. Each check sees a full window of new data.

use bevy_ecs::prelude::*;
use std::collections::VecDeque;

use crate::config::ConvergenceParams;

/// Monitor verdict after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Converged,
}

/// Resource: sliding-window steady-state detector
#[derive(Resource, Debug, Clone)]
pub struct QualityMonitor {
    window: usize,
    epsilon: f64,
    patience: usize,
    /// Last 2 * window observations, oldest first
    history: VecDeque<f64>,
    recent_sum: f64,
    previous_sum: f64,
    streak: usize,
    observations: u64,
    last_step: Option<u64>,
}

impl QualityMonitor {
    pub fn new(window: usize, epsilon: f64, patience: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            epsilon,
            patience: patience.max(1),
            history: VecDeque::with_capacity(2 * window + 1),
            recent_sum: 0.0,
            previous_sum: 0.0,
            streak: 0,
            observations: 0,
            last_step: None,
        }
    }

    pub fn from_params(params: &ConvergenceParams) -> Self {
        Self::new(params.window, params.epsilon, params.patience)
    }

    /// Record the statistic for `step` and report whether it has settled.
    pub fn observe(&mut self, step: u64, value: f64) -> Signal {
        self.last_step = Some(step);
        self.observations += 1;

        self.history.push_back(value);
        self.recent_sum += value;
        if self.history.len() > self.window {
            let crossing = self.history[self.history.len() - 1 - self.window];
            self.recent_sum -= crossing;
            self.previous_sum += crossing;
        }
        if self.history.len() > 2 * self.window {
            if let Some(dropped) = self.history.pop_front() {
                self.previous_sum -= dropped;
            }
        }
        if self.observations % self.window as u64 != 0 {
            return Signal::Continue;
        }
        self.resum();

        if self.history.len() < 2 * self.window {
            return Signal::Continue;
        }

        let new = self.recent_sum / self.window as f64;
        let old = self.previous_sum / self.window as f64;
        let scale = new.abs().max(old.abs());
        let stable = scale <= 0.0 || (new - old).abs() / scale < self.epsilon;

        if stable {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        if self.streak >= self.patience {
            Signal::Converged
        } else {
            Signal::Continue
        }
    }

    /// Mean of the latest window (or of everything seen, if shorter).
    pub fn window_mean(&self) -> Option<f64> {
        let n = self.history.len().min(self.window);
        if n == 0 {
            return None;
        }
        Some(self.history.iter().rev().take(n).sum::<f64>() / n as f64)
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    pub fn streak(&self) -> usize {
        self.streak
    }

    pub fn window(&self) -> usize {
        self.window
    }

    // Recompute running sums to drop accumulated rounding error
    fn resum(&mut self) {
        let split = self.history.len().saturating_sub(self.window);
        self.previous_sum = self.history.iter().take(split).sum();
        self.recent_sum = self.history.iter().skip(split).sum();
    }
}
