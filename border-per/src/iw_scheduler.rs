//! Annealing of the importance sampling exponent and importance weights.
use crate::PerConfig;
use log::trace;

/// Anneals the importance sampling exponent $\beta$ linearly from `beta_0`
/// to `beta_final` over `n_opts_final` calls of `update()`, and turns the
/// `N * P(i)` values of a sampled batch into importance weights.
#[derive(Clone, Debug, PartialEq)]
pub struct IwScheduler {
    beta_0: f32,
    beta_final: f32,
    n_opts_final: usize,
    n_updates: usize,
}

impl IwScheduler {
    /// Creates a scheduler starting at `beta_0`.
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_opts_final,
            n_updates: 0,
        }
    }

    /// Creates a scheduler from the `beta_*` fields of a buffer configuration.
    pub fn build(config: &PerConfig) -> Self {
        Self::new(config.beta_0, config.beta_final, config.n_opts_final)
    }

    /// Current value of $\beta$.
    pub fn beta(&self) -> f32 {
        if self.n_updates >= self.n_opts_final {
            return self.beta_final;
        }
        let frac = self.n_updates as f32 / self.n_opts_final as f32;
        self.beta_0 + (self.beta_final - self.beta_0) * frac
    }

    /// Number of priority updates seen so far.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Advances the schedule by one priority update.
    pub fn step(&mut self) {
        self.n_updates += 1;
        if self.n_updates == self.n_opts_final {
            trace!("beta reached its final value {}", self.beta_final);
        }
    }

    /// Importance weights of a batch at the current $\beta$.
    pub fn weights(&self, probs: &[f32]) -> Vec<f32> {
        Self::importance_weights(probs, self.beta())
    }

    /// Computes importance sampling weights from `N * P(i)` values.
    ///
    /// The weight is $w_i=\left(N P(i)\right)^{-\beta}$
    /// and it is normalized by $\max_i w_i$ within the batch.
    pub fn importance_weights(probs: &[f32], beta: f32) -> Vec<f32> {
        let ws = probs.iter().map(|p| p.powf(-beta)).collect::<Vec<_>>();
        let w_max = ws.iter().cloned().fold(f32::NAN, f32::max);
        ws.iter().map(|w| w / w_max).collect()
    }
}
