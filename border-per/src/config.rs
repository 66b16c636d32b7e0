//! Configuration of the prioritized replay buffers.
use crate::PerError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ProportionalPer`](crate::ProportionalPer) and
/// [`RankPer`](crate::RankPer).
///
/// # Examples
///
/// ```rust
/// use border_per::PerConfig;
///
/// let config = PerConfig::default()
///     .capacity(100_000)
///     .alpha(0.7)
///     .seg_num(32)
///     .framestack(4);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Number of transitions stored. The oldest ones are overwritten when full.
    pub capacity: usize,

    /// Exponent for prioritization. A value of 0 results in uniform sampling.
    pub alpha: f32,

    /// Small constant added to priority deltas so that no transition has zero
    /// probability. Used by the proportional variant only.
    pub eps: f32,

    /// Number of segments, which is also the size of a sampled batch.
    pub seg_num: usize,

    /// Number of frames stacked into a sampled observation.
    pub framestack: usize,

    /// Random seed used for sampling.
    pub seed: u64,

    /// Initial value of the importance sampling exponent.
    pub beta_0: f32,

    /// Final value of the importance sampling exponent.
    pub beta_final: f32,

    /// Number of optimization steps after which `beta` reaches its final value.
    pub n_opts_final: usize,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            alpha: 0.6,
            eps: 0.01,
            seg_num: 32,
            framestack: 4,
            seed: 42,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 500_000,
        }
    }
}

impl PerConfig {
    /// Sets the capacity of the buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets `eps`.
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the number of segments.
    pub fn seg_num(mut self, seg_num: usize) -> Self {
        self.seg_num = seg_num;
        self
    }

    /// Sets the number of stacked frames.
    pub fn framestack(mut self, framestack: usize) -> Self {
        self.framestack = framestack;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the initial importance sampling exponent `beta_0`.
    pub fn beta_0(mut self, beta_0: f32) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the final importance sampling exponent `beta_final`.
    pub fn beta_final(mut self, beta_final: f32) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the number of optimization steps to reach the final beta value.
    pub fn n_opts_final(mut self, n_opts_final: usize) -> Self {
        self.n_opts_final = n_opts_final;
        self
    }

    /// Checks the values of the configuration.
    pub fn check(&self) -> Result<(), PerError> {
        if self.capacity == 0 {
            return Err(PerError::InvalidConfig("capacity must be positive".into()));
        }
        if self.seg_num == 0 || self.seg_num > self.capacity {
            return Err(PerError::InvalidConfig(format!(
                "seg_num must be in 1..={}, got {}",
                self.capacity, self.seg_num
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(PerError::InvalidConfig(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        if self.eps.is_nan() || self.eps <= 0.0 {
            return Err(PerError::InvalidConfig(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.framestack == 0 {
            return Err(PerError::InvalidConfig("framestack must be positive".into()));
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
