//! Helpers for environment wrappers feeding the replay buffers.
//!
//! The number of skipped frames is a field of each helper's configuration,
//! and reward shaping is a strategy chosen when the wrapper is built.
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Configuration of [`FrameSkip`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FrameSkipConfig {
    /// Number of frames an action is repeated for.
    pub frame_skip: usize,
}

impl Default for FrameSkipConfig {
    fn default() -> Self {
        Self { frame_skip: 4 }
    }
}

/// Outcome of a single environment frame, as seen by [`FrameSkip`].
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<S> {
    /// Observation after the frame.
    pub obs: S,

    /// Reward of the frame.
    pub reward: f32,

    /// Episode termination flag.
    pub done: bool,

    /// Flag if the target of the task changed in this frame.
    pub target_changed: bool,
}

/// Result of a skipped step.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedStep<S> {
    /// Observation after the last executed frame.
    pub obs: S,

    /// Sum of rewards over the executed frames.
    pub reward: f32,

    /// Episode termination flag.
    pub done: bool,

    /// Frames executed since the last reset.
    pub frame_count: usize,
}

/// Repeats an action over `frame_skip` frames.
#[derive(Clone, Debug)]
pub struct FrameSkip {
    frame_skip: usize,
    frame_count: usize,
}

impl FrameSkip {
    /// Creates the wrapper.
    pub fn build(config: &FrameSkipConfig) -> Self {
        Self {
            frame_skip: config.frame_skip.max(1),
            frame_count: 0,
        }
    }

    /// Number of frames an action is repeated for.
    pub fn frame_skip(&self) -> usize {
        self.frame_skip
    }

    /// Calls `step` up to `frame_skip` times and sums the rewards.
    ///
    /// Stops early when an episode ends or when the target changes.
    pub fn step<S, F>(&mut self, mut step: F) -> SkippedStep<S>
    where
        F: FnMut() -> Frame<S>,
    {
        let mut reward = 0f32;
        let mut k = 0;
        let frame = loop {
            let frame = step();
            self.frame_count += 1;
            k += 1;
            reward += frame.reward;
            if frame.target_changed {
                warn!("[FrameSkip] early break since target was changed");
                break frame;
            }
            if frame.done || k == self.frame_skip {
                break frame;
            }
        };

        SkippedStep {
            obs: frame.obs,
            reward,
            done: frame.done,
            frame_count: self.frame_count,
        }
    }

    /// Resets the frame counter at the start of an episode.
    pub fn reset(&mut self) {
        self.frame_count = 0;
    }
}

/// Configuration of [`StepBudget`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StepBudgetConfig {
    /// Maximum number of frames in an episode.
    pub max_time_limit: usize,

    /// Number of frames consumed by one wrapped step.
    pub frame_skip: usize,
}

impl Default for StepBudgetConfig {
    fn default() -> Self {
        Self {
            max_time_limit: 1000,
            frame_skip: 4,
        }
    }
}

/// Remaining-steps feature appended to observations by observation transformers.
#[derive(Clone, Debug)]
pub struct StepBudget {
    max_time_limit: usize,
    frame_skip: usize,
    remaining: i64,
}

impl StepBudget {
    /// Creates the feature with a full budget.
    pub fn build(config: &StepBudgetConfig) -> Self {
        Self {
            max_time_limit: config.max_time_limit,
            frame_skip: config.frame_skip,
            remaining: config.max_time_limit as i64,
        }
    }

    /// Consumes one wrapped step. The budget is refilled when the target changed.
    pub fn step(&mut self, target_changed: bool) {
        if target_changed {
            self.remaining = self.max_time_limit as i64;
        }
        self.remaining -= self.frame_skip as i64;
    }

    /// Refills the budget.
    pub fn reset(&mut self) {
        self.remaining = self.max_time_limit as i64;
    }

    /// Remaining frames, negative once the limit is exceeded.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Frames consumed since the last reset or target change.
    pub fn step_count(&self) -> i64 {
        self.max_time_limit as i64 - self.remaining
    }
}

/// Rewards computed by a [`RewardShaping`] strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapingInfo {
    /// Reward used for training.
    pub shaping_reward: f32,

    /// Signed magnitude of the target velocity.
    pub target_vel: f32,

    /// Reward given by the environment.
    pub r2_reward: f32,
}

/// Strategy computing a shaped reward from an environment step.
pub trait RewardShaping<S, A> {
    /// Computes the shaped reward.
    fn reward_shaping(&mut self, state: &S, reward: f32, done: bool, action: &A) -> ShapingInfo;
}

/// States exposing the velocity the agent is asked to reach.
pub trait TargetVelocity {
    /// Target velocity `[x, y, z]`.
    fn target_vel(&self) -> [f32; 3];
}

/// Passes the environment reward through and reports the signed target speed
/// in the horizontal plane.
#[derive(Clone, Debug, Default)]
pub struct ForwardReward;

impl ForwardReward {
    /// Creates the strategy.
    pub fn new() -> Self {
        info!("[RewardShaping] type: ForwardReward");
        Self
    }
}

impl<S: TargetVelocity, A> RewardShaping<S, A> for ForwardReward {
    fn reward_shaping(&mut self, state: &S, reward: f32, _done: bool, _action: &A) -> ShapingInfo {
        let v = state.target_vel();
        let mut target_vel = (v[0] * v[0] + v[2] * v[2]).sqrt();
        if v[0] < 0.0 {
            target_vel = -target_vel;
        }

        ShapingInfo {
            shaping_reward: reward,
            target_vel,
            r2_reward: reward,
        }
    }
}
