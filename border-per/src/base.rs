//! Interfaces of the prioritized replay buffers.
use crate::{IwScheduler, StackedTransition, Transition};
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// This is the part of a replay buffer used by processes producing
/// transitions, such as [`TransitionProxy`](crate::TransitionProxy) on the
/// actor side.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of items in the buffer.
    fn len(&self) -> usize;
}

/// Batch sampled from a prioritized replay buffer.
///
/// `items`, `ids` and `probs` are parallel vectors.
#[derive(Clone, Debug)]
pub struct PerBatch<O, A> {
    /// Sampled transitions with stacked observations.
    pub items: Vec<StackedTransition<O, A>>,

    /// Element ids of the sampled transitions, given back to `update()`.
    pub ids: Vec<usize>,

    /// `N * P(i)` of each sample, for later calculating importance sampling weights.
    pub probs: Vec<f32>,
}

impl<O, A> PerBatch<O, A> {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the batch has no samples.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Importance sampling weights normalized within the batch.
    pub fn weights(&self, beta: f32) -> Vec<f32> {
        IwScheduler::importance_weights(&self.probs, beta)
    }
}

/// Interface of prioritized experience replay.
///
/// A learner stores transitions, samples a batch, computes TD-errors of the
/// batch and gives them back with `update()`. [`ProportionalPer`](crate::ProportionalPer)
/// and [`RankPer`](crate::RankPer) are interchangeable behind this trait.
///
/// The buffer is not synchronized internally; a single training loop is
/// expected to own it.
pub trait PrioritizedReplayBase<O, A> {
    /// Stores a transition and returns its element id.
    ///
    /// If `delta` is `None`, the maximum priority seen so far is used so that
    /// new transitions are sampled soon. Negative deltas are rejected.
    fn store(&mut self, tr: Transition<O, A>, delta: Option<f32>) -> Result<usize>;

    /// Updates the priorities of elements with TD-error derived deltas.
    fn update(&mut self, ids: &[usize], deltas: &[f32]) -> Result<()>;

    /// Samples `seg_num` transitions, one per segment.
    ///
    /// Fails if the buffer is not full yet.
    fn sample(&mut self) -> Result<PerBatch<O, A>>;

    /// Samples one transition and returns it with its element id.
    ///
    /// Fails if the buffer is not full yet.
    fn sample_one(&mut self) -> Result<(StackedTransition<O, A>, usize)>;

    /// Number of stored transitions.
    fn len(&self) -> usize;

    /// Maximum number of stored transitions.
    fn capacity(&self) -> usize;

    /// Returns `true` once the buffer wrapped around, i.e., sampling is allowed.
    fn is_full(&self) -> bool;

    /// Current exponent of importance sampling weights.
    fn beta(&self) -> f32;
}
