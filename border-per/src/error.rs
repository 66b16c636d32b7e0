//! Errors in the library.
use thiserror::Error;

/// Errors raised by the prioritized replay buffers.
#[derive(Error, Debug, PartialEq)]
pub enum PerError {
    /// Sampling was requested before the buffer wrapped around once.
    #[error("The replay memory is not full: {len} of {capacity} transitions stored")]
    NotFull {
        /// Number of stored transitions.
        len: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// A priority delta given to `store()` was negative.
    #[error("Priority delta must be non-negative, got {0}")]
    NegativePriority(f32),

    /// A priority delta was NaN or infinite.
    #[error("Priority delta must be finite, got {0}")]
    InvalidPriority(f32),

    /// Lengths of ids and priorities given to `update()` differ.
    #[error("Got {ids} ids and {priorities} priorities")]
    LengthMismatch {
        /// Number of ids.
        ids: usize,
        /// Number of priorities.
        priorities: usize,
    },

    /// An element id does not address a slot of the buffer.
    #[error("Element id {id} is out of range for capacity {capacity}")]
    InvalidIndex {
        /// The given id.
        id: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to send pushed items to the learner.
    #[error("Failed to send pushed items")]
    SendMsgForPush,
}
