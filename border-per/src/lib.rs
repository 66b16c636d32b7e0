#![warn(missing_docs)]
//! Prioritized experience replay (PER) for reinforcement learning.
//!
//! Two interchangeable buffers implement [`PrioritizedReplayBase`]:
//!
//! - [`ProportionalPer`] samples transitions proportionally to their priority
//!   using a [`SumTree`].
//! - [`RankPer`] samples transitions by their rank in an [`IndexPriorityQueue`]
//!   with a power-law distribution over ranks.
//!
//! Both store [`Transition`]s in a circular buffer and reconstruct stacks of
//! consecutive observations on sampling, without crossing episode boundaries.
//! Actors hand transitions to the learner through a [`TransitionProxy`]; the
//! learner owns the buffer and drains them with [`drain_pushed_items`].
//!
//! # Examples
//!
//! ```rust
//! use border_per::{PerConfig, PrioritizedReplayBase, ProportionalPer, Transition};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PerConfig::default().capacity(8).seg_num(2).framestack(2);
//! let mut per = ProportionalPer::<Vec<f32>, usize>::build(&config)?;
//!
//! for i in 0..8 {
//!     let tr = Transition::new(vec![i as f32], i, 1.0, vec![(i + 1) as f32], false);
//!     per.store(tr, None)?;
//! }
//!
//! let batch = per.sample()?;
//! let td_errs = vec![0.5; batch.len()];
//! let _weights = batch.weights(per.beta());
//! per.update(&batch.ids, &td_errs)?;
//! # Ok(())
//! # }
//! ```
mod base;
mod config;
mod error;
mod frame_stack;
mod item_buffer;
mod iw_scheduler;
mod priority_queue;
mod proportional;
mod proxy;
mod rank;
mod sum_tree;
mod transition;
pub mod wrapper;

pub use base::{ExperienceBufferBase, PerBatch, PrioritizedReplayBase};
pub use config::PerConfig;
pub use error::PerError;
pub use frame_stack::stack_frames;
pub use item_buffer::ItemBuffer;
pub use iw_scheduler::IwScheduler;
pub use priority_queue::IndexPriorityQueue;
pub use proportional::ProportionalPer;
pub use proxy::{drain_pushed_items, PushedItemMessage, TransitionProxy, TransitionProxyConfig};
pub use rank::RankPer;
pub use sum_tree::SumTree;
pub use transition::{FrameObs, StackedTransition, Transition};
