//! Transitions stored in the replay buffers.
use anyhow::Result;
use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis};
use num_traits::Zero;

/// Observations that can produce a zero-filled value of the same shape.
///
/// Frame stacking pads the front of a stack with such values when an episode
/// boundary is reached before `framestack` frames were collected.
pub trait FrameObs: Clone {
    /// Returns a zero-filled observation with the shape of `self`.
    fn zeros_like(&self) -> Self;
}

impl FrameObs for Vec<f32> {
    fn zeros_like(&self) -> Self {
        vec![0f32; self.len()]
    }
}

impl FrameObs for Vec<u8> {
    fn zeros_like(&self) -> Self {
        vec![0u8; self.len()]
    }
}

impl<T, D> FrameObs for Array<T, D>
where
    T: Clone + Zero,
    D: Dimension,
{
    fn zeros_like(&self) -> Self {
        Array::zeros(self.raw_dim())
    }
}

/// A transition `(obs, act, reward, next_obs, done)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation.
    pub obs: O,

    /// Action taken at `obs`.
    pub act: A,

    /// Reward.
    pub reward: f32,

    /// Observation at the next step.
    pub next_obs: O,

    /// Flag if the episode terminated at this transition.
    pub done: bool,
}

impl<O, A> Transition<O, A> {
    /// Creates a transition.
    pub fn new(obs: O, act: A, reward: f32, next_obs: O, done: bool) -> Self {
        Self {
            obs,
            act,
            reward,
            next_obs,
            done,
        }
    }
}

/// A transition whose observation is a stack of consecutive frames.
///
/// `obs[framestack - 1]` is the observation of the sampled transition,
/// earlier entries are observations of preceding transitions in the same
/// episode or zero padding.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedTransition<O, A> {
    /// Stacked observations, oldest first.
    pub obs: Vec<O>,

    /// Action.
    pub act: A,

    /// Reward.
    pub reward: f32,

    /// Observation at the next step.
    pub next_obs: O,

    /// Flag if the episode terminated at this transition.
    pub done: bool,
}

impl<T, D, A> StackedTransition<Array<T, D>, A>
where
    T: Clone,
    D: Dimension,
    D::Larger: RemoveAxis,
{
    /// Concatenates the stacked frames along a new leading axis.
    ///
    /// Fails if the stored observations do not share a shape.
    pub fn stacked_obs(&self) -> Result<Array<T, D::Larger>> {
        let views: Vec<ArrayView<T, D>> = self.obs.iter().map(|o| o.view()).collect();
        Ok(ndarray::stack(Axis(0), &views)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};

    #[test]
    fn test_zeros_like() {
        let v = vec![1f32, 2.0, 3.0];
        assert_eq!(v.zeros_like(), vec![0f32; 3]);

        let a = Array2::<u8>::ones((2, 3));
        let z = a.zeros_like();
        assert_eq!(z.shape(), &[2, 3]);
        assert!(z.iter().all(|&x| x == 0));
    }

    #[test]
    fn test_stacked_obs() {
        let tr = StackedTransition {
            obs: vec![arr1(&[0f32, 0.0]), arr1(&[1f32, 2.0])],
            act: 0usize,
            reward: 1.0,
            next_obs: arr1(&[3f32, 4.0]),
            done: false,
        };
        let s = tr.stacked_obs().unwrap();
        assert_eq!(s.shape(), &[2, 2]);
        assert_eq!(s[[1, 1]], 2.0);
    }
}
