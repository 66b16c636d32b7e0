//! Reconstruction of frame-stacked observations from stored transitions.
use crate::{FrameObs, ItemBuffer, StackedTransition, Transition};

/// Builds a stack of `framestack` observations ending at slot `ix`.
///
/// The walk goes backward over the preceding slots and stops at a transition
/// with `done`, at an unwritten slot or when it would step from the oldest
/// live slot onto the newest one. Positions not reached are zero-padded.
pub fn stack_frames<O, A>(
    elements: &ItemBuffer<Transition<O, A>>,
    ix: usize,
    framestack: usize,
) -> Option<StackedTransition<O, A>>
where
    O: FrameObs,
    A: Clone,
{
    let tr = elements.get(ix)?;
    let capacity = elements.capacity();
    let oldest = if elements.full() { elements.cursor() } else { 0 };
    let n_pad = framestack.max(1) - 1;

    let mut frames = Vec::with_capacity(n_pad);
    let mut cur = ix;
    while frames.len() < n_pad && cur != oldest {
        cur = (cur + capacity - 1) % capacity;
        match elements.get(cur) {
            Some(prev) if !prev.done => frames.push(prev.obs.clone()),
            _ => break,
        }
    }

    let mut obs = Vec::with_capacity(n_pad + 1);
    obs.extend((frames.len()..n_pad).map(|_| tr.obs.zeros_like()));
    obs.extend(frames.into_iter().rev());
    obs.push(tr.obs.clone());

    Some(StackedTransition {
        obs,
        act: tr.act.clone(),
        reward: tr.reward,
        next_obs: tr.next_obs.clone(),
        done: tr.done,
    })
}

#[cfg(test)]
mod tests {
    use super::stack_frames;
    use crate::{ItemBuffer, Transition};

    fn buffer(n: usize, capacity: usize, dones: &[usize]) -> ItemBuffer<Transition<Vec<f32>, usize>> {
        let mut buf = ItemBuffer::new(capacity);
        for i in 0..n {
            let obs = vec![(i + 1) as f32; 2];
            let next_obs = vec![(i + 2) as f32; 2];
            buf.push(Transition::new(obs, i, i as f32, next_obs, dones.contains(&i)));
        }
        buf
    }

    #[test]
    fn test_stack_within_episode() {
        let buf = buffer(6, 8, &[]);
        let s = stack_frames(&buf, 4, 3).unwrap();
        assert_eq!(s.obs, vec![vec![3f32; 2], vec![4.0; 2], vec![5.0; 2]]);
        assert_eq!(s.act, 4);
        assert_eq!(s.reward, 4.0);
    }

    #[test]
    fn test_stack_stops_at_done() {
        let buf = buffer(8, 8, &[3]);
        // Slot 3 ends the previous episode, so slot 5 only sees slot 4.
        let s = stack_frames(&buf, 5, 4).unwrap();
        assert_eq!(
            s.obs,
            vec![vec![0f32; 2], vec![0.0; 2], vec![5.0; 2], vec![6.0; 2]]
        );

        // The first transition of an episode is padded entirely.
        let s = stack_frames(&buf, 4, 4).unwrap();
        assert_eq!(s.obs[..3], [vec![0f32; 2], vec![0.0; 2], vec![0.0; 2]]);
        assert_eq!(s.obs[3], vec![5f32; 2]);
    }

    #[test]
    fn test_stack_stops_at_oldest_slot() {
        // Slots hold items 8, 9, 2, ..., 7; slot 2 is the oldest.
        let buf = buffer(10, 8, &[]);
        let s = stack_frames(&buf, 2, 3).unwrap();
        assert_eq!(s.obs, vec![vec![0f32; 2], vec![0.0; 2], vec![3.0; 2]]);

        // Walks across the physical end of the buffer.
        let s = stack_frames(&buf, 1, 3).unwrap();
        assert_eq!(s.obs, vec![vec![8f32; 2], vec![9.0; 2], vec![10.0; 2]]);
    }

    #[test]
    fn test_framestack_one() {
        let buf = buffer(3, 4, &[]);
        let s = stack_frames(&buf, 2, 1).unwrap();
        assert_eq!(s.obs, vec![vec![3f32; 2]]);
        assert!(stack_frames(&buf, 3, 1).is_none());
    }
}
