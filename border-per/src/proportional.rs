//! Proportional prioritized experience replay.
use crate::{
    frame_stack::stack_frames, ExperienceBufferBase, FrameObs, IwScheduler, PerBatch, PerConfig,
    PerError, PrioritizedReplayBase, StackedTransition, SumTree, Transition,
};
use anyhow::Result;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Proportional prioritized experience replay.
///
/// The priority of a transition is $p_i=(|\delta_i|+\epsilon)^\alpha$ and
/// transitions are sampled with probability $P(i)=p_i/\sum_k p_k$, using a
/// [`SumTree`]. A batch is stratified: the total priority mass is split into
/// `seg_num` equal segments and one transition is drawn from each.
pub struct ProportionalPer<O, A> {
    alpha: f32,
    eps: f32,
    seg_num: usize,
    framestack: usize,
    elements: SumTree<Transition<O, A>>,

    /// Running maximum of the deltas seen so far.
    max_priority: f32,

    rng: StdRng,
    iw_scheduler: IwScheduler,
}

impl<O, A> ProportionalPer<O, A>
where
    O: FrameObs,
    A: Clone,
{
    /// Builds an empty buffer.
    pub fn build(config: &PerConfig) -> Result<Self> {
        config.check()?;
        info!(
            "Construct proportional PER with capacity = {}, alpha = {}, seg_num = {}",
            config.capacity, config.alpha, config.seg_num
        );

        Ok(Self {
            alpha: config.alpha,
            eps: config.eps,
            seg_num: config.seg_num,
            framestack: config.framestack,
            elements: SumTree::new(config.capacity),
            max_priority: 1.0,
            rng: StdRng::seed_from_u64(config.seed),
            iw_scheduler: IwScheduler::build(config),
        })
    }

    /// Builds a buffer holding an initial memory of `(transition, delta)` pairs.
    pub fn with_memory(
        config: &PerConfig,
        memory: impl IntoIterator<Item = (Transition<O, A>, f32)>,
    ) -> Result<Self> {
        let mut per = Self::build(config)?;
        for (tr, delta) in memory {
            per.store(tr, Some(delta))?;
        }
        Ok(per)
    }

    /// Priority of a transition with TD-error derived `delta`.
    pub fn priority(&self, delta: f32) -> f32 {
        (delta.abs() + self.eps).powf(self.alpha)
    }

    /// Running maximum of the deltas given to `store()` and `update()`.
    pub fn max_priority(&self) -> f32 {
        self.max_priority
    }

    /// Sum of the priorities of all stored transitions.
    pub fn total_p(&self) -> f32 {
        self.elements.total_p()
    }

    fn check_full(&self) -> Result<(), PerError> {
        if self.elements.full() {
            Ok(())
        } else {
            Err(PerError::NotFull {
                len: self.elements.len(),
                capacity: self.elements.capacity(),
            })
        }
    }

    fn stacked_item(&self, ix: usize) -> Result<StackedTransition<O, A>, PerError> {
        stack_frames(self.elements.elements(), ix, self.framestack).ok_or(PerError::InvalidIndex {
            id: ix,
            capacity: self.elements.capacity(),
        })
    }
}

impl<O, A> PrioritizedReplayBase<O, A> for ProportionalPer<O, A>
where
    O: FrameObs,
    A: Clone,
{
    fn store(&mut self, tr: Transition<O, A>, delta: Option<f32>) -> Result<usize> {
        let delta = delta.unwrap_or(self.max_priority);
        if !delta.is_finite() {
            return Err(PerError::InvalidPriority(delta).into());
        }
        if delta < 0.0 {
            return Err(PerError::NegativePriority(delta).into());
        }
        self.max_priority = self.max_priority.max(delta);

        let p = self.priority(delta);
        let ix = self.elements.add(tr, p);
        trace!("Stored a transition at {} with priority {}", ix, p);
        Ok(ix)
    }

    fn update(&mut self, ids: &[usize], deltas: &[f32]) -> Result<()> {
        if ids.len() != deltas.len() {
            return Err(PerError::LengthMismatch {
                ids: ids.len(),
                priorities: deltas.len(),
            }
            .into());
        }
        if let Some(&id) = ids.iter().find(|&&id| id >= self.elements.len()) {
            return Err(PerError::InvalidIndex {
                id,
                capacity: self.elements.capacity(),
            }
            .into());
        }
        if let Some(&delta) = deltas.iter().find(|d| !d.is_finite()) {
            return Err(PerError::InvalidPriority(delta).into());
        }

        for (&ix, &delta) in ids.iter().zip(deltas.iter()) {
            let p = self.priority(delta);
            self.elements.update(ix, p);
            self.max_priority = self.max_priority.max(delta.abs());
        }
        trace!("Updated {} priorities, total_p = {}", ids.len(), self.total_p());
        self.iw_scheduler.step();
        Ok(())
    }

    fn sample(&mut self) -> Result<PerBatch<O, A>> {
        self.check_full()?;

        let total_p = self.elements.total_p();
        let seg_size = total_p / self.seg_num as f32;
        let n = self.elements.capacity() as f32;
        let mut items = Vec::with_capacity(self.seg_num);
        let mut ids = Vec::with_capacity(self.seg_num);
        let mut probs = Vec::with_capacity(self.seg_num);

        for seg in 0..self.seg_num {
            let low = seg_size * seg as f32;
            let s = low + seg_size * self.rng.gen::<f32>();
            let (_, ix, p) = self.elements.retrieve(s);
            items.push(self.stacked_item(ix)?);
            ids.push(ix);
            probs.push(n * p / total_p);
        }
        debug!("Sampled {} transitions, total_p = {}", ids.len(), total_p);

        Ok(PerBatch { items, ids, probs })
    }

    fn sample_one(&mut self) -> Result<(StackedTransition<O, A>, usize)> {
        self.check_full()?;

        let s = self.elements.total_p() * self.rng.gen::<f32>();
        let (_, ix, _) = self.elements.retrieve(s);
        Ok((self.stacked_item(ix)?, ix))
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn capacity(&self) -> usize {
        self.elements.capacity()
    }

    fn is_full(&self) -> bool {
        self.elements.full()
    }

    fn beta(&self) -> f32 {
        self.iw_scheduler.beta()
    }
}

impl<O, A> ExperienceBufferBase for ProportionalPer<O, A>
where
    O: FrameObs,
    A: Clone,
{
    type Item = Transition<O, A>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.store(tr, None).map(|_| ())
    }

    fn len(&self) -> usize {
        self.elements.len()
    }
}
