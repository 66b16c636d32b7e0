//! Rank-based prioritized experience replay.
use crate::{
    frame_stack::stack_frames, ExperienceBufferBase, FrameObs, IndexPriorityQueue, IwScheduler,
    PerBatch, PerConfig, PerError, PrioritizedReplayBase, StackedTransition, Transition,
};
use anyhow::Result;
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Rank-based prioritized experience replay.
///
/// Transitions are kept in an [`IndexPriorityQueue`] keyed by their delta.
/// The probability of rank $r$ (0-based) is
/// $P(r)=(1/(r+1))^\alpha/\sum_k(1/(k+1))^\alpha$. The ranks are split into
/// `seg_num` segments of approximately equal probability mass, computed once
/// at construction, and one transition is drawn uniformly from each segment.
///
/// The rank of a transition is its position in the heap array, which is in
/// heap order rather than fully sorted; segments partition the heap array.
pub struct RankPer<O, A> {
    seg_num: usize,
    framestack: usize,
    elements: IndexPriorityQueue<Transition<O, A>>,
    pmf: Vec<f64>,

    /// `seg_bound[s - 1]..seg_bound[s]` is the range of ranks in segment `s`.
    seg_bound: Vec<usize>,

    /// Running maximum of the deltas seen so far.
    max_priority: f32,

    rng: StdRng,
    iw_scheduler: IwScheduler,
}

/// Power-law probability mass over ranks `0..n`.
fn build_pmf(alpha: f32, n: usize) -> Vec<f64> {
    let alpha = alpha as f64;
    let p = (0..n)
        .map(|rank| (1.0 / (rank + 1) as f64).powf(alpha))
        .collect::<Vec<_>>();
    let sum: f64 = p.iter().sum();
    p.iter().map(|x| x / sum).collect()
}

/// Ends of the segments, scanning the CDF until it first reaches each
/// multiple of `1 / seg_num`.
fn compute_seg_bound(pmf: &[f64], seg_num: usize) -> Vec<usize> {
    let n = pmf.len();
    let mut seg_bound = vec![0; seg_num + 1];
    let mut index = 0;
    let mut cdf = pmf.first().copied().unwrap_or(0.0);
    for seg in 1..=seg_num {
        let cur_bound = seg as f64 / seg_num as f64;
        while index < n && cdf < cur_bound {
            index += 1;
            if index < n {
                cdf += pmf[index];
            }
        }
        seg_bound[seg] = (index + 1).min(n);
    }
    seg_bound
}

impl<O, A> RankPer<O, A>
where
    O: FrameObs,
    A: Clone,
{
    /// Builds an empty buffer.
    pub fn build(config: &PerConfig) -> Result<Self> {
        config.check()?;
        info!(
            "Construct rank-based PER with capacity = {}, alpha = {}, seg_num = {}",
            config.capacity, config.alpha, config.seg_num
        );

        let pmf = build_pmf(config.alpha, config.capacity);
        let seg_bound = compute_seg_bound(&pmf, config.seg_num);
        debug!("Segment bounds: {:?}", seg_bound);

        Ok(Self {
            seg_num: config.seg_num,
            framestack: config.framestack,
            elements: IndexPriorityQueue::new(config.capacity),
            pmf,
            seg_bound,
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

    /// Probability mass of each rank.
    pub fn pmf(&self) -> &[f64] {
        &self.pmf
    }

    /// Segment boundaries over ranks; `seg_bound()[0] == 0`.
    pub fn seg_bound(&self) -> &[usize] {
        &self.seg_bound
    }

    /// Running maximum of the deltas given to `store()` and `update()`.
    pub fn max_priority(&self) -> f32 {
        self.max_priority
    }

    /// Range of ranks of segment `seg_id` in `1..=seg_num`.
    ///
    /// An empty segment is widened to the single preceding rank.
    fn segment(&self, seg_id: usize) -> (usize, usize) {
        debug_assert!(seg_id > 0 && seg_id <= self.seg_num);
        let (mut start, end) = (self.seg_bound[seg_id - 1], self.seg_bound[seg_id]);
        if start == end {
            start -= 1;
        }
        (start, end)
    }

    fn sample_from_segment(
        &mut self,
        seg_id: usize,
    ) -> Result<(StackedTransition<O, A>, usize, f32), PerError> {
        let (start, end) = self.segment(seg_id);
        let rank = self.rng.gen_range(start..end);
        let (_, id) = self.elements.heap()[rank];
        let item = stack_frames(self.elements.elements(), id, self.framestack).ok_or(
            PerError::InvalidIndex {
                id,
                capacity: self.elements.capacity(),
            },
        )?;
        Ok((item, id, self.pmf[rank] as f32))
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
}

impl<O, A> PrioritizedReplayBase<O, A> for RankPer<O, A>
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

        let id = self.elements.put(tr, delta);
        trace!("Stored a transition with id {} and priority {}", id, delta);
        Ok(id)
    }

    fn update(&mut self, ids: &[usize], deltas: &[f32]) -> Result<()> {
        if ids.len() != deltas.len() {
            return Err(PerError::LengthMismatch {
                ids: ids.len(),
                priorities: deltas.len(),
            }
            .into());
        }
        if let Some(&id) = ids.iter().find(|&&id| self.elements.position(id).is_none()) {
            return Err(PerError::InvalidIndex {
                id,
                capacity: self.elements.capacity(),
            }
            .into());
        }
        if let Some(&delta) = deltas.iter().find(|d| !d.is_finite()) {
            return Err(PerError::InvalidPriority(delta).into());
        }

        for (&id, &delta) in ids.iter().zip(deltas.iter()) {
            let delta = delta.abs();
            self.elements.update_item(id, delta);
            self.max_priority = self.max_priority.max(delta);
        }
        trace!("Updated {} priorities", ids.len());
        self.iw_scheduler.step();
        Ok(())
    }

    fn sample(&mut self) -> Result<PerBatch<O, A>> {
        self.check_full()?;

        let n = self.elements.capacity() as f32;
        let mut items = Vec::with_capacity(self.seg_num);
        let mut ids = Vec::with_capacity(self.seg_num);
        let mut probs = Vec::with_capacity(self.seg_num);

        for seg_id in 1..=self.seg_num {
            let (item, id, prob) = self.sample_from_segment(seg_id)?;
            items.push(item);
            ids.push(id);
            probs.push(n * prob);
        }
        debug!("Sampled {} transitions from {} segments", ids.len(), self.seg_num);

        Ok(PerBatch { items, ids, probs })
    }

    fn sample_one(&mut self) -> Result<(StackedTransition<O, A>, usize)> {
        self.check_full()?;

        let seg_id = self.rng.gen_range(1..=self.seg_num);
        let (item, id, _) = self.sample_from_segment(seg_id)?;
        Ok((item, id))
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

impl<O, A> ExperienceBufferBase for RankPer<O, A>
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
