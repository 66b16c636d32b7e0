use anyhow::Result;
use border_per::{
    drain_pushed_items, ExperienceBufferBase, PerConfig, PrioritizedReplayBase, ProportionalPer,
    RankPer, TransitionProxy, TransitionProxyConfig, Transition,
};
use crossbeam_channel::unbounded;
use std::thread;
use test_log::test;

type Obs = Vec<f32>;
type Act = usize;

const CAPACITY: usize = 8;
const FRAMESTACK: usize = 2;

fn transition(i: usize) -> Transition<Obs, Act> {
    // Observations are non-zero so that padding can be told apart.
    let obs = vec![(i + 1) as f32; 3];
    let next_obs = vec![(i + 2) as f32; 3];
    Transition::new(obs, i, i as f32, next_obs, i % 4 == 3)
}

fn config() -> PerConfig {
    PerConfig::default()
        .capacity(CAPACITY)
        .framestack(FRAMESTACK)
        .seg_num(2)
        .seed(0)
}

/// Stores 8 transitions with increasing rewards and `done` at slots 3 and 7,
/// updates two priorities, samples and checks the stacks.
fn run_scenario<R: PrioritizedReplayBase<Obs, Act>>(per: &mut R) -> Result<()> {
    for i in 0..CAPACITY {
        assert_eq!(per.store(transition(i), None)?, i);
    }
    assert!(per.is_full());

    per.update(&[0, 3], &[5.0, 1.0])?;

    for _ in 0..20 {
        let batch = per.sample()?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids.len(), 2);
        assert_eq!(batch.probs.len(), 2);
        assert!(batch.probs.iter().all(|&p| p > 0.0));

        for (item, &id) in batch.items.iter().zip(batch.ids.iter()) {
            assert_eq!(item.reward, id as f32);
            assert_eq!(item.obs.len(), FRAMESTACK);
            assert_eq!(item.obs[1], transition(id).obs);

            // Slot 0 is the oldest and slot 4 starts a new episode after the
            // `done` at slot 3, so both are padded.
            let prev = if id == 0 || id == 4 {
                vec![0f32; 3]
            } else {
                transition(id - 1).obs
            };
            assert_eq!(item.obs[0], prev);
        }

        let weights = batch.weights(per.beta());
        assert!(weights.iter().all(|&w| w > 0.0 && w <= 1.0));
        per.update(&batch.ids, &[0.5, 0.5])?;
    }
    Ok(())
}

#[test]
fn test_proportional_scenario() -> Result<()> {
    let mut per = ProportionalPer::<Obs, Act>::build(&config())?;
    run_scenario(&mut per)
}

#[test]
fn test_rank_scenario() -> Result<()> {
    let mut per = RankPer::<Obs, Act>::build(&config())?;
    run_scenario(&mut per)
}

fn check_wraparound<R: PrioritizedReplayBase<Obs, Act>>(per: &mut R) -> Result<()> {
    let k = 3;
    for i in 0..CAPACITY + k {
        per.store(transition(i), None)?;
    }
    assert_eq!(per.len(), CAPACITY);
    for _ in 0..100 {
        let (item, id) = per.sample_one()?;
        // Transitions 0..k were overwritten by CAPACITY..CAPACITY + k.
        assert!(item.act >= k);
        assert_eq!(item.act % CAPACITY, id);
    }
    Ok(())
}

#[test]
fn test_wraparound() -> Result<()> {
    check_wraparound(&mut ProportionalPer::<Obs, Act>::build(&config())?)?;
    check_wraparound(&mut RankPer::<Obs, Act>::build(&config())?)?;
    Ok(())
}

#[test]
fn test_not_full() -> Result<()> {
    let mut p = ProportionalPer::<Obs, Act>::build(&config())?;
    let mut r = RankPer::<Obs, Act>::build(&config())?;
    for i in 0..CAPACITY - 1 {
        p.store(transition(i), None)?;
        r.store(transition(i), None)?;
    }
    assert!(p.sample().is_err());
    assert!(r.sample().is_err());
    assert!(p.sample_one().is_err());
    assert!(r.sample_one().is_err());
    Ok(())
}

#[test]
fn test_with_memory() -> Result<()> {
    let memory = (0..CAPACITY).map(|i| (transition(i), i as f32)).collect::<Vec<_>>();
    let mut p = ProportionalPer::with_memory(&config(), memory.clone())?;
    let mut r = RankPer::with_memory(&config(), memory)?;
    assert!(p.is_full() && r.is_full());
    assert_eq!(p.max_priority(), 7.0);
    assert_eq!(r.max_priority(), 7.0);
    assert_eq!(p.sample()?.len(), 2);
    assert_eq!(r.sample()?.len(), 2);
    Ok(())
}

#[test]
fn test_learner_loop_with_proxy() -> Result<()> {
    let (sender, receiver) = unbounded();
    let n_actors = 2;
    let handles = (0..n_actors)
        .map(|id| {
            let sender = sender.clone();
            thread::spawn(move || -> Result<()> {
                let config = TransitionProxyConfig { n_buffer: 3 };
                let mut proxy = TransitionProxy::build_with_sender(id, &config, sender);
                for i in 0..10 {
                    proxy.push(transition(i))?;
                }
                proxy.flush()
            })
        })
        .collect::<Vec<_>>();
    for h in handles {
        h.join().expect("Actor thread panicked")?;
    }

    let mut per = ProportionalPer::<Obs, Act>::build(&config())?;
    let n = drain_pushed_items(&receiver, &mut per)?;
    assert_eq!(n, 20);
    assert_eq!(ExperienceBufferBase::len(&per), CAPACITY);

    for _ in 0..10 {
        let batch = per.sample()?;
        let td_errs = batch.items.iter().map(|tr| tr.reward).collect::<Vec<_>>();
        per.update(&batch.ids, &td_errs)?;
    }
    Ok(())
}
