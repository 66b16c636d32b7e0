//! Transfer of transitions from actors to the learner owning a replay buffer.
//!
//! Actors push transitions into a [`TransitionProxy`], which buffers them and
//! sends them in chunks through a channel. The learner loop calls
//! [`drain_pushed_items`] between optimization steps, so that the replay
//! buffer is mutated by the learner thread only.
use crate::{ExperienceBufferBase, PerError};
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

/// Transitions sent from an actor.
#[derive(Debug)]
pub struct PushedItemMessage<T> {
    /// Id of the actor.
    pub id: usize,

    /// Pushed transitions.
    pub pushed_items: Vec<T>,
}

/// Configuration of [`TransitionProxy`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TransitionProxyConfig {
    /// Number of transitions buffered until sent to the learner.
    pub n_buffer: usize,
}

impl Default for TransitionProxyConfig {
    fn default() -> Self {
        Self { n_buffer: 100 }
    }
}

/// A stand-in of the replay buffer on the actor side.
pub struct TransitionProxy<T> {
    id: usize,

    /// Sender of [`PushedItemMessage`].
    sender: Sender<PushedItemMessage<T>>,

    /// Number of transitions buffered until sent to the learner.
    n_buffer: usize,

    buffer: Vec<T>,
}

impl<T> TransitionProxy<T> {
    /// Creates a proxy sending to `sender`.
    pub fn build_with_sender(
        id: usize,
        config: &TransitionProxyConfig,
        sender: Sender<PushedItemMessage<T>>,
    ) -> Self {
        let n_buffer = config.n_buffer.max(1);
        Self {
            id,
            sender,
            n_buffer,
            buffer: Vec::with_capacity(n_buffer),
        }
    }

    /// Sends the buffered transitions, if any.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let pushed_items = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.n_buffer));
        trace!("Actor {} sends {} transitions", self.id, pushed_items.len());

        let msg = PushedItemMessage {
            id: self.id,
            pushed_items,
        };
        self.sender
            .try_send(msg)
            .map_err(|_| PerError::SendMsgForPush)?;
        Ok(())
    }
}

impl<T> ExperienceBufferBase for TransitionProxy<T> {
    type Item = T;

    fn push(&mut self, tr: T) -> Result<()> {
        self.buffer.push(tr);
        if self.buffer.len() == self.n_buffer {
            self.flush()?;
        }
        Ok(())
    }

    /// Number of transitions buffered and not sent yet.
    fn len(&self) -> usize {
        self.buffer.len()
    }
}

/// Pushes all pending transitions in `receiver` into `buffer`.
///
/// Returns the number of pushed transitions. It does not block.
///
/// If `buffer` rejects a transition, the rest of that message is dropped and
/// the error is returned; messages still in the channel are kept.
pub fn drain_pushed_items<R>(
    receiver: &Receiver<PushedItemMessage<R::Item>>,
    buffer: &mut R,
) -> Result<usize>
where
    R: ExperienceBufferBase,
{
    let mut n = 0;
    loop {
        match receiver.try_recv() {
            Ok(msg) => {
                trace!("Received {} transitions from actor {}", msg.pushed_items.len(), msg.id);
                let n_items = msg.pushed_items.len();
                for (i, tr) in msg.pushed_items.into_iter().enumerate() {
                    if let Err(e) = buffer.push(tr) {
                        warn!(
                            "Dropped {} transitions from actor {}: {}",
                            n_items - i,
                            msg.id,
                            e
                        );
                        return Err(e);
                    }
                    n += 1;
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    if n > 0 {
        debug!("Pushed {} transitions, {} in the buffer", n, buffer.len());
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    struct VecBuffer(Vec<usize>);

    impl ExperienceBufferBase for VecBuffer {
        type Item = usize;

        fn push(&mut self, tr: usize) -> Result<()> {
            self.0.push(tr);
            Ok(())
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn test_proxy_buffers_and_drains() -> Result<()> {
        let (s, r) = unbounded();
        let config = TransitionProxyConfig { n_buffer: 3 };
        let mut proxy = TransitionProxy::build_with_sender(0, &config, s);
        let mut buffer = VecBuffer(vec![]);

        proxy.push(0)?;
        proxy.push(1)?;
        assert_eq!(proxy.len(), 2);
        assert_eq!(drain_pushed_items(&r, &mut buffer)?, 0);

        proxy.push(2)?;
        assert_eq!(proxy.len(), 0);
        proxy.push(3)?;
        proxy.flush()?;
        assert_eq!(drain_pushed_items(&r, &mut buffer)?, 4);
        assert_eq!(buffer.0, vec![0, 1, 2, 3]);
        Ok(())
    }

    struct BoundedBuffer(Vec<usize>, usize);

    impl ExperienceBufferBase for BoundedBuffer {
        type Item = usize;

        fn push(&mut self, tr: usize) -> Result<()> {
            if self.0.len() == self.1 {
                return Err(PerError::InvalidIndex { id: tr, capacity: self.1 }.into());
            }
            self.0.push(tr);
            Ok(())
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn test_drain_stops_at_rejected_item() -> Result<()> {
        let (s, r) = unbounded();
        s.send(PushedItemMessage { id: 0, pushed_items: vec![0, 1, 2, 3] })?;
        s.send(PushedItemMessage { id: 1, pushed_items: vec![4] })?;

        let mut buffer = BoundedBuffer(vec![], 2);
        let err = drain_pushed_items(&r, &mut buffer).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PerError>(),
            Some(&PerError::InvalidIndex { id: 2, capacity: 2 })
        );
        assert_eq!(buffer.0, vec![0, 1]);

        // The next message stays in the channel.
        assert_eq!(r.len(), 1);
        Ok(())
    }

    #[test]
    fn test_send_fails_when_queue_full() -> Result<()> {
        let (s, _r) = bounded(1);
        let config = TransitionProxyConfig { n_buffer: 1 };
        let mut proxy = TransitionProxy::build_with_sender(1, &config, s);
        proxy.push(0)?;
        let err = proxy.push(1).unwrap_err();
        assert_eq!(err.downcast_ref::<PerError>(), Some(&PerError::SendMsgForPush));
        Ok(())
    }
}
