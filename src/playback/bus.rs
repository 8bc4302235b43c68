use crossbeam_channel::{Receiver, Sender, unbounded};

use super::PlayerUpdate;

/// Fan-out of player updates. Subscribers deregister by dropping their
/// receiver; closed channels are pruned on the next broadcast.
#[derive(Debug, Default)]
pub(crate) struct UpdateBus {
    subscribers: Vec<Sender<PlayerUpdate>>,
}

impl UpdateBus {
    pub(crate) fn subscribe(&mut self) -> Receiver<PlayerUpdate> {
        let (tx, rx) = unbounded::<PlayerUpdate>();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn broadcast(&mut self, update: PlayerUpdate) {
        self.subscribers
            .retain(|tx| tx.send(update.clone()).is_ok());
    }

    pub(crate) fn close(&mut self) {
        self.subscribers.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
