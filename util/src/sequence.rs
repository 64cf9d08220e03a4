//! A lazy, restartable single-producer/multi-consumer sequence used to
//! deliver newly accepted connections (`Listener`) and newly opened
//! incoming data channels (`Connection`) to callers without blocking any
//! protocol-plane operation on a consumer being present.

use std::sync::mpsc::{self, Receiver, Sender};

/// Producer half. Dropping it (via [`Producer::close`] or simply letting it
/// go out of scope) completes the sequence: outstanding and future
/// `Consumer::iter()` calls stop yielding once drained.
pub struct Producer<T> {
    tx: Option<Sender<T>>,
}

/// Consumer half. `Receiver` is cheaply shareable across threads; each
/// clone of the channel still delivers every item exactly once.
pub struct Consumer<T> {
    rx: Receiver<T>,
}

pub fn sequence<T>() -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = mpsc::channel();
    (Producer { tx: Some(tx) }, Consumer { rx })
}

impl<T> Producer<T> {
    /// Publish an item. A no-op if the sequence has already been closed.
    pub fn publish(&self, item: T) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(item);
        }
    }

    /// Complete the sequence. Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl<T> Consumer<T> {
    /// Drain whatever has been published so far without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = T> + '_ {
        self.rx.try_iter()
    }

    /// Block until either an item arrives or the sequence completes.
    pub fn blocking_next(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_on_close() {
        let (mut producer, consumer) = sequence::<i32>();
        producer.publish(1);
        producer.publish(2);
        producer.close();
        let items: Vec<_> = consumer.try_iter().collect();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(consumer.blocking_next(), None);
    }
}
