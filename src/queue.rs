use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Non-blocking enqueue into a bounded queue.
///
/// Returns `false` when the item was dropped because the queue is full or
/// already closed. Dropping is the intended load-shedding behaviour, not an
/// error, so callers are free to ignore the flag.
pub trait Offer<T> {
    fn offer(&self, item: T) -> bool;
}

impl<T> Offer<T> for Sender<T> {
    #[inline(always)]
    fn offer(&self, item: T) -> bool {
        match self.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Creates a fixed-capacity FIFO queue.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    crossbeam_channel::bounded(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_drops_when_full() {
        let (tx, rx) = bounded::<u32>(2);
        assert!(tx.offer(1));
        assert!(tx.offer(2));
        assert!(!tx.offer(3));
        assert_eq!(tx.len(), 2);

        assert_eq!(rx.recv().ok(), Some(1));
        assert!(tx.offer(4));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_offer_after_close_is_dropped() {
        let (tx, rx) = bounded::<u32>(2);
        drop(rx);
        assert!(!tx.offer(1));
    }
}
