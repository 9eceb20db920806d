//! Change notification.

use std::fmt;

/// Receives change events from a state owner.
pub trait Observer<E>: Send {
    /// Called once per event, in emission order.
    fn notify(&mut self, event: &E);
}

impl<E, F> Observer<E> for F
where
    F: FnMut(&E) + Send,
{
    fn notify(&mut self, event: &E) {
        self(event);
    }
}

/// Handle returned by `observe`, used to stop observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers, notified in registration order.
pub struct Observers<E> {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn Observer<E>>)>,
}

impl<E> Observers<E> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register `observer` after every existing one.
    pub fn subscribe(&mut self, observer: impl Observer<E> + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);

        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, Box::new(observer)));

        id
    }

    /// Returns whether the observer was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();

        self.entries.retain(|(entry, _)| *entry != id);

        self.entries.len() != before
    }

    /// Deliver `event` to every observer.
    pub fn notify(&mut self, event: &E) {
        for (_, observer) in &mut self.entries {
            observer.notify(event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is observing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use testresult::TestResult;

    use super::*;

    #[test]
    fn notifies_in_registration_order() -> TestResult {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::new();

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);

            observers.subscribe(move |event: &u32| {
                if let Ok(mut seen) = seen.lock() {
                    seen.push((tag, *event));
                }
            });
        }

        observers.notify(&7);

        assert_eq!(*seen.lock().map_err(|e| e.to_string())?, vec![("first", 7), ("second", 7)]);

        Ok(())
    }

    #[test]
    fn unsubscribed_observers_stop_receiving() -> TestResult {
        let seen = Arc::new(Mutex::new(0_u32));
        let mut observers = Observers::new();

        let id = {
            let seen = Arc::clone(&seen);

            observers.subscribe(move |_: &()| {
                if let Ok(mut seen) = seen.lock() {
                    *seen += 1;
                }
            })
        };

        observers.notify(&());

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id), "second removal must be a no-op");

        observers.notify(&());

        assert_eq!(*seen.lock().map_err(|e| e.to_string())?, 1);
        assert!(observers.is_empty());

        Ok(())
    }
}
