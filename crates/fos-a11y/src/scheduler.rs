//! Flush Scheduling
//!
//! The event queue flushes after the next layout pass of its document. The
//! render pipeline is reached through [`RefreshDriver`]; [`FlushScheduler`]
//! keeps the registration idempotent.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::DocumentId;

/// Render pipeline hook: tick observers registered per document
pub trait RefreshDriver {
    /// Register for ticks of the document; false if registration failed
    fn add_refresh_observer(&mut self, document: DocumentId) -> bool;

    /// Remove a registration; false if it could not be removed
    fn remove_refresh_observer(&mut self, document: DocumentId) -> bool;
}

/// Idempotent arm/disarm around a refresh driver
pub struct FlushScheduler {
    /// `None` when the document has no render pipeline
    driver: Option<Box<dyn RefreshDriver>>,
    armed: bool,
}

impl std::fmt::Debug for FlushScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushScheduler")
            .field("has_driver", &self.driver.is_some())
            .field("armed", &self.armed)
            .finish()
    }
}

impl FlushScheduler {
    pub fn new(driver: Box<dyn RefreshDriver>) -> Self {
        Self { driver: Some(driver), armed: false }
    }

    /// Scheduler for a document without a render pipeline; never arms
    pub fn detached() -> Self {
        Self { driver: None, armed: false }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Register for the next tick unless already registered
    pub fn arm(&mut self, document: DocumentId) -> bool {
        if self.armed {
            return true;
        }
        if let Some(driver) = self.driver.as_mut() {
            self.armed = driver.add_refresh_observer(document);
        }
        self.armed
    }

    /// Cancel the registration if there is one
    pub fn disarm(&mut self, document: DocumentId) {
        if !self.armed {
            return;
        }
        let removed = match self.driver.as_mut() {
            Some(driver) => driver.remove_refresh_observer(document),
            None => true,
        };
        if removed {
            self.armed = false;
        }
    }
}

/// Refresh driver ticked by hand, for headless hosts and tests.
///
/// Clones share the same registrations, so the host keeps one handle and
/// gives another to the queue.
#[derive(Debug, Clone, Default)]
pub struct ManualRefreshDriver {
    observers: Rc<RefCell<Vec<DocumentId>>>,
}

impl ManualRefreshDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_observing(&self, document: DocumentId) -> bool {
        self.observers.borrow().contains(&document)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Documents to run a tick for, in registration order.
    /// Registrations persist until removed.
    pub fn tick(&self) -> Vec<DocumentId> {
        self.observers.borrow().clone()
    }
}

impl RefreshDriver for ManualRefreshDriver {
    fn add_refresh_observer(&mut self, document: DocumentId) -> bool {
        let mut observers = self.observers.borrow_mut();
        if !observers.contains(&document) {
            observers.push(document);
        }
        true
    }

    fn remove_refresh_observer(&mut self, document: DocumentId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|&doc| doc != document);
        observers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_is_idempotent() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = FlushScheduler::new(Box::new(driver.clone()));
        let doc = DocumentId::from_raw(0);

        assert!(scheduler.arm(doc));
        assert!(scheduler.arm(doc));
        assert!(scheduler.is_armed());
        assert_eq!(driver.observer_count(), 1);

        scheduler.disarm(doc);
        scheduler.disarm(doc);
        assert!(!scheduler.is_armed());
        assert!(!driver.is_observing(doc));
    }

    #[test]
    fn test_detached_scheduler_never_arms() {
        let mut scheduler = FlushScheduler::detached();
        assert!(!scheduler.arm(DocumentId::from_raw(0)));
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_failed_registration_stays_disarmed() {
        struct Refusing;
        impl RefreshDriver for Refusing {
            fn add_refresh_observer(&mut self, _document: DocumentId) -> bool {
                false
            }
            fn remove_refresh_observer(&mut self, _document: DocumentId) -> bool {
                true
            }
        }

        let mut scheduler = FlushScheduler::new(Box::new(Refusing));
        assert!(!scheduler.arm(DocumentId::from_raw(3)));
        assert!(!scheduler.is_armed());
    }
}
