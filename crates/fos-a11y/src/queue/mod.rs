//! Accessibility Event Queue
//!
//! Per-document buffer of pending events. Every push coalesces the new
//! event against the ones already queued; the whole buffer is flushed to
//! an [`EventDispatcher`] once per refresh tick.
//!
//! Flushing swaps the buffer out before dispatching, so events pushed by a
//! handler during the flush wait for the next tick.

mod coalesce;
mod text;

use fos_dom::DocumentId;

use crate::config::QueueConfig;
use crate::event::AccEvent;
use crate::host::AccessibleTree;
use crate::scheduler::{FlushScheduler, RefreshDriver};

/// Receiver of events leaving the queue
pub trait EventDispatcher {
    /// Handle one event. The queue is handed back so the handler may push
    /// follow-up events or shut the queue down.
    fn process_pending_event(
        &mut self,
        event: &mut AccEvent,
        queue: &mut EventQueue,
        tree: &dyn AccessibleTree,
    );
}

/// Pending accessibility events of one document
#[derive(Debug)]
pub struct EventQueue {
    /// `None` once shut down
    document: Option<DocumentId>,
    events: Vec<AccEvent>,
    scheduler: FlushScheduler,
    config: QueueConfig,
}

impl EventQueue {
    pub fn new(document: DocumentId, driver: Box<dyn RefreshDriver>) -> Self {
        Self::with_config(document, FlushScheduler::new(driver), QueueConfig::default())
    }

    pub fn with_config(document: DocumentId, scheduler: FlushScheduler, config: QueueConfig) -> Self {
        tracing::debug!("Created accessibility event queue for {:?}", document);
        Self {
            document: Some(document),
            events: Vec::new(),
            scheduler,
            config,
        }
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Events waiting for the next flush, oldest first
    pub fn pending(&self) -> &[AccEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn is_shut_down(&self) -> bool {
        self.document.is_none()
    }

    /// Queue an event, coalesce it and make sure a flush is scheduled
    pub fn push(&mut self, event: AccEvent, tree: &dyn AccessibleTree) {
        if self.document.is_none() {
            tracing::debug!("Dropping {} event pushed after shutdown", event.event_type());
            return;
        }

        self.events.push(event);
        self.coalesce_events(tree);

        // The text change may already have been taken over from a hidden
        // sibling while coalescing.
        let tail = self.events.len() - 1;
        if self.events[tail].mutation().is_some_and(|m| m.text_change.is_none()) {
            self.create_text_change_event_for(tail, tree);
        }

        self.prepare_flush();
    }

    /// Drop pending events and stop observing refresh ticks
    pub fn shutdown(&mut self) {
        let Some(document) = self.document.take() else {
            return;
        };
        self.scheduler.disarm(document);
        tracing::debug!(
            "Shut down accessibility event queue for {:?}, dropping {} events",
            document,
            self.events.len()
        );
        self.events.clear();
    }

    fn prepare_flush(&mut self) {
        if self.events.is_empty() || self.scheduler.is_armed() {
            return;
        }
        if let Some(document) = self.document {
            self.scheduler.arm(document);
        }
    }

    /// Refresh tick: fire every event queued before the tick started
    pub fn will_refresh(&mut self, tree: &dyn AccessibleTree, dispatcher: &mut dyn EventDispatcher) {
        let Some(document) = self.document else {
            return;
        };

        let mut events = std::mem::take(&mut self.events);
        tracing::debug!("Processing {} accessibility events for {:?}", events.len(), document);

        for event in events.iter_mut() {
            if event.is_suppressed() {
                continue;
            }

            if self.config.skip_defunct_targets {
                let live = event.accessible(tree).is_some_and(|acc| !tree.is_defunct(acc));
                if !live {
                    tracing::trace!("Dropping {} event without a live target", event.event_type());
                    continue;
                }
            }

            dispatcher.process_pending_event(event, self, tree);
            if self.document.is_none() {
                tracing::debug!("Document shut down while handling events, aborting flush");
                return;
            }

            // Text change caused by the tree mutation goes right after it.
            if let Some(text_change) = event.mutation_mut().and_then(|m| m.text_change.as_deref_mut()) {
                dispatcher.process_pending_event(text_change, self, tree);
                if self.document.is_none() {
                    tracing::debug!("Document shut down while handling events, aborting flush");
                    return;
                }
            }
        }

        if self.events.is_empty() {
            self.scheduler.disarm(document);
        }
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
