//! Event Shell
//!
//! Fires single events at the platform layer right away, bypassing the
//! queue. While a handler runs it gets a [`FireContext`] naming the event's
//! target and whether the event came from user input, so attributes it
//! computes for that target can be tagged accordingly.

use std::collections::BTreeMap;

use fos_dom::NodeId;

use crate::event::{AccEvent, EventType, IsFromUserInput};
use crate::host::{AccessibleId, AccessibleTree};
use crate::queue::{EventDispatcher, EventQueue};

/// Object attributes of an accessible
pub type AccAttributes = BTreeMap<String, String>;

/// Attribute set on the target of the event being fired
pub const EVENT_FROM_INPUT: &str = "event-from-input";

/// State published to the handler for the duration of one fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireContext {
    target_node: Option<NodeId>,
    from_user_input: bool,
}

impl FireContext {
    pub fn target_node(&self) -> Option<NodeId> {
        self.target_node
    }

    pub fn is_from_user_input(&self) -> bool {
        self.from_user_input
    }

    /// Tag attributes computed for `node` if it is the event's target
    pub fn event_attributes(&self, node: NodeId, attributes: &mut AccAttributes) {
        if self.target_node != Some(node) {
            return;
        }
        let value = if self.from_user_input { "true" } else { "false" };
        attributes.insert(EVENT_FROM_INPUT.to_string(), value.to_string());
    }
}

/// Platform side of event delivery
pub trait AccEventHandler {
    fn handle_acc_event(&mut self, accessible: AccessibleId, event: &AccEvent, ctx: &FireContext);
}

impl<F> AccEventHandler for F
where
    F: FnMut(AccessibleId, &AccEvent, &FireContext),
{
    fn handle_acc_event(&mut self, accessible: AccessibleId, event: &AccEvent, ctx: &FireContext) {
        self(accessible, event, ctx)
    }
}

/// Stateless entry points for firing events immediately
pub struct EventShell;

impl EventShell {
    /// Hand one event to the handler. Events whose accessible cannot be
    /// resolved are dropped.
    pub fn fire_event(event: &mut AccEvent, tree: &dyn AccessibleTree, handler: &mut dyn AccEventHandler) {
        let Some(accessible) = event.accessible(tree) else {
            tracing::debug!("Cannot fire {} event without an accessible", event.event_type());
            return;
        };

        let ctx = FireContext {
            target_node: event.node(tree),
            from_user_input: event.is_from_user_input(),
        };
        handler.handle_acc_event(accessible, event, &ctx);
    }

    /// Build an event with the type's default rule and fire it
    pub fn fire(
        event_type: EventType,
        accessible: AccessibleId,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
        handler: &mut dyn AccEventHandler,
    ) {
        let mut event = AccEvent::with_options(
            event_type,
            accessible,
            is_async,
            from_input,
            event_type.default_rule(),
            tree,
        );
        Self::fire_event(&mut event, tree, handler);
    }
}

/// Queue dispatcher firing every flushed event through [`EventShell`]
#[derive(Debug, Default)]
pub struct ShellDispatcher<H> {
    handler: H,
}

impl<H: AccEventHandler> ShellDispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H: AccEventHandler> EventDispatcher for ShellDispatcher<H> {
    fn process_pending_event(
        &mut self,
        event: &mut AccEvent,
        _queue: &mut EventQueue,
        tree: &dyn AccessibleTree,
    ) {
        EventShell::fire_event(event, tree, &mut self.handler);
    }
}
