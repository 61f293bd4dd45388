//! Accessibility Events
//!
//! One `AccEvent` describes one pending accessibility notification: its
//! type, its target (node and/or accessible), where it came from and the
//! coalescing rule the queue applies to it. Kind-specific data lives in
//! [`EventPayload`].

mod payload;

pub use payload::{
    CaretMoveData, EventPayload, EventView, HideSnapshot, MutationData, MutationKind,
    ReorderData, SelChangeData, SelChangeType, StateChangeData, StateFlag, TableChangeData,
    TextChangeData,
};

use std::fmt;
use std::str::FromStr;

use fos_dom::{DocumentId, NodeId};

use crate::host::{AccessibleId, AccessibleTree};
use crate::A11yError;

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Show,
    Hide,
    Reorder,
    Focus,
    StateChange,
    NameChange,
    DescriptionChange,
    ValueChange,
    TextInserted,
    TextRemoved,
    TextCaretMoved,
    TextSelectionChanged,
    TableRowInsert,
    TableRowDelete,
    TableColumnInsert,
    TableColumnDelete,
    SelectionAdd,
    SelectionRemove,
    Selection,
    SelectionWithin,
    DocumentLoadComplete,
    Alert,
    MenuStart,
    MenuEnd,
    ScrollingStart,
}

impl EventType {
    pub const ALL: [EventType; 25] = [
        Self::Show,
        Self::Hide,
        Self::Reorder,
        Self::Focus,
        Self::StateChange,
        Self::NameChange,
        Self::DescriptionChange,
        Self::ValueChange,
        Self::TextInserted,
        Self::TextRemoved,
        Self::TextCaretMoved,
        Self::TextSelectionChanged,
        Self::TableRowInsert,
        Self::TableRowDelete,
        Self::TableColumnInsert,
        Self::TableColumnDelete,
        Self::SelectionAdd,
        Self::SelectionRemove,
        Self::Selection,
        Self::SelectionWithin,
        Self::DocumentLoadComplete,
        Self::Alert,
        Self::MenuStart,
        Self::MenuEnd,
        Self::ScrollingStart,
    ];

    /// Rule an event of this type gets unless one is given explicitly
    pub fn default_rule(self) -> EventRule {
        match self {
            Self::Show | Self::Hide | Self::Reorder => EventRule::CoalesceFromSameSubtree,
            Self::Focus => EventRule::CoalesceFromSameDocument,
            // State and text changes are not deduplicated yet.
            Self::StateChange | Self::TextInserted | Self::TextRemoved => EventRule::AllowDupes,
            Self::TextSelectionChanged => EventRule::CoalesceOfSameType,
            Self::SelectionAdd | Self::SelectionRemove | Self::Selection | Self::SelectionWithin => {
                EventRule::CoalesceSelectionChange
            }
            _ => EventRule::RemoveDupes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Reorder => "reorder",
            Self::Focus => "focus",
            Self::StateChange => "state-change",
            Self::NameChange => "name-change",
            Self::DescriptionChange => "description-change",
            Self::ValueChange => "value-change",
            Self::TextInserted => "text-inserted",
            Self::TextRemoved => "text-removed",
            Self::TextCaretMoved => "text-caret-moved",
            Self::TextSelectionChanged => "text-selection-changed",
            Self::TableRowInsert => "table-row-insert",
            Self::TableRowDelete => "table-row-delete",
            Self::TableColumnInsert => "table-column-insert",
            Self::TableColumnDelete => "table-column-delete",
            Self::SelectionAdd => "selection-add",
            Self::SelectionRemove => "selection-remove",
            Self::Selection => "selection",
            Self::SelectionWithin => "selection-within",
            Self::DocumentLoadComplete => "document-load-complete",
            Self::Alert => "alert",
            Self::MenuStart => "menu-start",
            Self::MenuEnd => "menu-end",
            Self::ScrollingStart => "scrolling-start",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| A11yError::UnknownEventType(s.to_string()))
    }
}

/// How the queue coalesces an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRule {
    /// Never coalesced
    AllowDupes,
    /// An earlier event of the same type is dropped for the newer one
    CoalesceOfSameType,
    /// Coalesced with events whose targets are related in the tree
    CoalesceFromSameSubtree,
    /// The newest event of this type in a document wins
    CoalesceFromSameDocument,
    /// Selection events of one widget are packed
    CoalesceSelectionChange,
    /// A newer duplicate (same type and node) is dropped
    RemoveDupes,
    /// Suppressed; terminal
    DoNotEmit,
}

/// Where the user input flag of an event comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsFromUserInput {
    /// Ask the owning document at construction time
    #[default]
    AutoDetect,
    FromUserInput,
    NoUserInput,
}

impl From<bool> for IsFromUserInput {
    fn from(value: bool) -> Self {
        if value { Self::FromUserInput } else { Self::NoUserInput }
    }
}

/// What an event is constructed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Node(NodeId),
    Accessible(AccessibleId),
}

impl From<NodeId> for EventTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<AccessibleId> for EventTarget {
    fn from(accessible: AccessibleId) -> Self {
        Self::Accessible(accessible)
    }
}

bitflags::bitflags! {
    /// Event kind tags; an event's family is the union of the tags of
    /// every kind it is an instance of
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFamily: u32 {
        const GENERIC = 1 << 0;
        const REORDER = 1 << 1;
        const STATE_CHANGE = 1 << 2;
        const TEXT_CHANGE = 1 << 3;
        const MUTATION = 1 << 4;
        const HIDE = 1 << 5;
        const SHOW = 1 << 6;
        const CARET_MOVE = 1 << 7;
        const TABLE_CHANGE = 1 << 8;
        const SELECTION_CHANGE = 1 << 9;
    }
}

/// Pending accessibility notification
#[derive(Debug, Clone)]
pub struct AccEvent {
    pub(crate) event_type: EventType,
    pub(crate) rule: EventRule,
    pub(crate) is_async: bool,
    pub(crate) is_from_user_input: bool,
    pub(crate) node: Option<NodeId>,
    pub(crate) accessible: Option<AccessibleId>,
    pub(crate) payload: EventPayload,
    /// Suppressed on behalf of an event for an ancestor
    pub(crate) covered: bool,
}

impl AccEvent {
    fn raw(
        event_type: EventType,
        accessible: Option<AccessibleId>,
        node: Option<NodeId>,
        is_async: bool,
        rule: EventRule,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_type,
            rule,
            is_async,
            is_from_user_input: false,
            node,
            accessible,
            payload,
            covered: false,
        }
    }

    fn targeted(
        event_type: EventType,
        target: EventTarget,
        is_async: bool,
        rule: EventRule,
        payload: EventPayload,
    ) -> Self {
        match target {
            EventTarget::Node(node) => Self::raw(event_type, None, Some(node), is_async, rule, payload),
            EventTarget::Accessible(acc) => {
                Self::raw(event_type, Some(acc), None, is_async, rule, payload)
            }
        }
    }

    fn captured(mut self, from_input: IsFromUserInput, tree: &dyn AccessibleTree) -> Self {
        self.capture_is_from_user_input(from_input, tree);
        self
    }

    /// Synchronous event with the type's default rule
    pub fn new(event_type: EventType, target: impl Into<EventTarget>, tree: &dyn AccessibleTree) -> Self {
        Self::with_options(
            event_type,
            target,
            false,
            IsFromUserInput::AutoDetect,
            event_type.default_rule(),
            tree,
        )
    }

    pub fn with_options(
        event_type: EventType,
        target: impl Into<EventTarget>,
        is_async: bool,
        from_input: IsFromUserInput,
        rule: EventRule,
        tree: &dyn AccessibleTree,
    ) -> Self {
        Self::targeted(event_type, target.into(), is_async, rule, EventPayload::Generic)
            .captured(from_input, tree)
    }

    /// Reorder of the children of `target`
    pub fn reorder(
        target: AccessibleId,
        is_async: bool,
        is_unconditional: bool,
        reason_node: Option<NodeId>,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let payload = EventPayload::Reorder(ReorderData { is_unconditional, reason_node });
        Self::raw(
            EventType::Reorder,
            Some(target),
            None,
            is_async,
            EventRule::CoalesceFromSameSubtree,
            payload,
        )
        .captured(IsFromUserInput::AutoDetect, tree)
    }

    pub fn state_change(
        accessible: AccessibleId,
        state: StateFlag,
        is_enabled: bool,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let payload = EventPayload::StateChange(StateChangeData { state, is_enabled });
        Self::raw(
            EventType::StateChange,
            Some(accessible),
            None,
            is_async,
            EventRule::AllowDupes,
            payload,
        )
        .captured(from_input, tree)
    }

    /// State change against a node; the resulting value is read from the
    /// node's accessible, which is not cached on the event.
    pub fn state_change_for_node(node: NodeId, state: StateFlag, tree: &dyn AccessibleTree) -> Self {
        let mut event = Self::raw(
            EventType::StateChange,
            None,
            Some(node),
            false,
            EventRule::AllowDupes,
            EventPayload::Generic,
        );
        let is_enabled = match event.accessible_for_node(tree) {
            Some(acc) => {
                let (states, extra) = tree.states(acc);
                state.is_set_in(states, extra)
            }
            None => false,
        };
        event.payload = EventPayload::StateChange(StateChangeData { state, is_enabled });
        event.captured(IsFromUserInput::AutoDetect, tree)
    }

    pub fn text_change(
        accessible: AccessibleId,
        start: i32,
        modified_text: impl Into<String>,
        is_inserted: bool,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let event_type = if is_inserted { EventType::TextInserted } else { EventType::TextRemoved };
        let payload = EventPayload::TextChange(TextChangeData {
            start,
            is_inserted,
            modified_text: modified_text.into(),
        });
        Self::raw(event_type, Some(accessible), None, is_async, EventRule::AllowDupes, payload)
            .captured(from_input, tree)
    }

    /// Hide of `accessible`. Must be created before the node is detached:
    /// the former parent and siblings are snapshotted here.
    pub fn hide(
        accessible: AccessibleId,
        node: NodeId,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let snapshot = HideSnapshot {
            parent: tree.cached_parent(accessible),
            next_sibling: tree.cached_next_sibling(accessible),
            prev_sibling: tree.cached_prev_sibling(accessible),
        };
        let payload = EventPayload::Mutation(MutationData {
            kind: MutationKind::Hide(snapshot),
            text_change: None,
        });
        Self::raw(
            EventType::Hide,
            Some(accessible),
            Some(node),
            is_async,
            EventRule::CoalesceFromSameSubtree,
            payload,
        )
        .captured(from_input, tree)
    }

    pub fn show(
        accessible: AccessibleId,
        node: NodeId,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let payload = EventPayload::Mutation(MutationData {
            kind: MutationKind::Show,
            text_change: None,
        });
        Self::raw(
            EventType::Show,
            Some(accessible),
            Some(node),
            is_async,
            EventRule::CoalesceFromSameSubtree,
            payload,
        )
        .captured(from_input, tree)
    }

    /// Caret moves are always asynchronous
    pub fn caret_move(accessible: AccessibleId, caret_offset: i32, tree: &dyn AccessibleTree) -> Self {
        let payload = EventPayload::CaretMove(CaretMoveData { caret_offset });
        Self::targeted(
            EventType::TextCaretMoved,
            accessible.into(),
            true,
            EventType::TextCaretMoved.default_rule(),
            payload,
        )
        .captured(IsFromUserInput::AutoDetect, tree)
    }

    /// Caret move whose offset is resolved from the node later
    pub fn caret_move_for_node(node: NodeId, tree: &dyn AccessibleTree) -> Self {
        let payload = EventPayload::CaretMove(CaretMoveData { caret_offset: -1 });
        Self::targeted(
            EventType::TextCaretMoved,
            node.into(),
            true,
            EventType::TextCaretMoved.default_rule(),
            payload,
        )
        .captured(IsFromUserInput::AutoDetect, tree)
    }

    pub fn table_change(
        accessible: AccessibleId,
        event_type: EventType,
        row_or_col_index: i32,
        num_rows_or_cols: i32,
        is_async: bool,
        tree: &dyn AccessibleTree,
    ) -> Self {
        debug_assert!(matches!(
            event_type,
            EventType::TableRowInsert
                | EventType::TableRowDelete
                | EventType::TableColumnInsert
                | EventType::TableColumnDelete
        ));
        let payload = EventPayload::TableChange(TableChangeData { row_or_col_index, num_rows_or_cols });
        Self::targeted(event_type, accessible.into(), is_async, event_type.default_rule(), payload)
            .captured(IsFromUserInput::AutoDetect, tree)
    }

    /// Selection add/remove of `item` inside `widget`
    pub fn selection_change(
        widget: AccessibleId,
        item: AccessibleId,
        change: SelChangeType,
        is_async: bool,
        from_input: IsFromUserInput,
        tree: &dyn AccessibleTree,
    ) -> Self {
        let event_type = match change {
            SelChangeType::Add => EventType::SelectionAdd,
            SelChangeType::Remove => EventType::SelectionRemove,
        };
        let payload = EventPayload::SelectionChange(SelChangeData {
            widget,
            item,
            change,
            preceding_count: 0,
        });
        Self::targeted(
            event_type,
            item.into(),
            is_async,
            EventRule::CoalesceSelectionChange,
            payload,
        )
        .captured(from_input, tree)
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn rule(&self) -> EventRule {
        self.rule
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    pub fn is_from_user_input(&self) -> bool {
        self.is_from_user_input
    }

    pub fn is_suppressed(&self) -> bool {
        self.rule == EventRule::DoNotEmit
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Union of the tags of every event kind this event is
    pub fn family(&self) -> EventFamily {
        self.payload.family()
    }

    /// Typed view if the event's family includes `T`'s kind
    pub fn downcast<T: EventView>(&self) -> Option<&T> {
        if !self.family().contains(T::FAMILY) {
            return None;
        }
        T::view(&self.payload)
    }

    pub fn downcast_mut<T: EventView>(&mut self) -> Option<&mut T> {
        if !self.family().contains(T::FAMILY) {
            return None;
        }
        T::view_mut(&mut self.payload)
    }

    /// Target node without resolving it
    pub fn cached_node(&self) -> Option<NodeId> {
        self.node
    }

    /// Target accessible without resolving it
    pub fn cached_accessible(&self) -> Option<AccessibleId> {
        self.accessible
    }

    /// Target accessible, resolved from the node on first use
    pub fn accessible(&mut self, tree: &dyn AccessibleTree) -> Option<AccessibleId> {
        if self.accessible.is_none() {
            self.accessible = self.accessible_for_node(tree);
        }
        self.accessible
    }

    /// Target node, derived from the accessible on first use
    pub fn node(&mut self, tree: &dyn AccessibleTree) -> Option<NodeId> {
        if self.node.is_none() {
            if let Some(acc) = self.accessible {
                self.node = tree.node_for(acc);
            }
        }
        self.node
    }

    /// Document the target node belongs to
    pub fn owning_document(&mut self, tree: &dyn AccessibleTree) -> Option<DocumentId> {
        let node = self.node(tree)?;
        tree.owner_document(node)
    }

    fn accessible_for_node(&self, tree: &dyn AccessibleTree) -> Option<AccessibleId> {
        let node = self.node?;
        let accessible = tree.accessible_for(node);

        // Tree containers address rows through their current index; the
        // row accessible already exists, so prefer it over the container.
        if let (Some(index), Some(container)) = (tree.tree_current_index(node), accessible) {
            if index >= 0 {
                if let Some(item) = tree.tree_item_accessible(container, index) {
                    return Some(item);
                }
            }
        }

        accessible
    }

    fn capture_is_from_user_input(&mut self, from_input: IsFromUserInput, tree: &dyn AccessibleTree) {
        let target_node = self.node(tree);

        // Only the application accessible has no DOM node.
        if target_node.is_none() {
            debug_assert!(
                self.accessible.is_some() && self.accessible == tree.application_accessible(),
                "There should always be a DOM node for an event"
            );
        }

        self.is_from_user_input = match from_input {
            IsFromUserInput::FromUserInput => true,
            IsFromUserInput::NoUserInput => false,
            IsFromUserInput::AutoDetect => {
                let Some(node) = target_node else {
                    return;
                };
                match tree.owner_document(node).and_then(|doc| tree.is_handling_user_input(doc)) {
                    Some(handling) => handling,
                    None => {
                        tracing::debug!("No input state for event target {:?}", node);
                        false
                    }
                }
            }
        };
    }

    pub(crate) fn suppress(&mut self) {
        self.rule = EventRule::DoNotEmit;
    }

    /// Suppress in favour of an event targeting an ancestor. Siblings
    /// queued later share this fate.
    pub(crate) fn cover(&mut self) {
        self.suppress();
        self.covered = true;
    }

    pub(crate) fn is_covered(&self) -> bool {
        self.covered
    }

    /// Take over the fate of an earlier sibling event
    pub(crate) fn adopt_sibling(&mut self, sibling: &AccEvent) {
        if sibling.covered {
            self.cover();
        } else {
            self.adopt_rule(sibling.rule);
        }
    }

    /// Take over another event's rule; a suppressed event stays suppressed
    pub(crate) fn adopt_rule(&mut self, rule: EventRule) {
        if self.rule != EventRule::DoNotEmit {
            self.rule = rule;
        }
    }

    pub(crate) fn mutation(&self) -> Option<&MutationData> {
        self.downcast::<MutationData>()
    }

    pub(crate) fn mutation_mut(&mut self) -> Option<&mut MutationData> {
        self.downcast_mut::<MutationData>()
    }

    pub(crate) fn is_unconditional_reorder(&self) -> bool {
        self.downcast::<ReorderData>().is_some_and(|r| r.is_unconditional)
    }
}
