//! Event payloads and typed views
//!
//! Each event kind carries its extra data in one `EventPayload` variant.
//! `EventView` ties a payload struct to its family bit so
//! [`AccEvent::downcast`](super::AccEvent::downcast) can check the family
//! mask before handing out the typed view.

use fos_dom::NodeId;

use super::{AccEvent, EventFamily};
use crate::host::{AccessibleId, AccessibleTree, ExtraStates, States};

/// Kind-specific event data
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    #[default]
    Generic,
    Reorder(ReorderData),
    StateChange(StateChangeData),
    TextChange(TextChangeData),
    Mutation(MutationData),
    CaretMove(CaretMoveData),
    TableChange(TableChangeData),
    SelectionChange(SelChangeData),
}

impl EventPayload {
    /// Family bits of every event kind in this payload's chain
    pub fn family(&self) -> EventFamily {
        match self {
            Self::Generic => EventFamily::GENERIC,
            Self::Reorder(_) => EventFamily::GENERIC | EventFamily::REORDER,
            Self::StateChange(_) => EventFamily::GENERIC | EventFamily::STATE_CHANGE,
            Self::TextChange(_) => EventFamily::GENERIC | EventFamily::TEXT_CHANGE,
            Self::Mutation(m) => {
                let kind = match m.kind {
                    MutationKind::Hide(_) => EventFamily::HIDE,
                    MutationKind::Show => EventFamily::SHOW,
                };
                EventFamily::GENERIC | EventFamily::MUTATION | kind
            }
            Self::CaretMove(_) => EventFamily::GENERIC | EventFamily::CARET_MOVE,
            Self::TableChange(_) => EventFamily::GENERIC | EventFamily::TABLE_CHANGE,
            Self::SelectionChange(_) => EventFamily::GENERIC | EventFamily::SELECTION_CHANGE,
        }
    }
}

/// Typed view into an event's payload
pub trait EventView: Sized {
    /// Family bit an event must carry to expose this view
    const FAMILY: EventFamily;

    fn view(payload: &EventPayload) -> Option<&Self>;

    fn view_mut(payload: &mut EventPayload) -> Option<&mut Self>;
}

macro_rules! impl_event_view {
    ($ty:ty, $family:expr, $variant:ident) => {
        impl EventView for $ty {
            const FAMILY: EventFamily = $family;

            fn view(payload: &EventPayload) -> Option<&Self> {
                match payload {
                    EventPayload::$variant(data) => Some(data),
                    _ => None,
                }
            }

            fn view_mut(payload: &mut EventPayload) -> Option<&mut Self> {
                match payload {
                    EventPayload::$variant(data) => Some(data),
                    _ => None,
                }
            }
        }
    };
}

impl_event_view!(ReorderData, EventFamily::REORDER, Reorder);
impl_event_view!(StateChangeData, EventFamily::STATE_CHANGE, StateChange);
impl_event_view!(TextChangeData, EventFamily::TEXT_CHANGE, TextChange);
impl_event_view!(MutationData, EventFamily::MUTATION, Mutation);
impl_event_view!(CaretMoveData, EventFamily::CARET_MOVE, CaretMove);
impl_event_view!(TableChangeData, EventFamily::TABLE_CHANGE, TableChange);
impl_event_view!(SelChangeData, EventFamily::SELECTION_CHANGE, SelectionChange);

impl EventView for HideSnapshot {
    const FAMILY: EventFamily = EventFamily::HIDE;

    fn view(payload: &EventPayload) -> Option<&Self> {
        match payload {
            EventPayload::Mutation(MutationData { kind: MutationKind::Hide(snapshot), .. }) => {
                Some(snapshot)
            }
            _ => None,
        }
    }

    fn view_mut(payload: &mut EventPayload) -> Option<&mut Self> {
        match payload {
            EventPayload::Mutation(MutationData { kind: MutationKind::Hide(snapshot), .. }) => {
                Some(snapshot)
            }
            _ => None,
        }
    }
}

/// Reorder event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderData {
    /// Fire regardless of how coalescing turns out
    pub is_unconditional: bool,
    /// Node whose mutation caused the reorder
    pub reason_node: Option<NodeId>,
}

impl ReorderData {
    /// Whether the reason node, or something under it, has an accessible.
    /// A reorder that can be validated this way is preferred over one that
    /// cannot.
    pub fn has_accessible_in_reason_subtree(&self, tree: &dyn AccessibleTree) -> bool {
        let Some(reason) = self.reason_node else {
            return false;
        };
        tree.accessible_for(reason).is_some() || tree.has_accessible_children(reason)
    }
}

/// Which state bit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFlag {
    Base(States),
    Extra(ExtraStates),
}

impl StateFlag {
    pub fn is_extra_state(self) -> bool {
        matches!(self, Self::Extra(_))
    }

    /// Whether the flag is set in the given state sets
    pub fn is_set_in(self, states: States, extra: ExtraStates) -> bool {
        match self {
            Self::Base(flag) => states.intersects(flag),
            Self::Extra(flag) => extra.intersects(flag),
        }
    }
}

/// State change event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChangeData {
    pub state: StateFlag,
    /// Resulting value of the state
    pub is_enabled: bool,
}

/// Text change event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChangeData {
    /// Offset of the change in the container's text
    pub start: i32,
    pub is_inserted: bool,
    pub modified_text: String,
}

impl TextChangeData {
    /// Length of the modified text in characters
    pub fn length(&self) -> i32 {
        self.modified_text.chars().count() as i32
    }
}

/// Former position of a hidden accessible, captured before detachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HideSnapshot {
    pub parent: Option<AccessibleId>,
    pub next_sibling: Option<AccessibleId>,
    pub prev_sibling: Option<AccessibleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Hide(HideSnapshot),
    Show,
}

/// Show/hide event data
#[derive(Debug, Clone)]
pub struct MutationData {
    pub kind: MutationKind,
    /// Text change caused by the mutation, fired right after the event
    pub text_change: Option<Box<AccEvent>>,
}

impl MutationData {
    pub fn is_hide(&self) -> bool {
        matches!(self.kind, MutationKind::Hide(_))
    }

    pub fn is_show(&self) -> bool {
        matches!(self.kind, MutationKind::Show)
    }

    pub fn text_change(&self) -> Option<&AccEvent> {
        self.text_change.as_deref()
    }
}

/// Caret move event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretMoveData {
    /// -1 when unknown and to be resolved from the node
    pub caret_offset: i32,
}

/// Table change event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChangeData {
    pub row_or_col_index: i32,
    pub num_rows_or_cols: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelChangeType {
    Add,
    Remove,
}

/// Selection change event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelChangeData {
    /// Selection container
    pub widget: AccessibleId,
    /// Item whose selection changed
    pub item: AccessibleId,
    pub change: SelChangeType,
    /// Number of earlier queued selection events for the same widget
    pub preceding_count: u32,
}
