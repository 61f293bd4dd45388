//! Text changes derived from show/hide events

use super::EventQueue;
use crate::event::{AccEvent, HideSnapshot, IsFromUserInput, TextChangeData};
use crate::host::{AccRole, AccessibleId, AccessibleTree};

impl EventQueue {
    /// Attach the text inserted or removed by a show/hide event to it
    pub(super) fn create_text_change_event_for(&mut self, index: usize, tree: &dyn AccessibleTree) {
        if !self.config.mutation_text_events {
            return;
        }

        let event = &mut self.events[index];
        let (Some(node), Some(accessible)) = (event.node, event.accessible) else {
            return;
        };
        let Some(is_show) = event.mutation().map(|m| m.is_show()) else {
            return;
        };

        let Some(text_accessible) = tree.container_text_accessible(node) else {
            tracing::trace!("No text container for {:?}", node);
            return;
        };

        // The line break an empty editor keeps around is not text.
        if tree.role(accessible) == AccRole::Whitespace {
            if let Some(editor) = tree.associated_editor(text_accessible) {
                if tree.is_editor_empty(editor) {
                    return;
                }
            }
        }

        let Some(offset) = tree.child_offset(text_accessible, accessible) else {
            tracing::trace!("{:?} has no offset in {:?}", accessible, text_accessible);
            return;
        };

        let mut text = String::new();
        tree.append_text_to(accessible, &mut text);
        if text.is_empty() {
            return;
        }

        let text_change = AccEvent::text_change(
            text_accessible,
            offset,
            text,
            is_show,
            event.is_async,
            IsFromUserInput::from(event.is_from_user_input),
            tree,
        );
        if let Some(mutation) = event.mutation_mut() {
            mutation.text_change = Some(Box::new(text_change));
        }
    }
}

/// Where the tail's text goes relative to the older event's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjacency {
    After,
    Before,
    None,
}

/// Fold the text of a hide event into the text change of the hide event
/// of its former sibling, then make the tail carry the merged change
pub(super) fn coalesce_hide_text_changes(
    tail_event: &mut AccEvent,
    this_event: &mut AccEvent,
    tree: &dyn AccessibleTree,
) {
    let Some(tail_accessible) = tail_event.accessible else {
        return;
    };
    let snapshot = this_event.downcast::<HideSnapshot>().copied().unwrap_or_default();
    let adjacency = if snapshot.next_sibling == Some(tail_accessible) {
        Adjacency::After
    } else if snapshot.prev_sibling == Some(tail_accessible) {
        Adjacency::Before
    } else {
        Adjacency::None
    };
    merge_text_change(tail_event, this_event, tail_accessible, adjacency, tree);
}

/// Same as for hide events, with adjacency taken from the live tree
pub(super) fn coalesce_show_text_changes(
    tail_event: &mut AccEvent,
    this_event: &mut AccEvent,
    tree: &dyn AccessibleTree,
) {
    let Some(tail_accessible) = tail_event.accessible else {
        return;
    };
    let tail_index = tree.index_in_parent(tail_accessible);
    let this_index = this_event.accessible.and_then(|acc| tree.index_in_parent(acc));
    let adjacency = match (tail_index, this_index) {
        (Some(tail), Some(this)) if tail == this + 1 => Adjacency::After,
        (Some(tail), Some(this)) if tail + 1 == this => Adjacency::Before,
        _ => Adjacency::None,
    };
    merge_text_change(tail_event, this_event, tail_accessible, adjacency, tree);
}

fn merge_text_change(
    tail_event: &mut AccEvent,
    this_event: &mut AccEvent,
    tail_accessible: AccessibleId,
    adjacency: Adjacency,
    tree: &dyn AccessibleTree,
) {
    let Some(mut text_change) = this_event.mutation_mut().and_then(|m| m.text_change.take()) else {
        return;
    };

    if let Some(data) = text_change.downcast_mut::<TextChangeData>() {
        match adjacency {
            Adjacency::After => tree.append_text_to(tail_accessible, &mut data.modified_text),
            Adjacency::Before => {
                let mut text = String::new();
                tree.append_text_to(tail_accessible, &mut text);
                data.start -= text.chars().count() as i32;
                data.modified_text.insert_str(0, &text);
            }
            Adjacency::None => {}
        }
    }

    let previous = tail_event
        .mutation_mut()
        .and_then(|m| m.text_change.replace(text_change));
    if let Some(mutation) = this_event.mutation_mut() {
        mutation.text_change = previous;
    }
}
