//! Coalescing of the newest queued event against the earlier ones

use fos_dom::NodeId;

use super::text::{coalesce_hide_text_changes, coalesce_show_text_changes};
use super::EventQueue;
use crate::event::{AccEvent, EventRule, EventType, HideSnapshot, ReorderData, SelChangeData, SelChangeType};
use crate::host::AccessibleTree;

impl EventQueue {
    /// Apply the tail event's rule against every earlier event
    pub(super) fn coalesce_events(&mut self, tree: &dyn AccessibleTree) {
        let Some(tail) = self.events.len().checked_sub(1) else {
            return;
        };

        // Events of the application accessible are never coalesced.
        if self.events[tail].node.is_none() {
            return;
        }

        match self.events[tail].rule {
            EventRule::CoalesceFromSameSubtree => self.coalesce_from_same_subtree(tail, tree),
            EventRule::CoalesceFromSameDocument => self.coalesce_from_same_document(tail, tree),
            EventRule::CoalesceOfSameType => self.coalesce_of_same_type(tail),
            EventRule::RemoveDupes => self.remove_dupes(tail),
            EventRule::CoalesceSelectionChange => self.coalesce_sel_change_events(tail, tree),
            EventRule::AllowDupes | EventRule::DoNotEmit => {}
        }
    }

    fn coalesce_from_same_subtree(&mut self, tail: usize, tree: &dyn AccessibleTree) {
        let Some(tail_node) = self.events[tail].node else {
            return;
        };
        let tail_doc = tree.owner_document(tail_node);

        for index in (0..tail).rev() {
            let (earlier, rest) = self.events.split_at_mut(tail);
            let this_event = &mut earlier[index];
            let tail_event = &mut rest[0];

            if this_event.event_type != tail_event.event_type {
                continue;
            }
            let Some(this_node) = this_event.node else {
                continue;
            };
            if tree.owner_document(this_node) != tail_doc {
                continue;
            }

            // Hidden nodes are detached already and are matched by their
            // former parent below. Other detached nodes are not coalesced.
            let in_document = tree.is_in_document(this_node);
            if tail_event.event_type != EventType::Hide && !in_document {
                continue;
            }

            if this_node == tail_node {
                if this_event.event_type == EventType::Reorder {
                    // A suppressed reorder lost against another one already.
                    if this_event.is_suppressed() {
                        continue;
                    }
                    coalesce_reorder_events_from_same_source(this_event, tail_event, tree);
                    if tail_event.is_suppressed() {
                        return;
                    }
                    continue;
                }

                tracing::trace!("Suppressing duplicate {} event for {:?}", tail_event.event_type, tail_node);
                if this_event.is_covered() {
                    tail_event.cover();
                } else {
                    tail_event.suppress();
                }
                return;
            }

            // Only suppression on behalf of an ancestor passes to siblings.
            let is_umbrella = !this_event.is_suppressed() || this_event.is_covered();

            match tail_event.event_type {
                EventType::Hide if have_same_former_parent(this_event, tail_event) => {
                    if !is_umbrella {
                        continue;
                    }
                    tail_event.adopt_sibling(this_event);
                    if !tail_event.is_suppressed() {
                        coalesce_hide_text_changes(tail_event, this_event, tree);
                    }
                    return;
                }
                EventType::Show if have_same_accessible_parent(this_event, tail_event, tree) => {
                    if !is_umbrella {
                        continue;
                    }
                    tail_event.adopt_sibling(this_event);
                    if !tail_event.is_suppressed() {
                        coalesce_show_text_changes(tail_event, this_event, tree);
                    }
                    return;
                }
                _ => {}
            }

            if !in_document {
                continue;
            }

            if tree.parent_node(this_node) == tree.parent_node(tail_node) {
                if !is_umbrella {
                    continue;
                }
                tail_event.adopt_sibling(this_event);
                return;
            }

            if tail_event.event_type != EventType::Hide && tree.is_ancestor_of(this_node, tail_node) {
                if this_event.event_type == EventType::Reorder {
                    coalesce_reorder_events_from_same_tree(this_event, tail_event);
                    if tail_event.is_suppressed() {
                        return;
                    }
                    continue;
                }

                tracing::trace!("{} event for {:?} is covered by an ancestor", tail_event.event_type, tail_node);
                tail_event.cover();
                return;
            }

            // An older show can only be folded into an asynchronous one.
            let this_can_be_descendant_of_tail = !this_event.is_suppressed()
                && tail_event.event_type != EventType::Hide
                && (tail_event.event_type != EventType::Show || tail_event.is_async);

            if this_can_be_descendant_of_tail && tree.is_ancestor_of(tail_node, this_node) {
                if this_event.event_type == EventType::Reorder {
                    coalesce_reorder_events_from_same_tree(tail_event, this_event);
                    continue;
                }

                tracing::trace!("{} event for {:?} is covered by {:?}", this_event.event_type, this_node, tail_node);
                this_event.cover();
                let event_type = this_event.event_type;
                self.apply_to_siblings(index, event_type, this_node, tree);
            }
        }
    }

    /// Suppress earlier events of `event_type` targeting siblings of `node`
    fn apply_to_siblings(
        &mut self,
        end: usize,
        event_type: EventType,
        node: NodeId,
        tree: &dyn AccessibleTree,
    ) {
        let parent = tree.parent_node(node);
        for event in &mut self.events[..end] {
            if event.event_type != event_type || event.is_suppressed() {
                continue;
            }
            if event.node.is_some_and(|n| tree.parent_node(n) == parent) {
                event.cover();
            }
        }
    }

    fn coalesce_from_same_document(&mut self, tail: usize, tree: &dyn AccessibleTree) {
        let (earlier, rest) = self.events.split_at_mut(tail);
        let tail_event = &mut rest[0];
        let tail_doc = tail_event.owning_document(tree);

        for this_event in earlier.iter_mut().rev() {
            if this_event.event_type == tail_event.event_type
                && this_event.rule == tail_event.rule
                && this_event.owning_document(tree) == tail_doc
            {
                tracing::trace!("Newer {} event in {:?} wins", tail_event.event_type, tail_doc);
                this_event.suppress();
                return;
            }
        }
    }

    fn coalesce_of_same_type(&mut self, tail: usize) {
        let (earlier, rest) = self.events.split_at_mut(tail);
        let tail_event = &rest[0];

        if let Some(this_event) = earlier
            .iter_mut()
            .rev()
            .find(|e| e.event_type == tail_event.event_type && e.rule == tail_event.rule)
        {
            this_event.suppress();
        }
    }

    fn remove_dupes(&mut self, tail: usize) {
        let (earlier, rest) = self.events.split_at_mut(tail);
        let tail_event = &mut rest[0];

        let is_dupe = earlier.iter().rev().any(|e| {
            e.event_type == tail_event.event_type && e.rule == tail_event.rule && e.node == tail_event.node
        });
        if is_dupe {
            tracing::trace!("Removing duplicate {} event", tail_event.event_type);
            tail_event.suppress();
        }
    }

    /// Count selection changes per widget and pack a run of them into one
    /// selection-within event
    fn coalesce_sel_change_events(&mut self, tail: usize, tree: &dyn AccessibleTree) {
        let threshold = self.config.selection_pack_threshold;
        let (earlier, rest) = self.events.split_at_mut(tail);
        let tail_event = &mut rest[0];

        let Some(widget) = tail_event.downcast::<SelChangeData>().map(|d| d.widget) else {
            return;
        };
        let same_widget = |e: &AccEvent| {
            e.rule == EventRule::CoalesceSelectionChange
                && e.downcast::<SelChangeData>().is_some_and(|d| d.widget == widget)
        };

        let Some(index) = earlier.iter().rposition(|e| same_widget(e)) else {
            return;
        };
        let preceding = earlier[index]
            .downcast::<SelChangeData>()
            .map_or(0, |d| d.preceding_count)
            + 1;
        if let Some(data) = tail_event.downcast_mut::<SelChangeData>() {
            data.preceding_count = preceding;
        }
        if preceding < threshold {
            if preceding == 1 && earlier[index].event_type != EventType::Selection {
                pack_selection_pair(&mut earlier[index], tail_event);
            }
            return;
        }

        tracing::debug!("Packing {} selection changes of {:?}", preceding + 1, widget);
        tail_event.event_type = EventType::SelectionWithin;
        tail_event.accessible = Some(widget);
        tail_event.node = tree.node_for(widget);

        for event in &mut earlier[..=index] {
            if same_widget(&*event) {
                event.suppress();
            }
        }
    }
}

/// A remove and an add of two different items in a row make one
/// selection event, carried by the add
fn pack_selection_pair(this_event: &mut AccEvent, tail_event: &mut AccEvent) {
    let (Some(this), Some(tail)) = (
        this_event.downcast::<SelChangeData>().map(|d| (d.item, d.change)),
        tail_event.downcast::<SelChangeData>().map(|d| (d.item, d.change)),
    ) else {
        return;
    };
    if this.0 == tail.0 {
        return;
    }

    match (this.1, tail.1) {
        (SelChangeType::Remove, SelChangeType::Add) => {
            this_event.suppress();
            tail_event.event_type = EventType::Selection;
        }
        (SelChangeType::Add, SelChangeType::Remove) => {
            tail_event.suppress();
            this_event.event_type = EventType::Selection;
        }
        _ => {}
    }
}

fn have_same_former_parent(this_event: &AccEvent, tail_event: &AccEvent) -> bool {
    let this_parent = this_event.downcast::<HideSnapshot>().and_then(|s| s.parent);
    let tail_parent = tail_event.downcast::<HideSnapshot>().and_then(|s| s.parent);
    this_parent.is_some() && this_parent == tail_parent
}

fn have_same_accessible_parent(
    this_event: &AccEvent,
    tail_event: &AccEvent,
    tree: &dyn AccessibleTree,
) -> bool {
    let this_parent = this_event.accessible.and_then(|acc| tree.cached_parent(acc));
    let tail_parent = tail_event.accessible.and_then(|acc| tree.cached_parent(acc));
    this_parent.is_some() && this_parent == tail_parent
}

/// Two reorders of the same container: keep the one that still means
/// something
fn coalesce_reorder_events_from_same_source(
    this_event: &mut AccEvent,
    tail_event: &mut AccEvent,
    tree: &dyn AccessibleTree,
) {
    if this_event.is_unconditional_reorder() {
        tail_event.suppress();
        return;
    }
    if tail_event.is_unconditional_reorder() {
        this_event.suppress();
        return;
    }

    let this_is_valid = this_event
        .downcast::<ReorderData>()
        .is_some_and(|r| r.has_accessible_in_reason_subtree(tree));
    if this_is_valid {
        tail_event.suppress();
    } else {
        this_event.suppress();
    }
}

/// Reorder of an ancestor covers the descendant's only if unconditional
fn coalesce_reorder_events_from_same_tree(ancestor: &AccEvent, descendant: &mut AccEvent) {
    if ancestor.is_unconditional_reorder() {
        descendant.cover();
    }
}
