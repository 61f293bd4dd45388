//! Event queue tests for fos-a11y
//!
//! Pushes events built against a DOM-backed accessible tree, ticks the
//! refresh driver by hand and checks what reaches the dispatcher.

use fos_a11y::event::{MutationData, SelChangeType, StateFlag, TextChangeData};
use fos_a11y::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the dispatcher saw for one event
#[derive(Debug, Clone, PartialEq)]
struct Fired {
    event_type: EventType,
    accessible: Option<AccessibleId>,
    text: Option<String>,
    start: Option<i32>,
}

/// Dispatcher recording every event, optionally pushing or shutting down
/// while the flush runs
#[derive(Default)]
struct Recorder {
    fired: Vec<Fired>,
    push_on_first: Option<NodeId>,
    shutdown_after: Option<usize>,
}

impl Recorder {
    fn types(&self) -> Vec<EventType> {
        self.fired.iter().map(|f| f.event_type).collect()
    }
}

impl EventDispatcher for Recorder {
    fn process_pending_event(
        &mut self,
        event: &mut AccEvent,
        queue: &mut EventQueue,
        tree: &dyn AccessibleTree,
    ) {
        let accessible = event.accessible(tree);
        let data = event.downcast::<TextChangeData>();
        self.fired.push(Fired {
            event_type: event.event_type(),
            accessible,
            text: data.map(|d| d.modified_text.clone()),
            start: data.map(|d| d.start),
        });

        if let Some(node) = self.push_on_first.take() {
            queue.push(AccEvent::new(EventType::NameChange, node, tree), tree);
        }
        if self.shutdown_after == Some(self.fired.len()) {
            queue.shutdown();
        }
    }
}

struct Page {
    tree: DomAccessibleTree,
    driver: ManualRefreshDriver,
    queue: EventQueue,
    doc: DocumentId,
    body: NodeId,
}

impl Page {
    fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    fn with_config(config: QueueConfig) -> Self {
        init_tracing();
        let mut tree = DomAccessibleTree::new();
        let doc = tree.create_document("https://example.com/");
        let body = tree.body(doc).unwrap();
        let driver = ManualRefreshDriver::new();
        let scheduler = FlushScheduler::new(Box::new(driver.clone()));
        let queue = EventQueue::with_config(doc, scheduler, config);
        Self { tree, driver, queue, doc, body }
    }

    fn element(&mut self, parent: NodeId, tag: &str, role: AccRole) -> NodeId {
        self.tree.append_element(parent, tag, role).unwrap()
    }

    /// Element holding one text node
    fn text_element(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.tree.append_element(parent, "span", AccRole::TextLeaf).unwrap();
        self.tree.append_text(node, text).unwrap();
        node
    }

    fn acc(&self, node: NodeId) -> AccessibleId {
        self.tree.accessible_for(node).unwrap()
    }

    fn push(&mut self, event: AccEvent) {
        self.queue.push(event, &self.tree);
    }

    fn hide(&mut self, node: NodeId) {
        let event = AccEvent::hide(self.acc(node), node, false, IsFromUserInput::AutoDetect, &self.tree);
        self.push(event);
        self.tree.remove(node).unwrap();
    }

    /// Run one refresh tick; false if the queue was not registered
    fn tick(&mut self, dispatcher: &mut dyn EventDispatcher) -> bool {
        if !self.driver.tick().contains(&self.doc) {
            return false;
        }
        self.queue.will_refresh(&self.tree, dispatcher);
        true
    }

    fn rules(&self) -> Vec<EventRule> {
        self.queue.pending().iter().map(AccEvent::rule).collect()
    }
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

#[test]
fn test_hide_is_queued_and_scheduled() {
    let mut page = Page::new();
    let paragraph = page.element(page.body, "p", AccRole::Paragraph);
    let x = page.text_element(paragraph, "hello");

    page.hide(x);

    assert_eq!(page.queue.len(), 1);
    assert!(page.queue.is_flush_scheduled());
    assert!(page.driver.is_observing(page.doc));

    let event = &page.queue.pending()[0];
    assert_eq!(event.rule(), EventRule::CoalesceFromSameSubtree);
    let text_change = event.downcast::<MutationData>().unwrap().text_change().unwrap();
    assert_eq!(text_change.event_type(), EventType::TextRemoved);
    assert_eq!(text_change.downcast::<TextChangeData>().unwrap().modified_text, "hello");
}

#[test]
fn test_unconditional_reorder_covers_descendant() {
    let mut page = Page::new();
    let p = page.element(page.body, "ul", AccRole::List);
    let child = page.element(p, "li", AccRole::ListItem);

    let event = AccEvent::reorder(page.acc(p), false, true, None, &page.tree);
    page.push(event);
    let event = AccEvent::reorder(page.acc(child), false, false, None, &page.tree);
    page.push(event);

    assert_eq!(page.rules(), vec![EventRule::CoalesceFromSameSubtree, EventRule::DoNotEmit]);

    let mut recorder = Recorder::default();
    assert!(page.tick(&mut recorder));
    assert_eq!(recorder.types(), vec![EventType::Reorder]);
    assert_eq!(recorder.fired[0].accessible, Some(page.acc(p)));
}

#[test]
fn test_sibling_hides_share_one_text_change() {
    let mut page = Page::new();
    let paragraph = page.element(page.body, "p", AccRole::Paragraph);
    let _before = page.text_element(paragraph, "ab");
    let x = page.text_element(paragraph, "cd");
    let y = page.text_element(paragraph, "ef");

    page.hide(x);
    page.hide(y);

    let pending = page.queue.pending();
    assert!(pending[0].downcast::<MutationData>().unwrap().text_change().is_none());
    let merged = pending[1].downcast::<MutationData>().unwrap().text_change().unwrap();
    let data = merged.downcast::<TextChangeData>().unwrap();
    assert_eq!(data.modified_text, "cdef");
    assert_eq!(data.start, 2);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(
        recorder.types(),
        vec![EventType::Hide, EventType::Hide, EventType::TextRemoved]
    );
    assert_eq!(recorder.fired[2].text.as_deref(), Some("cdef"));
}

#[test]
fn test_state_changes_are_not_deduplicated() {
    let mut page = Page::new();
    let checkbox = page.element(page.body, "input", AccRole::PushButton);
    let acc = page.acc(checkbox);

    for _ in 0..2 {
        let event = AccEvent::state_change(
            acc,
            StateFlag::Base(States::CHECKED),
            true,
            false,
            IsFromUserInput::AutoDetect,
            &page.tree,
        );
        page.push(event);
    }

    assert_eq!(page.rules(), vec![EventRule::AllowDupes; 2]);
    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::StateChange; 2]);
}

#[test]
fn test_newest_focus_wins() {
    let mut page = Page::new();
    let a = page.element(page.body, "input", AccRole::Entry);
    let b = page.element(page.body, "input", AccRole::Entry);

    let event = AccEvent::new(EventType::Focus, a, &page.tree);
    page.push(event);
    let event = AccEvent::new(EventType::Focus, b, &page.tree);
    page.push(event);

    assert_eq!(page.rules(), vec![EventRule::DoNotEmit, EventRule::CoalesceFromSameDocument]);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.fired.len(), 1);
    assert_eq!(recorder.fired[0].accessible, Some(page.acc(b)));
}

// ============================================================================
// FLUSH TESTS
// ============================================================================

#[test]
fn test_events_pushed_during_flush_wait_for_next_tick() {
    let mut page = Page::new();
    let a = page.element(page.body, "button", AccRole::PushButton);
    let b = page.element(page.body, "button", AccRole::PushButton);

    let event = AccEvent::new(EventType::Alert, a, &page.tree);
    page.push(event);

    let mut recorder = Recorder { push_on_first: Some(b), ..Recorder::default() };
    assert!(page.tick(&mut recorder));
    assert_eq!(recorder.types(), vec![EventType::Alert]);
    assert_eq!(page.queue.len(), 1);
    assert!(page.queue.is_flush_scheduled());

    assert!(page.tick(&mut recorder));
    assert_eq!(recorder.types(), vec![EventType::Alert, EventType::NameChange]);
    assert!(page.queue.is_empty());
    assert!(!page.queue.is_flush_scheduled());
    assert!(!page.driver.is_observing(page.doc));
}

#[test]
fn test_shutdown_during_flush_aborts_batch() {
    let mut page = Page::new();
    for tag in ["a", "b", "c"] {
        let node = page.element(page.body, tag, AccRole::Other);
        let event = AccEvent::new(EventType::Alert, node, &page.tree);
        page.push(event);
    }

    let mut recorder = Recorder { shutdown_after: Some(1), ..Recorder::default() };
    page.tick(&mut recorder);

    assert_eq!(recorder.fired.len(), 1);
    assert!(page.queue.is_shut_down());
    assert!(page.queue.is_empty());
    assert!(!page.driver.is_observing(page.doc));
}

#[test]
fn test_shutdown_after_mutation_skips_companion() {
    let mut page = Page::new();
    let paragraph = page.element(page.body, "p", AccRole::Paragraph);
    let x = page.text_element(paragraph, "gone");
    page.hide(x);

    let mut recorder = Recorder { shutdown_after: Some(1), ..Recorder::default() };
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::Hide]);
}

#[test]
fn test_each_event_fires_at_most_once() {
    let mut page = Page::new();
    let node = page.element(page.body, "div", AccRole::Section);
    let event = AccEvent::new(EventType::DescriptionChange, node, &page.tree);
    page.push(event);

    let mut recorder = Recorder::default();
    assert!(page.tick(&mut recorder));
    assert!(!page.tick(&mut recorder));
    page.queue.will_refresh(&page.tree, &mut recorder);

    assert_eq!(recorder.fired.len(), 1);
}

#[test]
fn test_shutdown_drops_pending_events() {
    let mut page = Page::new();
    let node = page.element(page.body, "div", AccRole::Section);
    let event = AccEvent::new(EventType::Alert, node, &page.tree);
    page.push(event);

    page.queue.shutdown();
    assert!(page.queue.is_empty());
    assert!(!page.driver.is_observing(page.doc));

    // Late producers are ignored.
    let event = AccEvent::new(EventType::Alert, node, &page.tree);
    page.push(event);
    assert!(page.queue.is_empty());
    assert!(!page.queue.is_flush_scheduled());
}

#[test]
fn test_tick_after_shutdown_does_nothing() {
    let mut page = Page::new();
    let node = page.element(page.body, "div", AccRole::Section);
    let event = AccEvent::new(EventType::Alert, node, &page.tree);
    page.push(event);
    page.queue.shutdown();

    // A refresh already in progress still reaches the queue.
    let mut recorder = Recorder { push_on_first: Some(node), ..Recorder::default() };
    page.queue.will_refresh(&page.tree, &mut recorder);

    assert!(recorder.fired.is_empty());
    assert!(page.queue.is_empty());
    assert!(page.queue.is_shut_down());
    assert!(!page.driver.is_observing(page.doc));
}

#[test]
fn test_dropping_queue_unregisters() {
    let mut page = Page::new();
    let driver = page.driver.clone();
    let doc = page.doc;
    let node = page.element(page.body, "div", AccRole::Section);
    let event = AccEvent::new(EventType::Alert, node, &page.tree);
    page.push(event);
    assert!(driver.is_observing(doc));

    drop(page);
    assert_eq!(driver.observer_count(), 0);
}

#[test]
fn test_application_event_is_not_coalesced() {
    let mut page = Page::new();
    let app = page.tree.application_accessible().unwrap();

    for _ in 0..2 {
        let event = AccEvent::new(EventType::MenuStart, app, &page.tree);
        page.push(event);
    }
    assert_eq!(page.rules(), vec![EventRule::RemoveDupes; 2]);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::MenuStart; 2]);
}

// ============================================================================
// COALESCING TESTS
// ============================================================================

#[test]
fn test_umbrella_suppresses_queued_siblings() {
    let mut page = Page::new();
    let outer = page.element(page.body, "div", AccRole::Section);
    let list = page.element(outer, "ul", AccRole::List);
    let items: Vec<_> = (0..3).map(|_| page.element(list, "li", AccRole::ListItem)).collect();

    let subtree = |node: NodeId, tree: &DomAccessibleTree| {
        AccEvent::with_options(
            EventType::NameChange,
            node,
            false,
            IsFromUserInput::AutoDetect,
            EventRule::CoalesceFromSameSubtree,
            tree,
        )
    };

    for &item in &items {
        let event = subtree(item, &page.tree);
        page.push(event);
    }
    assert!(page.queue.pending().iter().all(|e| !e.is_suppressed()));

    let event = subtree(outer, &page.tree);
    page.push(event);
    assert_eq!(
        page.rules(),
        vec![
            EventRule::DoNotEmit,
            EventRule::DoNotEmit,
            EventRule::DoNotEmit,
            EventRule::CoalesceFromSameSubtree,
        ]
    );
}

#[test]
fn test_reorder_from_same_source_keeps_validated_one() {
    let mut page = Page::new();
    let list = page.element(page.body, "ul", AccRole::List);
    let item = page.element(list, "li", AccRole::ListItem);
    let wrapper = page.tree.append_plain(list, "div").unwrap();

    let event = AccEvent::reorder(page.acc(list), false, false, Some(item), &page.tree);
    page.push(event);
    let event = AccEvent::reorder(page.acc(list), false, false, Some(wrapper), &page.tree);
    page.push(event);

    assert_eq!(page.rules(), vec![EventRule::CoalesceFromSameSubtree, EventRule::DoNotEmit]);
}

#[test]
fn test_name_change_dupes_removed() {
    let mut page = Page::new();
    let node = page.element(page.body, "button", AccRole::PushButton);

    for _ in 0..3 {
        let event = AccEvent::new(EventType::NameChange, node, &page.tree);
        page.push(event);
    }

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::NameChange]);
}

#[test]
fn test_selection_burst_becomes_selection_within() {
    let mut page = Page::new();
    let select = page.element(page.body, "select", AccRole::List);
    let widget = page.acc(select);
    let options: Vec<_> = (0..8)
        .map(|_| {
            let node = page.element(select, "option", AccRole::ListItem);
            page.acc(node)
        })
        .collect();

    for (i, &option) in options.iter().enumerate() {
        let change = if i % 2 == 0 { SelChangeType::Add } else { SelChangeType::Remove };
        let event = AccEvent::selection_change(
            widget,
            option,
            change,
            false,
            IsFromUserInput::AutoDetect,
            &page.tree,
        );
        page.push(event);
    }

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::SelectionWithin]);
    assert_eq!(recorder.fired[0].accessible, Some(widget));
}

#[test]
fn test_repeated_hide_does_not_swallow_sibling() {
    let mut page = Page::new();
    let paragraph = page.element(page.body, "p", AccRole::Paragraph);
    let x = page.text_element(paragraph, "cd");
    let y = page.text_element(paragraph, "ef");

    let acc = page.acc(x);
    for _ in 0..2 {
        let event = AccEvent::hide(acc, x, false, IsFromUserInput::AutoDetect, &page.tree);
        page.push(event);
    }
    page.tree.remove(x).unwrap();
    page.hide(y);

    assert_eq!(
        page.rules(),
        vec![
            EventRule::CoalesceFromSameSubtree,
            EventRule::DoNotEmit,
            EventRule::CoalesceFromSameSubtree
        ]
    );

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(
        recorder.types(),
        vec![EventType::Hide, EventType::Hide, EventType::TextRemoved]
    );
    assert_eq!(recorder.fired[1].accessible, Some(page.acc(y)));
    assert_eq!(recorder.fired[2].text.as_deref(), Some("cdef"));
    assert_eq!(recorder.fired[2].start, Some(0));
}

#[test]
fn test_selection_remove_then_add_is_one_selection() {
    let mut page = Page::new();
    let select = page.element(page.body, "select", AccRole::List);
    let widget = page.acc(select);
    let a = page.element(select, "option", AccRole::ListItem);
    let b = page.element(select, "option", AccRole::ListItem);

    for (option, change) in [(a, SelChangeType::Remove), (b, SelChangeType::Add)] {
        let event = AccEvent::selection_change(
            widget,
            page.acc(option),
            change,
            false,
            IsFromUserInput::AutoDetect,
            &page.tree,
        );
        page.push(event);
    }

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::Selection]);
    assert_eq!(recorder.fired[0].accessible, Some(page.acc(b)));
}

#[test]
fn test_selection_threshold_from_config() {
    let config = QueueConfig::from_json(r#"{"selection_pack_threshold": 1}"#).unwrap();
    let mut page = Page::with_config(config);
    let select = page.element(page.body, "select", AccRole::List);
    let widget = page.acc(select);
    let a = page.element(select, "option", AccRole::ListItem);
    let b = page.element(select, "option", AccRole::ListItem);

    for option in [a, b] {
        let event = AccEvent::selection_change(
            widget,
            page.acc(option),
            SelChangeType::Add,
            false,
            IsFromUserInput::AutoDetect,
            &page.tree,
        );
        page.push(event);
    }

    assert_eq!(page.rules()[0], EventRule::DoNotEmit);
    assert_eq!(page.queue.pending()[1].event_type(), EventType::SelectionWithin);
}

// ============================================================================
// TARGET AND TEXT TESTS
// ============================================================================

#[test]
fn test_defunct_targets_are_skipped() {
    let mut page = Page::new();
    let live = page.element(page.body, "button", AccRole::PushButton);
    let dead = page.element(page.body, "button", AccRole::PushButton);

    for node in [dead, live] {
        let event = AccEvent::new(EventType::ValueChange, node, &page.tree);
        page.push(event);
    }
    page.tree.remove_accessible(dead);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.fired.len(), 1);
    assert_eq!(recorder.fired[0].accessible, Some(page.acc(live)));
}

#[test]
fn test_defunct_skip_can_be_disabled() {
    let mut page = Page::with_config(QueueConfig::default().with_skip_defunct_targets(false));
    let dead = page.element(page.body, "button", AccRole::PushButton);
    let event = AccEvent::new(EventType::ValueChange, dead, &page.tree);
    page.push(event);
    page.tree.remove_accessible(dead);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.fired.len(), 1);
    assert_eq!(recorder.fired[0].accessible, None);
}

#[test]
fn test_show_then_text_inserted() {
    let mut page = Page::new();
    let paragraph = page.element(page.body, "p", AccRole::Paragraph);
    let _lead = page.text_element(paragraph, "one ");
    let shown = page.text_element(paragraph, "two");

    let event = AccEvent::show(page.acc(shown), shown, false, IsFromUserInput::AutoDetect, &page.tree);
    page.push(event);

    let mut recorder = Recorder::default();
    page.tick(&mut recorder);
    assert_eq!(recorder.types(), vec![EventType::Show, EventType::TextInserted]);
    assert_eq!(recorder.fired[1].accessible, Some(page.acc(paragraph)));
    assert_eq!(recorder.fired[1].text.as_deref(), Some("two"));
    assert_eq!(recorder.fired[1].start, Some(4));
}

#[test]
fn test_shell_dispatcher_tags_attributes() {
    let mut page = Page::new();
    let button = page.element(page.body, "button", AccRole::PushButton);
    page.tree.set_handling_user_input(page.doc, true);
    let event = AccEvent::new(EventType::NameChange, button, &page.tree);
    page.push(event);
    page.tree.set_handling_user_input(page.doc, false);

    let mut tagged = Vec::new();
    let mut dispatcher = ShellDispatcher::new(|_: AccessibleId, event: &AccEvent, ctx: &FireContext| {
        let mut attributes = AccAttributes::new();
        ctx.event_attributes(button, &mut attributes);
        tagged.push((event.event_type(), attributes));
    });
    page.tick(&mut dispatcher);
    drop(dispatcher);

    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].1.get("event-from-input").map(String::as_str), Some("true"));
}
