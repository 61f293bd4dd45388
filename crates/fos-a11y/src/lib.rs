//! fOS Accessibility
//!
//! Accessibility event machinery for the fOS browser engine.
//!
//! Features:
//! - Accessibility events with typed payloads and family-mask downcasts
//! - Per-document event queue with coalescing (subtree, document, dupes,
//!   same type, selection packing)
//! - Text change events derived from show/hide mutations
//! - Flush scheduling on the render pipeline's refresh ticks
//! - Immediate firing with "event from input" attribute tagging
//! - DOM-backed accessible tree for headless use

pub mod config;
pub mod dom_host;
pub mod event;
pub mod host;
pub mod queue;
pub mod scheduler;
pub mod shell;

pub use config::QueueConfig;
pub use dom_host::DomAccessibleTree;
pub use event::{
    AccEvent, EventFamily, EventPayload, EventRule, EventTarget, EventType, EventView,
    IsFromUserInput,
};
pub use host::{AccRole, AccessibleId, AccessibleTree, EditorId, ExtraStates, States};
pub use queue::{EventDispatcher, EventQueue};
pub use scheduler::{FlushScheduler, ManualRefreshDriver, RefreshDriver};
pub use shell::{AccAttributes, AccEventHandler, EventShell, FireContext, ShellDispatcher};

pub use fos_dom::{DocumentId, NodeId};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Invalid queue config: {0}")]
    InvalidConfig(String),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}
