//! Change events for spine invalidation.
//!
//! The content store raises a [`ChangeEvent`] whenever a project, section or
//! page is written. Only some field changes alter navigation;
//! [`ChangeEvent::affects_spine`] tells them apart so the rebuild hook can
//! skip edits to page bodies and the like.

use std::sync::mpsc;

use serde::Deserialize;

/// Which kind of record changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Project,
    Section,
    Page,
}

impl Scheme {
    /// Fields of this scheme that the spine depends on.
    #[must_use]
    pub fn structural_fields(self) -> &'static [&'static str] {
        match self {
            Scheme::Project => &["title", "name", "order"],
            Scheme::Section => &[
                "title", "name", "order", "root", "project", "options", "priority",
            ],
            Scheme::Page => &[
                "title", "name", "section", "project", "options", "priority", "tags",
            ],
        }
    }
}

/// A write to one record of a project.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChangeEvent {
    /// Kind of record written.
    pub scheme: Scheme,
    /// Project the record belongs to.
    pub unit: i64,
    /// Names of the fields that changed. `"*"` marks creation or removal.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl ChangeEvent {
    /// Marker field for record creation or removal.
    pub const WHOLE_RECORD: &'static str = "*";

    /// Create an event for changed fields.
    #[must_use]
    pub fn new(scheme: Scheme, unit: i64, fields: &[&str]) -> Self {
        Self {
            scheme,
            unit,
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        }
    }

    /// Create an event for a created or removed record.
    #[must_use]
    pub fn whole_record(scheme: Scheme, unit: i64) -> Self {
        Self::new(scheme, unit, &[Self::WHOLE_RECORD])
    }

    /// Whether this change can alter the project's spine.
    #[must_use]
    pub fn affects_spine(&self) -> bool {
        let structural = self.scheme.structural_fields();
        self.fields
            .iter()
            .any(|f| f == Self::WHOLE_RECORD || structural.contains(&f.as_str()))
    }
}

/// Sending half of a change event channel.
#[derive(Clone)]
pub struct ChangeEventSender {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChangeEventSender {
    /// Send an event.
    ///
    /// Returns `false` if the receiving side is gone.
    pub fn send(&self, event: ChangeEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiver for change events.
///
/// Wraps a [`std::sync::mpsc::Receiver`] for synchronous event delivery.
pub struct ChangeEventReceiver {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl ChangeEventReceiver {
    /// Wait for the next event (blocking).
    ///
    /// Returns `None` when every sender is dropped.
    #[must_use]
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Try to receive an event without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected sender/receiver pair.
#[must_use]
pub fn channel() -> (ChangeEventSender, ChangeEventReceiver) {
    let (tx, rx) = mpsc::channel();
    (ChangeEventSender { tx }, ChangeEventReceiver { rx })
}
