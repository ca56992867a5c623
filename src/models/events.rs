//! Change notification for the rendering collaborator
//!
//! The editing session owns the only writable handle on the document and
//! publishes a `ChangeEvent` after each committed edit (renumbering
//! included). Collaborators subscribe and receive read-only events.

use serde::{Deserialize, Serialize};

/// Why the document changed
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChangeReason {
    /// Incremental edit (flow key, shortcut, typing)
    Edit,
    /// Document replaced wholesale (new, open, import, template switch)
    Replaced,
}

/// Published once per committed transaction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub revision: u64,
    pub reason: ChangeReason,
    pub template_id: String,
    /// Whether the renumbering pass had to patch scene numbers
    pub renumbered: bool,
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Listener = Box<dyn Fn(&ChangeEvent) + Send>;

/// Subscriber list
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ChangeEvent) + Send>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(&self, event: &ChangeEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}
