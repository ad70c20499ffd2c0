use crate::value::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use trellis_dom::NodeId;

/// A dispatched event.
///
/// Propagation state lives in cells so listeners can stop propagation or
/// prevent the default through a shared reference.
pub struct Event {
    name: String,
    detail: Value,
    bubbles: bool,
    composed: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// A non-bubbling event without detail
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Value::Null,
            bubbles: false,
            composed: false,
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// A bubbling event carrying `detail`
    pub fn custom(name: impl Into<String>, detail: Value) -> Self {
        Self {
            detail,
            bubbles: true,
            ..Self::new(name)
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Let the event cross shadow root boundaries while bubbling
    pub fn with_composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn composed(&self) -> bool {
        self.composed
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, node: NodeId) {
        self.target.set(Some(node));
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("detail", &self.detail)
            .field("bubbles", &self.bubbles)
            .field("target", &self.target.get())
            .finish()
    }
}

pub type ListenerFn = Rc<dyn Fn(&Event)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    event: String,
    callback: ListenerFn,
}

/// Event listeners per node
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    by_node: HashMap<NodeId, Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub fn add(&mut self, node: NodeId, event: impl Into<String>, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_node.entry(node).or_default().push(ListenerEntry {
            id,
            event: event.into(),
            callback,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        for entries in self.by_node.values_mut() {
            if let Some(index) = entries.iter().position(|entry| entry.id == id) {
                entries.remove(index);
                return true;
            }
        }
        false
    }

    /// Listeners registered on `node` for `event`, in registration order
    pub fn matching(&self, node: NodeId, event: &str) -> Vec<ListenerFn> {
        self.by_node
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.event == event)
                    .map(|entry| entry.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_add_match_remove() {
        let mut doc = trellis_dom::Document::new();
        let node = doc.create_element("button");
        let mut registry = ListenerRegistry::default();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let click = registry.add(node, "click", Rc::new(move |e: &Event| {
            log.borrow_mut().push(e.name().to_string())
        }));
        registry.add(node, "input", Rc::new(|_: &Event| {}));

        let listeners = registry.matching(node, "click");
        assert_eq!(listeners.len(), 1);
        listeners[0](&Event::new("click"));
        assert_eq!(*seen.borrow(), vec!["click".to_string()]);

        assert!(registry.remove(click));
        assert!(!registry.remove(click));
        assert_eq!(registry.count(node), 1);
    }

    #[test]
    fn test_event_flags() {
        let event = Event::custom("select", Value::from(1));
        assert!(event.bubbles());
        assert!(!event.composed());
        event.prevent_default();
        event.stop_propagation();
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(event.detail(), &Value::from(1));
    }
}
