use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;
use trellis_common::IDGenerator;
use trellis_dom::NodeId;

/// Value and node registries keyed by owning identity, then by token.
///
/// Tokens embed their owner (`__<identity>__<seq>__` for values,
/// `placehold:<identity>:<seq>__` for nodes), and the sequence comes from a
/// shared generator, so tokens never collide across owners.
#[derive(Debug, Default)]
pub struct Stash {
    values: HashMap<String, IndexMap<String, Value>>,
    nodes: HashMap<String, IndexMap<String, Vec<NodeId>>>,
    owners: HashMap<String, String>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stash_value(&mut self, ids: &mut IDGenerator, identity: &str, value: Value) -> String {
        let token = format!("__{}__{}__", identity, ids.new_id());
        debug!(identity, token = %token, "Stashed value");

        self.values
            .entry(identity.to_string())
            .or_default()
            .insert(token.clone(), value);
        self.owners.insert(token.clone(), identity.to_string());
        token
    }

    pub fn stash_nodes(&mut self, ids: &mut IDGenerator, identity: &str, nodes: Vec<NodeId>) -> String {
        let token = format!("placehold:{}:{}__", identity, ids.new_id());
        debug!(identity, token = %token, count = nodes.len(), "Stashed nodes");

        self.nodes
            .entry(identity.to_string())
            .or_default()
            .insert(token.clone(), nodes);
        self.owners.insert(token.clone(), identity.to_string());
        token
    }

    pub fn owner(&self, token: &str) -> Option<&str> {
        self.owners.get(token).map(String::as_str)
    }

    pub fn value(&self, token: &str) -> Option<&Value> {
        self.values.get(self.owner(token)?)?.get(token)
    }

    pub fn nodes(&self, token: &str) -> Option<&[NodeId]> {
        self.nodes
            .get(self.owner(token)?)?
            .get(token)
            .map(Vec::as_slice)
    }

    /// Node tokens of `identity` that have not been spliced yet, oldest first
    pub fn node_tokens(&self, identity: &str) -> Vec<String> {
        self.nodes
            .get(identity)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a node entry, returning its nodes
    pub fn take_nodes(&mut self, token: &str) -> Option<Vec<NodeId>> {
        let owner = self.owners.get(token)?.clone();
        let entries = self.nodes.get_mut(&owner)?;
        let nodes = entries.shift_remove(token)?;
        if entries.is_empty() {
            self.nodes.remove(&owner);
        }
        self.owners.remove(token);
        Some(nodes)
    }

    /// Drop every entry owned by `identity`. Returns how many were removed.
    pub fn release(&mut self, identity: &str) -> usize {
        let values = self.values.remove(identity).unwrap_or_default();
        let nodes = self.nodes.remove(identity).unwrap_or_default();

        for token in values.keys().chain(nodes.keys()) {
            self.owners.remove(token);
        }

        let released = values.len() + nodes.len();
        if released > 0 {
            debug!(identity, released, "Released stash entries");
        }
        released
    }

    /// Number of live entries owned by `identity`
    pub fn count(&self, identity: &str) -> usize {
        self.values.get(identity).map_or(0, IndexMap::len)
            + self.nodes.get(identity).map_or(0, IndexMap::len)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Process-wide state continuity store keyed by element id.
///
/// Reading an entry consumes it.
#[derive(Debug, Default)]
pub struct StateStore {
    states: HashMap<String, Value>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stash(&mut self, id: impl Into<String>, state: Value) {
        let id = id.into();
        debug!(id = %id, "Stashed state");
        self.states.insert(id, state);
    }

    pub fn take(&mut self, id: &str) -> Option<Value> {
        self.states.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
