//! Construct, connect and disconnect reactions for component hosts

use crate::decoder::decode_attributes;
use crate::error::RuntimeResult;
use crate::events::{Event, ListenerFn};
use crate::instance::{Instance, JobKind};
use crate::runtime::Runtime;
use crate::value::{NodeList, Props, Value};
use futures::FutureExt;
use std::rc::Rc;
use tracing::{debug, error};
use trellis_dom::NodeId;

fn is_word_like(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Whether `id` has the `<prefix><n>` shape the id generator hands out
fn is_generated_shape(prefix: &str, id: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

impl Runtime {
    /// The host's `id` attribute, when present and non-empty
    pub(crate) fn explicit_id(&self, host: NodeId) -> Option<String> {
        self.document()
            .element(host)
            .and_then(|element| element.id())
            .map(str::to_string)
    }

    /// Identity used to own stash entries; assigned on first use.
    ///
    /// Explicit ids that could collide with generated identities are not used.
    pub(crate) fn ensure_identity(&self, instance: &Instance) -> String {
        if let Some(identity) = instance.identity() {
            return identity;
        }

        let prefix = &self.config().id_prefix;
        let identity = match self.explicit_id(instance.host) {
            Some(id) if is_word_like(&id) && !is_generated_shape(prefix, &id) => id,
            _ => self.inner().ids.borrow_mut().new_id(),
        };
        *instance.identity.borrow_mut() = Some(identity.clone());
        identity
    }

    /// Create the instance for a registered element. Returns `None` for
    /// anything that is not a registered element.
    pub(crate) fn construct(&self, node: NodeId) -> RuntimeResult<Option<Rc<Instance>>> {
        if let Some(existing) = self.instance(node) {
            return Ok(Some(existing));
        }

        let Some(tag) = self.document().tag_name(node).map(str::to_string) else {
            return Ok(None);
        };
        let Some(definition) = self.inner().registry.borrow().get(&tag) else {
            return Ok(None);
        };

        let component = definition.instantiate();

        let state = self
            .explicit_id(node)
            .and_then(|id| self.inner().states.borrow_mut().take(&id))
            .unwrap_or_else(Value::object);

        let (elements, nodes) = {
            let doc = self.document();
            (doc.element_children(node), doc.children(node).to_vec())
        };

        let instance = Rc::new(Instance::new(
            node,
            definition.clone(),
            component,
            state,
            NodeList::children_of(elements),
            NodeList::children_of(nodes),
        ));
        self.inner()
            .instances
            .borrow_mut()
            .insert(node, instance.clone());

        if definition.shadow {
            let mut doc = self.inner().document.borrow_mut();
            if doc.shadow_root(node).is_none() {
                doc.attach_shadow(node)?;
            }
        }

        for event in &definition.events {
            let inner = Rc::downgrade(self.inner());
            let weak = Rc::downgrade(&instance);
            let listener: ListenerFn = Rc::new(move |event: &Event| {
                if let (Some(inner), Some(instance)) = (inner.upgrade(), weak.upgrade()) {
                    let scope = Runtime::from_inner(inner).scope_for(&instance);
                    instance.component.handle_event(&scope, event);
                }
            });
            self.inner()
                .listeners
                .borrow_mut()
                .add(node, event.as_str(), listener);
        }

        debug!(tag = %tag, host = ?node, "Constructed component");
        Ok(Some(instance))
    }

    /// Mount or remount an instance whose host just entered the document
    pub(crate) fn connect(&self, instance: &Rc<Instance>) -> RuntimeResult<()> {
        if instance.connected.replace(true) {
            return Ok(());
        }

        let host = instance.host;
        let explicit_id = self.explicit_id(host);
        if let Some(id) = &explicit_id {
            self.inner().ref_ids.borrow_mut().insert(id.clone());
        }

        let attributes = self.document().attributes(host).to_vec();
        let decoded = decode_attributes(&attributes, &self.inner().stash.borrow());
        let mut props = instance.component.defaults();
        props.extend(instance.props.take());
        props.extend(decoded);
        *instance.props.borrow_mut() = props;

        let identity = self.ensure_identity(instance);
        let scope = self.scope_for(instance);
        instance.component.will_connect(&scope);

        if !self.document().is_connected(host) {
            debug!(tag = instance.tag(), identity = %identity, "Host is not in the document, skipping render");
            instance.connected.set(false);
            return Ok(());
        }

        let source = instance.source.borrow().clone();
        match source {
            Some(source) => {
                if let Some(state) = explicit_id
                    .as_deref()
                    .and_then(|id| self.inner().states.borrow_mut().take(id))
                {
                    *instance.state.borrow_mut() = state;
                }

                if instance.component.prevent_render_on_reconnect() {
                    debug!(tag = instance.tag(), identity = %identity, "Reconnected without render");
                    instance.component.connected(&scope);
                    return Ok(());
                }

                self.inner()
                    .document
                    .borrow_mut()
                    .set_inner_html(host, &source)?;
                // A light-tree render replaces the restored markup anyway
                if instance.definition.render.is_none() || instance.definition.shadow {
                    let nodes = self.document().descendants(host);
                    self.upgrade_nodes(host, nodes)?;
                }
                debug!(tag = instance.tag(), identity = %identity, "Reconnected component");
            }
            None => {
                let markup = self.document().inner_html(host);
                *instance.source.borrow_mut() = Some(markup);
                debug!(tag = instance.tag(), identity = %identity, "Connected component");
            }
        }

        let handle = self.schedule(instance, JobKind::Mount, Props::new());
        match handle.clone().now_or_never() {
            Some(result) => result,
            None => {
                self.drive(handle);
                Ok(())
            }
        }
    }

    /// Unmount reaction: fire the hook, release stash entries, keep dirty state
    pub(crate) fn disconnect(&self, instance: &Rc<Instance>) {
        if !instance.connected.replace(false) {
            return;
        }

        let scope = self.scope_for(instance);
        instance.component.disconnected(&scope);

        let released = instance
            .identity()
            .map(|identity| self.inner().stash.borrow_mut().release(&identity))
            .unwrap_or(0);

        if instance.state_dirty.get() {
            if let Some(id) = self.explicit_id(instance.host) {
                let state = instance.state.borrow().clone();
                self.inner().states.borrow_mut().stash(id, state);
                instance.state_dirty.set(false);
            }
        }

        debug!(tag = instance.tag(), host = ?instance.host, released, "Disconnected component");
    }

    /// Construct registered elements among `nodes` and connect those in the document.
    ///
    /// Nodes that left `root` while earlier nodes were connecting are skipped.
    /// Every node is attempted; the first error is returned.
    pub(crate) fn upgrade_nodes(&self, root: NodeId, nodes: Vec<NodeId>) -> RuntimeResult<()> {
        let mut first_error = None;

        for node in nodes {
            if !self.document().is_composed_inclusive_ancestor(root, node) {
                continue;
            }

            let instance = match self.construct(node) {
                Ok(Some(instance)) => instance,
                Ok(None) => continue,
                Err(err) => {
                    error!(host = ?node, error = %err, "Failed to construct component");
                    first_error.get_or_insert(err);
                    continue;
                }
            };

            let connected = self.document().is_connected(node);
            if connected && !instance.connected.get() {
                if let Err(err) = self.connect(&instance) {
                    error!(tag = instance.tag(), error = %err, "Failed to connect component");
                    first_error.get_or_insert(err);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Disconnect every connected instance under `roots` whose host has left the document
    pub(crate) fn disconnect_tree(&self, roots: &[NodeId]) {
        let detached: Vec<Rc<Instance>> = {
            let doc = self.document();
            let instances = self.inner().instances.borrow();
            roots
                .iter()
                .flat_map(|&root| std::iter::once(root).chain(doc.composed_descendants(root)))
                .filter_map(|node| instances.get(&node).cloned())
                .filter(|instance| instance.connected.get() && !doc.is_connected(instance.host))
                .collect()
        };

        for instance in detached {
            self.disconnect(&instance);
        }
    }
}
