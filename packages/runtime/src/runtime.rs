//! # Runtime
//!
//! Owns the document, the component registry, the stash registries and the
//! executor. Tree operations on the runtime fire component reactions
//! (construct, connect, disconnect) the way a browser does for custom elements.

use crate::component::{Component, Content, FnComponent, RenderFn};
use crate::config::RuntimeConfig;
use crate::error::{ConfigError, RuntimeError, RuntimeResult};
use crate::events::{Event, ListenerFn, ListenerId, ListenerRegistry};
use crate::instance::{Instance, RenderHandle};
use crate::registry::{derive_tag_name, validate_tag_name, ComponentRegistry, Definition};
use crate::scope::Scope;
use crate::stash::{StateStore, Stash};
use crate::styles::StyleRegistry;
use crate::value::Props;
use futures::executor::{LocalPool, LocalSpawner};
use futures::FutureExt;
use indexmap::IndexSet;
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, info};
use trellis_common::IDGenerator;
use trellis_dom::{Document, NodeId, Selector};

pub(crate) struct Inner {
    pub(crate) config: RuntimeConfig,
    pub(crate) document: RefCell<Document>,
    pub(crate) registry: RefCell<ComponentRegistry>,
    pub(crate) stash: RefCell<Stash>,
    pub(crate) states: RefCell<StateStore>,
    pub(crate) styles: RefCell<StyleRegistry>,
    pub(crate) instances: RefCell<HashMap<NodeId, Rc<Instance>>>,
    /// Explicit ids seen at connect; only these take part in state snapshots
    pub(crate) ref_ids: RefCell<IndexSet<String>>,
    pub(crate) ids: RefCell<IDGenerator>,
    pub(crate) listeners: RefCell<ListenerRegistry>,
    pub(crate) pool: RefCell<LocalPool>,
    pub(crate) spawner: LocalSpawner,
    pub(crate) failures: RefCell<Vec<RuntimeError>>,
}

/// Component runtime. Cheap to clone; clones share all state.
///
/// Single threaded: futures run on an owned `LocalPool`, driven by
/// [`Runtime::block_on`] and [`Runtime::run_until_stalled`].
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<Inner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::build(RuntimeConfig::default())
    }

    /// Runtime with a custom config; the config is validated first
    pub fn with_config(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RuntimeConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let ids = IDGenerator::new(&config.id_prefix);

        Self {
            inner: Rc::new(Inner {
                config,
                document: RefCell::new(Document::new()),
                registry: RefCell::new(ComponentRegistry::default()),
                stash: RefCell::new(Stash::new()),
                states: RefCell::new(StateStore::new()),
                styles: RefCell::new(StyleRegistry::default()),
                instances: RefCell::new(HashMap::new()),
                ref_ids: RefCell::new(IndexSet::new()),
                ids: RefCell::new(ids),
                listeners: RefCell::new(ListenerRegistry::default()),
                pool: RefCell::new(pool),
                spawner,
                failures: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<Inner> {
        &self.inner
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    // Registration

    /// Register a component type under a tag derived from its type name
    pub fn register<C: Component + Default>(&self) -> RuntimeResult<String> {
        self.register_with(C::default)
    }

    pub fn register_with<C, F>(&self, factory: F) -> RuntimeResult<String>
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        let type_name = std::any::type_name::<C>();
        let tag = derive_tag_name(type_name)?;
        self.define(tag, type_name.to_string(), factory)
    }

    /// Register a component type under an explicit tag
    pub fn register_as<C, F>(&self, tag: &str, factory: F) -> RuntimeResult<String>
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        let tag = validate_tag_name(tag)?;
        self.define(tag, std::any::type_name::<C>().to_string(), factory)
    }

    /// Register a bare render function as a component
    pub fn register_render(&self, type_name: &str, render: RenderFn) -> RuntimeResult<String> {
        let tag = derive_tag_name(type_name)?;
        self.define(tag, type_name.to_string(), move || FnComponent {
            render: render.clone(),
        })
    }

    fn define<C, F>(&self, tag: String, type_name: String, factory: F) -> RuntimeResult<String>
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        if self.inner.registry.borrow().contains(&tag) {
            return Err(RuntimeError::DuplicateTag { type_name, tag });
        }

        let factory: crate::registry::ComponentFactory =
            Rc::new(move || Rc::new(factory()) as Rc<dyn Component>);
        let definition = Definition::new(tag.clone(), type_name, factory);
        let definition = self.inner.registry.borrow_mut().insert(definition)?;

        info!(
            tag = %definition.tag,
            type_name = %definition.type_name,
            render = ?definition.render,
            shadow = definition.shadow,
            "Registered component"
        );

        if !definition.shadow {
            if let Some(stylesheet) = definition.stylesheet {
                self.register_stylesheet(stylesheet)?;
            }
        }

        self.upgrade_existing(&tag)?;
        Ok(tag)
    }

    fn register_stylesheet(&self, stylesheet: fn() -> String) -> RuntimeResult<()> {
        if !self.inner.styles.borrow_mut().insert(stylesheet) {
            return Ok(());
        }

        let css = stylesheet();
        let mut doc = self.inner.document.borrow_mut();
        let style = doc.create_element("style");
        if let Some(nonce) = &self.inner.config.nonce {
            doc.set_attribute(style, "nonce", nonce.as_str())?;
        }
        let text = doc.create_text(css);
        doc.append_child(style, text)?;
        let head = doc.head();
        doc.append_child(head, style)?;
        debug!("Added shared stylesheet to head");
        Ok(())
    }

    /// Construct instances for elements already in the document, shadow trees
    /// included, connecting the connected ones
    fn upgrade_existing(&self, tag: &str) -> RuntimeResult<()> {
        let selector = Selector::parse(tag)?;
        let (root, matching) = {
            let doc = self.inner.document.borrow();
            let root = doc.root();
            let matching: Vec<NodeId> = doc
                .composed_descendants(root)
                .into_iter()
                .filter(|&node| doc.matches(node, &selector))
                .collect();
            (root, matching)
        };
        if matching.is_empty() {
            return Ok(());
        }
        debug!(tag, count = matching.len(), "Upgrading existing elements");
        self.upgrade_nodes(root, matching)
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.inner.registry.borrow().contains(tag)
    }

    // Document access

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn root(&self) -> NodeId {
        self.document().root()
    }

    pub fn head(&self) -> NodeId {
        self.document().head()
    }

    pub fn body(&self) -> NodeId {
        self.document().body()
    }

    /// Create an element, constructing a component instance when the tag is registered
    pub fn create_element(&self, tag: &str) -> RuntimeResult<NodeId> {
        self.create_element_with(tag, Vec::new())
    }

    pub fn create_element_with(
        &self,
        tag: &str,
        attributes: Vec<(String, String)>,
    ) -> RuntimeResult<NodeId> {
        let node = self
            .inner
            .document
            .borrow_mut()
            .create_element_with(tag, attributes);
        self.construct(node)?;
        Ok(node)
    }

    pub fn create_text(&self, content: &str) -> NodeId {
        self.inner.document.borrow_mut().create_text(content)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> RuntimeResult<()> {
        Ok(self
            .inner
            .document
            .borrow_mut()
            .set_attribute(node, name, value)?)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document().get_attribute(node, name).map(str::to_string)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> RuntimeResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert a node, disconnecting it from its old place and connecting it in the new one
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> RuntimeResult<()> {
        let was_connected = {
            let mut doc = self.inner.document.borrow_mut();
            let was_connected = doc.is_connected(child);
            if was_connected && doc.parent(child) != Some(parent) {
                doc.remove(child)?;
            }
            was_connected
        };
        if was_connected {
            self.disconnect_tree(&[child]);
        }

        self.inner
            .document
            .borrow_mut()
            .insert_before(parent, child, reference)?;

        let nodes = self.inclusive_subtree(child);
        self.upgrade_nodes(child, nodes)
    }

    pub fn remove(&self, node: NodeId) -> RuntimeResult<()> {
        self.inner.document.borrow_mut().remove(node)?;
        self.disconnect_tree(&[node]);
        Ok(())
    }

    /// Replace the children of `node` with parsed markup
    pub fn set_inner_html(&self, node: NodeId, markup: &str) -> RuntimeResult<()> {
        let removed = {
            let mut doc = self.inner.document.borrow_mut();
            let removed = doc.clear_children(node)?;
            for child in doc.parse_fragment(markup) {
                doc.append_child(node, child)?;
            }
            removed
        };
        self.disconnect_tree(&removed);

        let nodes = self.document().composed_descendants(node);
        self.upgrade_nodes(node, nodes)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        self.document().inner_html(node)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        self.document().outer_html(node)
    }

    pub fn attach_shadow(&self, host: NodeId) -> RuntimeResult<NodeId> {
        Ok(self.inner.document.borrow_mut().attach_shadow(host)?)
    }

    pub fn query_selector(&self, root: NodeId, selector: &str) -> RuntimeResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.document().query_selector(root, &selector))
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> RuntimeResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.document().query_selector_all(root, &selector))
    }

    /// Nearest inclusive ancestor matching `selector`, for event delegation
    pub fn closest(&self, node: NodeId, selector: &str) -> RuntimeResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.document().closest(node, &selector))
    }

    pub(crate) fn inclusive_subtree(&self, node: NodeId) -> Vec<NodeId> {
        let doc = self.document();
        std::iter::once(node)
            .chain(doc.composed_descendants(node))
            .collect()
    }

    // Components

    pub(crate) fn instance(&self, host: NodeId) -> Option<Rc<Instance>> {
        self.inner.instances.borrow().get(&host).cloned()
    }

    pub(crate) fn scope_for(&self, instance: &Rc<Instance>) -> Scope {
        Scope::new(self.clone(), instance.clone())
    }

    pub fn is_component(&self, node: NodeId) -> bool {
        self.inner.instances.borrow().contains_key(&node)
    }

    pub fn scope(&self, host: NodeId) -> RuntimeResult<Scope> {
        self.instance(host)
            .map(|instance| self.scope_for(&instance))
            .ok_or(RuntimeError::NotAComponent(host))
    }

    /// Replace a component's props and schedule a re-render
    pub fn update(&self, host: NodeId, props: Props) -> RuntimeResult<RenderHandle> {
        self.update_with(host, move |_| props)
    }

    pub fn update_with<F>(&self, host: NodeId, f: F) -> RuntimeResult<RenderHandle>
    where
        F: FnOnce(&Props) -> Props,
    {
        let instance = self.instance(host).ok_or(RuntimeError::NotAComponent(host))?;
        Ok(self.update_instance(&instance, f))
    }

    pub fn re_render(&self, host: NodeId) -> RuntimeResult<RenderHandle> {
        self.update_with(host, Props::clone)
    }

    /// Handle of the newest queued render, or a resolved handle when idle
    pub fn render_handle(&self, host: NodeId) -> RuntimeResult<RenderHandle> {
        let instance = self.instance(host).ok_or(RuntimeError::NotAComponent(host))?;
        let tail = instance.queue.borrow().tail();
        Ok(tail.unwrap_or_else(|| async { Ok(()) }.boxed_local().shared()))
    }

    /// Renders queued or running for a component
    pub fn renders_in_flight(&self, host: NodeId) -> RuntimeResult<usize> {
        let instance = self.instance(host).ok_or(RuntimeError::NotAComponent(host))?;
        let count = instance.queue.borrow().in_flight();
        Ok(count)
    }

    /// Commit literal content into a component, bypassing its render function
    pub fn render_literal(&self, host: NodeId, content: impl Into<Content>) -> RuntimeResult<()> {
        let instance = self.instance(host).ok_or(RuntimeError::NotAComponent(host))?;
        self.render_content(&instance, content.into())
    }

    // Events

    pub fn add_event_listener<F>(&self, node: NodeId, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) + 'static,
    {
        let listener: ListenerFn = Rc::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .add(node, event, listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Deliver an event to `node` and, when it bubbles, to its ancestors.
    ///
    /// Bubbling crosses from a shadow root to its host only for composed events.
    /// Returns false when a listener prevented the default.
    pub fn dispatch_event(&self, node: NodeId, event: Event) -> bool {
        event.set_target(node);
        let path = self.event_path(node, &event);

        for current in path {
            let listeners = self
                .inner
                .listeners
                .borrow()
                .matching(current, event.name());
            event.set_current_target(Some(current));
            for listener in listeners {
                listener(&event);
            }
            if event.propagation_stopped() {
                break;
            }
        }

        event.set_current_target(None);
        !event.default_prevented()
    }

    fn event_path(&self, node: NodeId, event: &Event) -> Vec<NodeId> {
        let doc = self.document();
        let mut path = vec![node];
        if !event.bubbles() {
            return path;
        }

        let mut current = node;
        loop {
            let next = match doc.parent(current) {
                Some(parent) => Some(parent),
                None if event.composed() => doc.host(current),
                None => None,
            };
            match next {
                Some(next) => {
                    path.push(next);
                    current = next;
                }
                None => break,
            }
        }
        path
    }

    // Execution

    /// Run `future` to completion on the runtime's pool, along with spawned renders.
    ///
    /// Must not be called from inside a render or a hook.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.inner.pool.borrow_mut().run_until(future)
    }

    /// Run spawned renders until none can progress, then report the oldest
    /// background render failure. Later failures stay queued for the next call.
    pub fn run_until_stalled(&self) -> RuntimeResult<()> {
        self.inner.pool.borrow_mut().run_until_stalled();

        let mut failures = self.inner.failures.borrow_mut();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0))
        }
    }

    /// Background render failures collected so far, without clearing them
    pub fn failure_count(&self) -> usize {
        self.inner.failures.borrow().len()
    }

    // Inspection

    pub fn stash(&self) -> Ref<'_, Stash> {
        self.inner.stash.borrow()
    }

    pub fn states(&self) -> Ref<'_, StateStore> {
        self.inner.states.borrow()
    }

    pub fn registered_tags(&self) -> Vec<String> {
        self.inner
            .registry
            .borrow()
            .tags()
            .map(str::to_string)
            .collect()
    }
}
