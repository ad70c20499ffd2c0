//! # Render Pipeline
//!
//! Snapshot → Invoke → Commit → Hooks, one job at a time per instance.
//!
//! Jobs are queued per instance and chained: each awaits its predecessor.
//! An update request arriving while the newest job has not started yet joins
//! that job instead of queueing another one.

use crate::component::{Content, RenderFn, RenderSource};
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{Instance, JobKind, RenderHandle};
use crate::runtime::Runtime;
use crate::value::{Props, Value};
use futures::task::LocalSpawnExt;
use futures::{FutureExt, StreamExt};
use std::rc::Rc;
use tracing::{debug, error, instrument, warn};
use trellis_common::{escape_attribute, escape_html};
use trellis_dom::{NodeId, Selector};

impl Runtime {
    /// Queue a render job behind the instance's current tail
    pub(crate) fn schedule(
        &self,
        instance: &Rc<Instance>,
        kind: JobKind,
        old_props: Props,
    ) -> RenderHandle {
        let (previous, ticket) = {
            let mut queue = instance.queue.borrow_mut();
            (queue.tail(), queue.next_ticket())
        };

        let runtime = self.clone();
        let job_instance = instance.clone();
        let job = async move {
            if let Some(previous) = previous {
                // The previous job reports its own failure
                let _ = previous.await;
            }

            job_instance.queue.borrow_mut().begin(ticket);
            let result = runtime.run_job(&job_instance, kind, &old_props).await;
            job_instance.queue.borrow_mut().finish(ticket);
            result
        }
        .boxed_local()
        .shared();

        instance
            .queue
            .borrow_mut()
            .push(ticket, kind, job.clone());
        debug!(tag = instance.tag(), ticket, ?kind, "Queued render");
        job
    }

    /// Poll a job on the pool; failures nobody awaits are kept for `run_until_stalled`
    pub(crate) fn drive(&self, handle: RenderHandle) {
        let inner = Rc::downgrade(self.inner());
        let spawned = self.inner().spawner.spawn_local(async move {
            if let Err(err) = handle.await {
                error!(error = %err, "Background render failed");
                if let Some(inner) = inner.upgrade() {
                    inner.failures.borrow_mut().push(err);
                }
            }
        });

        if let Err(err) = spawned {
            warn!(error = %err, "Could not spawn render");
        }
    }

    /// Replace props and request a re-render, joining a queued update if there is one
    pub(crate) fn update_instance<F>(&self, instance: &Rc<Instance>, f: F) -> RenderHandle
    where
        F: FnOnce(&Props) -> Props,
    {
        let old_props = instance.props.borrow().clone();
        let props = f(&old_props);
        *instance.props.borrow_mut() = props;

        let pending = instance.queue.borrow().coalesce_target();
        if let Some(handle) = pending {
            debug!(tag = instance.tag(), "Coalesced update into queued render");
            return handle;
        }

        let handle = self.schedule(instance, JobKind::Update, old_props);
        self.drive(handle.clone());
        handle
    }

    async fn run_job(
        &self,
        instance: &Rc<Instance>,
        kind: JobKind,
        old_props: &Props,
    ) -> RuntimeResult<()> {
        let scope = self.scope_for(instance);
        match kind {
            JobKind::Mount => {
                self.render_instance(instance.clone()).await?;
                instance.component.connected(&scope);
            }
            JobKind::Update => {
                if !instance.connected.get() {
                    debug!(tag = instance.tag(), "Skipping update of detached component");
                    return Ok(());
                }
                self.render_instance(instance.clone()).await?;
                instance.component.updated(&scope, old_props);
            }
        }
        Ok(())
    }

    pub(crate) async fn render_instance(&self, instance: Rc<Instance>) -> RuntimeResult<()> {
        match instance.definition.render.clone() {
            Some(render) => self.run_source(instance, RenderSource::Function(render)).await,
            None => Ok(()),
        }
    }

    #[instrument(skip(self, instance, source), fields(tag = %instance.definition.tag, host = ?instance.host))]
    pub(crate) async fn run_source(
        &self,
        instance: Rc<Instance>,
        source: RenderSource,
    ) -> RuntimeResult<()> {
        let scope = self.scope_for(&instance);

        match source {
            RenderSource::Literal(content) => self.render_content(&instance, content),
            RenderSource::Function(RenderFn::Sync(render)) => {
                self.prepare(&instance);
                let content = render(scope).map_err(RuntimeError::render)?;
                self.commit(&instance, content)
            }
            RenderSource::Function(RenderFn::Deferred(render)) => {
                self.prepare(&instance);
                let content = render(scope).await.map_err(RuntimeError::render)?;
                self.commit(&instance, content)
            }
            RenderSource::Function(RenderFn::Incremental(render)) => {
                self.prepare(&instance);
                let mut frames = render(scope);
                let mut count = 0usize;
                while let Some(frame) = frames.next().await {
                    let content = frame.map_err(RuntimeError::render)?;
                    if count > 0 {
                        self.prepare(&instance);
                    }
                    self.commit(&instance, content)?;
                    count += 1;
                }
                debug!(frames = count, "Incremental render finished");
                Ok(())
            }
        }
    }

    /// Commit literal content with the same snapshot step a render gets
    pub(crate) fn render_content(&self, instance: &Rc<Instance>, content: Content) -> RuntimeResult<()> {
        self.prepare(instance);
        self.commit(instance, content)
    }

    /// Fire `will_render` and snapshot the state of nested components with known ids
    fn prepare(&self, instance: &Rc<Instance>) {
        let scope = self.scope_for(instance);
        instance.component.will_render(&scope);

        let target = self.render_target(instance);
        let snapshot: Vec<(String, Value)> = {
            let doc = self.document();
            let instances = self.inner().instances.borrow();
            let ref_ids = self.inner().ref_ids.borrow();
            doc.composed_descendants(target)
                .into_iter()
                .filter_map(|node| {
                    let nested = instances.get(&node)?;
                    let id = doc.element(node)?.id()?;
                    if !ref_ids.contains(id) {
                        return None;
                    }
                    Some((id.to_string(), nested.state.borrow().clone()))
                })
                .collect()
        };

        if !snapshot.is_empty() {
            let mut states = self.inner().states.borrow_mut();
            for (id, state) in snapshot {
                states.stash(id, state);
            }
        }
    }

    /// Container a component renders into: its shadow root, or the host itself
    pub(crate) fn render_target(&self, instance: &Instance) -> NodeId {
        if instance.definition.shadow {
            if let Some(shadow) = self.document().shadow_root(instance.host) {
                return shadow;
            }
        }
        instance.host
    }

    /// Write content into the instance's container, then upgrade what it contains
    pub(crate) fn commit(&self, instance: &Rc<Instance>, content: Content) -> RuntimeResult<()> {
        let target = self.render_target(instance);

        let markup = match content {
            Content::Node(node) => {
                let removed = {
                    let mut doc = self.inner().document.borrow_mut();
                    let removed = doc.clear_children(target)?;
                    let copy = doc.deep_clone(node)?;
                    doc.append_child(target, copy)?;
                    removed
                };
                self.disconnect_tree(&removed);
                debug!(tag = instance.tag(), "Committed node");
                let nodes = self.document().composed_descendants(target);
                return self.upgrade_nodes(target, nodes);
            }
            Content::Markup(template) => template.into_text(),
            Content::Text(text) => escape_html(&text),
            Content::Empty => String::new(),
        };

        let markup = match instance.definition.stylesheet {
            Some(stylesheet) if instance.definition.shadow => {
                format!("{}{}", self.style_block(&stylesheet()), markup)
            }
            _ => markup,
        };

        let removed = {
            let mut doc = self.inner().document.borrow_mut();
            let removed = doc.clear_children(target)?;
            for node in doc.parse_fragment(&markup) {
                doc.append_child(target, node)?;
            }
            removed
        };

        self.apply_style_groups(instance, target)?;
        let moved = self.reconcile(instance, target)?;

        self.disconnect_tree(&removed);
        self.disconnect_tree(&moved);
        debug!(tag = instance.tag(), bytes = markup.len(), "Committed markup");

        let nodes = self.document().composed_descendants(target);
        self.upgrade_nodes(target, nodes)
    }

    pub(crate) fn style_block(&self, css: &str) -> String {
        match &self.config().nonce {
            Some(nonce) => format!("<style nonce=\"{}\">{}</style>", escape_attribute(nonce), css),
            None => format!("<style>{}</style>", css),
        }
    }

    /// Inline the declarations of each group named in an element's `styles` attribute
    fn apply_style_groups(&self, instance: &Rc<Instance>, target: NodeId) -> RuntimeResult<()> {
        let scope = self.scope_for(instance);
        let groups = instance.component.styles(&scope);
        if groups.is_empty() {
            return Ok(());
        }

        let selector = Selector::parse("[styles]")?;
        let mut doc = self.inner().document.borrow_mut();
        for node in doc.query_selector_all(target, &selector) {
            let names = doc.get_attribute(node, "styles").unwrap_or_default().to_string();
            for name in names.split_whitespace() {
                let Some(group) = groups.get(name) else {
                    continue;
                };
                for (property, value) in group {
                    doc.set_style_property(node, property, value)?;
                }
            }
        }
        Ok(())
    }

    /// Splice stashed nodes back in place of their marker text nodes.
    ///
    /// Returns the moved nodes so callers can disconnect any that left the document.
    fn reconcile(&self, instance: &Rc<Instance>, target: NodeId) -> RuntimeResult<Vec<NodeId>> {
        let Some(identity) = instance.identity() else {
            return Ok(Vec::new());
        };
        let pending = self.stash().node_tokens(&identity);
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let markers: Vec<(NodeId, String)> = {
            let doc = self.document();
            doc.descendants(target)
                .into_iter()
                .filter_map(|node| {
                    let text = doc.text(node)?.trim();
                    pending
                        .iter()
                        .find(|token| token.as_str() == text)
                        .map(|token| (node, token.clone()))
                })
                .collect()
        };

        let mut moved = Vec::new();
        for (marker, token) in markers {
            let Some(nodes) = self.inner().stash.borrow_mut().take_nodes(&token) else {
                continue;
            };

            let mut doc = self.inner().document.borrow_mut();
            let Some(parent) = doc.parent(marker) else {
                continue;
            };
            for node in nodes {
                doc.insert_before(parent, node, Some(marker))?;
                moved.push(node);
            }
            doc.remove(marker)?;
            debug!(token = %token, "Reconciled stashed nodes");
        }
        Ok(moved)
    }
}
