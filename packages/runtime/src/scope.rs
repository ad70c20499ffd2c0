use crate::error::{RuntimeError, RuntimeResult};
use crate::events::Event;
use crate::instance::{Instance, RenderHandle};
use crate::runtime::Runtime;
use crate::template::{Encoder, TemplateResult};
use crate::value::{NodeList, Props, Value};
use serde::de::DeserializeOwned;
use std::fmt;
use std::rc::Rc;
use trellis_dom::NodeId;

/// A component's handle on its own instance, passed to render functions and hooks.
#[derive(Clone)]
pub struct Scope {
    runtime: Runtime,
    instance: Rc<Instance>,
}

impl Scope {
    pub(crate) fn new(runtime: Runtime, instance: Rc<Instance>) -> Self {
        Self { runtime, instance }
    }

    /// Build markup from template fragments and interpolated values.
    ///
    /// Complex values are stashed under this instance's identity. Usually
    /// called through the [`html!`](crate::html) macro.
    pub fn html(&self, strings: &[&str], values: Vec<Value>) -> TemplateResult {
        let identity = self.runtime.ensure_identity(&self.instance);
        let inner = self.runtime.inner();
        let mut stash = inner.stash.borrow_mut();
        let mut ids = inner.ids.borrow_mut();
        Encoder::new(&mut stash, &mut ids, &identity).encode(strings, values)
    }

    pub fn props(&self) -> Props {
        self.instance.props.borrow().clone()
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.instance.props.borrow().get(name).cloned()
    }

    /// Parse a string property holding JSON
    pub fn prop_json<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.prop(name) {
            Some(Value::String(raw)) => Ok(Some(serde_json::from_str(&raw)?)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Ok(Some(serde_json::from_value(other.to_json())?)),
        }
    }

    /// State kept across detach and re-attach. Requires an `id` attribute on the host.
    pub fn state(&self) -> RuntimeResult<Value> {
        self.require_id()?;
        Ok(self.instance.state.borrow().clone())
    }

    pub fn set_state(&self, state: impl Into<Value>) -> RuntimeResult<()> {
        self.require_id()?;
        *self.instance.state.borrow_mut() = state.into();
        self.instance.state_dirty.set(true);
        Ok(())
    }

    fn require_id(&self) -> RuntimeResult<String> {
        if let Some(id) = self.runtime.explicit_id(self.instance.host) {
            return Ok(id);
        }

        let doc = self.runtime.document();
        let outer = doc.outer_html(self.instance.host);
        let inner = doc.inner_html(self.instance.host);
        let markup = if inner.is_empty() {
            outer
        } else {
            outer.replacen(&inner, "...", 1)
        };
        Err(RuntimeError::MissingIdentity { markup })
    }

    pub fn identity(&self) -> String {
        self.runtime.ensure_identity(&self.instance)
    }

    pub fn host(&self) -> NodeId {
        self.instance.host
    }

    pub fn tag(&self) -> &str {
        self.instance.tag()
    }

    /// The host's attributes, for spreading onto an inner element
    /// (`html!(scope; "<a ..." {scope.attributes()} ">")`)
    pub fn attributes(&self) -> Value {
        let attributes = self.runtime.document().attributes(self.instance.host).to_vec();
        Value::Attributes(attributes)
    }

    /// Element children of the host captured at construction
    pub fn elements(&self) -> NodeList {
        self.instance.elements.clone()
    }

    /// All child nodes of the host captured at construction
    pub fn nodes(&self) -> NodeList {
        self.instance.nodes.clone()
    }

    /// Dispatch a bubbling custom event from the host.
    /// Returns false when a listener prevented the default.
    pub fn dispatch(&self, name: &str, detail: impl Into<Value>) -> bool {
        self.runtime
            .dispatch_event(self.instance.host, Event::custom(name, detail.into()))
    }

    /// Replace the props and re-render
    pub fn update(&self, props: Props) -> RenderHandle {
        self.runtime.update_instance(&self.instance, move |_| props)
    }

    pub fn update_with<F>(&self, f: F) -> RenderHandle
    where
        F: FnOnce(&Props) -> Props,
    {
        self.runtime.update_instance(&self.instance, f)
    }

    /// Re-render with the current props
    pub fn re_render(&self) -> RenderHandle {
        self.runtime.update_instance(&self.instance, Props::clone)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn is_connected(&self) -> bool {
        self.instance.connected.get()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("tag", &self.instance.tag())
            .field("host", &self.instance.host)
            .field("identity", &self.instance.identity())
            .finish()
    }
}
