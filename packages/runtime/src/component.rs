use crate::events::Event;
use crate::scope::Scope;
use crate::template::TemplateResult;
use crate::value::Props;
use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use futures::{FutureExt, Stream, StreamExt};
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use trellis_dom::NodeId;

/// What a render produces
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    /// Clears the content area
    #[default]
    Empty,
    /// Markup committed as is
    Markup(TemplateResult),
    /// Plain text, escaped before commit
    Text(String),
    /// A node cloned into the content area
    Node(NodeId),
}

impl From<TemplateResult> for Content {
    fn from(template: TemplateResult) -> Self {
        Content::Markup(template)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(content: Option<T>) -> Self {
        content.map(Into::into).unwrap_or_default()
    }
}

pub type RenderResult = anyhow::Result<Content>;

/// A render function, tagged by calling convention.
///
/// The variant is fixed when the component is registered.
#[derive(Clone)]
pub enum RenderFn {
    /// Returns its content directly
    Sync(Rc<dyn Fn(Scope) -> RenderResult>),
    /// Resolves to its content later
    Deferred(Rc<dyn Fn(Scope) -> LocalBoxFuture<'static, RenderResult>>),
    /// Yields a sequence of content; each item is committed as it arrives
    Incremental(Rc<dyn Fn(Scope) -> LocalBoxStream<'static, RenderResult>>),
}

impl RenderFn {
    pub fn sync<F>(render: F) -> Self
    where
        F: Fn(Scope) -> RenderResult + 'static,
    {
        RenderFn::Sync(Rc::new(render))
    }

    pub fn deferred<F, Fut>(render: F) -> Self
    where
        F: Fn(Scope) -> Fut + 'static,
        Fut: Future<Output = RenderResult> + 'static,
    {
        RenderFn::Deferred(Rc::new(move |scope| render(scope).boxed_local()))
    }

    pub fn incremental<F, S>(render: F) -> Self
    where
        F: Fn(Scope) -> S + 'static,
        S: Stream<Item = RenderResult> + 'static,
    {
        RenderFn::Incremental(Rc::new(move |scope| render(scope).boxed_local()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderFn::Sync(_) => "sync",
            RenderFn::Deferred(_) => "deferred",
            RenderFn::Incremental(_) => "incremental",
        }
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderFn::{}", self.kind())
    }
}

/// Where a pipeline run takes its content from
#[derive(Debug, Clone)]
pub enum RenderSource {
    Function(RenderFn),
    Literal(Content),
}

/// Named groups of inline style declarations, applied to elements whose
/// `styles` attribute lists the group name
pub type StyleGroups = IndexMap<String, IndexMap<String, String>>;

/// A component type.
///
/// One value is created per instance through the registered factory. Type
/// level answers (`render`, `events`, `shadow`, `stylesheet`) are read once at
/// registration from a prototype instance.
pub trait Component: 'static {
    fn render(&self) -> Option<RenderFn> {
        None
    }

    /// Property defaults; decoded attributes are merged over them
    fn defaults(&self) -> Props {
        Props::new()
    }

    /// Stylesheet for the type. Shared in the document head, or inlined
    /// ahead of every render for shadow components.
    fn stylesheet(&self) -> Option<fn() -> String> {
        None
    }

    fn styles(&self, _scope: &Scope) -> StyleGroups {
        StyleGroups::new()
    }

    /// Render into an attached shadow root instead of the host's children
    fn shadow(&self) -> bool {
        false
    }

    /// Event names delivered to `handle_event`
    fn events(&self) -> &'static [&'static str] {
        &[]
    }

    fn handle_event(&self, _scope: &Scope, _event: &Event) {}

    /// Skip restoring and re-rendering when the host is attached again
    fn prevent_render_on_reconnect(&self) -> bool {
        false
    }

    fn will_connect(&self, _scope: &Scope) {}

    fn will_render(&self, _scope: &Scope) {}

    fn connected(&self, _scope: &Scope) {}

    fn disconnected(&self, _scope: &Scope) {}

    fn updated(&self, _scope: &Scope, _old_props: &Props) {}
}

/// A bare render function registered as a component
pub(crate) struct FnComponent {
    pub(crate) render: RenderFn,
}

impl Component for FnComponent {
    fn render(&self) -> Option<RenderFn> {
        Some(self.render.clone())
    }
}

/// Helper for incremental renders built from a fixed list of frames
pub fn frames<I>(items: I) -> impl Stream<Item = RenderResult>
where
    I: IntoIterator<Item = Content>,
{
    futures::stream::iter(items.into_iter().map(Ok))
}
