use crate::component::Component;
use crate::error::RuntimeResult;
use crate::registry::Definition;
use crate::value::{NodeList, Props, Value};
use futures::future::{LocalBoxFuture, Shared};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use trellis_dom::NodeId;

/// Completion of one queued render. Clones resolve together.
pub type RenderHandle = Shared<LocalBoxFuture<'static, RuntimeResult<()>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobKind {
    /// First render after connect, followed by the `connected` hook
    Mount,
    /// Re-render requested through an update, followed by `updated`
    Update,
}

struct QueuedRender {
    ticket: u64,
    kind: JobKind,
    started: bool,
    handle: RenderHandle,
}

/// Pending and running renders of one instance, oldest first.
///
/// Each job awaits the one queued before it, so renders of an instance never
/// interleave.
#[derive(Default)]
pub(crate) struct RenderQueue {
    next_ticket: u64,
    jobs: VecDeque<QueuedRender>,
}

impl RenderQueue {
    pub(crate) fn next_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    pub(crate) fn push(&mut self, ticket: u64, kind: JobKind, handle: RenderHandle) {
        self.jobs.push_back(QueuedRender {
            ticket,
            kind,
            started: false,
            handle,
        });
    }

    /// An update that has not started yet absorbs further update requests
    pub(crate) fn coalesce_target(&self) -> Option<RenderHandle> {
        self.jobs
            .back()
            .filter(|job| job.kind == JobKind::Update && !job.started)
            .map(|job| job.handle.clone())
    }

    pub(crate) fn tail(&self) -> Option<RenderHandle> {
        self.jobs.back().map(|job| job.handle.clone())
    }

    pub(crate) fn begin(&mut self, ticket: u64) {
        if let Some(job) = self.jobs.iter_mut().find(|job| job.ticket == ticket) {
            job.started = true;
        }
    }

    pub(crate) fn finish(&mut self, ticket: u64) {
        self.jobs.retain(|job| job.ticket != ticket);
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.jobs.len()
    }
}

/// Per-host component state
pub(crate) struct Instance {
    pub(crate) host: NodeId,
    pub(crate) definition: Rc<Definition>,
    pub(crate) component: Rc<dyn Component>,
    pub(crate) identity: RefCell<Option<String>>,
    pub(crate) props: RefCell<Props>,
    pub(crate) state: RefCell<Value>,
    pub(crate) state_dirty: Cell<bool>,
    /// Host markup captured on first connect, restored on reconnect
    pub(crate) source: RefCell<Option<String>>,
    pub(crate) elements: NodeList,
    pub(crate) nodes: NodeList,
    pub(crate) connected: Cell<bool>,
    pub(crate) queue: RefCell<RenderQueue>,
}

impl Instance {
    pub(crate) fn new(
        host: NodeId,
        definition: Rc<Definition>,
        component: Rc<dyn Component>,
        state: Value,
        elements: NodeList,
        nodes: NodeList,
    ) -> Self {
        Self {
            host,
            definition,
            component,
            identity: RefCell::new(None),
            props: RefCell::new(Props::new()),
            state: RefCell::new(state),
            state_dirty: Cell::new(false),
            source: RefCell::new(None),
            elements,
            nodes,
            connected: Cell::new(false),
            queue: RefCell::new(RenderQueue::default()),
        }
    }

    pub(crate) fn identity(&self) -> Option<String> {
        self.identity.borrow().clone()
    }

    pub(crate) fn tag(&self) -> &str {
        &self.definition.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready() -> RenderHandle {
        async { Ok(()) }.boxed_local().shared()
    }

    #[test]
    fn test_only_unstarted_updates_coalesce() {
        let mut queue = RenderQueue::default();

        let mount = queue.next_ticket();
        queue.push(mount, JobKind::Mount, ready());
        assert!(queue.coalesce_target().is_none());

        let update = queue.next_ticket();
        queue.push(update, JobKind::Update, ready());
        assert!(queue.coalesce_target().is_some());

        queue.begin(update);
        assert!(queue.coalesce_target().is_none());
        assert_eq!(queue.in_flight(), 2);

        queue.finish(mount);
        queue.finish(update);
        assert!(queue.tail().is_none());
    }
}
