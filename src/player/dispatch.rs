//! Cross-thread hand-off to the owning thread
//!
//! libmpv calls its wakeup and redraw callbacks from arbitrary threads. The
//! [`Notifier`] turns each call into a [`Task`] on a channel that only the
//! owning thread drains, so facade state is never touched off that thread.
//! Wakeups and redraws are single-slot: while one is queued and not yet
//! taken, further calls post nothing.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::trace;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Work posted to the owning thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// The native event queue has something to drain
    MpvEvents,
    /// The renderer wants a new frame
    Update,
    /// The render context was created
    InitFinished,
}

/// Called after a task is posted, e.g. to wake a host event loop
pub type HostWaker = Box<dyn Fn() + Send + Sync + 'static>;

struct Shared {
    sender: Sender<Task>,
    events_pending: AtomicBool,
    update_pending: AtomicBool,
    waker: RwLock<Option<HostWaker>>,
}

/// Sending half of the task queue; cheap to clone and safe to call from
/// any thread
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

impl Notifier {
    /// Signal that native events are waiting. Never blocks.
    pub fn mpv_wakeup(&self) {
        if !self.shared.events_pending.swap(true, Ordering::AcqRel) {
            self.post(Task::MpvEvents);
        }
    }

    /// Ask for a repaint. Never blocks.
    pub fn request_update(&self) {
        if !self.shared.update_pending.swap(true, Ordering::AcqRel) {
            self.post(Task::Update);
        }
    }

    pub fn init_finished(&self) {
        self.post(Task::InitFinished);
    }

    /// Install a callback run after every posted task
    pub fn set_host_waker(&self, waker: Option<HostWaker>) {
        *self.shared.waker.write() = waker;
    }

    fn post(&self, task: Task) {
        // The receiver lives as long as the facade; a send error only means
        // it is being torn down.
        if self.shared.sender.send(task).is_err() {
            trace!("Task queue closed, dropping {:?}", task);
            return;
        }
        if let Some(waker) = self.shared.waker.read().as_ref() {
            waker();
        }
    }
}

/// Receiving half of the task queue, owned by the owning thread
pub struct TaskQueue {
    receiver: Receiver<Task>,
    notifier: Notifier,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            receiver,
            notifier: Notifier {
                shared: Arc::new(Shared {
                    sender,
                    events_pending: AtomicBool::new(false),
                    update_pending: AtomicBool::new(false),
                    waker: RwLock::new(None),
                }),
            },
        }
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Take the next task without waiting
    pub fn try_next(&self) -> Option<Task> {
        match self.receiver.try_recv() {
            Ok(task) => Some(self.taken(task)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take the next task, waiting at most `timeout`
    pub fn next_timeout(&self, timeout: Duration) -> Option<Task> {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => Some(self.taken(task)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Re-arm the single slot before the task is handled, so a wakeup that
    /// arrives mid-drain queues another pass.
    fn taken(&self, task: Task) -> Task {
        match task {
            Task::MpvEvents => self.notifier.shared.events_pending.store(false, Ordering::Release),
            Task::Update => self.notifier.shared.update_pending.store(false, Ordering::Release),
            Task::InitFinished => {}
        }
        task
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
