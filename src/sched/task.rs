//! Task descriptor.

use crate::trap::Context;

/// Task slots available in the fixed-capacity table. The array index is
/// the stable task id handed back by [`super::task_create`].
pub const MAX_TASKS: usize = 16;

/// Bytes of stack given to each task. Matches the teacher's page size so a
/// stack occupies a round number of pages once demand paging exists.
pub const STACK_SIZE: usize = 4096;

/// Bytes of dedicated trap/kernel stack given to each task — the stack the
/// trap stub switches onto before calling into Rust, kept separate from the
/// task's own user-mode stack (`STACK_SIZE`, above) so a trap never runs on
/// top of the interrupted task's stack frame.
pub const KERNEL_STACK_SIZE: usize = 4096;

/// Timeslice assigned to a task when the caller doesn't care.
pub const DEFAULT_TIMESLICE: u32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskState {
    Invalid,
    Ready,
    Running,
    Sleeping,
    Exited,
}

/// A run-queue slot. `prev`/`next` are indices into the task table rather
/// than pointers, so a descriptor's address never needs to be pinned and
/// the whole table can live in a `static`.
#[derive(Clone, Copy)]
pub(super) struct RunQueueLink {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl RunQueueLink {
    pub const fn unlinked() -> Self {
        RunQueueLink { prev: None, next: None }
    }
}

pub struct TaskDescriptor {
    pub ctx: Context,
    /// Entry point the task was created with, kept only for `print_tasks`.
    pub entry: usize,
    pub arg: usize,
    pub priority: usize,
    pub state: TaskState,
    pub timeslice: u32,
    pub remaining_timeslice: u32,
    pub(super) link: RunQueueLink,
}

impl TaskDescriptor {
    pub const fn invalid() -> Self {
        TaskDescriptor {
            ctx: Context::zeroed(),
            entry: 0,
            arg: 0,
            priority: 0,
            state: TaskState::Invalid,
            timeslice: 0,
            remaining_timeslice: 0,
            link: RunQueueLink::unlinked(),
        }
    }
}
