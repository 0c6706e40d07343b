//! Priority run queues with round-robin inside each level, and the
//! context switch that rides on the trap entry/exit stub in [`crate::trap`].
//!
//! There is no dedicated `switch_to` assembly routine. `sscratch` always
//! points at the *current* task's [`crate::trap::Context`]; the trap stub
//! in `trap::vector` saves and restores every field there, `pc` and
//! `sstatus` included. Switching tasks is therefore just: pick a new task
//! and point `sscratch` at it — the trap epilogue's `sret` resumes it
//! exactly where it left off. Each task also owns a small dedicated
//! trap/kernel stack (`Context::kernel_sp`) that the trap stub runs on
//! while handling that task's traps.

mod task;

pub use task::{TaskDescriptor, TaskState, DEFAULT_TIMESLICE, MAX_TASKS, STACK_SIZE, KERNEL_STACK_SIZE};

use task::RunQueueLink;

use crate::arch::cpu;
use crate::sync::IrqLock;

/// One more than the highest priority a task may request. Priority 0 is
/// highest; `MAX_PRIORITY - 1` is lowest.
pub const MAX_PRIORITY: usize = 256;

const BITMAP_WORDS: usize = MAX_PRIORITY / 64;

#[derive(Clone, Copy)]
struct RunQueue {
    head: Option<usize>,
    tail: Option<usize>,
}

impl RunQueue {
    const fn empty() -> Self {
        RunQueue { head: None, tail: None }
    }
}

struct Scheduler {
    tasks: [TaskDescriptor; MAX_TASKS],
    queues: [RunQueue; MAX_PRIORITY],
    bitmap: [u64; BITMAP_WORDS],
    current: Option<usize>,
}

impl Scheduler {
    const fn new() -> Self {
        Scheduler {
            tasks: [const { TaskDescriptor::invalid() }; MAX_TASKS],
            queues: [RunQueue::empty(); MAX_PRIORITY],
            bitmap: [0; BITMAP_WORDS],
            current: None,
        }
    }
}

static SCHED: IrqLock<Scheduler> = IrqLock::new(Scheduler::new());

/// Per-task stacks, `MAX_TASKS` of them, each `STACK_SIZE` bytes. Indexed
/// by task id; `task_create` hands out the top of `TASK_STACKS[id]`.
static mut TASK_STACKS: [[u8; STACK_SIZE]; MAX_TASKS] = [[0; STACK_SIZE]; MAX_TASKS];

/// Per-task trap/kernel stacks, separate from the user-mode stacks above.
/// `task_create` points each task's `Context::kernel_sp` at the top of its
/// own slot here; the trap stub switches onto it before calling into Rust.
static mut TASK_KERNEL_STACKS: [[u8; KERNEL_STACK_SIZE]; MAX_TASKS] =
    [[0; KERNEL_STACK_SIZE]; MAX_TASKS];

/// Reset the task table and run queues. Idempotent; call once at boot.
pub fn init() {
    let mut sched = SCHED.lock();
    *sched = Scheduler::new();
}

fn set_bitmap(sched: &mut Scheduler, priority: usize) {
    sched.bitmap[priority / 64] |= 1 << (priority % 64);
}

fn clear_bitmap(sched: &mut Scheduler, priority: usize) {
    sched.bitmap[priority / 64] &= !(1 << (priority % 64));
}

/// Append `id` to the tail of its priority's run queue and mark the
/// priority non-empty.
fn enqueue_tail(sched: &mut Scheduler, id: usize) {
    let priority = sched.tasks[id].priority;
    let old_tail = sched.queues[priority].tail;
    sched.tasks[id].link = RunQueueLink { prev: old_tail, next: None };
    match old_tail {
        Some(t) => sched.tasks[t].link.next = Some(id),
        None => sched.queues[priority].head = Some(id),
    }
    sched.queues[priority].tail = Some(id);
    set_bitmap(sched, priority);
}

/// Remove `id` from whichever run queue it's on. Clears the priority's
/// bitmap bit if the queue is now empty.
fn unlink(sched: &mut Scheduler, id: usize) {
    let priority = sched.tasks[id].priority;
    let link = sched.tasks[id].link;
    match link.prev {
        Some(p) => sched.tasks[p].link.next = link.next,
        None => sched.queues[priority].head = link.next,
    }
    match link.next {
        Some(n) => sched.tasks[n].link.prev = link.prev,
        None => sched.queues[priority].tail = link.prev,
    }
    sched.tasks[id].link = RunQueueLink::unlinked();
    if sched.queues[priority].head.is_none() {
        clear_bitmap(sched, priority);
    }
}

/// Find the highest-priority non-empty queue via count-trailing-zeros,
/// take its head, and rotate that same task to the tail — the round-robin
/// step. The task returned stays linked in its queue; `schedule` marks it
/// Running without touching queue membership, matching the grounding
/// source exactly (a Running task sits at the tail of its own queue, so it
/// is never picked again until everything ahead of it has had a turn).
fn pick_next(sched: &mut Scheduler) -> Option<usize> {
    for word in 0..BITMAP_WORDS {
        let bits = sched.bitmap[word];
        if bits != 0 {
            let priority = word * 64 + bits.trailing_zeros() as usize;
            let id = sched.queues[priority].head.expect("bitmap set but queue empty");
            unlink(sched, id);
            enqueue_tail(sched, id);
            return Some(id);
        }
    }
    None
}

/// Create a task: find an `Invalid` slot, point its context at `entry`
/// with `arg` in `a0` and a fresh stack, clear `SSTATUS_SPP` so it resumes
/// in user mode, and enqueue it Ready. Returns `None` if the table is full
/// or `priority` is out of range.
pub fn task_create(entry: fn(usize), arg: usize, priority: usize, timeslice: u32) -> Option<usize> {
    if priority >= MAX_PRIORITY {
        log::warn!("task_create: priority {} out of range", priority);
        return None;
    }

    let mut sched = SCHED.lock();
    let id = (0..MAX_TASKS).find(|&i| sched.tasks[i].state == TaskState::Invalid)?;

    let stack_top = unsafe { core::ptr::addr_of!(TASK_STACKS[id]) as usize + STACK_SIZE };
    let stack_top = stack_top & !0xf;
    let kernel_stack_top =
        unsafe { core::ptr::addr_of!(TASK_KERNEL_STACKS[id]) as usize + KERNEL_STACK_SIZE };
    let kernel_stack_top = kernel_stack_top & !0xf;

    let task = &mut sched.tasks[id];
    task.ctx = crate::trap::Context::zeroed();
    task.ctx.sp = stack_top;
    task.ctx.kernel_sp = kernel_stack_top;
    task.ctx.a0 = arg;
    task.ctx.pc = entry as usize;
    task.ctx.sstatus = (cpu::sstatus_read() & !cpu::SSTATUS_SPP) | cpu::SSTATUS_SPIE;
    task.entry = entry as usize;
    task.arg = arg;
    task.priority = priority;
    task.state = TaskState::Ready;
    task.timeslice = timeslice;
    task.remaining_timeslice = timeslice;

    enqueue_tail(&mut sched, id);
    log::debug!("task_create: id={} pc={:#x} sp={:#x} prio={}", id, entry as usize, stack_top, priority);
    Some(id)
}

/// The scheduler's core decision point: demote the current task to Ready
/// if it was Running, pick the next Ready task, reload its
/// `remaining_timeslice` from its nominal `timeslice`, and redirect
/// `sscratch` at it. Panics if no task is Ready — the baseline design has
/// no idle task.
pub fn schedule() {
    let mut sched = SCHED.lock();

    if let Some(id) = sched.current {
        if sched.tasks[id].state == TaskState::Running {
            sched.tasks[id].state = TaskState::Ready;
        }
    }

    let next = match pick_next(&mut sched) {
        Some(id) => id,
        None => panic!("No ready tasks to schedule!"),
    };

    let switching = sched.current != Some(next);
    sched.tasks[next].state = TaskState::Running;
    sched.tasks[next].remaining_timeslice = sched.tasks[next].timeslice;
    sched.current = Some(next);

    if switching {
        let next_ctx_addr = core::ptr::addr_of_mut!(sched.tasks[next].ctx) as usize;
        drop(sched);
        cpu::sscratch_write(next_ctx_addr);
    }
}

/// The timer heartbeat's entry point: charge the running task one tick
/// against its timeslice and only reschedule once it hits zero. A task
/// created with a longer `timeslice` therefore runs for that many ticks
/// before losing the CPU, instead of every task being preempted on every
/// heartbeat regardless of what it asked for.
pub fn tick() {
    let mut sched = SCHED.lock();
    let id = match sched.current {
        Some(id) => id,
        None => {
            drop(sched);
            schedule();
            return;
        }
    };

    if sched.tasks[id].remaining_timeslice > 0 {
        sched.tasks[id].remaining_timeslice -= 1;
    }
    let expired = sched.tasks[id].remaining_timeslice == 0;
    drop(sched);

    if expired {
        schedule();
    }
}

/// Voluntarily give up the remainder of the current timeslice. Implemented
/// by raising a local software interrupt rather than calling `schedule`
/// directly: the switch then happens inside the same trap path a
/// timer-driven preemption takes, so both get identical register handling.
pub fn task_yield() {
    {
        let mut sched = SCHED.lock();
        if let Some(id) = sched.current {
            if sched.tasks[id].state == TaskState::Running {
                sched.tasks[id].state = TaskState::Ready;
            }
        }
    }
    crate::sbi::ipi::raise_self_ipi();
}

/// Put the current task to sleep for `ticks` timer intervals. Removes it
/// from its run queue, arms a wake timer, and reschedules. If the timer
/// can't be allocated the task is put back on its queue and this returns
/// without sleeping.
pub fn task_delay(ticks: u32) {
    let id = {
        let mut sched = SCHED.lock();
        let id = match sched.current {
            Some(id) => id,
            None => return,
        };
        unlink(&mut sched, id);
        sched.tasks[id].state = TaskState::Sleeping;
        id
    };

    if !crate::timer::create(wake, id, ticks) {
        let mut sched = SCHED.lock();
        sched.tasks[id].state = TaskState::Ready;
        enqueue_tail(&mut sched, id);
        return;
    }

    schedule();
}

/// Timer callback passed to [`crate::timer::create`] by `task_delay`.
/// No-ops if the task isn't Sleeping (e.g. it was already reaped).
fn wake(task_id: usize) {
    let mut sched = SCHED.lock();
    if task_id < MAX_TASKS && sched.tasks[task_id].state == TaskState::Sleeping {
        sched.tasks[task_id].state = TaskState::Ready;
        enqueue_tail(&mut sched, task_id);
    }
}

/// Wake a Sleeping task early. No-op if it isn't Sleeping.
pub fn wake_task(task_id: usize) {
    wake(task_id);
}

/// Terminate the current task. Removes it from its run queue, marks it
/// Exited (the slot is never recycled, see `DESIGN.md`), and reschedules.
pub fn task_exit(_status: i32) {
    let mut sched = SCHED.lock();
    if let Some(id) = sched.current.take() {
        unlink(&mut sched, id);
        sched.tasks[id].state = TaskState::Exited;
        log::info!("task {} exited", id);
    }
    drop(sched);
    schedule();
}

/// The running task's id, or `None` if the scheduler hasn't started yet.
pub fn current_task_id() -> Option<usize> {
    SCHED.lock().current
}

/// Dump every non-Invalid task slot at debug level.
pub fn print_tasks() {
    let sched = SCHED.lock();
    log::debug!("=== Tasks ===");
    for (id, task) in sched.tasks.iter().enumerate() {
        if task.state != TaskState::Invalid {
            log::debug!(
                "  [{}] state={:?} prio={} pc={:#x} entry={:#x}",
                id, task.state, task.priority, task.ctx.pc, task.entry
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset() {
        init();
    }

    fn noop(_arg: usize) {}

    #[test]
    fn task_create_assigns_increasing_ids_and_sets_ready() {
        reset();
        let a = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();
        let b = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        let sched = SCHED.lock();
        assert_eq!(sched.tasks[a].state, TaskState::Ready);
        assert_eq!(sched.tasks[b].state, TaskState::Ready);
    }

    #[test]
    fn task_create_rejects_out_of_range_priority() {
        reset();
        assert!(task_create(noop, 0, MAX_PRIORITY, DEFAULT_TIMESLICE).is_none());
    }

    #[test]
    fn same_priority_tasks_round_robin() {
        reset();
        let a = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();
        let b = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();

        assert_eq!(schedule_pick_only(), a);
        assert_eq!(schedule_pick_only(), b);
        assert_eq!(schedule_pick_only(), a);
        assert_eq!(schedule_pick_only(), b);
    }

    #[test]
    fn higher_priority_task_always_wins() {
        reset();
        let low = task_create(noop, 0, 5, DEFAULT_TIMESLICE).unwrap();
        let high = task_create(noop, 0, 1, DEFAULT_TIMESLICE).unwrap();
        let _ = low;

        let mut sched = SCHED.lock();
        let picked = pick_next(&mut sched).unwrap();
        assert_eq!(picked, high);
    }

    #[test]
    fn exit_removes_task_from_rotation() {
        reset();
        let a = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();
        let b = task_create(noop, 0, 3, DEFAULT_TIMESLICE).unwrap();

        {
            let mut sched = SCHED.lock();
            let picked = pick_next(&mut sched).unwrap();
            assert_eq!(picked, a);
            sched.tasks[picked].state = TaskState::Running;
            sched.current = Some(picked);
        }

        task_exit(0);

        let sched = SCHED.lock();
        assert_eq!(sched.tasks[a].state, TaskState::Exited);
        assert_eq!(sched.current, Some(b));
    }

    #[test]
    fn delay_with_no_current_task_is_a_noop() {
        reset();
        task_delay(1);
        assert_eq!(current_task_id(), None);
    }

    #[test]
    fn tick_does_not_switch_before_timeslice_expires() {
        reset();
        let a = task_create(noop, 0, 3, 2).unwrap();
        let _b = task_create(noop, 0, 3, 2).unwrap();
        assert_eq!(schedule_pick_only(), a);

        tick();

        assert_eq!(current_task_id(), Some(a));
        assert_eq!(SCHED.lock().tasks[a].remaining_timeslice, 1);
    }

    #[test]
    fn tick_switches_once_timeslice_is_exhausted() {
        reset();
        let a = task_create(noop, 0, 3, 1).unwrap();
        let b = task_create(noop, 0, 3, 1).unwrap();
        assert_eq!(schedule_pick_only(), a);

        tick();

        assert_eq!(current_task_id(), Some(b));
        assert_eq!(SCHED.lock().tasks[b].remaining_timeslice, 1);
    }

    /// Test helper: run the pick+promote half of `schedule` without the
    /// `sscratch`-touching half, so unit tests can drive the rotation
    /// under the host stub without caring about CSR state.
    fn schedule_pick_only() -> usize {
        let mut sched = SCHED.lock();
        if let Some(id) = sched.current {
            if sched.tasks[id].state == TaskState::Running {
                sched.tasks[id].state = TaskState::Ready;
            }
        }
        let next = pick_next(&mut sched).unwrap();
        sched.tasks[next].state = TaskState::Running;
        sched.current = Some(next);
        next
    }
}
