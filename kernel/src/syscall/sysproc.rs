use crate::proc::{self, myproc};
use crate::syscall::syscall::argint;

// Terminate the current process; status reported to the parent via wait().
pub(crate) fn sys_exit() -> u64 {
    let status = argint(0);
    proc::exit(status);
}

pub(crate) fn sys_getpid() -> u64 {
    myproc().pid as u64
}

pub(crate) fn sys_fork() -> u64 {
    match proc::fork() {
        Some(pid) => pid as u64,
        None => u64::MAX,
    }
}

pub(crate) fn sys_wait() -> u64 {
    let addr = crate::syscall::syscall::argaddr(0);
    match proc::wait(addr) {
        Some(pid) => pid as u64,
        None => u64::MAX,
    }
}

// Grow or shrink the calling process's address space by n bytes.
// Returns the previous program break, or u64::MAX on failure.
pub(crate) fn sys_sbrk() -> u64 {
    let n = argint(0);
    let addr = myproc().sz;
    if proc::grow_proc(n) < 0 {
        return u64::MAX;
    }
    addr as u64
}

// Suspend the calling process for n clock ticks.
pub(crate) fn sys_sleep() -> u64 {
    let n = argint(0);
    if n < 0 {
        return u64::MAX;
    }
    proc::sleep_ticks(n as u64);
    0
}
