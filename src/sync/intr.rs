//! Interrupt-enable state of the executing core
//!
//! Translation-cache writes must not be preempted mid-update, so they are
//! bracketed by [`disable`]/[`restore`]. `disable` hands back the prior
//! state; nesting works as long as every `disable` is paired with a
//! `restore` of the value it returned.

/// Disable interrupts on this core, returning the previous state.
pub fn disable() -> bool {
    state::swap(false)
}

/// Restore the interrupt state saved by a matching [`disable`].
pub fn restore(prev: bool) {
    state::set(prev);
}

/// Current interrupt-enable state of this core.
pub fn enabled() -> bool {
    state::get()
}

#[cfg(not(test))]
mod state {
    use core::sync::atomic::{AtomicBool, Ordering};

    static INTR_ENABLED: AtomicBool = AtomicBool::new(true);

    pub fn swap(value: bool) -> bool {
        INTR_ENABLED.swap(value, Ordering::AcqRel)
    }

    pub fn set(value: bool) {
        INTR_ENABLED.store(value, Ordering::Release);
    }

    pub fn get() -> bool {
        INTR_ENABLED.load(Ordering::Acquire)
    }
}
