//! Modeled hardware translation cache
//!
//! A fixed array of (virtual page, frame + flags) slots accelerating
//! translation over the authoritative page table. The trap layer owns the
//! device and passes it into whatever consumes it. Replacement picks an
//! arbitrary slot via a wrapping cursor; no eviction order matters because
//! every entry can be re-derived from the page table. Slot writes are the
//! subsystem's only critical section and run with interrupts disabled.

use super::address::{PhysPageNum, VirtPageNum};
use super::page_table::PTEFlags;
use crate::config::TLB_ENTRIES;
use crate::sync::intr;

/// One cache slot.
#[derive(Debug, Clone, Copy)]
pub struct TlbEntry {
    pub vpn: VirtPageNum,
    pub ppn: PhysPageNum,
    pub flags: PTEFlags,
}

/// A request to invalidate entries on another core.
#[derive(Debug)]
pub struct ShootdownRequest {
    pub target_vpn: VirtPageNum,
}

/// The translation cache of the executing core.
pub struct TranslationCache {
    slots: [Option<TlbEntry>; TLB_ENTRIES],
    victim: usize,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            slots: [None; TLB_ENTRIES],
            victim: 0,
        }
    }

    /// Write one mapping into an arbitrary slot. The write runs with
    /// interrupts disabled; the prior interrupt state is restored before
    /// returning.
    pub fn refill(&mut self, vpn: VirtPageNum, ppn: PhysPageNum, flags: PTEFlags) {
        let prev = intr::disable();
        self.slots[self.victim] = Some(TlbEntry { vpn, ppn, flags });
        self.victim = (self.victim + 1) % TLB_ENTRIES;
        intr::restore(prev);
    }

    /// Invalidate every slot: address-space switch or load completion.
    pub fn invalidate_all(&mut self) {
        let prev = intr::disable();
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        intr::restore(prev);
    }

    /// Associative probe, the lookup the hardware performs on every
    /// access.
    pub fn probe(&self, vpn: VirtPageNum) -> Option<TlbEntry> {
        self.slots.iter().flatten().find(|entry| entry.vpn == vpn).copied()
    }

    /// Number of valid slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Cross-core invalidation. Single-core configurations cannot honor
    /// the request; this aborts instead of proceeding incorrectly.
    pub fn shootdown(&mut self, request: &ShootdownRequest) -> ! {
        panic!(
            "tlb shootdown requested for {:?} on a single-core configuration!",
            request.target_vpn
        );
    }
}
