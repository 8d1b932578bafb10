//! Translation-miss and protection-trap handling
//!
//! Every hardware translation miss lands here. The handler is stateless
//! across calls; the order of its steps is load-bearing: the read-only
//! trap is rejected before any software state is consulted, an existing
//! mapping is refilled before the region list is re-checked (pages mapped
//! under old permissions stay reachable until the next full flush), and
//! region checks complete before any frame is allocated.

use super::address::VirtAddr;
use super::address_space::AddressSpace;
use super::error::{VmError, VmResult};
use super::frame_allocator::frame_alloc;
use super::page_table::{PTEFlags, PageTableEntry};
use super::tlb::TranslationCache;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Hardware classification of a translation trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// load from an untranslated page
    Read,
    /// store to an untranslated page
    Write,
    /// store to a page the cache itself marks read-only
    ReadOnly,
}

/// Global fault statistics
static FAULT_STATS: FaultStats = FaultStats::new();

/// Counters updated on every handler invocation.
pub struct FaultStats {
    /// faults taken
    pub total: AtomicUsize,
    /// fast-path refills from an existing mapping
    pub refills: AtomicUsize,
    /// zero-filled frames handed out
    pub zero_fills: AtomicUsize,
    /// faults that terminated with an error
    pub failures: AtomicUsize,
}

impl FaultStats {
    const fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            refills: AtomicUsize::new(0),
            zero_fills: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }
}

/// Get fault statistics
pub fn stats() -> &'static FaultStats {
    &FAULT_STATS
}

fn fail(err: VmError) -> VmError {
    FAULT_STATS.failures.fetch_add(1, Ordering::Relaxed);
    err
}

/// Resolve one translation trap at `va`.
///
/// On success the translation cache holds a mapping for the faulting page
/// and the access can be retried. Any error is terminal for the access;
/// the trap layer kills the process.
pub fn vm_fault(
    space: Option<&mut AddressSpace>,
    tlb: &mut TranslationCache,
    kind: FaultKind,
    va: VirtAddr,
) -> VmResult<()> {
    FAULT_STATS.total.fetch_add(1, Ordering::Relaxed);

    // a store to a page the cache marks read-only is a hard permission
    // trap, not a retryable miss
    if kind == FaultKind::ReadOnly {
        return Err(fail(VmError::AccessViolation));
    }

    let space = match space {
        Some(space) => space,
        None => return Err(fail(VmError::NoAddressSpace)),
    };

    let vpn = va.floor();
    if let Some((ppn, flags)) = space.lookup(va) {
        tlb.refill(vpn, ppn, flags);
        FAULT_STATS.refills.fetch_add(1, Ordering::Relaxed);
        trace!("[kernel] vm_fault refill {:?} -> {:?}", vpn, ppn);
        return Ok(());
    }

    let writable = match space.find_region(va) {
        None => return Err(fail(VmError::AccessViolation)),
        Some(region) => {
            if !region.permits(kind) {
                return Err(fail(VmError::PermissionViolation));
            }
            region.writable()
        }
    };

    // first touch of this page: back it with one zero-filled frame
    let frame = match frame_alloc() {
        Some(frame) => frame,
        None => return Err(fail(VmError::OutOfMemory)),
    };
    let ppn = frame.ppn;
    let mut flags = PTEFlags::V;
    if writable {
        flags |= PTEFlags::D;
    }
    if space.insert_mapping(vpn, PageTableEntry::new(frame, flags)).is_err() {
        // a duplicate fault slipped past the lookup above; treat it as a
        // bad access rather than clobber the existing mapping
        return Err(fail(VmError::AccessViolation));
    }
    tlb.refill(vpn, ppn, flags);
    FAULT_STATS.zero_fills.fetch_add(1, Ordering::Relaxed);
    trace!(
        "[kernel] vm_fault zero-fill {:?} -> {:?} flags {:?}",
        vpn,
        ppn,
        flags
    );
    Ok(())
}

/// a simple test of the fault path
pub fn vm_fault_test() {
    use crate::config::PAGE_SIZE;

    let mut space = AddressSpace::new();
    let mut tlb = TranslationCache::new();
    space
        .define_region(VirtAddr(0x1000_0000), PAGE_SIZE, true, true, false)
        .unwrap();
    vm_fault(
        Some(&mut space),
        &mut tlb,
        FaultKind::Write,
        VirtAddr(0x1000_0008),
    )
    .unwrap();
    assert!(space.lookup(VirtAddr(0x1000_0000)).is_some());
    assert!(vm_fault(
        Some(&mut space),
        &mut tlb,
        FaultKind::Read,
        VirtAddr(0x2000_0000)
    )
    .is_err());
    info!("vm_fault_test passed!");
}
