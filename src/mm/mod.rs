//! Memory management implementation
//!
//! Everything about virtual memory lives here: the modeled physical frame
//! pool, the two-level sparse page table, permission-tagged regions, the
//! per-process address space and the translation-miss handler.
//!
//! Every process owns an [`AddressSpace`] to control its virtual memory.

mod address;
mod address_space;
mod error;
mod frame_allocator;
mod page_table;
mod tlb;
mod vm_fault;

pub use address::{PhysPageNum, VPNRange, VirtAddr, VirtPageNum};
pub use address_space::{AddressSpace, MapPermission, Region};
pub use error::{VmError, VmResult};
pub use frame_allocator::{
    frame_alloc, frame_allocator_test, frame_dealloc, free_frame_count, FrameTracker,
    StackFrameAllocator,
};
pub use page_table::{PTEFlags, PageTable, PageTableEntry};
pub use tlb::{ShootdownRequest, TlbEntry, TranslationCache};
pub use vm_fault::{stats, vm_fault, vm_fault_test, FaultKind, FaultStats};

/// initiate the frame pool backing the modeled physical memory
pub fn init() {
    frame_allocator::init_frame_allocator();
}
