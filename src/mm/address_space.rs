//! Address spaces: the per-process region list and page table
//!
//! An [`AddressSpace`] is created at process creation, duplicated at fork
//! and dropped at exit; dropping it returns every owned frame to the
//! allocator. The loader shapes it through `define_region`,
//! `prepare_load`/`complete_load` and `define_stack`.

use super::address::{PhysPageNum, VPNRange, VirtAddr, VirtPageNum};
use super::error::{VmError, VmResult};
use super::frame_allocator::frame_alloc;
use super::page_table::{PTEFlags, PageTable, PageTableEntry};
use super::tlb::TranslationCache;
use super::vm_fault::FaultKind;
use crate::config::{PAGE_SIZE, USER_SPACE_TOP, USER_STACK_PAGES};
use alloc::vec::Vec;

bitflags! {
    /// region access permissions
    pub struct MapPermission: u8 {
        /// readable
        const R = 1 << 1;
        /// writable
        const W = 1 << 2;
        /// executable
        const X = 1 << 3;
    }
}

/// One contiguous permission-tagged range of user virtual memory.
///
/// `perm` is the set enforced on new mappings right now; `declared` is the
/// set fixed at definition time, kept so the load window can force writes
/// on and later restore what the segment actually asked for.
pub struct Region {
    vpn_range: VPNRange,
    perm: MapPermission,
    declared: MapPermission,
}

impl Region {
    fn new(vpn_range: VPNRange, perm: MapPermission) -> Self {
        Self {
            vpn_range,
            perm,
            declared: perm,
        }
    }

    pub fn contains(&self, va: VirtAddr) -> bool {
        self.vpn_range.contains(va.floor())
    }

    /// Does the current permission set allow this access?
    pub fn permits(&self, kind: FaultKind) -> bool {
        match kind {
            FaultKind::Read => self.perm.contains(MapPermission::R),
            FaultKind::Write => self.perm.contains(MapPermission::W),
            FaultKind::ReadOnly => false,
        }
    }

    pub fn start_va(&self) -> VirtAddr {
        self.vpn_range.get_start().into()
    }
    pub fn end_va(&self) -> VirtAddr {
        self.vpn_range.get_end().into()
    }
    pub fn len_bytes(&self) -> usize {
        self.vpn_range.page_count() * PAGE_SIZE
    }
    pub fn perm(&self) -> MapPermission {
        self.perm
    }
    pub fn declared(&self) -> MapPermission {
        self.declared
    }
    pub fn writable(&self) -> bool {
        self.perm.contains(MapPermission::W)
    }
    pub fn declared_writable(&self) -> bool {
        self.declared.contains(MapPermission::W)
    }
}

/// A process address space: ordered region list plus two-level page table.
pub struct AddressSpace {
    regions: Vec<Region>,
    page_table: PageTable,
}

impl AddressSpace {
    /// Empty space: no regions, every level-one slot absent.
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            page_table: PageTable::new(),
        }
    }

    /// Define a segment at `va` covering `len` bytes.
    ///
    /// The base is aligned down to a page boundary and the length grown to
    /// whole pages over at least the requested bytes; the normalized range
    /// must stay below the kernel boundary. Overlap between regions is not
    /// checked: the most recently defined region containing an address
    /// decides its permissions.
    pub fn define_region(
        &mut self,
        va: VirtAddr,
        len: usize,
        readable: bool,
        writable: bool,
        executable: bool,
    ) -> VmResult<()> {
        let base = VirtAddr(va.0 & !(PAGE_SIZE - 1));
        let len = len
            .checked_add(va.page_offset())
            .and_then(|len| len.checked_add(PAGE_SIZE - 1))
            .ok_or(VmError::AccessViolation)?
            & !(PAGE_SIZE - 1);
        let end = base.0.checked_add(len).ok_or(VmError::AccessViolation)?;
        if end > USER_SPACE_TOP {
            return Err(VmError::AccessViolation);
        }

        let mut perm = MapPermission::empty();
        if readable {
            perm |= MapPermission::R;
        }
        if writable {
            perm |= MapPermission::W;
        }
        if executable {
            perm |= MapPermission::X;
        }
        debug!(
            "[kernel] define region [{:#x}, {:#x}) perm {:?}",
            base.0, end, perm
        );
        let range = VPNRange::new(base.floor(), VirtAddr(end).ceil());
        // newest first: the first containing region in scan order wins
        self.regions.insert(0, Region::new(range, perm));
        Ok(())
    }

    /// Force every region writable so the loader can populate pages
    /// regardless of their declared permissions.
    pub fn prepare_load(&mut self) {
        for region in self.regions.iter_mut() {
            region.perm |= MapPermission::W;
        }
    }

    /// Restore each region's declared write permission, then flush the
    /// translation cache so entries admitted under the load window get
    /// re-derived on their next access.
    pub fn complete_load(&mut self, tlb: &mut TranslationCache) {
        for region in self.regions.iter_mut() {
            region.perm.remove(MapPermission::W);
            region.perm |= region.declared & MapPermission::W;
        }
        tlb.invalidate_all();
    }

    /// Define the fixed-size user stack ending at the kernel boundary and
    /// return the initial stack pointer.
    pub fn define_stack(&mut self) -> VmResult<VirtAddr> {
        self.define_region(
            VirtAddr(USER_SPACE_TOP - USER_STACK_PAGES * PAGE_SIZE),
            USER_STACK_PAGES * PAGE_SIZE,
            true,
            true,
            false,
        )?;
        Ok(VirtAddr(USER_SPACE_TOP))
    }

    /// First region containing `va`, newest first.
    pub fn find_region(&self, va: VirtAddr) -> Option<&Region> {
        self.regions.iter().find(|region| region.contains(va))
    }

    /// Regions in scan order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Page-table lookup with the lazy write-permission upgrade: an entry
    /// whose owning region is declared writable is promoted to dirty
    /// before being returned, so permission upgrades from `complete_load`
    /// take effect without an eager table walk.
    pub fn lookup(&mut self, va: VirtAddr) -> Option<(PhysPageNum, PTEFlags)> {
        let declared_writable = self
            .find_region(va)
            .map_or(false, |region| region.declared_writable());
        let entry = self.page_table.entry_mut(va.floor())?;
        if declared_writable {
            entry.mark_writable();
        }
        Some((entry.ppn(), entry.flags()))
    }

    /// Install a mapping; the slot must be unmapped.
    pub fn insert_mapping(&mut self, vpn: VirtPageNum, entry: PageTableEntry) -> VmResult<()> {
        self.page_table.insert(vpn, entry)
    }

    /// Entry mapped at `vpn`, without the permission upgrade.
    pub fn translate(&self, vpn: VirtPageNum) -> Option<&PageTableEntry> {
        self.page_table.entry(vpn)
    }

    /// Duplicate `src` for fork: an equivalent region list in the same
    /// scan order (including any in-flight load-window state) and a deep
    /// copy of every mapping into freshly allocated frames.
    pub fn from_existing(src: &AddressSpace) -> VmResult<AddressSpace> {
        let mut space = AddressSpace::new();
        // oldest first, so prepending rebuilds the source scan order
        for region in src.regions.iter().rev() {
            space.define_region(
                region.start_va(),
                region.len_bytes(),
                region.declared.contains(MapPermission::R),
                region.declared_writable(),
                region.declared.contains(MapPermission::X),
            )?;
        }
        for (dst, src_region) in space.regions.iter_mut().zip(src.regions.iter()) {
            dst.perm = src_region.perm;
        }
        for (vpn, entry) in src.page_table.mapped_pages() {
            let frame = frame_alloc().ok_or(VmError::OutOfMemory)?;
            frame
                .ppn
                .get_bytes_array()
                .copy_from_slice(entry.ppn().get_bytes_array());
            space
                .page_table
                .insert(vpn, PageTableEntry::new(frame, entry.flags()))?;
        }
        Ok(space)
    }

    /// Flush the whole translation cache. Called on every switch to this
    /// address space; each space has its own page table, so entries left
    /// by the previous space must never be consulted.
    pub fn activate(&self, tlb: &mut TranslationCache) {
        tlb.invalidate_all();
    }

    /// Nothing to do on switch-out; present for symmetry with
    /// [`AddressSpace::activate`].
    pub fn deactivate(&self) {}
}
