//! Constants used in the VM subsystem

/// page size is 4k
pub const PAGE_SIZE: usize = 0x1000;
/// page size bits is 12 bits
pub const PAGE_SIZE_BITS: usize = 0xc;

/// level-one table slots, the top 11 bits of a virtual page number
pub const PT_LEVEL_ONE_ENTRIES: usize = 2048;
/// level-two table slots, the low 9 bits of a virtual page number
pub const PT_LEVEL_TWO_ENTRIES: usize = 512;
/// bits consumed by a level-two index
pub const PT_LEVEL_TWO_BITS: usize = 9;

/// first byte of the kernel-reserved range; user mappings stay below it
pub const USER_SPACE_TOP: usize = 0x8000_0000;
/// user stack size, in pages
pub const USER_STACK_PAGES: usize = 16;

/// hardware translation-cache slots
pub const TLB_ENTRIES: usize = 64;

/// frames in the modeled physical memory, 16 MiB
pub const PHYS_FRAME_COUNT: usize = 4096;
