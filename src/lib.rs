//! Virtual-memory subsystem of the kernel.
//!
//! Every process owns an [`mm::AddressSpace`]: an ordered list of
//! permission-tagged regions plus a lazily populated two-level page table.
//! The hardware translation cache is only an accelerator over that table;
//! whenever it misses, the trap layer calls [`mm::vm_fault`], which
//! classifies the fault, resolves it against the region permissions and
//! refills the cache — allocating and zero-filling a physical frame on the
//! first touch of each page.
//!
//! The loader drives the address-space lifecycle: `new`, `define_region`
//! per segment, `prepare_load`, segment writes, `complete_load`,
//! `define_stack`. Everything here runs under the single-core discipline:
//! no locks, and interrupts disabled only around translation-cache writes.

#![no_std]

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

extern crate alloc;
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
#[cfg(test)]
mod logging;
pub mod mm;
pub mod sync;
