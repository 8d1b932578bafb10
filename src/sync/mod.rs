//! Synchronization discipline of the single-core kernel
//!
//! The VM subsystem takes no locks; its only ordering rule is that every
//! hardware translation-cache write runs with interrupts disabled. The
//! [`intr`] module carries that disable/restore pair.

pub mod intr;
