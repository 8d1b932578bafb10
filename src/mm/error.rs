//! VM error taxonomy
//!
//! Every failure is returned synchronously to the immediate caller; the
//! subsystem never retries. The trap layer treats any error from a fault
//! as grounds to kill the offending process.

/// Errors raised by address-space operations and fault handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// physical frame pool exhausted
    OutOfMemory,
    /// address outside every region, a range crossing into kernel space,
    /// or a hard read-only trap
    AccessViolation,
    /// the owning region forbids this access type
    PermissionViolation,
    /// page-table slot already holds a mapping
    AlreadyMapped,
    /// fault taken with no address space bound
    NoAddressSpace,
}

pub type VmResult<T> = Result<T, VmError>;
