//! Physical frame management
//!
//! Physical memory is modeled as a page-granular arena allocated once and
//! never returned; a [`PhysPageNum`] indexes into it. Frames are handed out
//! through the global [`StackFrameAllocator`] and owned as RAII
//! [`FrameTracker`] values, so whoever holds the tracker holds the frame
//! and dropping it returns the frame to the pool.

use super::address::PhysPageNum;
use crate::config::{PAGE_SIZE, PHYS_FRAME_COUNT};
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};
use lazy_static::*;
use spin::Mutex;

lazy_static! {
    /// base address of the modeled physical memory
    static ref PHYS_MEM_BASE: usize = {
        let arena = vec![0u8; PHYS_FRAME_COUNT * PAGE_SIZE].into_boxed_slice();
        Box::leak(arena).as_mut_ptr() as usize
    };
}

impl PhysPageNum {
    /// Byte view of the frame backing this page number.
    pub fn get_bytes_array(&self) -> &'static mut [u8] {
        assert!(self.0 < PHYS_FRAME_COUNT, "{:?} outside physical memory", self);
        unsafe {
            core::slice::from_raw_parts_mut(
                (*PHYS_MEM_BASE + self.0 * PAGE_SIZE) as *mut u8,
                PAGE_SIZE,
            )
        }
    }
}

/// Watermark allocator over `[start, end)` with a recycle stack.
pub struct StackFrameAllocator {
    current: usize,
    end: usize,
    recycled: Vec<usize>,
}

impl StackFrameAllocator {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            current: start,
            end,
            recycled: Vec::new(),
        }
    }

    pub fn alloc(&mut self) -> Option<PhysPageNum> {
        if let Some(ppn) = self.recycled.pop() {
            Some(ppn.into())
        } else if self.current == self.end {
            None
        } else {
            self.current += 1;
            Some((self.current - 1).into())
        }
    }

    pub fn dealloc(&mut self, ppn: PhysPageNum) {
        let ppn = ppn.0;
        if ppn >= self.current || self.recycled.iter().any(|&v| v == ppn) {
            panic!("Frame ppn={:#x} has not been allocated!", ppn);
        }
        self.recycled.push(ppn);
    }

    /// Frames still available from this allocator.
    pub fn free_frames(&self) -> usize {
        self.end - self.current + self.recycled.len()
    }
}

lazy_static! {
    /// global allocator covering the whole modeled frame pool
    static ref FRAME_ALLOCATOR: Mutex<StackFrameAllocator> =
        Mutex::new(StackFrameAllocator::new(0, PHYS_FRAME_COUNT));
}

/// RAII handle on one physical frame, zero-filled on acquisition.
pub struct FrameTracker {
    pub ppn: PhysPageNum,
}

impl FrameTracker {
    pub fn new(ppn: PhysPageNum) -> Self {
        // wipe whatever the previous owner left behind
        let bytes_array = ppn.get_bytes_array();
        for i in bytes_array {
            *i = 0;
        }
        Self { ppn }
    }
}

impl Debug for FrameTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("FrameTracker:PPN={:#x}", self.ppn.0))
    }
}

impl Drop for FrameTracker {
    fn drop(&mut self) {
        frame_dealloc(self.ppn);
    }
}

/// Allocate one zero-filled frame from the global pool.
pub fn frame_alloc() -> Option<FrameTracker> {
    FRAME_ALLOCATOR.lock().alloc().map(FrameTracker::new)
}

/// Return a frame to the global pool.
pub fn frame_dealloc(ppn: PhysPageNum) {
    FRAME_ALLOCATOR.lock().dealloc(ppn);
}

/// Frames currently available from the global pool.
pub fn free_frame_count() -> usize {
    FRAME_ALLOCATOR.lock().free_frames()
}

/// initiate the global frame allocator
pub fn init_frame_allocator() {
    info!(
        "[kernel] physical frame pool ready: {} frames",
        free_frame_count()
    );
}

/// a simple test for the frame allocator
pub fn frame_allocator_test() {
    let mut v: Vec<FrameTracker> = Vec::new();
    for _ in 0..5 {
        let frame = frame_alloc().unwrap();
        debug!("{:?}", frame);
        v.push(frame);
    }
    v.clear();
    for _ in 0..5 {
        let frame = frame_alloc().unwrap();
        debug!("{:?}", frame);
        v.push(frame);
    }
    drop(v);
    info!("frame_allocator_test passed!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_allocator_recycles_lifo() {
        let mut allocator = StackFrameAllocator::new(0, 4);
        let a = allocator.alloc().unwrap();
        let b = allocator.alloc().unwrap();
        assert_eq!(a, PhysPageNum(0));
        assert_eq!(b, PhysPageNum(1));
        allocator.dealloc(a);
        allocator.dealloc(b);
        assert_eq!(allocator.alloc().unwrap(), b);
        assert_eq!(allocator.alloc().unwrap(), a);
        assert_eq!(allocator.free_frames(), 2);
    }

    #[test]
    fn local_allocator_exhausts() {
        let mut allocator = StackFrameAllocator::new(0, 2);
        let a = allocator.alloc().unwrap();
        let _b = allocator.alloc().unwrap();
        assert!(allocator.alloc().is_none());
        allocator.dealloc(a);
        assert!(allocator.alloc().is_some());
        assert!(allocator.alloc().is_none());
    }

    #[test]
    #[should_panic]
    fn double_free_panics() {
        let mut allocator = StackFrameAllocator::new(0, 2);
        let a = allocator.alloc().unwrap();
        allocator.dealloc(a);
        allocator.dealloc(a);
    }

    #[test]
    #[should_panic]
    fn freeing_unallocated_frame_panics() {
        let mut allocator = StackFrameAllocator::new(0, 2);
        allocator.dealloc(PhysPageNum(1));
    }

    #[test]
    fn fresh_frames_are_zero_filled() {
        crate::logging::init();
        let frame = frame_alloc().unwrap();
        for byte in frame.ppn.get_bytes_array() {
            *byte = 0xaa;
        }
        drop(frame);
        // any later allocation must come out clean, recycled or not
        let frame = frame_alloc().unwrap();
        assert!(frame.ppn.get_bytes_array().iter().all(|&b| b == 0));
    }

    #[test]
    fn smoke() {
        crate::logging::init();
        frame_allocator_test();
    }
}
