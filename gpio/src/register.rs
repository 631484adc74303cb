//! Memory-mapped register handles.
//!
//! [MmioRegister] is a single volatile byte at a fixed address. [RegisterBlock] maps a window of
//! physical memory through `/dev/mem` (or `/dev/gpiomem`) and hands out one [MappedRegister] per
//! offset, so no two components can own the same register by accident.

use crate::{GpioError, GpioResult, Register};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// An 8-bit register at a fixed address, accessed with volatile reads and writes.
pub struct MmioRegister {
    ptr: *mut u8,
}

impl MmioRegister {
    /// Creates a handle to the register at `ptr`.
    ///
    /// # Safety
    /// `ptr` must be valid for volatile reads and writes for as long as the handle lives, and no
    /// other handle may access the same address concurrently.
    pub unsafe fn new(ptr: *mut u8) -> Self {
        MmioRegister { ptr }
    }

    pub fn address(&self) -> usize {
        self.ptr as usize
    }
}

impl Debug for MmioRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MmioRegister({:#x})", self.address())
    }
}

impl Register for MmioRegister {
    fn read(&self) -> GpioResult<u8> {
        Ok(unsafe { self.ptr.read_volatile() })
    }

    fn write(&self, value: u8) -> GpioResult<()> {
        unsafe { self.ptr.write_volatile(value) };
        Ok(())
    }
}

/// A mapped window of physical memory containing 8-bit registers.
pub struct RegisterBlock {
    mmap: MmapRaw,
    base: u64,
    used: BitVec<AtomicU8>,
}

impl RegisterBlock {
    /// Maps `len` bytes of the memory device at `path`, starting at the physical address `base`.
    pub fn map(path: impl AsRef<Path>, base: u64, len: usize) -> GpioResult<Self> {
        if len == 0 {
            return Err(GpioError::InvalidArgument);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        let mmap = MmapOptions::new()
            .offset(base)
            .len(len)
            .map_raw(&file)?;

        debug!("Mapped {} bytes of {:?} at {:#x}", len, path.as_ref(), base);

        Ok(RegisterBlock {
            mmap,
            base,
            used: BitVec::repeat(false, len),
        })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// Takes the register at `offset` bytes into the window.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the offset is outside the window.
    /// - `GpioError::AlreadyInUse` if a handle to this offset is still alive.
    pub fn register(&self, offset: usize) -> GpioResult<MappedRegister<'_>> {
        if offset >= self.len() {
            return Err(GpioError::InvalidArgument);
        }

        if self.used[offset] {
            return Err(GpioError::AlreadyInUse);
        }
        self.used.set_aliased(offset, true);

        let ptr = unsafe { self.mmap.as_mut_ptr().add(offset) };

        Ok(MappedRegister {
            block: self,
            offset,
            inner: unsafe { MmioRegister::new(ptr) },
        })
    }
}

impl Debug for RegisterBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegisterBlock({:#x}+{:#x})", self.base, self.len())
    }
}

/// A register taken from a [RegisterBlock]. Releases its offset when dropped.
pub struct MappedRegister<'a> {
    block: &'a RegisterBlock,
    offset: usize,
    inner: MmioRegister,
}

impl MappedRegister<'_> {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Debug for MappedRegister<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{:#x}]", self.block, self.offset)
    }
}

impl Register for MappedRegister<'_> {
    fn read(&self) -> GpioResult<u8> {
        self.inner.read()
    }

    fn write(&self, value: u8) -> GpioResult<()> {
        self.inner.write(value)
    }
}

impl Drop for MappedRegister<'_> {
    fn drop(&mut self) {
        self.block.used.set_aliased(self.offset, false);
    }
}
