//! Memory definitions shared by the bridge
//!
//! Only address types live here. Page tables and physical memory belong to
//! the virtual memory subsystem, which the bridge does not touch.

pub mod address;

pub use address::{VirtAddr, PAGE_SIZE, PHYS_BASE};
