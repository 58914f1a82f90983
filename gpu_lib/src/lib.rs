//! Register and command core of a PlayStation-class GPU.
//!
//! The crate models the chip's word-level contract: a status/control
//! register file, the GP0/GP1 command channels and the linked-list DMA
//! delivery path. Everything that touches pixels sits behind the
//! [`Renderer`] trait; the host wires the word interface to its bus or
//! plugin surface and hands the core a renderer implementation.
//!
//! Command chains coming from the emulated program are untrusted: the
//! traversal in [`ChainWalker`] is bounded for truncated, out-of-bounds
//! and deliberately cyclic chains alike.

mod bitwise;
mod error;
mod gpu;
mod snapshot;

pub use crate::error::{GpuError, GpuResult};
pub use crate::gpu::commands::{COMMAND_BUFFER_DEPTH, Decoder};
pub use crate::gpu::display::{DisplayState, Point, Rect, TextureWindow};
pub use crate::gpu::dma_chain::{
    CHAIN_TERMINATOR, ChainTag, ChainWalker, EXTENDED_RAM_BYTES, ExtendedChainWalker,
    STANDARD_RAM_BYTES, StandardChainWalker,
};
pub use crate::gpu::hardware::{Config, HardwareProfile, HardwareVersion, TexturePage};
pub use crate::gpu::regs::{LIGHTGUN_SLOTS, Registers};
pub use crate::gpu::renderer::{NullRenderer, PrimFlags, Renderer, TextureAttrs, Vertex};
pub use crate::gpu::status::{DmaDirection, Status, TransferMode};
pub use crate::gpu::{CONTROL_HISTORY_DEPTH, Gpu};
pub use crate::snapshot::Snapshot;
