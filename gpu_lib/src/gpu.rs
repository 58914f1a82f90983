//! The emulated GPU device: register file, command decoder and chain
//! traversal wired together behind the word-level interface the plugin
//! boundary calls into.

pub mod commands;
pub mod display;
pub mod dma_chain;
pub mod hardware;
pub mod regs;
pub mod renderer;
pub mod status;

use log::{trace, warn};

use crate::error::GpuResult;
use crate::gpu::commands::Decoder;
use crate::gpu::display::DisplayState;
use crate::gpu::dma_chain::{ChainWalker, EXTENDED_RAM_BYTES, STANDARD_RAM_BYTES};
use crate::gpu::hardware::{Config, HardwareProfile};
use crate::gpu::regs::Registers;
use crate::gpu::renderer::Renderer;
use crate::gpu::status::TransferMode;
use crate::snapshot::Snapshot;

/// One slot per control opcode
pub const CONTROL_HISTORY_DEPTH: usize = 0x40;

pub struct Gpu {
    regs: Registers,
    decoder: Decoder,
    /// Last word written for each control opcode, kept for save states
    control_history: [u32; CONTROL_HISTORY_DEPTH],
    frame_skipped: bool,
}

impl Gpu {
    pub fn new(config: &Config) -> GpuResult<Gpu> {
        let profile = HardwareProfile::from_config(config)?;

        Ok(Gpu {
            regs: Registers::new(profile, config.fake_gpu_busy),
            decoder: Decoder::new(),
            control_history: [0; CONTROL_HISTORY_DEPTH],
            frame_skipped: false,
        })
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Geometry the rendering side reads: draw area, offsets, display
    /// window, texture window
    pub fn display(&self) -> &DisplayState {
        self.regs.display()
    }

    /// Status-register read
    pub fn read_status(&mut self) -> u32 {
        let s = self.regs.read_status();
        trace!("GPUSTAT = {:08x}", s);
        s
    }

    /// Control-register write (GP1 channel, 6-bit opcode)
    pub fn write_control(&mut self, word: u32) {
        let op = (word >> 24) & 0x3f;
        trace!("GP1 {:02x} {:08x}", op, word);

        self.control_history[op as usize] = word;

        match op {
            0x00 => self.reset(),
            0x01 => self.decoder.clear(&mut self.regs),
            0x02 => self.regs.ack_irq(),
            0x03 => self.regs.set_display_enabled(word & 1 == 0),
            0x04 => self.regs.set_dma_direction(word),
            0x05 => self.regs.set_display_origin(word),
            0x06 => self.regs.set_horizontal_range(word),
            0x07 => self.regs.set_vertical_range(word),
            0x08 => self.regs.set_display_mode(word),
            0x09 => self.regs.allow_texture_disable(word & 1 == 1),
            0x10 => self.regs.gpu_info(word),
            _ => warn!("unhandled control word {:08x}", word),
        }
    }

    /// Data-register write (GP0 channel), one word
    pub fn write_data(&mut self, word: u32, renderer: &mut dyn Renderer) {
        self.write_data_buffer(&[word], renderer);
    }

    /// Data-register write, buffered. Words may stop in the middle of a
    /// command; the remainder is picked up by the next call.
    pub fn write_data_buffer(&mut self, words: &[u32], renderer: &mut dyn Renderer) {
        self.regs.set_busy();

        let mut left = words;
        while !left.is_empty() {
            let n = self
                .decoder
                .decode_one(&mut self.regs, renderer, left, self.frame_skipped);
            left = &left[n..];
        }

        self.regs.set_idle();
    }

    /// Data-register read: drains a pending VRAM load, otherwise returns
    /// the buffered read word
    pub fn read_data(&mut self, renderer: &mut dyn Renderer) -> u32 {
        match self.regs.transfer() {
            TransferMode::VramRead { remaining } => {
                let word = renderer.vram_read();

                if remaining <= 1 {
                    self.regs.set_transfer(TransferMode::Primitives);
                    self.regs.vram_read_done();
                } else {
                    self.regs.set_transfer(TransferMode::VramRead {
                        remaining: remaining - 1,
                    });
                }

                self.regs.set_read_word(word);
                word
            }
            _ => self.regs.read_word(),
        }
    }

    /// Buffered data-register read
    pub fn read_data_buffer(&mut self, out: &mut [u32], renderer: &mut dyn Renderer) {
        for word in out {
            *word = self.read_data(renderer);
        }
    }

    /// Walk a command chain rooted at `start_addr` and execute every
    /// block it yields. `ram` is the chain memory, `None` when the host
    /// never mapped one.
    pub fn dma_chain(&mut self, ram: Option<&[u32]>, start_addr: u32, renderer: &mut dyn Renderer) {
        if self.regs.profile().extended_memory() {
            self.run_chain::<EXTENDED_RAM_BYTES>(ram, start_addr, renderer);
        } else {
            self.run_chain::<STANDARD_RAM_BYTES>(ram, start_addr, renderer);
        }
    }

    fn run_chain<const RAM_BYTES: usize>(
        &mut self,
        ram: Option<&[u32]>,
        start_addr: u32,
        renderer: &mut dyn Renderer,
    ) {
        self.regs.set_busy();

        let mut walker = ChainWalker::<RAM_BYTES>::new(ram, start_addr);

        while let Some(block) = walker.next_block() {
            let mut left = block;
            while !left.is_empty() {
                let n = self
                    .decoder
                    .decode_one(&mut self.regs, renderer, left, self.frame_skipped);
                left = &left[n..];
            }
        }

        self.regs.set_idle();
    }

    /// Tell the core the current frame won't be presented; pure drawing
    /// commands are then discarded without execution
    pub fn set_frame_skip(&mut self, skip: bool) {
        self.frame_skipped = skip;
    }

    pub fn set_lightgun_cursor(&mut self, slot: usize, x: i32, y: i32) {
        self.regs.set_cursor(slot, x, y);
    }

    pub fn clear_lightgun_cursor(&mut self, slot: usize) {
        self.regs.clear_cursor(slot);
    }

    /// Full reset: registers back to their power-on value, any partial
    /// command dropped
    pub fn reset(&mut self) {
        self.decoder.clear(&mut self.regs);
        self.regs.reset();
    }

    /// Capture the register state for a save state
    pub fn freeze(&self) -> Snapshot {
        Snapshot::new(self.regs.clone(), self.control_history)
    }

    /// Direct register overwrite from a save state
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.decoder.clear(&mut self.regs);
        self.control_history = *snapshot.control_history();
        self.regs = snapshot.registers().clone();
    }

    /// Last control word written for each opcode; hosts replay these when
    /// an external renderer needs to resynchronize after a restore
    pub fn control_history(&self) -> &[u32; CONTROL_HISTORY_DEPTH] {
        &self.control_history
    }
}
