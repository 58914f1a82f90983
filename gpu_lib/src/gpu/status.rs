//! The packed status/control word and the transfer bookkeeping derived from
//! it.

use crate::bitwise::Bitwise;

/// Requested DMA direction.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DmaDirection {
    Off = 0,
    Fifo = 1,
    CpuToGp0 = 2,
    VRamToCpu = 3,
}

impl DmaDirection {
    pub fn from_raw(v: u32) -> DmaDirection {
        match v & 3 {
            0 => DmaDirection::Off,
            1 => DmaDirection::Fifo,
            2 => DmaDirection::CpuToGp0,
            3 => DmaDirection::VRamToCpu,
            _ => unreachable!(),
        }
    }
}

/// What a pending bulk transfer over the data port represents.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TransferMode {
    /// Ordinary command words
    #[default]
    Primitives,
    /// A store is in flight, `remaining` words of pixel data still expected
    VramWrite { remaining: u32 },
    /// A load is in flight, `remaining` words still to be read back
    VramRead { remaining: u32 },
}

/// Wrapper around the raw status word. Callers go through the typed
/// accessors instead of open-coding masks.
///
/// Bit layout: 0-3 texture page X base, 4 texture page Y base, 5-6
/// semi-transparency, 7-8 texture color depth, 9 dithering, 10
/// draw-to-display, 11 set-mask-bit, 12 check-mask-bit, 13 interlace field,
/// 14 reverse flag, 15 texture disable, 16 wide horizontal resolution,
/// 17-18 horizontal resolution, 19 vertical resolution, 20 video standard,
/// 21 display color depth, 22 vertical interlace, 23 display disabled, 24
/// IRQ, 25 DMA request, 26 ready for commands, 27 ready to send VRAM, 28
/// ready for DMA block, 29-30 DMA direction, 31 scanline parity.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq)]
pub struct Status(u32);

impl Status {
    /// Value after reset: ready for commands and DMA blocks, display
    /// disabled, interlace field set
    pub const RESET: Status = Status(0x1480_2000);

    pub fn from_raw(v: u32) -> Status {
        Status(v)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn ready_for_commands(self) -> bool {
        self.0.bit(26)
    }

    pub fn set_ready_for_commands(&mut self, v: bool) {
        self.0.set_bit(26, v);
    }

    pub fn ready_for_dma_block(self) -> bool {
        self.0.bit(28)
    }

    pub fn set_ready_for_dma_block(&mut self, v: bool) {
        self.0.set_bit(28, v);
    }

    pub fn ready_to_send_vram(self) -> bool {
        self.0.bit(27)
    }

    pub fn set_ready_to_send_vram(&mut self, v: bool) {
        self.0.set_bit(27, v);
    }

    pub fn dma_request(self) -> bool {
        self.0.bit(25)
    }

    pub fn set_dma_request(&mut self, v: bool) {
        self.0.set_bit(25, v);
    }

    pub fn dma_direction(self) -> DmaDirection {
        DmaDirection::from_raw(self.0 >> 29)
    }

    pub fn set_dma_direction(&mut self, dir: DmaDirection) {
        self.0 &= !(3 << 29);
        self.0 |= (dir as u32) << 29;
    }

    pub fn set_irq(&mut self, v: bool) {
        self.0.set_bit(24, v);
    }

    pub fn display_disabled(self) -> bool {
        self.0.bit(23)
    }

    pub fn set_display_disabled(&mut self, v: bool) {
        self.0.set_bit(23, v);
    }

    pub fn interlace_enabled(self) -> bool {
        self.0.bit(22)
    }

    pub fn is_pal(self) -> bool {
        self.0.bit(20)
    }

    pub fn set_interlace_field(&mut self, v: bool) {
        self.0.set_bit(13, v);
    }

    pub fn texture_disabled(self) -> bool {
        self.0.bit(15)
    }

    pub fn set_texture_disabled(&mut self, v: bool) {
        self.0.set_bit(15, v);
    }

    pub fn set_scanline_parity(&mut self, odd: bool) {
        self.0.set_bit(31, odd);
    }

    /// Rewrite the draw-mode group (bits 0-10) from a draw-mode word
    pub fn set_draw_mode_bits(&mut self, raw: u32) {
        self.0 &= !0x7ff;
        self.0 |= raw & 0x7ff;
    }

    /// Rewrite the mask group (bits 11-12) from a mask-settings word
    pub fn set_mask_bits(&mut self, raw: u32) {
        self.0 &= !(3 << 11);
        self.0 |= (raw & 3) << 11;
    }

    /// Rewrite the display-mode group: bits 17-22 take the low six data
    /// bits, bit 16 the wide-resolution bit, bit 14 the reverse flag.
    /// Nothing outside the group changes.
    pub fn set_display_mode_bits(&mut self, raw: u32) {
        self.0 &= !0x007f_4000;
        self.0 |= (raw & 0x3f) << 17;
        self.0 |= ((raw >> 6) & 1) << 16;
        self.0 |= ((raw >> 7) & 1) << 14;
    }
}

impl std::fmt::Debug for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Status({:08x})", self.0)
    }
}
