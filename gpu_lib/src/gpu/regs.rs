//! The hardware register state machine: every mutation of the status word
//! and of the derived display geometry happens here.

use log::trace;

use crate::gpu::display::{DisplayState, Point, TextureWindow};
use crate::gpu::hardware::{HardwareProfile, TexturePage};
use crate::gpu::status::{DmaDirection, Status, TransferMode};

/// Number of lightgun cursor slots
pub const LIGHTGUN_SLOTS: usize = 8;

/// Status reads the busy countdown fabricates before going idle again
const FAKE_BUSY_TICKS: u32 = 4;

/// Module address reported by the BIOS info selectors
const BIOS_MODULE_ADDR: u32 = 0xbfc0_3720;

/// Active display widths, indexed by the two resolution bits plus the wide
/// bit of the display-mode register
const DISPLAY_WIDTHS: [i32; 8] = [256, 320, 512, 640, 368, 384, 512, 640];

#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Registers {
    status: Status,
    /// Next word returned by a read of the data port
    read_word: u32,
    transfer: TransferMode,
    profile: HardwareProfile,
    /// Busy countdown, armed after commands when the hack is enabled
    fake_busy: u32,
    fake_busy_enabled: bool,
    /// Sticky: GP1 texture-disable permission survives a GPU reset
    texture_disable_allowed: bool,
    /// Raw draw-mode word, kept for poly updates and typed page reads
    raw_draw_mode: u32,
    /// Raw texture-window word, kept for the info query
    raw_tex_window: u32,
    /// Textured sprites flip horizontally/vertically
    rect_flip: (bool, bool),
    display: DisplayState,
    cursors: [Point; LIGHTGUN_SLOTS],
    /// Bit per slot with a live cursor
    active_cursors: u32,
}

impl Registers {
    pub fn new(profile: HardwareProfile, fake_busy_enabled: bool) -> Registers {
        Registers {
            status: Status::RESET,
            read_word: 0,
            transfer: TransferMode::Primitives,
            profile,
            fake_busy: 0,
            fake_busy_enabled,
            texture_disable_allowed: false,
            raw_draw_mode: 0,
            raw_tex_window: 0,
            rect_flip: (false, false),
            display: DisplayState::new(),
            cursors: [Point::default(); LIGHTGUN_SLOTS],
            active_cursors: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn transfer(&self) -> TransferMode {
        self.transfer
    }

    pub fn set_transfer(&mut self, mode: TransferMode) {
        self.transfer = mode;
    }

    pub fn read_word(&self) -> u32 {
        self.read_word
    }

    pub fn set_read_word(&mut self, v: u32) {
        self.read_word = v;
    }

    /// Status-register read as seen by the host. While the busy countdown
    /// runs, the two ready bits alternate with the parity of the remaining
    /// count, so a tight polling loop observes at least one busy sample.
    pub fn read_status(&mut self) -> u32 {
        if self.fake_busy > 0 {
            self.fake_busy -= 1;

            let busy = self.fake_busy & 1 == 1;
            self.status.set_ready_for_commands(!busy);
            self.status.set_ready_for_dma_block(!busy);
        }

        self.status.raw()
    }

    pub fn set_busy(&mut self) {
        self.status.set_ready_for_commands(false);
    }

    pub fn set_idle(&mut self) {
        self.status.set_ready_for_commands(true);
    }

    /// A multi-word command started arriving: block further DMA blocks
    /// until it completes
    pub fn gp0_pending(&mut self) {
        self.status.set_ready_for_dma_block(false);

        if self.status.dma_direction() == DmaDirection::CpuToGp0 {
            self.status.set_dma_request(false);
        }
    }

    pub(crate) fn restore_gp0_ready(&mut self) {
        self.status.set_ready_for_dma_block(true);

        if self.status.dma_direction() == DmaDirection::CpuToGp0 {
            self.status.set_dma_request(true);
        }
    }

    /// The pending command completed
    pub fn gp0_done(&mut self) {
        self.restore_gp0_ready();

        if self.fake_busy_enabled {
            self.fake_busy = FAKE_BUSY_TICKS;
        }
    }

    /// Pixel data from a VRAM load became available on the read port
    pub fn vram_read_pending(&mut self) {
        self.status.set_ready_to_send_vram(true);

        if self.status.dma_direction() == DmaDirection::VRamToCpu {
            self.status.set_dma_request(true);
        }
    }

    /// The VRAM load drained completely
    pub fn vram_read_done(&mut self) {
        self.status.set_ready_to_send_vram(false);

        if self.status.dma_direction() == DmaDirection::VRamToCpu {
            self.status.set_dma_request(false);
        }
    }

    /// Rewrite the DMA direction field. The request bit is re-seeded from
    /// the ready bit matching the new direction; a bulk transfer that the
    /// new direction can no longer feed is abandoned.
    pub fn set_dma_direction(&mut self, raw: u32) {
        let dir = DmaDirection::from_raw(raw);
        self.status.set_dma_direction(dir);

        match dir {
            DmaDirection::Off => {
                self.transfer = TransferMode::Primitives;
                self.status.set_dma_request(false);
            }
            DmaDirection::Fifo => {
                self.status.set_dma_request(true);
            }
            DmaDirection::CpuToGp0 => {
                if let TransferMode::VramRead { .. } = self.transfer {
                    self.transfer = TransferMode::Primitives;
                }
                let ready = self.status.ready_for_dma_block();
                self.status.set_dma_request(ready);
            }
            DmaDirection::VRamToCpu => {
                if let TransferMode::VramWrite { .. } = self.transfer {
                    self.transfer = TransferMode::Primitives;
                }
                let ready = self.status.ready_to_send_vram();
                self.status.set_dma_request(ready);
            }
        }

        trace!("DMA direction {:?}", dir);
    }

    /// Answer an info query into the read word. Selectors outside the
    /// documented set keep whatever the read word already held.
    pub fn gpu_info(&mut self, val: u32) {
        let v = match val & 0xf {
            0x2 => self.raw_tex_window,
            0x3 => {
                let a = self.display.draw_area;
                self.profile.pack_draw_coord(a.x0, a.y0)
            }
            0x4 => {
                let a = self.display.draw_area;
                self.profile.pack_draw_coord(a.x1, a.y1)
            }
            0x5 | 0x6 => {
                let o = self.display.draw_offset;
                (o.x as u32 & 0x7ff) | ((o.y as u32 & 0x7ff) << 11)
            }
            0x7 => self.profile.version_code(),
            0x8 => (self.active_cursors != 0) as u32,
            0x9 | 0xf => BIOS_MODULE_ADDR,
            _ => return,
        };

        trace!("info query {:x} -> {:08x}", val & 0xf, v);
        self.read_word = v;
    }

    /// Display-mode write: recompute the active display size and mirror
    /// the mode bits into the status word. Flipping the interlace enable
    /// forces the interlace-field bit high, like the real chip.
    pub fn set_display_mode(&mut self, val: u32) {
        let was_interlaced = self.status.interlace_enabled();

        self.status.set_display_mode_bits(val);

        let width_index = ((val & 3) | ((val >> 4) & 4)) as usize;
        let width = DISPLAY_WIDTHS[width_index];

        let base_height = if val & 0x08 != 0 { 256 } else { 240 };
        let doubled = (val & 0x04 != 0) && (val & 0x20 != 0);
        let height = base_height << doubled as i32;

        self.display.display_size = Point::new(width, height);

        if self.status.interlace_enabled() != was_interlaced {
            self.status.set_interlace_field(true);
        }

        trace!("display mode {:06x}, size {:?}", val, self.display.display_size);
    }

    /// Draw-mode write (texture page, transparency, dithering)
    pub fn set_texture_page(&mut self, val: u32) {
        self.raw_draw_mode = val;
        self.status.set_draw_mode_bits(val);

        let disable = self.texture_disable_allowed && (val >> 11) & 1 == 1;
        self.status.set_texture_disabled(disable);

        self.rect_flip = ((val >> 12) & 1 == 1, (val >> 13) & 1 == 1);
    }

    /// Textured polygons rewrite the page attributes globally, not just
    /// for the polygon carrying them
    pub fn set_texture_page_from_poly(&mut self, attrs: u32) {
        let merged = (self.raw_draw_mode & !0x9ff) | (attrs & 0x9ff);
        self.set_texture_page(merged);
    }

    /// Current page geometry, decoded per hardware profile
    pub fn texture_page(&self) -> TexturePage {
        self.profile.texture_page(self.raw_draw_mode)
    }

    pub fn rect_flip(&self) -> (bool, bool) {
        self.rect_flip
    }

    pub fn set_texture_window(&mut self, val: u32) {
        self.raw_tex_window = val & 0xf_ffff;
        self.display.tex_window = TextureWindow::from_raw(val);

        trace!("texture window {:?}", self.display.tex_window);
    }

    pub fn set_draw_area_start(&mut self, val: u32) {
        let (x, y) = self.profile.draw_coord(val);
        self.display.draw_area.x0 = x;
        self.display.draw_area.y0 = y;

        trace!("draw area start ({}, {})", x, y);
    }

    pub fn set_draw_area_end(&mut self, val: u32) {
        let (x, y) = self.profile.draw_coord(val);
        self.display.draw_area.x1 = x;
        self.display.draw_area.y1 = y;

        trace!("draw area end ({}, {})", x, y);
    }

    pub fn set_draw_offset(&mut self, val: u32) {
        let (x, y) = self.profile.draw_offset(val);
        self.display.draw_offset = Point::new(x, y);

        trace!("draw offset ({}, {})", x, y);
    }

    pub fn set_mask_settings(&mut self, val: u32) {
        self.status.set_mask_bits(val);
    }

    pub fn set_display_enabled(&mut self, on: bool) {
        self.status.set_display_disabled(!on);
    }

    pub fn ack_irq(&mut self) {
        self.status.set_irq(false);
    }

    pub fn set_display_origin(&mut self, val: u32) {
        // The lowest X bit is hardwired to zero
        self.display.display_origin.x = (val & 0x3fe) as i32;
        self.display.display_origin.y = ((val >> 10) & self.profile.display_origin_y_mask()) as i32;

        trace!("display origin {:?}", self.display.display_origin);
    }

    pub fn set_horizontal_range(&mut self, val: u32) {
        self.display.display_range.x0 = (val & 0xfff) as i32;
        self.display.display_range.x1 = ((val >> 12) & 0xfff) as i32;
    }

    pub fn set_vertical_range(&mut self, val: u32) {
        self.display.display_range.y0 = (val & 0x3ff) as i32;
        self.display.display_range.y1 = ((val >> 10) & 0x3ff) as i32;
    }

    pub fn allow_texture_disable(&mut self, allowed: bool) {
        self.texture_disable_allowed = allowed;

        if !allowed {
            self.status.set_texture_disabled(false);
        }
    }

    /// Host-driven scanline parity, toggled once per displayed line pair
    pub fn toggle_scanline_parity(&mut self) {
        let odd = self.status.raw() & 0x8000_0000 == 0;
        self.status.set_scanline_parity(odd);
    }

    /// Host-driven field flag, alternated once per interlaced field
    pub fn set_interlace_field(&mut self, odd: bool) {
        self.status.set_interlace_field(odd);
    }

    pub fn set_cursor(&mut self, slot: usize, x: i32, y: i32) {
        let slot = slot % LIGHTGUN_SLOTS;
        self.cursors[slot] = Point::new(x, y);
        self.active_cursors |= 1 << slot;
    }

    pub fn clear_cursor(&mut self, slot: usize) {
        self.active_cursors &= !(1 << (slot % LIGHTGUN_SLOTS));
    }

    pub fn cursor(&self, slot: usize) -> Option<Point> {
        let slot = slot % LIGHTGUN_SLOTS;

        if self.active_cursors & (1 << slot) != 0 {
            Some(self.cursors[slot])
        } else {
            None
        }
    }

    pub fn active_cursors(&self) -> u32 {
        self.active_cursors
    }

    /// Full register reset. The texture-disable permission is sticky and
    /// the cursor slots belong to the host, both survive.
    pub fn reset(&mut self) {
        self.status = Status::RESET;
        self.read_word = 0;
        self.transfer = TransferMode::Primitives;
        self.fake_busy = 0;
        self.raw_draw_mode = 0;
        self.raw_tex_window = 0;
        self.rect_flip = (false, false);
        self.display.reset();
    }
}
