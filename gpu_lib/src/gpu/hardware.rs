//! The handful of encoding differences between the consumer GPU and the two
//! arcade derivatives, collected behind one profile value so the register
//! setters never branch on the version themselves.

use crate::bitwise::extend_to_i32;
use crate::error::{GpuError, GpuResult};

/// Which silicon we're emulating.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum HardwareVersion {
    /// Consumer console GPU
    #[default]
    Standard,
    /// First arcade derivative: standard register encodings over
    /// double-height VRAM
    ArcadeV1,
    /// Second arcade derivative: double-height VRAM plus widened draw-area,
    /// draw-offset and texture-page fields
    ArcadeV2,
}

/// Startup configuration for a [`crate::Gpu`].
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug)]
pub struct Config {
    pub version: HardwareVersion,
    /// Lines of VRAM: 512 on consoles, 1024 on the arcade boards
    pub vram_height: u32,
    /// Fabricate a short busy/idle sequence after every completed command,
    /// for hosts that poll status without ever yielding
    pub fake_gpu_busy: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            version: HardwareVersion::Standard,
            vram_height: 512,
            fake_gpu_busy: false,
        }
    }
}

/// Texture page geometry decoded from a draw-mode word.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TexturePage {
    /// Left edge of the page in VRAM
    pub base_x: u16,
    /// Top edge of the page in VRAM
    pub base_y: u16,
    /// Semi-transparency function (0-3)
    pub semi_transparency: u8,
    /// Texel color depth (0=4bpp, 1=8bpp, 2=15bpp)
    pub color_depth: u8,
}

/// Answers every bit-width question that depends on the hardware version.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub struct HardwareProfile {
    version: HardwareVersion,
    vram_height: u32,
}

impl HardwareProfile {
    pub fn from_config(config: &Config) -> GpuResult<HardwareProfile> {
        match config.vram_height {
            512 | 1024 => Ok(HardwareProfile {
                version: config.version,
                vram_height: config.vram_height,
            }),
            h => Err(GpuError::BadVramHeight(h)),
        }
    }

    pub fn version(&self) -> HardwareVersion {
        self.version
    }

    pub fn vram_height(&self) -> u32 {
        self.vram_height
    }

    /// Version constant reported by the info query
    pub fn version_code(&self) -> u32 {
        match self.version {
            HardwareVersion::ArcadeV2 => 1,
            _ => 2,
        }
    }

    /// True when command chains live in the 8 MiB arcade memory instead of
    /// the 2 MiB console RAM
    pub fn extended_memory(&self) -> bool {
        self.vram_height == 1024
    }

    /// Mask applied to the Y field of the display origin register
    pub fn display_origin_y_mask(&self) -> u32 {
        self.vram_height - 1
    }

    fn wide_fields(&self) -> bool {
        self.version == HardwareVersion::ArcadeV2
    }

    /// Unpack a draw-area corner register (10-bit fields, 12-bit on the
    /// second arcade variant)
    pub fn draw_coord(&self, raw: u32) -> (i32, i32) {
        if self.wide_fields() {
            ((raw & 0xfff) as i32, ((raw >> 12) & 0xfff) as i32)
        } else {
            ((raw & 0x3ff) as i32, ((raw >> 10) & 0x3ff) as i32)
        }
    }

    /// Pack a draw-area corner the way the info query reports it
    pub fn pack_draw_coord(&self, x: i32, y: i32) -> u32 {
        if self.wide_fields() {
            (x as u32 & 0xfff) | ((y as u32 & 0xfff) << 12)
        } else {
            (x as u32 & 0x3ff) | ((y as u32 & 0x3ff) << 10)
        }
    }

    /// Unpack a draw-offset register into sign-extended coordinates:
    /// 11-bit two's-complement fields, widened to 12 bits on the second
    /// arcade variant
    pub fn draw_offset(&self, raw: u32) -> (i32, i32) {
        if self.wide_fields() {
            (extend_to_i32(raw & 0xfff, 12), extend_to_i32((raw >> 12) & 0xfff, 12))
        } else {
            (extend_to_i32(raw & 0x7ff, 11), extend_to_i32((raw >> 11) & 0x7ff, 11))
        }
    }

    /// Decode the texture page geometry carried in a draw-mode word. The
    /// second arcade variant spends bit 11 on a second page Y bit so pages
    /// can sit in the lower half of its 1024-line VRAM.
    pub fn texture_page(&self, raw: u32) -> TexturePage {
        let mut base_y = (((raw >> 4) & 1) * 256) as u16;

        if self.wide_fields() {
            base_y += (((raw >> 11) & 1) * 512) as u16;
        }

        TexturePage {
            base_x: ((raw & 0xf) * 64) as u16,
            base_y,
            semi_transparency: ((raw >> 5) & 3) as u8,
            color_depth: ((raw >> 7) & 3) as u8,
        }
    }
}
