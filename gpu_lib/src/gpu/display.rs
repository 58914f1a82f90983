//! Display geometry derived from register writes: visible ranges, draw
//! area, draw offset and the texture window.

#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Wraparound sampling window inside a texture page.
///
/// Mask sizes are always powers of two between 8 and 256, offsets are
/// aligned to the size and `offset + size` never exceeds 256.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub struct TextureWindow {
    pub offset_x: u32,
    pub offset_y: u32,
    pub mask_width: u32,
    pub mask_height: u32,
    pub enabled: bool,
}

impl TextureWindow {
    pub const DISABLED: TextureWindow = TextureWindow {
        offset_x: 0,
        offset_y: 0,
        mask_width: 256,
        mask_height: 256,
        enabled: false,
    };

    /// Decode a texture-window word. Only the low 20 bits carry data; an
    /// all-zero payload disables the window.
    pub fn from_raw(raw: u32) -> TextureWindow {
        let raw = raw & 0xf_ffff;

        let width = mask_size(raw & 0x1f);
        let height = mask_size((raw >> 5) & 0x1f);

        // Offsets come in 8-pixel steps and snap down to a multiple of the
        // window size
        let offset_x = (((raw >> 10) & 0x1f) << 3) & !(width - 1);
        let offset_y = (((raw >> 15) & 0x1f) << 3) & !(height - 1);

        TextureWindow {
            offset_x,
            offset_y,
            mask_width: width,
            mask_height: height,
            enabled: raw != 0,
        }
    }
}

impl Default for TextureWindow {
    fn default() -> TextureWindow {
        TextureWindow::DISABLED
    }
}

/// The lowest set bit of the 5-bit mask field picks the window size
fn mask_size(field: u32) -> u32 {
    for bit in 0..5 {
        if field & (1 << bit) != 0 {
            return 8 << bit;
        }
    }

    256
}

/// Geometry recomputed by the display-affecting register writes.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub struct DisplayState {
    /// Visible window in raw hardware units: x0..x1 columns, y0..y1 lines
    pub display_range: Rect,
    /// Clipping rectangle for draw commands, in VRAM coordinates
    pub draw_area: Rect,
    /// Signed offset added to every primitive coordinate
    pub draw_offset: Point,
    /// Active display size in pixels, derived from the display-mode bits
    pub display_size: Point,
    /// Location of the displayed rectangle inside VRAM
    pub display_origin: Point,
    pub tex_window: TextureWindow,
}

impl DisplayState {
    pub fn new() -> DisplayState {
        DisplayState {
            display_range: Rect {
                x0: 0x200,
                y0: 0x10,
                x1: 0xc00,
                y1: 0x100,
            },
            draw_area: Rect::default(),
            draw_offset: Point::default(),
            display_size: Point::new(256, 240),
            display_origin: Point::default(),
            tex_window: TextureWindow::DISABLED,
        }
    }

    pub fn reset(&mut self) {
        *self = DisplayState::new();
    }
}

impl Default for DisplayState {
    fn default() -> DisplayState {
        DisplayState::new()
    }
}
