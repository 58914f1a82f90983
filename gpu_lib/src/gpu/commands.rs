//! GP0 command decoding: a generated dispatch table, cross-call command
//! assembly and the handlers that mutate the registers or feed the
//! renderer.

use log::warn;

use crate::gpu::regs::Registers;
use crate::gpu::renderer::{PrimFlags, Renderer, TextureAttrs, Vertex};
use crate::gpu::status::TransferMode;

/// Hard per-command limit, in words
pub const COMMAND_BUFFER_DEPTH: usize = 256;

/// A word with this pattern in both halves closes a poly-line
const POLYLINE_TERMINATOR_MASK: u32 = 0xf000_f000;
const POLYLINE_TERMINATOR: u32 = 0x5000_5000;

/// Fixed sprite sizes encoded in the rectangle opcodes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum RectSize {
    Variable,
    One,
    Eight,
    Sixteen,
}

impl RectSize {
    fn from_opcode(op: u8) -> RectSize {
        match (op >> 3) & 3 {
            0 => RectSize::Variable,
            1 => RectSize::One,
            2 => RectSize::Eight,
            _ => RectSize::Sixteen,
        }
    }

    fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            RectSize::Variable => None,
            RectSize::One => Some((1, 1)),
            RectSize::Eight => Some((8, 8)),
            RectSize::Sixteen => Some((16, 16)),
        }
    }
}

/// What a table slot does once its words are assembled
#[derive(Copy, Clone, Debug)]
enum Op {
    Nop,
    ClearCache,
    FillRect,
    Polygon { quad: bool, flags: PrimFlags },
    Line { flags: PrimFlags },
    PolyLine { flags: PrimFlags },
    Rect { size: RectSize, flags: PrimFlags },
    VramCopy,
    VramStore,
    VramLoad,
    DrawMode,
    TexWindow,
    DrawAreaStart,
    DrawAreaEnd,
    DrawOffset,
    MaskSettings,
}

/// Expected command length
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Len {
    Fixed(u8),
    /// Terminated by the marker word; shaded lines carry two words per
    /// segment
    PolyLine { shaded: bool },
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    op: Op,
    len: Len,
    /// Pure drawing command, droppable when the frame is skipped
    skippable: bool,
}

/// Build the 256-entry dispatch table. The primitive families are
/// synthesized from their base opcode plus the variant bits instead of
/// being listed row by row.
fn build_table() -> [Slot; 0x100] {
    let nop = Slot {
        op: Op::Nop,
        len: Len::Fixed(1),
        skippable: false,
    };

    let mut table = [nop; 0x100];

    table[0x01] = Slot {
        op: Op::ClearCache,
        len: Len::Fixed(1),
        skippable: false,
    };
    table[0x02] = Slot {
        op: Op::FillRect,
        len: Len::Fixed(3),
        skippable: false,
    };

    for op in 0x20..=0x3f {
        let flags = PrimFlags::from_opcode(op);
        let quad = op & 0x08 != 0;
        let verts = if quad { 4u8 } else { 3u8 };

        let mut len = verts * (1 + flags.textured as u8);
        len += if flags.gouraud { verts } else { 1 };

        table[op as usize] = Slot {
            op: Op::Polygon { quad, flags },
            len: Len::Fixed(len),
            skippable: true,
        };
    }

    for op in 0x40..=0x5f {
        let mut flags = PrimFlags::from_opcode(op);
        flags.textured = false;
        flags.raw_texture = false;

        let slot = if op & 0x08 != 0 {
            Slot {
                op: Op::PolyLine { flags },
                len: Len::PolyLine {
                    shaded: flags.gouraud,
                },
                skippable: true,
            }
        } else {
            Slot {
                op: Op::Line { flags },
                len: Len::Fixed(3 + flags.gouraud as u8),
                skippable: true,
            }
        };

        table[op as usize] = slot;
    }

    for op in 0x60..=0x7f {
        let mut flags = PrimFlags::from_opcode(op);
        flags.gouraud = false;

        let size = RectSize::from_opcode(op);
        let len = 2 + flags.textured as u8 + (size == RectSize::Variable) as u8;

        table[op as usize] = Slot {
            op: Op::Rect { size, flags },
            len: Len::Fixed(len),
            skippable: true,
        };
    }

    table[0x80] = Slot {
        op: Op::VramCopy,
        len: Len::Fixed(4),
        skippable: false,
    };
    table[0xa0] = Slot {
        op: Op::VramStore,
        len: Len::Fixed(3),
        skippable: false,
    };
    table[0xc0] = Slot {
        op: Op::VramLoad,
        len: Len::Fixed(3),
        skippable: false,
    };

    let env = [
        Op::DrawMode,
        Op::TexWindow,
        Op::DrawAreaStart,
        Op::DrawAreaEnd,
        Op::DrawOffset,
        Op::MaskSettings,
    ];
    for (i, &op) in env.iter().enumerate() {
        table[0xe1 + i] = Slot {
            op,
            len: Len::Fixed(1),
            skippable: false,
        };
    }

    table
}

/// Assembles commands from the word stream and runs them. Owns its
/// carry-over buffer so independent GPU instances never share state.
pub struct Decoder {
    table: [Slot; 0x100],
    buffer: [u32; COMMAND_BUFFER_DEPTH],
    buffered: usize,
    /// Opcode of the command being assembled, valid while `buffered > 0`
    opcode: u8,
}

impl Decoder {
    pub fn new() -> Decoder {
        Decoder {
            table: build_table(),
            buffer: [0; COMMAND_BUFFER_DEPTH],
            buffered: 0,
            opcode: 0,
        }
    }

    /// Drop any partially assembled command
    pub fn clear(&mut self, regs: &mut Registers) {
        if self.buffered > 0 {
            self.buffered = 0;
            regs.restore_gp0_ready();
        }
    }

    /// True while a command is waiting for more words
    pub fn has_partial_command(&self) -> bool {
        self.buffered > 0
    }

    /// Consume words from `words` until one command completes, the pending
    /// VRAM store takes what it needs, or the input runs out. Returns the
    /// number of words consumed: always at least 1 and never more than
    /// `words.len()`; nothing past the slice is ever read.
    pub fn decode_one(
        &mut self,
        regs: &mut Registers,
        renderer: &mut dyn Renderer,
        words: &[u32],
        frame_skipped: bool,
    ) -> usize {
        if words.is_empty() {
            return 0;
        }

        // An active store takes raw pixel data without decoding
        if let TransferMode::VramWrite { remaining } = regs.transfer() {
            let n = (remaining as usize).min(words.len());
            renderer.vram_write(&words[..n]);

            let left = remaining - n as u32;
            if left == 0 {
                regs.set_transfer(TransferMode::Primitives);
                regs.gp0_done();
            } else {
                regs.set_transfer(TransferMode::VramWrite { remaining: left });
            }

            return n;
        }

        let mut consumed = 0;

        for &word in words {
            consumed += 1;

            if self.buffered == 0 {
                let opcode = (word >> 24) as u8;
                let slot = self.table[opcode as usize];

                if let Op::Nop = slot.op {
                    if !matches!(opcode, 0x00 | 0x03..=0x1f | 0xe0 | 0xe7..=0xef) {
                        warn!("GPU command {:08x}", word);
                    }

                    // Reserved or unhandled opcode: swallow exactly one
                    // word and forget any partial state
                    self.buffered = 0;
                    return consumed;
                }

                self.opcode = opcode;
                self.buffer[0] = word;
                self.buffered = 1;

                if slot.len != Len::Fixed(1) {
                    regs.gp0_pending();
                }
            } else {
                self.buffer[self.buffered] = word;
                self.buffered += 1;
            }

            let slot = self.table[self.opcode as usize];

            if self.command_complete(slot.len) {
                let count = self.buffered;
                self.buffered = 0;
                regs.gp0_done();

                if !(frame_skipped && slot.skippable) {
                    run_command(slot.op, regs, renderer, &self.buffer[..count]);
                }

                return consumed;
            }
        }

        // Out of input mid-command; everything given is now buffered
        consumed
    }

    fn command_complete(&self, len: Len) -> bool {
        match len {
            Len::Fixed(n) => self.buffered >= n as usize,
            Len::PolyLine { shaded } => {
                if self.buffered == COMMAND_BUFFER_DEPTH {
                    // Malformed stream: no terminator within the longest
                    // legal command, run with what we have
                    return true;
                }

                let i = self.buffered - 1;
                let eligible = if shaded { i >= 4 && i % 2 == 0 } else { i >= 3 };

                eligible && self.buffer[i] & POLYLINE_TERMINATOR_MASK == POLYLINE_TERMINATOR
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Decoder {
        Decoder::new()
    }
}

fn run_command(op: Op, regs: &mut Registers, renderer: &mut dyn Renderer, words: &[u32]) {
    match op {
        Op::Nop => (),
        Op::ClearCache => renderer.clear_texture_cache(),
        Op::FillRect => {
            let color = words[0] & 0xff_ffff;
            // Fills snap to the 16-pixel grid
            let x = (words[1] & 0x3f0) as u16;
            let y = ((words[1] >> 16) & 0x1ff) as u16;
            let w = (((words[2] & 0x3ff) + 0xf) & !0xf) as u16;
            let h = ((words[2] >> 16) & 0x1ff) as u16;

            renderer.fill_rectangle(color, (x, y), (w, h));
        }
        Op::Polygon { quad, flags } => run_polygon(quad, flags, regs, renderer, words),
        Op::Line { flags } => {
            let start = Vertex::from_word(words[1], words[0]);
            let (end_color, end_pos) = if flags.gouraud {
                (words[2], words[3])
            } else {
                (words[0], words[2])
            };

            renderer.draw_line(start, Vertex::from_word(end_pos, end_color), flags);
        }
        Op::PolyLine { flags } => run_polyline(flags, renderer, words),
        Op::Rect { size, flags } => run_rect(size, flags, regs, renderer, words),
        Op::VramCopy => {
            let src = vram_point(words[1]);
            let dst = vram_point(words[2]);
            let size = vram_dimensions(words[3]);

            renderer.copy_vram(src, dst, size);
        }
        Op::VramStore => {
            let dst = vram_point(words[1]);
            let size = vram_dimensions(words[2]);

            renderer.begin_vram_write(dst, size);
            regs.set_transfer(TransferMode::VramWrite {
                remaining: vram_word_count(size),
            });
        }
        Op::VramLoad => {
            let src = vram_point(words[1]);
            let size = vram_dimensions(words[2]);

            renderer.begin_vram_read(src, size);
            regs.set_transfer(TransferMode::VramRead {
                remaining: vram_word_count(size),
            });
            regs.vram_read_pending();
        }
        Op::DrawMode => regs.set_texture_page(words[0]),
        Op::TexWindow => regs.set_texture_window(words[0]),
        Op::DrawAreaStart => regs.set_draw_area_start(words[0]),
        Op::DrawAreaEnd => regs.set_draw_area_end(words[0]),
        Op::DrawOffset => regs.set_draw_offset(words[0]),
        Op::MaskSettings => regs.set_mask_settings(words[0]),
    }
}

fn run_polygon(
    quad: bool,
    flags: PrimFlags,
    regs: &mut Registers,
    renderer: &mut dyn Renderer,
    words: &[u32],
) {
    let count = if quad { 4 } else { 3 };
    let mut vertices = [Vertex::default(); 4];
    let mut tex = TextureAttrs::default();

    let mut i = 1;
    for (v, vertex) in vertices.iter_mut().take(count).enumerate() {
        let color = if v > 0 && flags.gouraud {
            let c = words[i];
            i += 1;
            c
        } else {
            words[0]
        };

        *vertex = Vertex::from_word(words[i], color);
        i += 1;

        if flags.textured {
            let t = words[i];
            i += 1;

            vertex.set_texel(t);
            match v {
                0 => tex.set_clut(t),
                1 => {
                    // The second texel word rewrites the live page state
                    regs.set_texture_page_from_poly(t >> 16);
                    tex.page = regs.texture_page();
                }
                _ => (),
            }
        }
    }

    let tex = flags.textured.then_some(tex);
    renderer.draw_polygon(&vertices[..count], tex, flags);
}

fn run_polyline(flags: PrimFlags, renderer: &mut dyn Renderer, words: &[u32]) {
    let base_color = words[0];
    let mut prev = Vertex::from_word(words[1], base_color);
    let mut i = 2;

    while i < words.len() {
        let color = if flags.gouraud {
            let c = words[i];
            if i >= 4 && i % 2 == 0 && c & POLYLINE_TERMINATOR_MASK == POLYLINE_TERMINATOR {
                break;
            }
            i += 1;
            c
        } else {
            base_color
        };

        if i >= words.len() {
            break;
        }

        let w = words[i];
        if !flags.gouraud && i >= 3 && w & POLYLINE_TERMINATOR_MASK == POLYLINE_TERMINATOR {
            break;
        }
        i += 1;

        let vertex = Vertex::from_word(w, color);
        renderer.draw_line(prev, vertex, flags);
        prev = vertex;
    }
}

fn run_rect(
    size: RectSize,
    flags: PrimFlags,
    regs: &mut Registers,
    renderer: &mut dyn Renderer,
    words: &[u32],
) {
    let mut top_left = Vertex::from_word(words[1], words[0]);

    let mut i = 2;
    let tex = if flags.textured {
        let t = words[i];
        i += 1;

        top_left.set_texel(t);

        let mut attrs = TextureAttrs::default();
        attrs.set_clut(t);
        // Sprites sample the page currently configured in the registers
        attrs.page = regs.texture_page();

        Some(attrs)
    } else {
        None
    };

    let dims = size.dimensions().unwrap_or_else(|| {
        let d = words[i];
        (d & 0x3ff, (d >> 16) & 0x1ff)
    });

    renderer.draw_rectangle(top_left, dims, tex, flags);
}

fn vram_point(word: u32) -> (u16, u16) {
    ((word & 0x3ff) as u16, ((word >> 16) & 0x3ff) as u16)
}

fn vram_dimensions(word: u32) -> (u16, u16) {
    let mut w = word & 0x3ff;
    let mut h = (word >> 16) & 0x1ff;

    if w == 0 {
        w = 1024;
    }
    if h == 0 {
        h = 512;
    }

    (w as u16, h as u16)
}

/// Pixels are 16 bits and travel two per word, rounded up
fn vram_word_count((w, h): (u16, u16)) -> u32 {
    (w as u32 * h as u32 + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::hardware::{Config, HardwareProfile};

    #[derive(Debug, PartialEq)]
    enum Event {
        Polygon(usize, bool),
        Line(Vertex, Vertex),
        Rect(Vertex, (u32, u32)),
        Fill(u32, (u16, u16), (u16, u16)),
        Copy((u16, u16), (u16, u16), (u16, u16)),
        BeginWrite((u16, u16), (u16, u16)),
        Write(Vec<u32>),
        BeginRead((u16, u16), (u16, u16)),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl Renderer for Recorder {
        fn draw_polygon(&mut self, v: &[Vertex], tex: Option<TextureAttrs>, _: PrimFlags) {
            self.events.push(Event::Polygon(v.len(), tex.is_some()));
        }

        fn draw_line(&mut self, a: Vertex, b: Vertex, _: PrimFlags) {
            self.events.push(Event::Line(a, b));
        }

        fn draw_rectangle(
            &mut self,
            tl: Vertex,
            size: (u32, u32),
            _: Option<TextureAttrs>,
            _: PrimFlags,
        ) {
            self.events.push(Event::Rect(tl, size));
        }

        fn fill_rectangle(&mut self, color: u32, tl: (u16, u16), size: (u16, u16)) {
            self.events.push(Event::Fill(color, tl, size));
        }

        fn clear_texture_cache(&mut self) {}

        fn copy_vram(&mut self, src: (u16, u16), dst: (u16, u16), size: (u16, u16)) {
            self.events.push(Event::Copy(src, dst, size));
        }

        fn begin_vram_write(&mut self, dst: (u16, u16), size: (u16, u16)) {
            self.events.push(Event::BeginWrite(dst, size));
        }

        fn vram_write(&mut self, words: &[u32]) {
            self.events.push(Event::Write(words.to_vec()));
        }

        fn begin_vram_read(&mut self, src: (u16, u16), size: (u16, u16)) {
            self.events.push(Event::BeginRead(src, size));
        }

        fn vram_read(&mut self) -> u32 {
            0
        }
    }

    fn setup() -> (Decoder, Registers, Recorder) {
        let profile = HardwareProfile::from_config(&Config::default()).unwrap();
        (
            Decoder::new(),
            Registers::new(profile, false),
            Recorder::default(),
        )
    }

    fn feed(dec: &mut Decoder, regs: &mut Registers, r: &mut Recorder, words: &[u32]) {
        let mut left = words;
        while !left.is_empty() {
            let n = dec.decode_one(regs, r, left, false);
            assert!(n >= 1 && n <= left.len());
            left = &left[n..];
        }
    }

    #[test]
    fn table_lengths() {
        let t = build_table();

        let fixed = |op: usize| match t[op].len {
            Len::Fixed(n) => n,
            _ => panic!("expected fixed length for {:02x}", op),
        };

        // Flat, textured, shaded and shaded-textured triangles and quads
        assert_eq!(fixed(0x20), 4);
        assert_eq!(fixed(0x24), 7);
        assert_eq!(fixed(0x28), 5);
        assert_eq!(fixed(0x2c), 9);
        assert_eq!(fixed(0x30), 6);
        assert_eq!(fixed(0x34), 9);
        assert_eq!(fixed(0x38), 8);
        assert_eq!(fixed(0x3c), 12);

        // Lines
        assert_eq!(fixed(0x40), 3);
        assert_eq!(fixed(0x50), 4);
        assert_eq!(t[0x48].len, Len::PolyLine { shaded: false });
        assert_eq!(t[0x58].len, Len::PolyLine { shaded: true });

        // Rectangles
        assert_eq!(fixed(0x60), 3);
        assert_eq!(fixed(0x64), 4);
        assert_eq!(fixed(0x68), 2);
        assert_eq!(fixed(0x74), 3);
        assert_eq!(fixed(0x7f), 3);

        // Transfers
        assert_eq!(fixed(0x80), 4);
        assert_eq!(fixed(0xa0), 3);
        assert_eq!(fixed(0xc0), 3);

        // Environment
        for op in 0xe1..=0xe6 {
            assert_eq!(fixed(op), 1);
        }
    }

    #[test]
    fn unknown_opcode_consumes_one_word() {
        let (mut dec, mut regs, mut r) = setup();

        let n = dec.decode_one(&mut regs, &mut r, &[0x1f00_0000, 0x1234], false);
        assert_eq!(n, 1);
        assert!(!dec.has_partial_command());
        assert!(r.events.is_empty());
    }

    #[test]
    fn flat_triangle_decodes() {
        let (mut dec, mut regs, mut r) = setup();

        let cmd = [0x2000_00ff, 0x0000_0000, 0x0000_0040, 0x0040_0000];
        let n = dec.decode_one(&mut regs, &mut r, &cmd, false);

        assert_eq!(n, 4);
        assert_eq!(r.events, vec![Event::Polygon(3, false)]);
    }

    #[test]
    fn split_delivery_resumes() {
        let (mut dec, mut regs, mut r) = setup();

        let cmd = [0x2800_00ff, 0, 0x40, 0x40_0000, 0x40_0040];

        // First call only carries two of the five words
        let n = dec.decode_one(&mut regs, &mut r, &cmd[..2], false);
        assert_eq!(n, 2);
        assert!(dec.has_partial_command());
        assert!(r.events.is_empty());
        // A pending command blocks the next DMA block
        assert!(!regs.status().ready_for_dma_block());

        let n = dec.decode_one(&mut regs, &mut r, &cmd[2..], false);
        assert_eq!(n, 3);
        assert!(!dec.has_partial_command());
        assert_eq!(r.events, vec![Event::Polygon(4, false)]);
        assert!(regs.status().ready_for_dma_block());
    }

    #[test]
    fn clear_drops_partial_command() {
        let (mut dec, mut regs, mut r) = setup();

        dec.decode_one(&mut regs, &mut r, &[0x2000_0000, 0], false);
        assert!(dec.has_partial_command());

        dec.clear(&mut regs);
        assert!(!dec.has_partial_command());
        assert!(regs.status().ready_for_dma_block());

        // The next word starts a fresh command
        let n = dec.decode_one(&mut regs, &mut r, &[0xe500_0000], false);
        assert_eq!(n, 1);
        assert!(r.events.is_empty());
    }

    #[test]
    fn polyline_stops_at_terminator() {
        let (mut dec, mut regs, mut r) = setup();

        let cmd = [
            0x4800_00ff,
            0x0000_0000,
            0x0000_0010,
            0x0010_0010,
            0x5000_5000,
        ];
        let n = dec.decode_one(&mut regs, &mut r, &cmd, false);

        assert_eq!(n, 5);
        assert_eq!(r.events.len(), 2);

        let expect_a = Vertex::from_word(0, 0x4800_00ff);
        let expect_b = Vertex::from_word(0x10, 0x4800_00ff);
        assert_eq!(r.events[0], Event::Line(expect_a, expect_b));
    }

    #[test]
    fn shaded_polyline_takes_two_words_per_segment() {
        let (mut dec, mut regs, mut r) = setup();

        // Color/vertex pairs; a terminator-looking word in a color slot
        // before the minimum length must not end the command
        let cmd = [
            0x5800_00ff,
            0x0000_0000,
            0x0000_ff00,
            0x0000_0010,
            0x5000_5000,
        ];
        let n = dec.decode_one(&mut regs, &mut r, &cmd, false);

        assert_eq!(n, 5);
        assert_eq!(r.events.len(), 1);
    }

    #[test]
    fn polyline_without_terminator_consumes_maximum_length() {
        let (mut dec, mut regs, mut r) = setup();

        let mut fed = 0usize;
        let word = 0x0001_0001u32;

        // Feed an endless stream of vertices; the decoder must give up at
        // the buffer limit
        let mut first = vec![0x4800_0000u32];
        first.extend(std::iter::repeat(word).take(99));
        fed += first.len();
        let n = dec.decode_one(&mut regs, &mut r, &first, false);
        assert_eq!(n, first.len());
        assert!(dec.has_partial_command());

        let chunk: Vec<u32> = std::iter::repeat(word).take(200).collect();
        let n = dec.decode_one(&mut regs, &mut r, &chunk, false);
        fed += n;

        assert_eq!(fed, COMMAND_BUFFER_DEPTH);
        assert!(!dec.has_partial_command());
        // 255 vertices drawn as 254 segments
        assert_eq!(r.events.len(), COMMAND_BUFFER_DEPTH - 2);
    }

    #[test]
    fn frame_skip_drops_draws_but_keeps_state() {
        let (mut dec, mut regs, mut r) = setup();

        let tri = [0x2000_00ff, 0, 0x40, 0x40_0000];
        let n = dec.decode_one(&mut regs, &mut r, &tri, true);
        assert_eq!(n, 4);
        assert!(r.events.is_empty());

        // Environment commands execute regardless
        let n = dec.decode_one(&mut regs, &mut r, &[0xe500_0000 | 0x10], true);
        assert_eq!(n, 1);
        assert_eq!(regs.display().draw_offset.x, 0x10);

        // Fills execute regardless
        let fill = [0x0200_0000, 0, 0x0010_0020];
        feed_skip(&mut dec, &mut regs, &mut r, &fill);
        assert_eq!(r.events.len(), 1);
    }

    fn feed_skip(dec: &mut Decoder, regs: &mut Registers, r: &mut Recorder, words: &[u32]) {
        let mut left = words;
        while !left.is_empty() {
            let n = dec.decode_one(regs, r, left, true);
            left = &left[n..];
        }
    }

    #[test]
    fn fill_rectangle_snaps_to_grid() {
        let (mut dec, mut regs, mut r) = setup();

        let cmd = [0x0212_3456, (0x10 << 16) | 0x23, (0x20 << 16) | 0x11];
        feed(&mut dec, &mut regs, &mut r, &cmd);

        assert_eq!(
            r.events,
            vec![Event::Fill(0x12_3456, (0x20, 0x10), (0x20, 0x20))]
        );
    }

    #[test]
    fn vram_store_streams_payload() {
        let (mut dec, mut regs, mut r) = setup();

        // 4x2 pixels -> 4 words of payload
        let header = [0xa000_0000, (2 << 16) | 8, (2 << 16) | 4];
        feed(&mut dec, &mut regs, &mut r, &header);

        assert_eq!(r.events, vec![Event::BeginWrite((8, 2), (4, 2))]);
        assert_eq!(regs.transfer(), TransferMode::VramWrite { remaining: 4 });

        // Payload split across two calls
        let n = dec.decode_one(&mut regs, &mut r, &[1, 2, 3], false);
        assert_eq!(n, 3);
        assert_eq!(regs.transfer(), TransferMode::VramWrite { remaining: 1 });

        // The tail word beyond the payload is left for the next command
        let n = dec.decode_one(&mut regs, &mut r, &[4, 0xe100_0000], false);
        assert_eq!(n, 1);
        assert_eq!(regs.transfer(), TransferMode::Primitives);

        assert_eq!(r.events[1], Event::Write(vec![1, 2, 3]));
        assert_eq!(r.events[2], Event::Write(vec![4]));
    }

    #[test]
    fn vram_load_arms_read_state() {
        let (mut dec, mut regs, mut r) = setup();

        let header = [0xc000_0000, 0, (1 << 16) | 3];
        feed(&mut dec, &mut regs, &mut r, &header);

        assert_eq!(r.events, vec![Event::BeginRead((0, 0), (3, 1))]);
        assert_eq!(regs.transfer(), TransferMode::VramRead { remaining: 2 });
        assert!(regs.status().ready_to_send_vram());
    }

    #[test]
    fn vram_copy_decodes_corners() {
        let (mut dec, mut regs, mut r) = setup();

        let cmd = [0x8000_0000, (4 << 16) | 8, (6 << 16) | 2, (2 << 16) | 2];
        feed(&mut dec, &mut regs, &mut r, &cmd);

        assert_eq!(r.events, vec![Event::Copy((8, 4), (2, 6), (2, 2))]);
    }

    #[test]
    fn zero_dimensions_mean_full_vram() {
        assert_eq!(vram_dimensions(0), (1024, 512));
        assert_eq!(vram_word_count((1024, 512)), 1024 * 512 / 2);
        assert_eq!(vram_word_count((3, 1)), 2);
    }

    #[test]
    fn textured_quad_updates_page_state() {
        let (mut dec, mut regs, mut r) = setup();

        // Texture page 5 in the second texel word
        let cmd = [
            0x2c00_0000,
            0x0000_0000,
            0x0000_0000,
            0x0000_0010,
            0x0005_0000,
            0x0000_0020,
            0x0000_0000,
            0x0020_0020,
            0x0000_0000,
        ];
        feed(&mut dec, &mut regs, &mut r, &cmd);

        assert_eq!(r.events, vec![Event::Polygon(4, true)]);
        assert_eq!(regs.texture_page().base_x, 5 * 64);
    }

    #[test]
    fn rectangle_sizes() {
        let (mut dec, mut regs, mut r) = setup();

        feed(&mut dec, &mut regs, &mut r, &[0x6800_0000, 0]);
        feed(&mut dec, &mut regs, &mut r, &[0x7000_0000, 0]);
        feed(&mut dec, &mut regs, &mut r, &[0x7800_0000, 0]);
        feed(
            &mut dec,
            &mut regs,
            &mut r,
            &[0x6000_0000, 0, (7 << 16) | 13],
        );

        let sizes: Vec<_> = r
            .events
            .iter()
            .map(|e| match e {
                Event::Rect(_, size) => *size,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();

        assert_eq!(sizes, vec![(1, 1), (8, 8), (16, 16), (13, 7)]);
    }
}
