//! Save-state capture of the register file, framed the same way the host
//! stores the rest of its state: a 4-byte magic, a little-endian length
//! and a flexbuffers payload.

use serde::{Deserialize, Serialize};

use crate::error::{GpuError, GpuResult};
use crate::gpu::CONTROL_HISTORY_DEPTH;
use crate::gpu::regs::Registers;

const MAGIC: &[u8; 4] = b"GPB1";
const HEADER_LEN: usize = 8;

/// Opaque register-state snapshot. VRAM contents belong to the renderer
/// and travel separately.
#[derive(Serialize, Deserialize, Clone)]
pub struct Snapshot {
    registers: Registers,
    #[serde(with = "serde_big_array::BigArray")]
    control_history: [u32; CONTROL_HISTORY_DEPTH],
}

impl Snapshot {
    pub(crate) fn new(
        registers: Registers,
        control_history: [u32; CONTROL_HISTORY_DEPTH],
    ) -> Snapshot {
        Snapshot {
            registers,
            control_history,
        }
    }

    pub(crate) fn registers(&self) -> &Registers {
        &self.registers
    }

    pub(crate) fn control_history(&self) -> &[u32; CONTROL_HISTORY_DEPTH] {
        &self.control_history
    }

    pub fn to_bytes(&self) -> GpuResult<Vec<u8>> {
        let mut fb = flexbuffers::FlexbufferSerializer::new();

        self.serialize(&mut fb)
            .map_err(|e| GpuError::Serialization(e.to_string()))?;

        let payload = fb.view();

        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);

        Ok(out)
    }

    pub fn from_bytes(buf: &[u8]) -> GpuResult<Snapshot> {
        if buf.len() < HEADER_LEN {
            return Err(GpuError::TruncatedSnapshot {
                expected: HEADER_LEN,
                got: buf.len(),
            });
        }

        if &buf[0..4] != MAGIC {
            return Err(GpuError::BadMagic);
        }

        let len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;

        if buf.len() < HEADER_LEN + len {
            return Err(GpuError::TruncatedSnapshot {
                expected: HEADER_LEN + len,
                got: buf.len(),
            });
        }

        let payload = &buf[HEADER_LEN..HEADER_LEN + len];

        let reader = flexbuffers::Reader::get_root(payload)
            .map_err(|e| GpuError::Serialization(e.to_string()))?;

        Snapshot::deserialize(reader).map_err(|e| GpuError::Serialization(e.to_string()))
    }
}
