use thiserror::Error;

pub type GpuResult<T> = ::std::result::Result<T, GpuError>;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("Snapshot header magic mismatch")]
    BadMagic,
    #[error("Snapshot truncated: expected {expected} bytes, got {got}")]
    TruncatedSnapshot { expected: usize, got: usize },
    #[error("Snapshot encoding error: {0}")]
    Serialization(String),
    #[error("Unsupported VRAM height: {0}")]
    BadVramHeight(u32),
}
