use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("population of {requested} exceeds GPU buffer capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    #[error("readback map failed: {0}")]
    MapFailed(String),
    #[error("readback size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}
