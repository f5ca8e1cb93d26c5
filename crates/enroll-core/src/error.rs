use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Registry errors
    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("Duplicate device id: {0}")]
    DuplicateDevice(String),

    #[error("Unknown device kind: {0}")]
    UnknownDeviceKind(String),

    // Simulation profile errors
    #[error("Invalid success rate for {operation}: {rate} (expected 0.0..=1.0)")]
    InvalidSuccessRate { operation: String, rate: f64 },

    #[error("Invalid minimum quality for {operation}: {quality} (expected 0..=99)")]
    InvalidMinQuality { operation: String, quality: u8 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
