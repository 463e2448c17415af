use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarcodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open video: {0}")]
    Open(String),

    #[error("Problem decoding the video frame: {0}")]
    Decode(String),

    #[error("There are more pixel columns ({columns}) than output image width ({width})")]
    OversizedSequence { columns: usize, width: usize },

    #[error("Cannot write barcode image: {0}")]
    Write(String),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BarcodeError>;
