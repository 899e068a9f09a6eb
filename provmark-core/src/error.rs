use thiserror::Error;

/// Prefix given to every watermarked output file.
pub const WATERMARKED_PREFIX: &str = "watermarked_";

/// Image extensions picked up when enumerating a folder.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum ProvmarkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Watermark capacity exceeded: need {needed} blocks, image has {available}")]
    CapacityExceeded { needed: usize, available: usize },

    #[error("Watermark is empty")]
    EmptyWatermark,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProvmarkError>;
