pub mod ffmpeg;
pub mod ser;
pub mod source;

pub use source::{open_source, FrameSource, FrameStream};
