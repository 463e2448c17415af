pub mod border;
pub mod color;
pub mod compose;
pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod profile;
pub mod sampler;
