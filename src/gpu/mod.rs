pub mod buffers;
pub mod pipeline;
pub mod renderer;
