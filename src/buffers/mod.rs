//! Audio buffering layer: byte accumulation, FIFO framing, and the fixed-capacity ring
//! VAD segments are resolved against.

mod byte_accumulator;
mod frame_buffer;
mod vad_ring;

pub use byte_accumulator::ByteAccumulator;
pub use frame_buffer::FrameBuffer;
pub use vad_ring::VadRing;
