//! Distributed coordination structures built on the symmetric heap.

pub mod bitmap;
pub mod pvector;
pub mod sliding_queue;

pub use bitmap::Bitmap;
pub use pvector::Pvector;
pub use sliding_queue::{QueueBuffer, SlidingQueue};
