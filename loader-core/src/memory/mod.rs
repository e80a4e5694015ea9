//! Remote memory management operations.

pub mod allocator;
pub mod wide;
pub mod writer;

pub use allocator::RemoteBuffer;
pub use writer::write_wide_string;
