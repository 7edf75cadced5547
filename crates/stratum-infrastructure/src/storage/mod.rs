//! Low-level file storage primitives.

pub mod atomic_file;
pub mod lock;

pub use atomic_file::AtomicJsonFile;
pub use lock::WorkspaceLock;
