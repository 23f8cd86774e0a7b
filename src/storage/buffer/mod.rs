pub mod error;
pub mod frame;
pub mod guard;
pub mod manager;
pub mod replacer;

pub use error::BufferPoolError;
pub use frame::{Frame, PageData};
pub use guard::{PageGuard, ReadPageGuard, WritePageGuard};
pub use manager::BufferPoolManager;
pub use replacer::LruKReplacer;
