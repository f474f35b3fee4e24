mod buffer_pool;
mod frame;
mod replacer;

pub use buffer_pool::*;
pub use frame::*;
pub use replacer::*;
