mod btree;
mod meta;
mod node;
mod scan;

pub use btree::*;
pub use scan::*;
