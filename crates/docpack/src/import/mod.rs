pub mod item;
pub mod list;

pub use item::{DocumentFormat, ItemId, SourceItem};
pub use list::{Added, ImportList};
