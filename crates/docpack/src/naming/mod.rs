pub mod registry;

pub use registry::{conflicts, qualified_name, NameRegistry};
