//! cortex-store — the Node Store: reading, writing, and
//! round-tripping the on-disk `<id>.md` node file format.
//!
//! The format is front-matter (a restricted YAML subset, see [`yaml`]) plus
//! a markdown body, separated by `---` lines. [`parse::parse_node`] and
//! [`serialize::serialize_node`] are the two halves of the round trip;
//! [`NodeStore`] is the directory-level API everything else in the
//! workspace uses.

mod parse;
mod serialize;
mod store;
mod yaml;

pub use parse::parse_node;
pub use serialize::serialize_node;
pub use store::NodeStore;
