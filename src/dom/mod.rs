//! Document model: arena-backed node tree, path addressing and rendering.

pub(crate) mod interp;
mod node;
mod path;
mod serialize;

pub use node::{Comment, Document, NodeData, NodeId};
pub use path::PathTarget;
pub use serialize::WriteOptions;
