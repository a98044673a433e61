mod fetch;
mod model;
mod parse;
mod store;

pub use fetch::{DataSource, MeshClient};
pub use model::{Link, LinkType, Node, NodeId, Role};
pub use store::EntityStore;
