mod entity;
mod package;
mod publisher;
mod solution;

pub use entity::EntityRef;
pub use package::ExportedPackage;
pub use publisher::PublisherRef;
pub use solution::{ComponentType, SolutionRef, DEFAULT_SOLUTION_VERSION};
