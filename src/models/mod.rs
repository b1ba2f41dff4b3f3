pub mod category;
pub mod problem;

pub use category::Category;
pub use problem::{CatalogRecord, Evidence, ProblemRef, Source, WorklistRow};
