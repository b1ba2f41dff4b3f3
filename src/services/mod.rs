pub mod catalog_writer;
pub mod classifier;
pub mod evidence_fetcher;
pub mod llm_service;
pub mod reference_parser;

pub use catalog_writer::{CatalogWriter, WorklistScope};
pub use classifier::Classifier;
pub use evidence_fetcher::EvidenceFetcher;
pub use llm_service::{ChatApi, LlmService};
pub use reference_parser::ReferenceParser;
