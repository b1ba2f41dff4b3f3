pub mod cf_api;
pub mod page_client;

pub use cf_api::{CodeforcesApi, ContestApi, ContestProblems};
pub use page_client::{HttpPageFetcher, PageFetcher, PageResponse};
