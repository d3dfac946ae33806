pub mod http;
pub mod repository;

pub use http::{HttpBackend, HttpConfig};
pub use repository::{
    AccessError, AccessGrant, AccessValidator, CodeRunner, InMemoryRepository, ResultRepository,
    Storage, StorageError, SubmissionRepository, TestPublisher, TestRepository, UserDirectory,
};
