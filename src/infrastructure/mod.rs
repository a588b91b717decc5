//! Infrastructure layer - Cache backends, storage, repositories and observability

pub mod cache;
pub mod logging;
pub mod observability;
pub mod repository;
pub mod storage;
