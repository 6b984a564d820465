//! Infrastructure Layer - fetching, parsing, orchestration, persistence

pub mod fetch;
pub mod orchestrators;
pub mod parsers;
pub mod repositories;
