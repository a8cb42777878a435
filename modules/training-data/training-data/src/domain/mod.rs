//! Unified implementation: one generic repository per entity kind, every
//! call wrapped in retry, timeout and circuit breaking.

pub mod mapping;
pub mod payload;
pub mod repository;
pub mod service;
pub mod tables;
