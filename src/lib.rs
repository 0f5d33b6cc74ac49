//! procflow server components.

pub mod proxy;
