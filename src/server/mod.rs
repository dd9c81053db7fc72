//! Serving side of an agent: task state machine and HTTP endpoint

pub mod handler;
pub mod manager;
pub mod router;

pub use manager::{TaskManager, TaskStore};
pub use router::A2AServer;
