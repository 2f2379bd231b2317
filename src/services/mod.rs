pub mod document;
pub mod fanout;
pub mod generation;
pub mod orchestrator;
pub mod payload;
pub mod selector;
