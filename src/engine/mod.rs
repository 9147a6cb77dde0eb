pub mod matching;
pub mod orchestrator;
pub mod scheduler;
