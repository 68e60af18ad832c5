//! Collaborator implementations.

pub mod command_evaluator;
pub mod command_media;
pub mod jsonl_store;
pub mod mock_evaluator;

pub use command_evaluator::CommandEvaluator;
pub use command_media::CommandMediaPreparer;
pub use jsonl_store::JsonlResultStore;
pub use mock_evaluator::MockEvaluator;
