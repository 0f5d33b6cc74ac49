mod app_config;
mod defaults;
mod documents;
mod step;
mod workflow;

pub use app_config::AppConfig;
pub use defaults::{default_document, default_steps};
pub use documents::{DocEntry, DocItem, Documents};
pub use step::{AmountFilter, StepId, SubTask, WorkflowStep};
pub use workflow::{ModelError, WorkflowDocument};
