mod analyzer;
mod llm;
mod scripted;

pub use analyzer::*;
pub use llm::*;
pub use scripted::ScriptedModel;
