use async_trait::async_trait;
use std::sync::Mutex;

use super::llm::{AnalysisError, CompletionModel};

/// Canned completion model used by the unit and integration tests.
///
/// Prompts asking for the JSON analysis get `analysis`, every other prompt gets
/// `reply`. A `None` script answers with a 503 error.
pub struct ScriptedModel {
    reply: Option<String>,
    analysis: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(reply: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            analysis: Some(analysis.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            analysis: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_analysis(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            analysis: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let script = if prompt.contains("exact JSON format") {
            &self.analysis
        } else {
            &self.reply
        };

        script.clone().ok_or_else(|| AnalysisError::Status {
            status: 503,
            message: "scripted model unavailable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
