use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use super::llm::{AnalysisError, CompletionModel};

pub const FALLBACK_ACTIONS: &str = "Review manually and respond appropriately";
pub const FALLBACK_REPLY: &str =
    "Thank you for taking the time to share your feedback with us. We truly appreciate it.";

const REPLY_PROMPT: &str = r#"You are a friendly customer service AI. A customer left a {rating}-star review.

Review: {review}

Generate a warm, professional response that:
- Thanks them for their feedback
- Acknowledges their specific points
- If positive (4-5 stars): Express appreciation
- If negative (1-2 stars): Apologize and show empathy
- If neutral (3 stars): Thank them and ask for more details

Keep it brief (2-3 sentences) and genuine.

Response:"#;

const ANALYSIS_PROMPT: &str = r#"Analyze this customer review and provide insights for the admin team.

Rating: {rating} stars
Review: {review}

Provide your analysis in this exact JSON format:
{
    "summary": "One-sentence summary of the review",
    "recommended_actions": "Specific action items for the team (be concrete and actionable)"
}

Response:"#;

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

fn code_fence() -> &'static Regex {
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```").expect("code fence pattern is valid")
    })
}

pub fn fallback_summary(rating: u8) -> String {
    format!("{}-star review requiring attention", rating)
}

/// Result of decoding the structured summary/actions response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    Decoded { summary: String, actions: String },
    Fallback,
}

impl Analysis {
    /// Summary and recommended actions, substituting the fixed fallback text when undecoded.
    pub fn into_parts(self, rating: u8) -> (String, String) {
        match self {
            Analysis::Decoded { summary, actions } => (summary, actions),
            Analysis::Fallback => (fallback_summary(rating), FALLBACK_ACTIONS.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct StructuredAnalysis {
    summary: String,
    recommended_actions: String,
}

/// Removes one enclosing markdown code fence, if present.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    code_fence()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str())
}

pub fn decode_analysis(content: &str) -> Analysis {
    match serde_json::from_str::<StructuredAnalysis>(strip_code_fence(content)) {
        Ok(parsed) => Analysis::Decoded {
            summary: parsed.summary.trim().to_string(),
            actions: parsed.recommended_actions.trim().to_string(),
        },
        Err(e) => {
            warn!("Structured analysis was not decodable, using fallback: {}", e);
            Analysis::Fallback
        }
    }
}

fn render_prompt(template: &str, rating: u8, review: &str) -> String {
    template
        .replace("{rating}", &rating.to_string())
        .replace("{review}", review)
}

#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn CompletionModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Customer-facing reply to the review.
    pub async fn respond(&self, rating: u8, review: &str) -> Result<String, AnalysisError> {
        let completion = self
            .model
            .complete(&render_prompt(REPLY_PROMPT, rating, review))
            .await?;
        let reply = completion.trim();
        if reply.is_empty() {
            warn!("Model {} returned an empty reply", self.model_name());
            return Ok(FALLBACK_REPLY.to_string());
        }
        Ok(reply.to_string())
    }

    /// Internal summary and recommended actions. Only the model call itself can fail.
    pub async fn analyze(&self, rating: u8, review: &str) -> Result<Analysis, AnalysisError> {
        let completion = self
            .model
            .complete(&render_prompt(ANALYSIS_PROMPT, rating, review))
            .await?;
        let analysis = decode_analysis(&completion);
        info!(
            decoded = matches!(analysis, Analysis::Decoded { .. }),
            "Analyzed {}-star review",
            rating
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ScriptedModel;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"summary\": \"a\", \"recommended_actions\": \"b\"}\n```";
        assert_eq!(
            strip_code_fence(raw),
            "{\"summary\": \"a\", \"recommended_actions\": \"b\"}"
        );
    }

    #[test]
    fn strips_bare_fence_and_leaves_plain_text() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"x\": 1}  "), "{\"x\": 1}");
    }

    #[test]
    fn decodes_fenced_object() {
        let raw = "```json\n{\"summary\": \" Happy guest \", \"recommended_actions\": \"Share with staff\"}\n```";
        assert_eq!(
            decode_analysis(raw),
            Analysis::Decoded {
                summary: "Happy guest".to_string(),
                actions: "Share with staff".to_string(),
            }
        );
    }

    #[test]
    fn malformed_or_incomplete_output_falls_back() {
        assert_eq!(decode_analysis("Sure! Here is the summary."), Analysis::Fallback);
        assert_eq!(decode_analysis("{\"summary\": \"only one\"}"), Analysis::Fallback);
        assert_eq!(
            decode_analysis("{\"summary\": 3, \"recommended_actions\": \"x\"}"),
            Analysis::Fallback
        );
    }

    #[test]
    fn fallback_parts_mention_rating() {
        for rating in 1..=5u8 {
            let (summary, actions) = Analysis::Fallback.into_parts(rating);
            assert_eq!(summary, format!("{}-star review requiring attention", rating));
            assert_eq!(actions, "Review manually and respond appropriately");
        }
    }

    #[tokio::test]
    async fn prompts_embed_rating_and_review() {
        let model = Arc::new(ScriptedModel::new("  Thanks so much!  ", "not json"));
        let analyzer = Analyzer::new(model.clone());

        assert_eq!(analyzer.respond(4, "Nice patio").await.unwrap(), "Thanks so much!");
        assert_eq!(analyzer.analyze(4, "Nice patio").await.unwrap(), Analysis::Fallback);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("left a 4-star review"));
        assert!(prompts[0].contains("Review: Nice patio"));
        assert!(prompts[1].contains("Rating: 4 stars"));
        assert!(prompts[1].contains("\"recommended_actions\""));
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback_text() {
        let analyzer = Analyzer::new(Arc::new(ScriptedModel::new("   ", "{}")));
        assert_eq!(analyzer.respond(3, "Fine").await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn call_failure_propagates() {
        let analyzer = Analyzer::new(Arc::new(ScriptedModel::failing()));
        assert!(analyzer.respond(2, "Cold").await.is_err());
        assert!(analyzer.analyze(2, "Cold").await.is_err());
    }
}
