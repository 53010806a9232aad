use crate::arxiv::Paper;
use crate::gemini::ChatModel;

use super::ItemError;

const AFFIRMATIVE: &str = "yes";

/// Free-text topic a paper must concern to be kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceCondition(String);

impl RelevanceCondition {
    pub fn new(condition: &str) -> Self {
        Self(condition.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn classification_prompt(condition: &RelevanceCondition, paper: &Paper) -> String {
    format!(
        "You are an academic assistant. Given the abstract below, answer only 'yes' or 'no' \
         to whether it deals with: {}\n\nTitle: {}\nAbstract: {}",
        condition.as_str(),
        paper.title,
        paper.summary
    )
}

pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with(AFFIRMATIVE)
}

/// Asks the model whether `paper` concerns `condition`.
pub async fn classify(
    model: &mut impl ChatModel,
    condition: &RelevanceCondition,
    paper: &Paper,
) -> Result<bool, ItemError> {
    let reply = model
        .send_message(&classification_prompt(condition, paper))
        .await?;
    Ok(is_affirmative(&reply))
}
