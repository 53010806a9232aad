use tracing::warn;

use super::client::GeminiError;
use super::types::GenerateContentResponse;

/// Text of the first candidate, all parts joined.
///
/// A blocked prompt and a response with no text are both errors.
pub fn extract_reply_text(response: &GenerateContentResponse) -> Result<String, GeminiError> {
    let candidate = response.candidates.as_ref().and_then(|c| c.first());

    let text: String = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.iter().map(|part| part.text.as_str()).collect())
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        warn!(reason = %reason, "Gemini blocked the prompt");
        return Err(GeminiError::Blocked(reason));
    }

    warn!("Gemini returned empty answer (safety filter or empty response)");
    Err(GeminiError::EmptyResponse)
}
