use crate::gemini::ChatModel;

use super::ItemError;

/// Stored in place of a translation that could not be produced.
pub const TRANSLATION_FAILED: &str = "[translation failed]";

pub const DEFAULT_TARGET_LANGUAGE: &str = "Brazilian Portuguese";

pub fn translation_prompt(target_language: &str, text: &str) -> String {
    format!(
        "You are a translator into {target_language}. Given the text below, reply only with \
         the translated text and no additional commentary.\nText: {text}"
    )
}

/// Translates `text`; an empty reply counts as a failure.
pub async fn translate(
    model: &mut impl ChatModel,
    target_language: &str,
    text: &str,
) -> Result<String, ItemError> {
    let reply = model
        .send_message(&translation_prompt(target_language, text))
        .await?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(ItemError::EmptyReply);
    }
    Ok(reply.to_string())
}
