use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};
use tastebook_shared::{Error, Result};

const SUGGEST_RECIPE_PROMPT: &str = r#"
You are a creative executive chef. Generate ONE completely original and realistic recipe using common ingredients from any cuisine in the world. The recipe must be expressed in valid JSON format.

VARIETY RULES:
- Each recipe must be significantly different from the previous ones in this conversation: vary cuisine, protein type, flavor profile, and cooking method.
- Do NOT repeat the same recipe or ingredient combinations within this conversation.
- Do NOT default to vegan. Use non-vegan recipes ~60% of the time unless specified otherwise.
- Maintain dietary diversity: mix omnivorous, vegetarian, vegan, paleo, keto, high-protein, etc.
- Avoid quinoa and curry unless explicitly requested.

RECIPE JSON FORMAT (strict):
{
  "title": string,
  "description": string,
  "prepTime": number,
  "servings": number,
  "utensils": string[],
  "categories": string[],
  "ingredients": [
    { "name": string, "unit": "unit" | "gr" | "ml" | "tsp" | "tbsp" | "cloves", "quantity": number }
  ],
  "instructions": string[]
}

CATEGORY OPTIONS (2-4 max):
"vegan", "vegetarian", "meat-based", "high-fat", "baked", "gluten-free", "low-carb", "keto", "paleo", "high-protein", "dessert", "breakfast", "lunch", "dinner", "snack", "soup"

RULES:
- Keep ingredients realistic and compatible.
- Use global cuisines and rotate them.
- Be creative but avoid exotic ingredients that are hard to find.
- Output ONLY the JSON object.
"#;

/// Outbound recipe generator. The production client talks to a
/// chat-completions API; tests queue canned documents instead.
#[async_trait]
pub trait SuggestionClient: Send + Sync {
    /// Fetch one raw recipe suggestion. The result is untrusted JSON; the
    /// caller runs it through the suggestion normalizer.
    async fn suggest(&self) -> Result<Value>;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }
}

/// Models wrap JSON in markdown fences often enough that stripping them is
/// part of the contract.
fn strip_fences(content: &str) -> &str {
    content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim_matches('`')
        .trim()
}

#[async_trait]
impl SuggestionClient for OpenAiClient {
    async fn suggest(&self) -> Result<Value> {
        let seed: f64 = rand::rng().random();
        let prompt = format!("{SUGGEST_RECIPE_PROMPT}\nRANDOMIZATION SEED: {seed}");

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.8,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Internal(format!("suggestion request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Internal(format!(
                "suggestion service returned {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| Error::Internal(format!("suggestion response unreadable: {err}")))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| Error::Internal("No response content from model".to_string()))?;

        serde_json::from_str(strip_fences(content)).map_err(|err| {
            Error::Internal(format!("Failed to parse suggested recipe JSON: {err}"))
        })
    }
}

/// Deterministic client for tests and offline development: pops queued
/// documents, then repeats the last one.
pub struct CannedSuggestionClient {
    queue: std::sync::Mutex<Vec<Value>>,
}

impl CannedSuggestionClient {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            queue: std::sync::Mutex::new(responses),
        }
    }
}

#[async_trait]
impl SuggestionClient for CannedSuggestionClient {
    async fn suggest(&self) -> Result<Value> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| Error::Internal("suggestion queue poisoned".to_string()))?;
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            queue
                .first()
                .cloned()
                .ok_or_else(|| Error::Internal("no canned suggestion queued".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("`{\"a\":1}`"), "{\"a\":1}");
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn canned_client_pops_then_repeats() {
        let client =
            CannedSuggestionClient::new(vec![json!({"title": "A"}), json!({"title": "B"})]);
        assert_eq!(client.suggest().await.unwrap()["title"], "A");
        assert_eq!(client.suggest().await.unwrap()["title"], "B");
        assert_eq!(client.suggest().await.unwrap()["title"], "B");
    }
}
