//! In-memory [`LanguageModel`] test double, grounded on the teacher's
//! `adapter.rs::tests::MockBackend` pattern.

use async_trait::async_trait;
use parking_lot::Mutex;
use podcast_core::{LanguageModel, Result};

/// Returns a fixed queue of responses in order, one per `generate` call,
/// repeating the last response once the queue is drained. Records every
/// `(system_prompt, user_prompt)` pair it was called with for assertions.
pub struct MockLanguageModel {
    responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLanguageModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self { responses: Mutex::new(responses), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls.lock().push((system_prompt.to_string(), user_prompt.to_string()));
        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            Ok(responses.first().cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_responses_in_order_then_repeats_last() {
        let mock = MockLanguageModel::new(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(mock.generate("sys", "a").await.unwrap(), "first");
        assert_eq!(mock.generate("sys", "b").await.unwrap(), "second");
        assert_eq!(mock.generate("sys", "c").await.unwrap(), "second");
        assert_eq!(mock.calls().len(), 3);
    }
}
