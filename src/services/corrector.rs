// Corrector Abstraction
// Common interface over spelling correction backends

use crate::models::CorrectionResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrectorError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Model not configured: {0}")]
    NotConfigured(String),
    #[error("Failed to load {model}: {reason}")]
    LoadFailed { model: String, reason: String },
}

/// A spelling correction model evaluated by the harness.
///
/// Implementations are called strictly one sentence at a time.
#[allow(async_fn_in_trait)]
pub trait Corrector {
    /// Display name used in logs and reports.
    fn model_name(&self) -> &str;

    /// Prepare the model. Calling it more than once is a no-op.
    async fn load(&mut self) -> Result<(), CorrectorError>;

    fn is_loaded(&self) -> bool;

    async fn correct(&self, sentence: &str) -> Result<CorrectionResult, CorrectorError>;

    async fn correct_batch(&self, sentences: &[String]) -> Result<Vec<CorrectionResult>, CorrectorError> {
        let mut results = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            results.push(self.correct(sentence).await?);
        }
        Ok(results)
    }

    async fn detect_error(&self, sentence: &str) -> Result<bool, CorrectorError> {
        Ok(self.correct(sentence).await?.has_error)
    }

    async fn detect_batch(&self, sentences: &[String]) -> Result<Vec<bool>, CorrectorError> {
        let mut flags = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            flags.push(self.detect_error(sentence).await?);
        }
        Ok(flags)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::ErrorDetail;
    use std::collections::HashMap;

    /// In-memory corrector answering from a script keyed by sentence.
    #[derive(Default)]
    pub struct ScriptedCorrector {
        pub answers: HashMap<String, Result<String, String>>,
        pub loaded: bool,
        pub load_calls: usize,
    }

    impl ScriptedCorrector {
        /// `Ok(corrected)` answers; equal text means nothing detected. `Err(msg)` fails the call.
        pub fn new(answers: &[(&str, Result<&str, &str>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(s, a)| (s.to_string(), (*a).map(str::to_string).map_err(str::to_string)))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl Corrector for ScriptedCorrector {
        fn model_name(&self) -> &str {
            "Scripted"
        }

        async fn load(&mut self) -> Result<(), CorrectorError> {
            self.load_calls += 1;
            self.loaded = true;
            Ok(())
        }

        fn is_loaded(&self) -> bool {
            self.loaded
        }

        async fn correct(&self, sentence: &str) -> Result<CorrectionResult, CorrectorError> {
            match self.answers.get(sentence) {
                Some(Ok(corrected)) => {
                    let errors = sentence
                        .chars()
                        .zip(corrected.chars())
                        .enumerate()
                        .filter(|(_, (a, b))| a != b)
                        .map(|(i, (a, b))| ErrorDetail {
                            position: Some(i),
                            original: a.to_string(),
                            corrected: b.to_string(),
                        })
                        .collect();
                    Ok(CorrectionResult::new(sentence, corrected.clone(), errors))
                }
                Some(Err(msg)) => Err(CorrectorError::ApiError {
                    status: 500,
                    message: msg.clone(),
                }),
                None => Ok(CorrectionResult::new(sentence, sentence, vec![])),
            }
        }
    }

    #[tokio::test]
    async fn test_default_batch_methods() {
        let corrector = ScriptedCorrector::new(&[
            ("今天天汽很好", Ok("今天天气很好")),
            ("我门一起去公园", Ok("我门一起去公园")),
        ]);
        let sentences = vec!["今天天汽很好".to_string(), "我门一起去公园".to_string()];

        let flags = corrector.detect_batch(&sentences).await.unwrap();
        assert_eq!(flags, vec![true, false]);

        let results = corrector.correct_batch(&sentences).await.unwrap();
        assert_eq!(results[0].errors[0].position, Some(3));
        assert_eq!(results[0].errors[0].corrected, "气");
    }

    #[tokio::test]
    async fn test_batch_stops_on_failure() {
        let corrector = ScriptedCorrector::new(&[("坏句", Err("boom"))]);
        let sentences = vec!["好句".to_string(), "坏句".to_string()];
        assert!(corrector.correct_batch(&sentences).await.is_err());
    }
}
