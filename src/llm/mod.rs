//! Model invocation boundary.
//!
//! Clients classify their own failures into [`ModelError`] so callers can
//! tell an unavailable endpoint apart from any other failure.

pub mod gemini;

pub use crate::error::ModelError;
pub use gemini::GeminiClient;

use std::future::Future;

/// A text-in, text-out language model.
pub trait ModelClient {
    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

impl<T: ModelClient + Sync + ?Sized> ModelClient for &T {
    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send {
        (**self).generate(system_prompt, prompt)
    }
}

/// Client for runs that must not touch the network. Every call reports the
/// endpoint as unavailable, which routes analysis to the rule-based path.
#[derive(Debug, Default, Clone)]
pub struct OfflineClient;

impl ModelClient for OfflineClient {
    async fn generate(&self, _system_prompt: &str, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Unavailable("offline mode".to_string()))
    }
}
