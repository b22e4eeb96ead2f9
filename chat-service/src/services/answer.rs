//! Catalog-grounded answers from the local engine.

use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;

use crate::models::ProductRecord;
use crate::services::metrics;
use crate::services::providers::{GenerationParams, LocalEngine};
use crate::services::store::Catalog;

pub const NO_DETAILS_REPLY: &str = "Sorry, no details found for this product.";

const MAX_ANSWER_TOKENS: i32 = 50;
const ANSWER_TEMPERATURE: f32 = 0.1;
/// Crude truncation: may clip mid-sentence.
const STOP_SEQUENCES: [&str; 3] = ["\n", "?", "anything else"];

/// Answers a free-text question about one catalog product.
///
/// Returns data only; recording the exchange is the router's job.
pub struct LocalAnswerGenerator {
    catalog: Arc<dyn Catalog>,
    engine: Arc<dyn LocalEngine>,
}

impl LocalAnswerGenerator {
    pub fn new(catalog: Arc<dyn Catalog>, engine: Arc<dyn LocalEngine>) -> Self {
        Self { catalog, engine }
    }

    pub async fn answer(
        &self,
        brand: &str,
        product: &str,
        question: &str,
    ) -> Result<String, AppError> {
        let Some(record) = self.catalog.product_details(brand, product).await? else {
            tracing::info!(brand = %brand, product = %product, "No catalog record for product");
            return Ok(NO_DETAILS_REPLY.to_string());
        };

        let prompt = build_prompt(&build_context(&record), question);
        let provider = self.engine.name();
        let started = Instant::now();

        let result = self.engine.complete(&prompt, &answer_params()).await;
        metrics::record_provider_latency(provider, started.elapsed().as_secs_f64());

        match result {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                metrics::record_provider_error(provider, e.kind());
                tracing::error!(
                    error = %e,
                    brand = %brand,
                    product = %product,
                    "Local engine failed"
                );
                Err(AppError::BadGateway(format!("local answer engine: {}", e)))
            }
        }
    }
}

/// `key: value` pairs joined by `, `.
pub fn build_context(record: &ProductRecord) -> String {
    record
        .attributes
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Answer strictly based on the product details:\n\n\
         Product Details: {}\n\
         Question: {}\n\
         Answer:",
        context, question
    )
}

pub fn answer_params() -> GenerationParams {
    GenerationParams {
        max_tokens: MAX_ANSWER_TOKENS,
        temperature: ANSWER_TEMPERATURE,
        stop_sequences: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
    }
}
