use super::{deliverable, remote_id, simulate_call};
use crate::content::parse_product;
use async_trait::async_trait;
use chrono::Utc;
use relaycore::{Credentials, IntegrationAdapter, IntegrationCategory, IntegrationConfig, IntegrationError};
use serde_json::{json, Value};
use std::time::Duration;

/// Creates a product and its price from a generated product description.
pub struct StripeAdapter {
    latency: Duration,
}

impl StripeAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl IntegrationAdapter for StripeAdapter {
    fn config(&self) -> IntegrationConfig {
        IntegrationConfig::new("stripe", "Stripe", IntegrationCategory::Payment)
            .require("stripe_secret_key")
            .endpoint("products", "https://api.stripe.com/v1/products")
            .endpoint("prices", "https://api.stripe.com/v1/prices")
            .endpoint("checkout", "https://api.stripe.com/v1/checkout/sessions")
    }

    async fn deliver(&self, input: &Value, _credentials: &Credentials) -> Result<Value, IntegrationError> {
        let product = parse_product(&deliverable(input, "No product data provided")?);
        simulate_call(self.latency).await;

        Ok(json!({
            "productId": remote_id("prod"),
            "priceId": remote_id("price"),
            "name": product.name,
            "price": product.price,
            "created": true,
            "timestamp": Utc::now(),
        }))
    }
}
