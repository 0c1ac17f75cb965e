//! Personalized product recommendations
//!
//! Two chained calls: the model first profiles the shopper from their
//! purchases and browsing, then ranks the catalogue against that profile.

use crate::llm::LanguageModel;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Products included in the prompt catalogue
pub const MAX_CONTEXT_PRODUCTS: usize = 20;
/// Description characters kept per product
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub date: String,
    pub product: String,
    pub category: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowsingSession {
    pub date: String,
    pub viewed_products: Vec<String>,
}

/// Input for the recommendation flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopperCase {
    pub user_profile: Value,
    #[serde(default)]
    pub purchase_history: Vec<Purchase>,
    #[serde(default)]
    pub browsing_behavior: Vec<BrowsingSession>,
    #[serde(default)]
    pub available_products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendations {
    pub user_analysis: String,
    pub recommendations: String,
}

/// Catalogue block for prompts: first 20 products, prices to the cent, descriptions cut to 100 chars.
pub fn format_product_context(products: &[Product]) -> String {
    products
        .iter()
        .take(MAX_CONTEXT_PRODUCTS)
        .enumerate()
        .map(|(i, p)| {
            let preview: String = p.description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            format!(
                "Product {}: {} - ${:.2}\nCategory: {}, Brand: {}\nDescription: {}...\n\n",
                i + 1,
                p.name,
                p.price,
                p.category,
                p.brand,
                preview
            )
        })
        .collect()
}

pub struct ProductRecommender {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl ProductRecommender {
    pub fn new(model: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }

    pub async fn analyze_user_behavior(
        &self,
        user_profile: &Value,
        purchases: &[Purchase],
        browsing: &[BrowsingSession],
    ) -> Result<String> {
        let prompt = format!(
            r#"Analyze this user's behavior to identify preferences, patterns, and potential interests:

USER PROFILE:
{}

PURCHASE HISTORY:
{}

BROWSING BEHAVIOR:
{}

Provide a comprehensive analysis that includes:
1. Key demographic insights and how they might influence preferences
2. Primary product categories of interest based on purchases and browsing
3. Price sensitivity and typical spending patterns
4. Brand preferences or loyalty indicators
5. Seasonal or situational shopping patterns
6. Potential upcoming needs based on past behavior

Focus on extracting actionable insights for product recommendations."#,
            serde_json::to_string_pretty(user_profile)?,
            serde_json::to_string_pretty(purchases)?,
            serde_json::to_string_pretty(browsing)?,
        );

        info!(
            purchases = purchases.len(),
            sessions = browsing.len(),
            "Analyzing shopper behavior"
        );

        self.model.invoke(&prompt, self.temperature).await
    }

    pub async fn generate_recommendations(&self, case: &ShopperCase) -> Result<Recommendations> {
        let user_analysis = self
            .analyze_user_behavior(&case.user_profile, &case.purchase_history, &case.browsing_behavior)
            .await?;

        let prompt = format!(
            r#"Generate personalized product recommendations based on this user analysis:

USER ANALYSIS:
{}

AVAILABLE PRODUCTS:
{}
Using the user analysis and available products, follow these steps:
1. Identify key preferences and interests from the user's profile and behavior
2. Find patterns in past purchases that suggest product categories of interest
3. Consider the user's browsing behavior to identify current interests
4. Match these preferences to the available products
5. Rank recommendations based on relevance and likelihood of interest

Provide your top 5 product recommendations with a detailed explanation for each,
including why this specific product matches the user's preferences and behavior.
Format as a numbered list with product name and reasoning for each recommendation."#,
            user_analysis.trim(),
            format_product_context(&case.available_products),
        );

        info!(
            catalogue = case.available_products.len().min(MAX_CONTEXT_PRODUCTS),
            "Ranking products"
        );

        let recommendations = self.model.invoke(&prompt, self.temperature).await?;

        Ok(Recommendations {
            user_analysis,
            recommendations,
        })
    }

    /// Why one product suits this shopper
    pub async fn generate_explanation(
        &self,
        product_id: &str,
        user_profile: &Value,
        recommendation_context: &str,
    ) -> Result<String> {
        let prompt = format!(
            r#"Generate a personalized explanation for why this product was recommended to this specific user:

USER PROFILE:
{}

PRODUCT RECOMMENDATION ({}):
{}

Create a personalized explanation that:
1. Connects specific product features to the user's preferences or needs
2. References relevant past purchases or browsing behavior
3. Highlights how this product complements items they already own
4. Explains why this is the right time for this purchase
5. Adds a personal touch based on the user's demographics or interests

The explanation should feel tailored to this specific user, not generic."#,
            serde_json::to_string_pretty(user_profile)?,
            product_id,
            recommendation_context.trim(),
        );

        info!(product_id, "Explaining recommendation");

        self.model.invoke(&prompt, self.temperature).await
    }
}
