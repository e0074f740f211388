//! LLM-backed assistant
//!
//! Implements the [`Assistant`] and [`ProductAdvisor`] collaborators on top
//! of an [`LLMProvider`]. Plan generation and revision use the planning
//! model; classification, extraction and product advice use the cheaper
//! extraction model.
//!
//! Judgment calls degrade to a [`Parsed::Fallback`] when the provider fails
//! or answers with something that is not the requested JSON. Plan calls
//! return an error instead, since there is no meaningful neutral plan.

pub mod prompts;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use sdk::collaborators::{
    Assistant, CatalogProduct, Classification, Intent, Parsed, PlanRequest, PreferenceExtraction,
    ProductAdvisor, ProductSelection,
};
use sdk::errors::EngineError;
use sdk::types::{FamilyMember, Ingredient, MealPlan, MemberRole, Preference, Recipe, SessionState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::formatter::format_quantity;
use crate::i18n::Locale;
use crate::llm::{parse_structured, CompletionRequest, LLMProvider};
use prompts::fill;

const PLAN_MAX_TOKENS: u32 = 4096;
const PLAN_TEMPERATURE: f32 = 0.7;

pub struct LlmAssistant {
    provider: Arc<dyn LLMProvider>,
    planning_model: String,
    extraction_model: String,
    locale: Locale,
}

impl LlmAssistant {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        planning_model: impl Into<String>,
        extraction_model: impl Into<String>,
        locale: Locale,
    ) -> Self {
        Self {
            provider,
            planning_model: planning_model.into(),
            extraction_model: extraction_model.into(),
            locale,
        }
    }

    /// Ask the extraction model for JSON; any failure becomes the reason
    async fn judge<T: DeserializeOwned>(
        &self,
        prompt: String,
        max_tokens: u32,
    ) -> std::result::Result<T, String> {
        let request = CompletionRequest::new(&self.extraction_model, prompts::SYSTEM_JSON, prompt)
            .with_max_tokens(max_tokens)
            .with_temperature(0.0);
        let answer = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| e.to_string())?;
        parse_structured(&answer).map_err(|e| e.to_string())
    }

    async fn plan(&self, prompt: String) -> Result<MealPlan, EngineError> {
        let request = CompletionRequest::new(&self.planning_model, prompts::SYSTEM_JSON, prompt)
            .with_max_tokens(PLAN_MAX_TOKENS)
            .with_temperature(PLAN_TEMPERATURE);
        let answer = self.provider.complete(&request).await?;
        let raw: RawPlan = parse_structured(&answer)?;
        Ok(raw.into_meal_plan())
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawPlan {
    #[serde(default)]
    plan: Vec<RawPlanEntry>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawPlanEntry {
    date: String,
    recipe: RawRecipe,
}

fn default_servings() -> u32 {
    4
}

fn default_category() -> String {
    "other".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRecipe {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_servings")]
    servings: u32,
    #[serde(default)]
    prep_time_minutes: u32,
    #[serde(default)]
    cook_time_minutes: u32,
    #[serde(default)]
    cuisine: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ingredients: Vec<RawIngredient>,
    #[serde(default)]
    instructions: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawIngredient {
    name: String,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    unit: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    optional: bool,
}

impl RawPlan {
    fn from_recipes(recipes: &[Recipe]) -> Self {
        Self {
            plan: recipes
                .iter()
                .map(|recipe| RawPlanEntry {
                    date: recipe.planned_date.to_string(),
                    recipe: RawRecipe {
                        name: recipe.name.clone(),
                        description: recipe.description.clone(),
                        servings: recipe.servings,
                        prep_time_minutes: recipe.prep_time_minutes,
                        cook_time_minutes: recipe.cook_time_minutes,
                        cuisine: recipe.cuisine.clone(),
                        tags: recipe.tags.clone(),
                        ingredients: recipe
                            .ingredients
                            .iter()
                            .map(|ingredient| RawIngredient {
                                name: ingredient.name.clone(),
                                quantity: ingredient.quantity,
                                unit: ingredient.unit.clone(),
                                category: ingredient.category.clone(),
                                optional: ingredient.optional,
                            })
                            .collect(),
                        instructions: recipe.instructions.clone(),
                    },
                })
                .collect(),
            reasoning: String::new(),
        }
    }

    /// Entries with an unreadable date or no name are dropped
    fn into_meal_plan(self) -> MealPlan {
        let mut recipes = Vec::with_capacity(self.plan.len());
        for entry in self.plan {
            let Ok(planned_date) = NaiveDate::parse_from_str(entry.date.trim(), "%Y-%m-%d") else {
                warn!(date = %entry.date, "Skipping recipe with invalid date");
                continue;
            };
            let raw = entry.recipe;
            if raw.name.trim().is_empty() {
                continue;
            }

            let ingredients = raw
                .ingredients
                .into_iter()
                .filter(|ingredient| !ingredient.name.trim().is_empty())
                .map(|ingredient| {
                    let mut item = Ingredient::new(
                        ingredient.name.trim(),
                        ingredient.quantity.max(0.0),
                        ingredient.unit,
                        ingredient.category.to_lowercase(),
                    );
                    item.optional = ingredient.optional;
                    item
                })
                .collect();

            recipes.push(Recipe {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: None,
                planned_date,
                name: raw.name.trim().to_string(),
                description: raw.description,
                servings: raw.servings,
                prep_time_minutes: raw.prep_time_minutes,
                cook_time_minutes: raw.cook_time_minutes,
                cuisine: raw.cuisine,
                tags: raw.tags,
                instructions: raw.instructions,
                approved: false,
                ingredients,
            });
        }

        MealPlan {
            recipes,
            reasoning: self.reasoning,
        }
    }
}

pub fn season(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "winter",
        3..=5 => "spring",
        6..=8 => "summer",
        _ => "autumn",
    }
}

fn bullet_list(lines: Vec<String>, empty: &str) -> String {
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}

fn describe_preferences(preferences: &[Preference], names: &HashMap<&str, &str>) -> String {
    bullet_list(
        preferences
            .iter()
            .map(|pref| {
                let who = names.get(pref.member_id.as_str()).copied().unwrap_or("someone");
                format!("- {}: {} {} ({:.1})", who, pref.category, pref.detail, pref.confidence)
            })
            .collect(),
        "Nothing known yet.",
    )
}

fn plan_prompt(request: &PlanRequest, locale: Locale) -> String {
    let names: HashMap<&str, &str> = request
        .members
        .iter()
        .map(|member| (member.id.as_str(), member.name.as_str()))
        .collect();

    let members = bullet_list(
        request
            .members
            .iter()
            .map(|member| format!("- {} ({})", member.name, member.role))
            .collect(),
        "- unknown",
    );

    let wishes = bullet_list(
        request
            .wishes
            .iter()
            .flat_map(|(member_id, wishes)| {
                let who = names.get(member_id.as_str()).copied().unwrap_or("someone");
                wishes.iter().map(move |wish| format!("- {}: {}", who, wish))
            })
            .collect(),
        "No specific wishes.",
    );

    let history = bullet_list(
        request
            .recent_history
            .iter()
            .map(|meal| format!("- {} ({}, {})", meal.recipe_name, meal.cuisine, meal.cooked_date))
            .collect(),
        "No recent meals.",
    );

    let month = request.start_date.format("%B").to_string();
    let servings = request.members.len().max(1).to_string();

    fill(
        prompts::GENERATE_PLAN,
        &[
            ("days", &request.num_days.to_string()),
            ("start", &request.start_date.to_string()),
            ("members", &members),
            ("wishes", &wishes),
            ("preferences", &describe_preferences(&request.preferences, &names)),
            ("history", &history),
            ("month", &month),
            ("season", season(request.start_date.month())),
            ("servings", &servings),
            ("language", locale.language_name()),
        ],
    )
}

#[async_trait]
impl Assistant for LlmAssistant {
    async fn classify(
        &self,
        text: &str,
        state: SessionState,
        role: MemberRole,
    ) -> Parsed<Classification> {
        let prompt = fill(
            prompts::CLASSIFY,
            &[("text", text), ("state", state.as_str()), ("role", role.as_str())],
        );

        match self.judge::<RawClassification>(prompt, 200).await {
            Ok(raw) => Parsed::Structured(Classification {
                intent: Intent::from_label(&raw.intent),
                confidence: raw.confidence.clamp(0.0, 1.0),
                summary: raw.summary,
            }),
            Err(reason) => Parsed::fallback(Classification::neutral(), reason),
        }
    }

    async fn generate_plan(&self, request: &PlanRequest) -> Result<MealPlan, EngineError> {
        debug!(days = request.num_days, start = %request.start_date, "Generating meal plan");
        self.plan(plan_prompt(request, self.locale)).await
    }

    async fn revise_plan(&self, current: &[Recipe], feedback: &str) -> Result<MealPlan, EngineError> {
        let plan = serde_json::to_string_pretty(&RawPlan::from_recipes(current))
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
        let prompt = fill(prompts::REVISE_PLAN, &[("plan", &plan), ("feedback", feedback)]);
        self.plan(prompt).await
    }

    async fn extract_preferences(
        &self,
        member: &FamilyMember,
        text: &str,
        existing: &[Preference],
    ) -> Parsed<PreferenceExtraction> {
        let known = bullet_list(
            existing
                .iter()
                .map(|pref| format!("- {}: {} ({:.1})", pref.category, pref.detail, pref.confidence))
                .collect(),
            "Nothing yet.",
        );
        let prompt = fill(
            prompts::EXTRACT_PREFERENCES,
            &[
                ("name", &member.name),
                ("role", member.role.as_str()),
                ("text", text),
                ("known", &known),
            ],
        );

        match self.judge::<PreferenceExtraction>(prompt, 500).await {
            Ok(extraction) => Parsed::Structured(extraction),
            Err(reason) => Parsed::fallback(PreferenceExtraction::empty(), reason),
        }
    }

    async fn match_pantry_text(&self, text: &str, ingredient_names: &[String]) -> Parsed<Vec<String>> {
        if ingredient_names.is_empty() {
            return Parsed::Structured(Vec::new());
        }

        let list = ingredient_names
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = fill(prompts::MATCH_PANTRY, &[("text", text), ("ingredients", &list)]);

        match self.judge::<Vec<String>>(prompt, 300).await {
            Ok(names) => {
                // Only names that are actually on the list count
                let known: HashMap<String, &String> = ingredient_names
                    .iter()
                    .map(|name| (name.trim().to_lowercase(), name))
                    .collect();
                Parsed::Structured(
                    names
                        .iter()
                        .filter_map(|name| known.get(&name.trim().to_lowercase()))
                        .map(|name| (*name).clone())
                        .collect(),
                )
            }
            Err(reason) => Parsed::fallback(Vec::new(), reason),
        }
    }
}

#[async_trait]
impl ProductAdvisor for LlmAssistant {
    async fn generate_search_terms(&self, ingredient: &Ingredient) -> Parsed<Vec<String>> {
        let prompt = fill(
            prompts::SEARCH_TERMS,
            &[
                ("name", &ingredient.name),
                ("quantity", &format_quantity(ingredient.quantity, "")),
                ("unit", &ingredient.unit),
                ("category", &ingredient.category),
            ],
        );

        match self.judge::<Vec<String>>(prompt, 100).await {
            Ok(terms) => {
                let terms: Vec<String> = terms
                    .into_iter()
                    .map(|term| term.trim().to_string())
                    .filter(|term| !term.is_empty())
                    .collect();
                if terms.is_empty() {
                    Parsed::fallback(vec![ingredient.name.clone()], "no search terms returned")
                } else {
                    Parsed::Structured(terms)
                }
            }
            Err(reason) => Parsed::fallback(vec![ingredient.name.clone()], reason),
        }
    }

    async fn select_best_product(
        &self,
        ingredient: &Ingredient,
        candidates: &[CatalogProduct],
    ) -> Parsed<ProductSelection> {
        let products = candidates
            .iter()
            .map(|product| {
                let mut line = format!("- id={} {}", product.id, product.name);
                if let Some(size) = &product.unit_quantity {
                    line.push_str(&format!(" ({})", size));
                }
                if let Some(cents) = product.price_cents {
                    line.push_str(&format!(" EUR {:.2}", cents as f64 / 100.0));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = fill(
            prompts::SELECT_PRODUCT,
            &[
                ("name", &ingredient.name),
                ("quantity", &format_quantity(ingredient.quantity, "")),
                ("unit", &ingredient.unit),
                ("products", &products),
            ],
        );

        match self.judge::<ProductSelection>(prompt, 200).await {
            Ok(selection) => Parsed::Structured(selection),
            Err(reason) => Parsed::fallback(ProductSelection::no_match("Selection failed"), reason),
        }
    }
}
