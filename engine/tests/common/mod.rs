//! In-memory collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Local, Utc};
use potluck_engine::cart::CartEngine;
use potluck_engine::config::MemberConfig;
use potluck_engine::db::Database;
use potluck_engine::i18n::Locale;
use potluck_engine::session::{Orchestrator, OrchestratorSettings};
use sdk::{
    Assistant, Catalog, CatalogProduct, Classification, EngineError, ExtractedPreference,
    FamilyMember, IncomingMessage, Ingredient, Intent, MealPlan, MemberRole, MessageChannel,
    Parsed, PlanRequest, Preference, PreferenceExtraction, ProductAdvisor, ProductSelection,
    Recipe, SessionState,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const PARENT: &str = "100";
pub const CHILD: &str = "200";

/// Channel whose inbox is filled by the test and whose outbox is inspected
#[derive(Default)]
pub struct FakeChannel {
    inbox: Mutex<Vec<IncomingMessage>>,
    sent: Mutex<Vec<(String, String)>>,
    next_id: Mutex<i64>,
}

impl FakeChannel {
    pub fn push(&self, sender: &str, text: &str) -> IncomingMessage {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let message = IncomingMessage {
            id: *next_id,
            sender: sender.to_string(),
            text: text.to_string(),
            received_at: Utc::now(),
        };
        self.inbox.lock().unwrap().push(message.clone());
        message
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == address)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageChannel for FakeChannel {
    async fn poll_new(&self, cursor: Option<i64>) -> Result<Vec<IncomingMessage>, EngineError> {
        Ok(self
            .inbox
            .lock()
            .unwrap()
            .iter()
            .filter(|message| cursor.map_or(true, |cursor| message.id > cursor))
            .cloned()
            .collect())
    }

    async fn send(&self, recipient: &str, text: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        true
    }
}

/// Assistant driven by fixed keywords
///
/// - classify: "yes" approval, "no" rejection, "change" change request,
///   "stop" cancel, "go" trigger, anything else other
/// - extraction: "likes X" stores a preference, "wish X" is a wish
/// - pantry: every ingredient name mentioned in the text
pub struct ScriptedAssistant {
    pub plan: Mutex<Vec<Recipe>>,
    pub revision: Mutex<Vec<Recipe>>,
    pub fail_generation: AtomicBool,
    pub requests: Mutex<Vec<PlanRequest>>,
}

impl ScriptedAssistant {
    pub fn new(plan: Vec<Recipe>) -> Self {
        Self {
            plan: Mutex::new(plan),
            revision: Mutex::new(Vec::new()),
            fail_generation: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<PlanRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn classify(
        &self,
        text: &str,
        _state: SessionState,
        _role: MemberRole,
    ) -> Parsed<Classification> {
        let intent = match text.trim().to_lowercase().as_str() {
            "yes" => Intent::Approval,
            "no" => Intent::Rejection,
            "stop" => Intent::Cancel,
            "go" => Intent::Trigger,
            t if t.starts_with("change") => Intent::ChangeRequest,
            _ => Intent::Other,
        };
        Parsed::Structured(Classification {
            intent,
            confidence: 0.9,
            summary: String::new(),
        })
    }

    async fn generate_plan(&self, request: &PlanRequest) -> Result<MealPlan, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(EngineError::LlmProvider("model offline".to_string()));
        }
        Ok(MealPlan {
            recipes: self.plan.lock().unwrap().clone(),
            reasoning: String::new(),
        })
    }

    async fn revise_plan(&self, _current: &[Recipe], _feedback: &str) -> Result<MealPlan, EngineError> {
        Ok(MealPlan {
            recipes: self.revision.lock().unwrap().clone(),
            reasoning: String::new(),
        })
    }

    async fn extract_preferences(
        &self,
        _member: &FamilyMember,
        text: &str,
        _existing: &[Preference],
    ) -> Parsed<PreferenceExtraction> {
        let text = text.trim();
        let mut extraction = PreferenceExtraction::empty();
        if let Some(detail) = text.strip_prefix("likes ") {
            extraction.has_food_content = true;
            extraction.preferences.push(ExtractedPreference {
                category: "likes".to_string(),
                detail: detail.to_string(),
                confidence: 0.6,
                is_update: false,
            });
        } else if let Some(wish) = text.strip_prefix("wish ") {
            extraction.has_food_content = true;
            extraction.wishes.push(wish.to_string());
        }
        Parsed::Structured(extraction)
    }

    async fn match_pantry_text(&self, text: &str, ingredient_names: &[String]) -> Parsed<Vec<String>> {
        let text = text.to_lowercase();
        Parsed::Structured(
            ingredient_names
                .iter()
                .filter(|name| text.contains(&name.to_lowercase()))
                .cloned()
                .collect(),
        )
    }
}

/// Catalog that knows a fixed set of product names
#[derive(Default)]
pub struct FakeCatalog {
    pub products: HashMap<String, CatalogProduct>,
    pub added: Mutex<Vec<(String, u32)>>,
}

impl FakeCatalog {
    pub fn with_products(names: &[&str]) -> Self {
        let products = names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    CatalogProduct {
                        id: format!("p-{}", name),
                        name: format!("Picnic {}", name),
                        unit_quantity: None,
                        price_cents: Some(199),
                    },
                )
            })
            .collect();
        Self {
            products,
            added: Mutex::new(Vec::new()),
        }
    }

    pub fn added(&self) -> Vec<(String, u32)> {
        self.added.lock().unwrap().clone()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search(&self, term: &str) -> Result<Vec<CatalogProduct>, EngineError> {
        Ok(self.products.get(term).cloned().into_iter().collect())
    }

    async fn add_product(&self, product_id: &str, count: u32) -> Result<(), EngineError> {
        self.added
            .lock()
            .unwrap()
            .push((product_id.to_string(), count));
        Ok(())
    }
}

/// Searches by name and picks the first candidate
pub struct FirstPick;

#[async_trait]
impl ProductAdvisor for FirstPick {
    async fn generate_search_terms(&self, ingredient: &Ingredient) -> Parsed<Vec<String>> {
        Parsed::Structured(vec![ingredient.name.to_lowercase()])
    }

    async fn select_best_product(
        &self,
        _ingredient: &Ingredient,
        candidates: &[CatalogProduct],
    ) -> Parsed<ProductSelection> {
        match candidates.first() {
            Some(product) => Parsed::Structured(ProductSelection {
                product_id: Some(product.id.clone()),
                product_name: Some(product.name.clone()),
                count: 1,
                confidence: 0.9,
                note: None,
            }),
            None => Parsed::Structured(ProductSelection::no_match("nothing")),
        }
    }
}

pub fn recipe(id: &str, days_ahead: i64, name: &str, ingredients: Vec<Ingredient>) -> Recipe {
    Recipe {
        id: id.to_string(),
        session_id: None,
        planned_date: Local::now().date_naive() + Duration::days(days_ahead),
        name: name.to_string(),
        description: String::new(),
        servings: 4,
        prep_time_minutes: 10,
        cook_time_minutes: 20,
        cuisine: "italian".to_string(),
        tags: Vec::new(),
        instructions: "Cook.".to_string(),
        approved: false,
        ingredients,
    }
}

/// Two dinners; olive oil is the only pantry staple
pub fn sample_plan() -> Vec<Recipe> {
    vec![
        recipe(
            "r2",
            2,
            "Kip met rijst",
            vec![
                Ingredient::new("kipfilet", 500.0, "g", "meat"),
                Ingredient::new("olijfolie", 1.0, "el", "pantry"),
            ],
        ),
        recipe(
            "r1",
            1,
            "Pasta pesto",
            vec![
                Ingredient::new("spaghetti", 400.0, "g", "other"),
                Ingredient::new("olijfolie", 2.0, "el", "pantry"),
            ],
        ),
    ]
}

pub struct Harness {
    pub _dir: TempDir,
    pub db: Database,
    pub channel: Arc<FakeChannel>,
    pub assistant: Arc<ScriptedAssistant>,
    pub catalog: Arc<FakeCatalog>,
    pub members: Vec<FamilyMember>,
}

impl Harness {
    pub async fn new(plan: Vec<Recipe>) -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&dir.path().join("potluck.db")).await.unwrap();
        let members = db
            .members()
            .sync_from_config(&[
                MemberConfig {
                    name: "Anna".to_string(),
                    address: PARENT.to_string(),
                    role: MemberRole::Parent,
                },
                MemberConfig {
                    name: "Tim".to_string(),
                    address: CHILD.to_string(),
                    role: MemberRole::Child,
                },
            ])
            .await
            .unwrap();

        Self {
            _dir: dir,
            db,
            channel: Arc::new(FakeChannel::default()),
            assistant: Arc::new(ScriptedAssistant::new(plan)),
            catalog: Arc::new(FakeCatalog::with_products(&["kipfilet", "spaghetti", "olijfolie"])),
            members,
        }
    }

    pub fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            locale: Locale::En,
            ..OrchestratorSettings::default()
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let catalog: Arc<dyn Catalog> = self.catalog.clone();
        let cart = CartEngine::new(catalog, Arc::new(FirstPick));
        let channel: Arc<dyn MessageChannel> = self.channel.clone();
        let assistant: Arc<dyn Assistant> = self.assistant.clone();
        Orchestrator::new(self.db.clone(), channel, assistant, cart, Self::settings())
    }

    pub fn message(&self, sender: &str, text: &str) -> IncomingMessage {
        self.channel.push(sender, text)
    }
}
