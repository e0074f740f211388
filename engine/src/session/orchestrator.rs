//! Session orchestrator
//!
//! Drives one planning session at a time through the workflow in
//! [`super::transitions`]. Each transition is persisted before the entry
//! action of the new state sends anything, so a crash mid-send resumes from
//! the new state and a redelivered message finds the session already moved
//! on.
//!
//! Entry actions that finish on their own (compiling ingredients, filling
//! the cart, a successful plan generation) return the follow-up event and
//! [`Orchestrator::advance`] keeps stepping until a state waits for input.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use sdk::collaborators::{
    Assistant, Classification, Intent, MessageChannel, PlanExporter, PlanRequest,
};
use sdk::types::{
    ConversationEntry, Direction, FamilyMember, IncomingMessage, Ingredient, MealHistoryEntry,
    Recipe, Session, SessionState,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::transitions::{next_state, SessionEvent};
use crate::cart::{CartEngine, CartReport};
use crate::db::Database;
use crate::formatter::{
    format_cart_report, format_full_ingredient_list, format_meal_plan, format_pantry_check,
};
use crate::i18n::{is_trigger_phrase, render, Locale, MessageKey};
use crate::merge::{merge_for_cart, merge_for_export, needs_pantry_check};
use crate::preferences::PreferenceEngine;

/// Main proteins recognised when recording meal history, in match order
pub const PROTEIN_VOCABULARY: &[&str] = &[
    "chicken", "kip", "beef", "rund", "pork", "varken", "fish", "vis", "zalm", "salmon", "tofu",
    "garnalen", "shrimp", "gehakt", "lamb", "lam", "tonijn", "tuna",
];

const VEGETARIAN_TAGS: &[&str] = &["vegetarian", "vegetarisch"];

/// Best guess of a recipe's main protein
///
/// Tags are checked first for an exact vocabulary word, then ingredient
/// names for a vocabulary substring. A vegetarian tag yields "vegetarisch".
pub fn guess_protein(recipe: &Recipe) -> Option<String> {
    let tags: Vec<String> = recipe.tags.iter().map(|tag| tag.trim().to_lowercase()).collect();

    if let Some(tag) = tags.iter().find(|tag| PROTEIN_VOCABULARY.contains(&tag.as_str())) {
        return Some(tag.clone());
    }

    for ingredient in &recipe.ingredients {
        let name = ingredient.name.to_lowercase();
        if let Some(protein) = PROTEIN_VOCABULARY.iter().find(|p| name.contains(*p)) {
            return Some(protein.to_string());
        }
    }

    if tags.iter().any(|tag| VEGETARIAN_TAGS.contains(&tag.as_str())) {
        return Some("vegetarisch".to_string());
    }

    None
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub locale: Locale,
    pub plan_days: u32,
    pub history_weeks: u32,
    pub preference_timeout: Duration,
    pub pantry_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            locale: Locale::Nl,
            plan_days: 4,
            history_weeks: 3,
            preference_timeout: Duration::hours(4),
            pantry_timeout: Duration::hours(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started { session_id: String },
    AlreadyActive { state: SessionState },
}

pub struct Orchestrator {
    db: Database,
    channel: Arc<dyn MessageChannel>,
    assistant: Arc<dyn Assistant>,
    preferences: PreferenceEngine,
    cart: CartEngine,
    exporter: Option<Arc<dyn PlanExporter>>,
    settings: OrchestratorSettings,
    active: Option<Session>,
}

impl Orchestrator {
    pub fn new(
        db: Database,
        channel: Arc<dyn MessageChannel>,
        assistant: Arc<dyn Assistant>,
        cart: CartEngine,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            preferences: PreferenceEngine::new(db.clone(), Arc::clone(&assistant)),
            db,
            channel,
            assistant,
            cart,
            exporter: None,
            settings,
            active: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn PlanExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    /// Reload the active session left by a previous process, if any
    pub async fn resume(&mut self) -> Result<Option<SessionState>> {
        self.active = self.db.sessions().get_active().await?;
        if let Some(session) = &self.active {
            info!(
                session_id = %session.id,
                state = %session.state,
                "Resumed active session"
            );
        }
        Ok(self.active.as_ref().map(|session| session.state))
    }

    /// Start a planning session unless one is already running
    pub async fn start_session(&mut self, trigger: Option<&FamilyMember>) -> Result<StartOutcome> {
        let running = match &self.active {
            Some(session) => Some(session.state),
            None => self
                .db
                .sessions()
                .get_active()
                .await?
                .map(|session| session.state),
        };

        if let Some(state) = running {
            warn!(state = %state, "Session already active, ignoring new trigger");
            if let Some(member) = trigger {
                let text = self.text(MessageKey::SessionActive);
                self.send_to(member, &text).await?;
            }
            return Ok(StartOutcome::AlreadyActive { state });
        }

        let session = Session::new(
            uuid::Uuid::new_v4().to_string(),
            trigger.map(|member| member.id.clone()),
            Utc::now(),
        );
        let session_id = session.id.clone();
        self.db.sessions().save(&session).await?;
        self.active = Some(session);

        info!(
            session_id = %session_id,
            triggered_by = trigger.map(|m| m.name.as_str()).unwrap_or("schedule"),
            "Started new session"
        );
        self.advance(SessionEvent::Start).await?;

        Ok(StartOutcome::Started { session_id })
    }

    /// Route one inbound message
    pub async fn handle_message(&mut self, message: &IncomingMessage) -> Result<()> {
        let Some(member) = self.db.members().get_by_address(&message.sender).await? else {
            info!(sender = %message.sender, "Ignoring message from unknown sender");
            return Ok(());
        };

        let state = self.active.as_ref().map(|session| session.state);
        info!(
            member = %member.name,
            state = state.map(|s| s.as_str()).unwrap_or("idle"),
            "Incoming message"
        );

        self.db
            .conversation()
            .append(&ConversationEntry {
                id: None,
                session_id: self.active.as_ref().map(|session| session.id.clone()),
                member_id: member.id.clone(),
                direction: Direction::Incoming,
                text: message.text.clone(),
                transport_message_id: Some(message.id),
                timestamp: message.received_at,
            })
            .await?;

        match state {
            Some(state) => self.route_session_message(&member, &message.text, state).await,
            None => self.route_idle_message(&member, &message.text).await,
        }
    }

    /// Force the transitions whose waiting time has run out
    pub async fn check_timeouts(&mut self, now: DateTime<Utc>) -> Result<Option<SessionEvent>> {
        let Some(session) = &self.active else {
            return Ok(None);
        };

        let elapsed = now - session.state_entered_at;
        let event = match session.state {
            SessionState::CollectingPreferences if elapsed > self.settings.preference_timeout => {
                Some(SessionEvent::PreferenceTimeout)
            }
            SessionState::CheckingPantry if elapsed > self.settings.pantry_timeout => {
                Some(SessionEvent::PantryTimeout)
            }
            _ => None,
        };

        if let Some(event) = event {
            info!(
                session_id = %session.id,
                state = %session.state,
                minutes = elapsed.num_minutes(),
                "Session timed out"
            );
            self.advance(event).await?;
        }

        Ok(event)
    }

    async fn route_idle_message(&mut self, member: &FamilyMember, text: &str) -> Result<()> {
        if let Err(e) = self.preferences.extract_and_store(member, text).await {
            warn!(member = %member.name, "Passive preference extraction failed: {:#}", e);
        }

        if !member.is_parent() {
            return Ok(());
        }

        if is_trigger_phrase(text) {
            info!(member = %member.name, "Trigger phrase detected");
            self.start_session(Some(member)).await?;
            return Ok(());
        }

        let classification = self.classify(text, SessionState::Idle, member).await;
        if classification.intent == Intent::Trigger {
            self.start_session(Some(member)).await?;
        }
        Ok(())
    }

    async fn route_session_message(
        &mut self,
        member: &FamilyMember,
        text: &str,
        state: SessionState,
    ) -> Result<()> {
        let intent = self.classify(text, state, member).await.intent;

        if intent == Intent::Cancel && member.is_parent() {
            return self.cancel(member).await;
        }

        match state {
            SessionState::CollectingPreferences => {
                self.handle_preference_response(member, text, intent).await
            }
            SessionState::AwaitingApproval if member.is_parent() => {
                self.handle_approval(member, text, intent).await
            }
            SessionState::CheckingPantry if member.is_parent() => {
                self.handle_pantry_response(member, text).await
            }
            SessionState::GeneratingPlan
                if member.is_parent() && (intent == Intent::Trigger || is_trigger_phrase(text)) =>
            {
                info!(member = %member.name, "Retrying plan generation");
                self.advance(SessionEvent::RetryGeneration).await
            }
            _ => {
                debug!(state = %state, member = %member.name, "Ignoring message");
                Ok(())
            }
        }
    }

    async fn handle_preference_response(
        &mut self,
        member: &FamilyMember,
        text: &str,
        intent: Intent,
    ) -> Result<()> {
        let outcome = self.preferences.extract_and_store(member, text).await?;
        let everyone: BTreeSet<String> = self
            .db
            .members()
            .list()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let all_responded = {
            let session = self.session_mut()?;
            session.members_responded.insert(member.id.clone());
            if !outcome.wishes.is_empty() {
                session
                    .collected_wishes
                    .entry(member.id.clone())
                    .or_default()
                    .extend(outcome.wishes);
            }
            session.updated_at = Utc::now();
            everyone.is_subset(&session.members_responded)
        };
        self.save_active().await?;

        let thanks = render(
            MessageKey::ThanksPreference,
            self.settings.locale,
            &[("name", member.name.as_str())],
        );
        self.send_to(member, &thanks).await?;

        if intent == Intent::Trigger && member.is_parent() {
            info!(member = %member.name, "Parent asked to go ahead");
            return self.advance(SessionEvent::PreferencesComplete).await;
        }

        if all_responded {
            let text = self.text(MessageKey::AllResponded);
            self.send_to(member, &text).await?;
            return self.advance(SessionEvent::PreferencesComplete).await;
        }

        Ok(())
    }

    async fn handle_approval(
        &mut self,
        member: &FamilyMember,
        text: &str,
        intent: Intent,
    ) -> Result<()> {
        let session_id = self.session()?.id.clone();

        match intent {
            Intent::Approval => {
                let reply = self.text(MessageKey::PlanApproved);
                self.send_to(member, &reply).await?;
                self.advance(SessionEvent::Approved).await
            }
            Intent::Rejection => {
                let reply = self.text(MessageKey::FullRejection);
                self.send_to(member, &reply).await?;
                self.db.recipes().delete_for_session(&session_id).await?;
                self.advance(SessionEvent::Rejected).await
            }
            Intent::ChangeRequest => {
                let reply = self.text(MessageKey::AdjustingPlan);
                self.send_to(member, &reply).await?;

                self.session_mut()?.approval_feedback.push(text.to_string());
                self.save_active().await?;

                let current = self.db.recipes().for_session(&session_id).await?;
                match self.assistant.revise_plan(&current, text).await {
                    Ok(plan) if !plan.recipes.is_empty() => {
                        self.store_plan(&session_id, plan.recipes).await?;
                        self.advance(SessionEvent::Revised).await
                    }
                    Ok(_) => {
                        info!(session_id = %session_id, "Revision produced no changes");
                        self.advance(SessionEvent::RevisionUnchanged).await
                    }
                    Err(e) => {
                        error!(session_id = %session_id, "Plan revision failed: {}", e);
                        let reply = self.text(MessageKey::RevisionFailed);
                        self.send_to(member, &reply).await?;
                        self.advance(SessionEvent::RevisionUnchanged).await
                    }
                }
            }
            other => {
                debug!(intent = other.as_str(), "No approval action for intent");
                Ok(())
            }
        }
    }

    async fn handle_pantry_response(&mut self, member: &FamilyMember, text: &str) -> Result<()> {
        let session_id = self.session()?.id.clone();
        let recipes = self.db.recipes().for_session(&session_id).await?;

        let names: Vec<String> = recipes
            .iter()
            .flat_map(|recipe| recipe.ingredients.iter())
            .map(|ingredient| ingredient.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let parsed = self.assistant.match_pantry_text(text, &names).await;
        if let sdk::Parsed::Fallback { reason, .. } = &parsed {
            warn!("Pantry matching fell back: {}", reason);
        }
        let matched: HashSet<String> = parsed
            .into_value()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();

        let mut marked = HashSet::new();
        for ingredient in recipes.iter().flat_map(|recipe| recipe.ingredients.iter()) {
            let key = ingredient.name.trim().to_lowercase();
            if matched.contains(&key) {
                marked.insert(key);
                if !ingredient.already_available {
                    let mut updated = ingredient.clone();
                    updated.already_available = true;
                    self.db.recipes().update_ingredient(&updated).await?;
                }
            }
        }

        let reply = if marked.is_empty() {
            self.text(MessageKey::PantryNone)
        } else {
            render(
                MessageKey::PantryMarked,
                self.settings.locale,
                &[("count", &marked.len().to_string())],
            )
        };
        self.send_to(member, &reply).await?;

        self.advance(SessionEvent::PantryAnswered).await
    }

    async fn cancel(&mut self, member: &FamilyMember) -> Result<()> {
        let session_id = self.session()?.id.clone();
        info!(session_id = %session_id, member = %member.name, "Session cancelled");
        self.advance(SessionEvent::Cancelled).await?;

        let text = self.text(MessageKey::Cancelled);
        self.send_logged(member, &text, Some(session_id)).await
    }

    /// Apply `event` and run entry actions until a state waits for input
    async fn advance(&mut self, event: SessionEvent) -> Result<()> {
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let state = self.apply(event).await?;
            pending = self.enter(state, event).await?;
        }
        Ok(())
    }

    /// Persist the transition, then adopt it; a failed save leaves the
    /// in-memory session as it was
    async fn apply(&mut self, event: SessionEvent) -> Result<SessionState> {
        let now = Utc::now();
        let current = self
            .active
            .as_ref()
            .context("No active session to transition")?;

        let next = next_state(current.state, event)?;
        let mut moved = current.clone();
        moved.state = next;
        moved.state_entered_at = now;
        moved.updated_at = now;
        self.db.sessions().save(&moved).await?;

        info!(
            session_id = %moved.id,
            from = %current.state,
            to = %next,
            event = %event,
            "Session transition"
        );
        self.active = Some(moved);

        Ok(next)
    }

    async fn enter(
        &mut self,
        state: SessionState,
        event: SessionEvent,
    ) -> Result<Option<SessionEvent>> {
        match state {
            SessionState::CollectingPreferences => self.enter_collecting_preferences().await,
            SessionState::GeneratingPlan => self.enter_generating_plan().await,
            SessionState::AwaitingApproval => self.enter_awaiting_approval().await,
            SessionState::CompilingIngredients => self.enter_compiling_ingredients().await,
            SessionState::CheckingPantry => self.enter_checking_pantry().await,
            SessionState::FillingCart => self.enter_filling_cart().await,
            SessionState::Completed => self.enter_completed(event).await,
            SessionState::Idle => Ok(None),
        }
    }

    async fn enter_collecting_preferences(&mut self) -> Result<Option<SessionEvent>> {
        self.session_mut()?.reset_collection();
        self.save_active().await?;

        let prompt = self.text(MessageKey::AskPreferences);
        for member in self.db.members().list().await? {
            self.send_to(&member, &prompt).await?;
        }
        Ok(None)
    }

    async fn enter_generating_plan(&mut self) -> Result<Option<SessionEvent>> {
        let (session_id, wishes) = {
            let session = self.session()?;
            (session.id.clone(), session.collected_wishes.clone())
        };

        let today = Local::now().date_naive();
        let request = PlanRequest {
            members: self.db.members().list().await?,
            preferences: self.db.preferences().all().await?,
            wishes,
            recent_history: self
                .db
                .history()
                .recent_weeks(today, self.settings.history_weeks)
                .await?,
            num_days: self.settings.plan_days,
            start_date: today + Duration::days(1),
        };

        let failure = match self.assistant.generate_plan(&request).await {
            Ok(plan) if !plan.recipes.is_empty() => {
                info!(
                    session_id = %session_id,
                    recipes = plan.recipes.len(),
                    "Plan generated"
                );
                self.store_plan(&session_id, plan.recipes).await?;
                return Ok(Some(SessionEvent::PlanGenerated));
            }
            Ok(_) => "no recipes returned".to_string(),
            Err(e) => e.to_string(),
        };

        error!(session_id = %session_id, "Plan generation failed: {}", failure);
        let text = self.text(MessageKey::PlanFailed);
        self.notify_primary_parent(&text).await?;
        Ok(None)
    }

    async fn enter_awaiting_approval(&mut self) -> Result<Option<SessionEvent>> {
        let session_id = self.session()?.id.clone();
        let recipes = self.db.recipes().for_session(&session_id).await?;

        let plan = format_meal_plan(&recipes, self.settings.locale);
        let ask = self.text(MessageKey::AskApproval);
        self.notify_primary_parent(&plan).await?;
        self.notify_primary_parent(&ask).await?;
        Ok(None)
    }

    async fn enter_compiling_ingredients(&mut self) -> Result<Option<SessionEvent>> {
        let session = self.session()?.clone();
        self.db.recipes().mark_approved(&session.id).await?;

        if let Some(exporter) = &self.exporter {
            let recipes = self.db.recipes().for_session(&session.id).await?;
            match exporter.export(&session, &recipes) {
                Ok(()) => info!(session_id = %session.id, "Plan exported"),
                Err(e) => warn!(session_id = %session.id, "Plan export failed: {}", e),
            }
        }

        Ok(Some(SessionEvent::IngredientsCompiled))
    }

    async fn enter_checking_pantry(&mut self) -> Result<Option<SessionEvent>> {
        let session_id = self.session()?.id.clone();
        let recipes = self.db.recipes().for_session(&session_id).await?;
        let merged = merge_for_export(recipes.iter().flat_map(|recipe| recipe.ingredients.iter()));

        if !needs_pantry_check(&merged) {
            info!(session_id = %session_id, "No pantry staples to check");
            return Ok(Some(SessionEvent::PantrySkipped));
        }

        let full_list = format_full_ingredient_list(&recipes, self.settings.locale);
        let question = format_pantry_check(&merged, self.settings.locale);
        self.notify_primary_parent(&full_list).await?;
        self.notify_primary_parent(&question).await?;
        Ok(None)
    }

    async fn enter_filling_cart(&mut self) -> Result<Option<SessionEvent>> {
        let session_id = self.session()?.id.clone();
        let notice = self.text(MessageKey::FillingCart);
        self.notify_primary_parent(&notice).await?;

        let recipes = self.db.recipes().for_session(&session_id).await?;
        let ingredients: Vec<Ingredient> = recipes
            .into_iter()
            .flat_map(|recipe| recipe.ingredients)
            .collect();
        let merged = merge_for_cart(&ingredients);

        let report = self.cart.fill_cart(&merged).await;

        if let Err(e) = self.propagate_resolution(&ingredients, &report).await {
            error!(session_id = %session_id, "Failed to store cart results: {:#}", e);
            let text = self.text(MessageKey::CartFailed);
            self.notify_primary_parent(&text).await?;
        }

        let summary = format_cart_report(&report, self.settings.locale);
        self.notify_primary_parent(&summary).await?;
        Ok(Some(SessionEvent::CartFilled))
    }

    async fn enter_completed(&mut self, event: SessionEvent) -> Result<Option<SessionEvent>> {
        let session = self.active.take().context("No active session to complete")?;

        if event != SessionEvent::Cancelled {
            let recipes = self.db.recipes().for_session(&session.id).await?;
            let history = self.db.history();
            for recipe in &recipes {
                history
                    .append(&MealHistoryEntry {
                        id: None,
                        recipe_name: recipe.name.clone(),
                        cuisine: recipe.cuisine.clone(),
                        main_protein: guess_protein(recipe),
                        tags: recipe.tags.clone(),
                        cooked_date: recipe.planned_date,
                        rating: None,
                        session_id: Some(session.id.clone()),
                    })
                    .await?;
            }
            info!(
                session_id = %session.id,
                meals = recipes.len(),
                "Session completed"
            );
        }

        Ok(None)
    }

    /// Copy resolution fields from the cart run onto every stored
    /// ingredient with the same normalized name
    async fn propagate_resolution(
        &self,
        ingredients: &[Ingredient],
        report: &CartReport,
    ) -> Result<usize> {
        let resolved: HashMap<String, &Ingredient> = report
            .resolved()
            .map(|ingredient| (ingredient.normalized_name(), ingredient))
            .collect();

        let repo = self.db.recipes();
        let mut updated = 0;
        for ingredient in ingredients {
            let Some(source) = resolved.get(&ingredient.normalized_name()) else {
                continue;
            };
            let mut copy = ingredient.clone();
            copy.product_id = source.product_id.clone();
            copy.product_name = source.product_name.clone();
            copy.added_to_cart = source.added_to_cart;
            copy.search_status = source.search_status;
            if copy != *ingredient {
                repo.update_ingredient(&copy).await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Replace the session's recipes and derive the plan date range
    async fn store_plan(&mut self, session_id: &str, mut recipes: Vec<Recipe>) -> Result<()> {
        recipes.sort_by_key(|recipe| recipe.planned_date);
        for recipe in &mut recipes {
            recipe.session_id = Some(session_id.to_string());
            recipe.approved = false;
        }

        self.db
            .recipes()
            .replace_for_session(session_id, &recipes)
            .await?;

        let session = self.session_mut()?;
        session.plan_start_date = recipes.first().map(|recipe| recipe.planned_date);
        session.plan_end_date = recipes.last().map(|recipe| recipe.planned_date);
        session.updated_at = Utc::now();
        self.save_active().await
    }

    async fn classify(
        &self,
        text: &str,
        state: SessionState,
        member: &FamilyMember,
    ) -> Classification {
        let parsed = self.assistant.classify(text, state, member.role).await;
        if let sdk::Parsed::Fallback { reason, .. } = &parsed {
            warn!(member = %member.name, "Classification fell back: {}", reason);
        }
        let classification = parsed.into_value();
        debug!(
            member = %member.name,
            intent = classification.intent.as_str(),
            confidence = classification.confidence,
            "Classified message"
        );
        classification
    }

    fn text(&self, key: MessageKey) -> String {
        render(key, self.settings.locale, &[])
    }

    fn session(&self) -> Result<&Session> {
        self.active.as_ref().context("No active session")
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.active.as_mut().context("No active session")
    }

    async fn save_active(&self) -> Result<()> {
        if let Some(session) = &self.active {
            self.db.sessions().save(session).await?;
        }
        Ok(())
    }

    async fn notify_primary_parent(&self, text: &str) -> Result<()> {
        match self.db.members().parents().await?.into_iter().next() {
            Some(parent) => self.send_to(&parent, text).await,
            None => {
                warn!("No parent configured, dropping notification");
                Ok(())
            }
        }
    }

    async fn send_to(&self, member: &FamilyMember, text: &str) -> Result<()> {
        let session_id = self.active.as_ref().map(|session| session.id.clone());
        self.send_logged(member, text, session_id).await
    }

    /// Send and log; a failed send is logged and not retried
    async fn send_logged(
        &self,
        member: &FamilyMember,
        text: &str,
        session_id: Option<String>,
    ) -> Result<()> {
        if !self.channel.send(&member.address, text).await {
            warn!(member = %member.name, "Failed to deliver message");
        }

        self.db
            .conversation()
            .append(&ConversationEntry {
                id: None,
                session_id,
                member_id: member.id.clone(),
                direction: Direction::Outgoing,
                text: text.to_string(),
                transport_message_id: None,
                timestamp: Utc::now(),
            })
            .await
            .context("Failed to log outgoing message")?;
        Ok(())
    }
}
