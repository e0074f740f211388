//! Cart reconciliation
//!
//! Resolves merged ingredient demand to grocery catalog products and puts
//! them in the cart. Accepted matches are cached by normalized ingredient
//! name for as long as the engine lives, so the daemon only asks the
//! catalog and the selection collaborator once per ingredient name.

use sdk::collaborators::{Catalog, CatalogProduct, ProductAdvisor, ProductSelection};
use sdk::errors::PlannerErrorExt;
use sdk::types::{Ingredient, SearchStatus};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A selection must be strictly more confident than this to be accepted
pub const ACCEPTANCE_THRESHOLD: f64 = 0.5;
pub const MAX_SEARCH_TERMS: usize = 3;
pub const MAX_CANDIDATES: usize = 15;

const NO_RESULTS: &str = "No results";
const NO_MATCH: &str = "No match found";

/// Outcome of one cart-fill run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartReport {
    pub added: Vec<(Ingredient, ProductSelection)>,
    pub not_found: Vec<(Ingredient, String)>,
    pub skipped: Vec<Ingredient>,
    pub errors: Vec<(Ingredient, String)>,
}

impl CartReport {
    /// Every ingredient of the run with its resolution fields filled in
    pub fn resolved(&self) -> impl Iterator<Item = &Ingredient> {
        self.added
            .iter()
            .map(|(ingredient, _)| ingredient)
            .chain(self.not_found.iter().map(|(ingredient, _)| ingredient))
            .chain(self.skipped.iter())
            .chain(self.errors.iter().map(|(ingredient, _)| ingredient))
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.not_found.len() + self.skipped.len() + self.errors.len()
    }
}

/// Accepted product matches keyed by normalized ingredient name
#[derive(Debug, Clone, Default)]
pub struct MatchCache {
    entries: HashMap<String, ProductSelection>,
}

impl MatchCache {
    pub fn get(&self, name: &str) -> Option<&ProductSelection> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: String, selection: ProductSelection) {
        self.entries.insert(name, selection);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn is_acceptable(selection: &ProductSelection) -> bool {
    selection.product_id.is_some() && selection.confidence > ACCEPTANCE_THRESHOLD
}

enum SearchOutcome {
    Candidates(Vec<CatalogProduct>),
    NoResults,
    Failed(String),
}

pub struct CartEngine {
    catalog: Arc<dyn Catalog>,
    advisor: Arc<dyn ProductAdvisor>,
    cache: MatchCache,
}

impl CartEngine {
    pub fn new(catalog: Arc<dyn Catalog>, advisor: Arc<dyn ProductAdvisor>) -> Self {
        Self::with_cache(catalog, advisor, MatchCache::default())
    }

    pub fn with_cache(
        catalog: Arc<dyn Catalog>,
        advisor: Arc<dyn ProductAdvisor>,
        cache: MatchCache,
    ) -> Self {
        Self {
            catalog,
            advisor,
            cache,
        }
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Resolve and add every ingredient of a cart-fill merged list
    ///
    /// Failures are recorded per ingredient; the run always covers the whole
    /// list.
    pub async fn fill_cart(&mut self, merged: &[Ingredient]) -> CartReport {
        let mut report = CartReport::default();

        for ingredient in merged {
            let mut ingredient = ingredient.clone();

            if ingredient.already_available {
                ingredient.search_status = SearchStatus::Skipped;
                report.skipped.push(ingredient);
                continue;
            }

            let key = ingredient.normalized_name();
            let selection = match self.cache.get(&key) {
                Some(hit) => {
                    debug!(ingredient = %ingredient.name, "Product match cache hit");
                    hit.clone()
                }
                None => match self.search(&ingredient).await {
                    SearchOutcome::Candidates(candidates) => {
                        let parsed = self
                            .advisor
                            .select_best_product(&ingredient, &candidates)
                            .await;
                        if let sdk::Parsed::Fallback { reason, .. } = &parsed {
                            warn!(ingredient = %ingredient.name, "Product selection fell back: {}", reason);
                        }
                        parsed.into_value()
                    }
                    SearchOutcome::NoResults => {
                        ingredient.search_status = SearchStatus::NotFound;
                        report.not_found.push((ingredient, NO_RESULTS.to_string()));
                        continue;
                    }
                    SearchOutcome::Failed(hint) => {
                        report.errors.push((ingredient, hint));
                        continue;
                    }
                },
            };

            let product_id = match (&selection.product_id, is_acceptable(&selection)) {
                (Some(id), true) => id.clone(),
                _ => {
                    let note = selection
                        .note
                        .clone()
                        .filter(|note| !note.trim().is_empty())
                        .unwrap_or_else(|| NO_MATCH.to_string());
                    ingredient.search_status = SearchStatus::NotFound;
                    report.not_found.push((ingredient, note));
                    continue;
                }
            };

            match self
                .catalog
                .add_product(&product_id, selection.count.max(1))
                .await
            {
                Ok(()) => {
                    ingredient.product_id = Some(product_id);
                    ingredient.product_name = selection.product_name.clone();
                    ingredient.added_to_cart = true;
                    ingredient.search_status = SearchStatus::Found;
                    self.cache.insert(key, selection.clone());
                    report.added.push((ingredient, selection));
                }
                Err(e) => {
                    warn!(ingredient = %ingredient.name, "Failed to add product to cart: {}", e);
                    report.errors.push((ingredient, e.user_hint().to_string()));
                }
            }
        }

        info!(
            "Cart filled: {} added, {} not found, {} skipped, {} errors",
            report.added.len(),
            report.not_found.len(),
            report.skipped.len(),
            report.errors.len()
        );

        report
    }

    async fn search(&self, ingredient: &Ingredient) -> SearchOutcome {
        let mut terms: Vec<String> = self
            .advisor
            .generate_search_terms(ingredient)
            .await
            .into_value()
            .into_iter()
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .take(MAX_SEARCH_TERMS)
            .collect();
        if terms.is_empty() {
            terms.push(ingredient.name.clone());
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut failures = 0;
        let mut last_hint = None;

        for term in &terms {
            match self.catalog.search(term).await {
                Ok(products) => {
                    for product in products {
                        if seen.insert(product.id.clone()) {
                            candidates.push(product);
                        }
                    }
                    if !candidates.is_empty() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(term = %term, "Catalog search failed: {}", e);
                    failures += 1;
                    last_hint = Some(e.user_hint().to_string());
                }
            }
        }

        if !candidates.is_empty() {
            candidates.truncate(MAX_CANDIDATES);
            return SearchOutcome::Candidates(candidates);
        }

        match last_hint {
            Some(hint) if failures == terms.len() => SearchOutcome::Failed(hint),
            _ => SearchOutcome::NoResults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sdk::collaborators::Parsed;
    use sdk::errors::EngineError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCatalog {
        results: HashMap<String, Vec<CatalogProduct>>,
        failing: bool,
        searches: Mutex<Vec<String>>,
        added: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn search(&self, term: &str) -> Result<Vec<CatalogProduct>, EngineError> {
            self.searches.lock().unwrap().push(term.to_string());
            if self.failing {
                return Err(EngineError::Catalog("HTTP 503".to_string()));
            }
            Ok(self.results.get(term).cloned().unwrap_or_default())
        }

        async fn add_product(&self, product_id: &str, count: u32) -> Result<(), EngineError> {
            self.added
                .lock()
                .unwrap()
                .push((product_id.to_string(), count));
            Ok(())
        }
    }

    struct FakeAdvisor {
        terms: Vec<String>,
        selection: ProductSelection,
        selections: Mutex<Vec<usize>>,
    }

    impl FakeAdvisor {
        fn new(terms: &[&str], selection: ProductSelection) -> Self {
            Self {
                terms: terms.iter().map(|t| t.to_string()).collect(),
                selection,
                selections: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProductAdvisor for FakeAdvisor {
        async fn generate_search_terms(&self, _ingredient: &Ingredient) -> Parsed<Vec<String>> {
            Parsed::Structured(self.terms.clone())
        }

        async fn select_best_product(
            &self,
            _ingredient: &Ingredient,
            candidates: &[CatalogProduct],
        ) -> Parsed<ProductSelection> {
            self.selections.lock().unwrap().push(candidates.len());
            Parsed::Structured(self.selection.clone())
        }
    }

    fn product(id: &str) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            name: format!("Product {}", id),
            unit_quantity: None,
            price_cents: None,
        }
    }

    fn selection(id: Option<&str>, confidence: f64) -> ProductSelection {
        ProductSelection {
            product_id: id.map(str::to_string),
            product_name: id.map(|id| format!("Product {}", id)),
            count: 2,
            confidence,
            note: Some("too unsure".to_string()),
        }
    }

    fn catalog_with(term: &str, ids: &[&str]) -> FakeCatalog {
        let mut catalog = FakeCatalog::default();
        catalog
            .results
            .insert(term.to_string(), ids.iter().map(|id| product(id)).collect());
        catalog
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let catalog = Arc::new(catalog_with("kip", &["s1"]));
        let advisor = Arc::new(FakeAdvisor::new(&["kip"], selection(Some("s1"), 0.5)));
        let mut engine = CartEngine::new(catalog.clone(), advisor);

        let report = engine
            .fill_cart(&[Ingredient::new("kip", 500.0, "g", "meat")])
            .await;
        assert!(report.added.is_empty());
        assert_eq!(report.not_found[0].1, "too unsure");
        assert!(catalog.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_above_threshold_is_added_and_cached() {
        let catalog = Arc::new(catalog_with("kip", &["s1"]));
        let advisor = Arc::new(FakeAdvisor::new(&["kip"], selection(Some("s1"), 0.51)));
        let mut engine = CartEngine::new(catalog.clone(), advisor.clone());

        let report = engine
            .fill_cart(&[Ingredient::new("Kip", 500.0, "g", "meat")])
            .await;
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].0.search_status, SearchStatus::Found);
        assert_eq!(*catalog.added.lock().unwrap(), vec![("s1".to_string(), 2)]);
        assert!(engine.cache().get("kip").is_some());

        // Second run reuses the cached match without searching again
        engine
            .fill_cart(&[Ingredient::new("kip ", 300.0, "g", "meat")])
            .await;
        assert_eq!(catalog.searches.lock().unwrap().len(), 1);
        assert_eq!(advisor.selections.lock().unwrap().len(), 1);
        assert_eq!(catalog.added.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_product_id_is_rejected() {
        let catalog = Arc::new(catalog_with("kip", &["s1"]));
        let mut no_id = selection(None, 0.9);
        no_id.note = None;
        let advisor = Arc::new(FakeAdvisor::new(&["kip"], no_id));
        let mut engine = CartEngine::new(catalog, advisor);

        let report = engine
            .fill_cart(&[Ingredient::new("kip", 500.0, "g", "meat")])
            .await;
        assert_eq!(report.not_found[0].1, NO_MATCH);
        assert!(engine.cache().is_empty());
    }

    #[tokio::test]
    async fn test_available_ingredients_are_skipped() {
        let catalog = Arc::new(FakeCatalog::default());
        let advisor = Arc::new(FakeAdvisor::new(&["zout"], selection(Some("s1"), 0.9)));
        let mut engine = CartEngine::new(catalog.clone(), advisor);

        let mut salt = Ingredient::new("zout", 1.0, "tl", "spice");
        salt.already_available = true;
        let report = engine.fill_cart(&[salt]).await;

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].search_status, SearchStatus::Skipped);
        assert!(catalog.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_first_term_with_results() {
        let mut catalog = catalog_with("verse kip", &["s1", "s2"]);
        catalog
            .results
            .insert("kipfilet".to_string(), vec![product("s3")]);
        let catalog = Arc::new(catalog);
        let advisor = Arc::new(FakeAdvisor::new(
            &["kippendij", "verse kip", "kipfilet", "kip"],
            selection(Some("s1"), 0.9),
        ));
        let mut engine = CartEngine::new(catalog.clone(), advisor.clone());

        engine
            .fill_cart(&[Ingredient::new("kip", 500.0, "g", "meat")])
            .await;
        assert_eq!(
            *catalog.searches.lock().unwrap(),
            vec!["kippendij".to_string(), "verse kip".to_string()]
        );
        assert_eq!(*advisor.selections.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_candidates_are_capped() {
        let ids: Vec<String> = (0..20).map(|i| format!("s{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let catalog = Arc::new(catalog_with("ui", &refs));
        let advisor = Arc::new(FakeAdvisor::new(&["ui"], selection(Some("s1"), 0.9)));
        let mut engine = CartEngine::new(catalog, advisor.clone());

        engine
            .fill_cart(&[Ingredient::new("ui", 1.0, "stuks", "produce")])
            .await;
        assert_eq!(*advisor.selections.lock().unwrap(), vec![MAX_CANDIDATES]);
    }

    #[tokio::test]
    async fn test_empty_terms_fall_back_to_name() {
        let catalog = Arc::new(FakeCatalog::default());
        let advisor = Arc::new(FakeAdvisor::new(&[], selection(Some("s1"), 0.9)));
        let mut engine = CartEngine::new(catalog.clone(), advisor);

        let report = engine
            .fill_cart(&[Ingredient::new("Tahin", 1.0, "pot", "pantry")])
            .await;
        assert_eq!(*catalog.searches.lock().unwrap(), vec!["Tahin".to_string()]);
        assert_eq!(report.not_found[0].1, NO_RESULTS);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_isolated() {
        let catalog = Arc::new(FakeCatalog {
            failing: true,
            ..Default::default()
        });
        let advisor = Arc::new(FakeAdvisor::new(&["kip"], selection(Some("s1"), 0.9)));
        let mut engine = CartEngine::new(catalog, advisor);

        let report = engine
            .fill_cart(&[
                Ingredient::new("kip", 500.0, "g", "meat"),
                Ingredient::new("ui", 1.0, "stuks", "produce"),
            ])
            .await;
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.total(), 2);
        assert!(!report.errors[0].1.contains("503"));
    }
}
