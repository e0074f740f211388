//! Markdown export of approved plans
//!
//! Writes into a notes folder:
//! - `recipes/<name>.md` per recipe, left alone when it already exists
//! - `meal-plans/<start> - Meal Plan.md` with the week table and shopping list
//! - `index.md` linking every exported plan, rewritten on each export

use regex::Regex;
use sdk::collaborators::PlanExporter;
use sdk::errors::EngineError;
use sdk::types::{Recipe, Session};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::formatter::format_quantity;
use crate::i18n::{day_label, Locale};
use crate::merge::merge_for_export;

const RECIPE_DIR: &str = "recipes";
const PLAN_DIR: &str = "meal-plans";
const PLAN_SUFFIX: &str = " - Meal Plan.md";
const MAX_FILE_STEM: usize = 120;

static FILE_NAME_PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();

/// (characters not allowed in file names, runs of dashes and whitespace)
fn file_name_patterns() -> &'static (Regex, Regex) {
    FILE_NAME_PATTERNS.get_or_init(|| {
        (
            Regex::new(r#"[\\/:*?"<>|]"#).expect("Invalid file name pattern"),
            Regex::new(r"[-\s]+").expect("Invalid separator pattern"),
        )
    })
}

/// A recipe name usable as a file name on every platform
pub fn sanitize_file_name(name: &str) -> String {
    let (unsafe_chars, separators) = file_name_patterns();
    let cleaned = unsafe_chars.replace_all(name, "-");
    let collapsed = separators.replace_all(&cleaned, " ");
    let trimmed = collapsed.trim().trim_matches('.').trim();
    let stem: String = trimmed.chars().take(MAX_FILE_STEM).collect();
    if stem.is_empty() {
        "recipe".to_string()
    } else {
        stem
    }
}

fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

pub fn render_recipe(recipe: &Recipe) -> String {
    let mut tags: Vec<&str> = Vec::new();
    for tag in std::iter::once(recipe.cuisine.as_str()).chain(recipe.tags.iter().map(String::as_str)) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut lines = vec![
        "---".to_string(),
        format!("cuisine: {}", yaml_string(&recipe.cuisine)),
    ];
    if tags.is_empty() {
        lines.push("tags: []".to_string());
    } else {
        lines.push("tags:".to_string());
        lines.extend(tags.iter().map(|tag| format!("  - {}", yaml_string(tag))));
    }
    lines.extend([
        format!("servings: {}", recipe.servings),
        format!("prep_time: {}", recipe.prep_time_minutes),
        format!("cook_time: {}", recipe.cook_time_minutes),
        format!("total_time: {}", recipe.total_minutes()),
        format!("date_planned: {}", recipe.planned_date),
        "---".to_string(),
        String::new(),
        format!("# {}", recipe.name),
        String::new(),
        recipe.description.clone(),
        String::new(),
        "## Ingredients".to_string(),
        String::new(),
    ]);

    for ingredient in merge_for_export(&recipe.ingredients) {
        let quantity = format_quantity(ingredient.quantity, &ingredient.unit);
        if quantity.is_empty() {
            lines.push(format!("- {}", ingredient.name));
        } else {
            lines.push(format!("- {} {}", quantity, ingredient.name));
        }
    }

    lines.extend([
        String::new(),
        "## Instructions".to_string(),
        String::new(),
        recipe.instructions.clone(),
    ]);
    lines.join("\n") + "\n"
}

pub fn render_plan(session: &Session, recipes: &[Recipe], locale: Locale) -> Option<String> {
    let first = recipes.first()?;
    let last = recipes.last()?;
    let start = session.plan_start_date.unwrap_or(first.planned_date);
    let end = session.plan_end_date.unwrap_or(last.planned_date);

    let mut lines = vec![
        "---".to_string(),
        format!("date_start: {}", start),
        format!("date_end: {}", end),
        format!("session: {}", session.id),
        "---".to_string(),
        String::new(),
        format!("# Meal Plan {} - {}", start, end),
        String::new(),
        "| Day | Meal | Time |".to_string(),
        "|-----|------|------|".to_string(),
    ];

    for recipe in recipes {
        lines.push(format!(
            "| {} | [[{}]] | {} min |",
            day_label(recipe.planned_date, locale),
            sanitize_file_name(&recipe.name),
            recipe.total_minutes()
        ));
    }

    lines.extend([String::new(), "## Shopping list".to_string(), String::new()]);
    let merged = merge_for_export(recipes.iter().flat_map(|recipe| recipe.ingredients.iter()));
    for ingredient in merged {
        let quantity = format_quantity(ingredient.quantity, &ingredient.unit);
        let checkbox = if ingredient.already_available { "x" } else { " " };
        lines.push(format!("- [{}] {} {}", checkbox, ingredient.name, quantity).trim_end().to_string());
    }

    Some(lines.join("\n") + "\n")
}

pub struct MarkdownExporter {
    root: PathBuf,
    locale: Locale,
}

impl MarkdownExporter {
    pub fn new(root: impl Into<PathBuf>, locale: Locale) -> Self {
        Self {
            root: root.into(),
            locale,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_recipe(&self, recipe: &Recipe) -> std::io::Result<bool> {
        let path = self
            .root
            .join(RECIPE_DIR)
            .join(format!("{}.md", sanitize_file_name(&recipe.name)));
        if path.exists() {
            debug!(recipe = %recipe.name, "Recipe note exists, skipping");
            return Ok(false);
        }
        fs::write(&path, render_recipe(recipe))?;
        Ok(true)
    }

    fn write_index(&self) -> std::io::Result<()> {
        let mut plans: Vec<String> = fs::read_dir(self.root.join(PLAN_DIR))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| name.strip_suffix(".md").map(str::to_string))
            .collect();
        plans.sort_by(|a, b| b.cmp(a));

        let mut lines = vec!["# Potluck".to_string(), String::new(), "## Meal plans".to_string(), String::new()];
        lines.extend(plans.iter().map(|plan| format!("- [[{}]]", plan)));
        fs::write(self.root.join("index.md"), lines.join("\n") + "\n")
    }
}

impl PlanExporter for MarkdownExporter {
    fn export(&self, session: &Session, recipes: &[Recipe]) -> Result<(), EngineError> {
        let Some(plan) = render_plan(session, recipes, self.locale) else {
            return Ok(());
        };

        fs::create_dir_all(self.root.join(RECIPE_DIR))?;
        fs::create_dir_all(self.root.join(PLAN_DIR))?;

        let mut written = 0;
        for recipe in recipes {
            if self.write_recipe(recipe)? {
                written += 1;
            }
        }

        let start = session
            .plan_start_date
            .unwrap_or(recipes[0].planned_date);
        fs::write(
            self.root.join(PLAN_DIR).join(format!("{}{}", start, PLAN_SUFFIX)),
            plan,
        )?;
        self.write_index()?;

        info!(
            root = %self.root.display(),
            new_recipes = written,
            "Exported meal plan"
        );
        Ok(())
    }
}
