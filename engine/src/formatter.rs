//! Plain-text rendering of plans, ingredient lists and cart reports for
//! chat messages

use sdk::types::{Ingredient, Recipe};
use std::collections::BTreeMap;

use crate::cart::CartReport;
use crate::i18n::{day_label, render, Locale, MessageKey};
use crate::merge::merge_for_export;

fn label(key: MessageKey, locale: Locale) -> String {
    render(key, locale, &[])
}

/// Quantity without trailing zeros; zero renders as nothing
pub fn format_quantity(quantity: f64, unit: &str) -> String {
    if quantity <= 0.0 {
        return String::new();
    }
    let number = if quantity.fract().abs() < 1e-9 {
        format!("{}", quantity as i64)
    } else {
        let text = format!("{:.2}", quantity);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    format!("{} {}", number, unit).trim().to_string()
}

fn ingredient_line(ingredient: &Ingredient) -> String {
    format!(
        "{} {}",
        ingredient.name,
        format_quantity(ingredient.quantity, &ingredient.unit)
    )
    .trim()
    .to_string()
}

pub fn format_meal_plan(recipes: &[Recipe], locale: Locale) -> String {
    let mut lines = vec![label(MessageKey::MenuHeader, locale), String::new()];

    for recipe in recipes {
        let minutes = recipe.total_minutes();
        let time = if minutes > 0 {
            format!(" ({} min)", minutes)
        } else {
            String::new()
        };
        lines.push(format!(
            "{} - {}{}",
            day_label(recipe.planned_date, locale),
            recipe.name,
            time
        ));
        if !recipe.description.is_empty() {
            lines.push(format!("  {}", recipe.description));
        }
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}

/// Pantry question for required pantry staples; empty when there are none
pub fn format_pantry_check(merged: &[Ingredient], locale: Locale) -> String {
    let staples: Vec<&Ingredient> = merged
        .iter()
        .filter(|ingredient| ingredient.is_pantry_staple() && !ingredient.optional)
        .collect();

    if staples.is_empty() {
        return String::new();
    }

    let mut lines = vec![label(MessageKey::PantryQuestion, locale), String::new()];
    lines.extend(staples.iter().map(|ingredient| format!("- {}", ingredient_line(ingredient))));
    lines.push(String::new());
    lines.push(label(MessageKey::PantryFooter, locale));
    lines.join("\n")
}

/// Complete shopping list across recipes, grouped by category
pub fn format_full_ingredient_list(recipes: &[Recipe], locale: Locale) -> String {
    let merged = merge_for_export(recipes.iter().flat_map(|recipe| recipe.ingredients.iter()));

    let mut by_category: BTreeMap<&str, Vec<&Ingredient>> = BTreeMap::new();
    for ingredient in &merged {
        by_category
            .entry(ingredient.category.as_str())
            .or_default()
            .push(ingredient);
    }

    let mut lines = vec![label(MessageKey::ShoppingList, locale), String::new()];
    for (category, mut items) in by_category {
        items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        lines.push(format!("[{}]", category));
        lines.extend(items.iter().map(|ingredient| format!("  {}", ingredient_line(ingredient))));
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}

pub fn format_cart_report(report: &CartReport, locale: Locale) -> String {
    let mut lines = Vec::new();

    if !report.added.is_empty() {
        lines.push(render(
            MessageKey::CartAdded,
            locale,
            &[("count", &report.added.len().to_string())],
        ));
    }

    if !report.not_found.is_empty() {
        lines.push(String::new());
        lines.push(label(MessageKey::CartNotFound, locale));
        for (ingredient, note) in &report.not_found {
            lines.push(format!("- {} ({})", ingredient.name, note));
        }
    }

    if !report.errors.is_empty() {
        lines.push(String::new());
        lines.push(label(MessageKey::CartErrors, locale));
        for (ingredient, error) in &report.errors {
            lines.push(format!("- {}: {}", ingredient.name, error));
        }
    }

    lines.push(String::new());
    lines.push(label(MessageKey::CartFooter, locale));
    lines.join("\n").trim_start().to_string()
}

pub fn format_recipe_detail(recipe: &Recipe, locale: Locale) -> String {
    let mut lines = vec![
        format!("*{}*", recipe.name),
        recipe.description.clone(),
        String::new(),
        format!("{} {} min", label(MessageKey::PrepTime, locale), recipe.total_minutes()),
        format!("{} {}", label(MessageKey::Servings, locale), recipe.servings),
        String::new(),
        label(MessageKey::Ingredients, locale),
    ];

    for ingredient in &recipe.ingredients {
        let quantity = format_quantity(ingredient.quantity, &ingredient.unit);
        lines.push(format!("- {} {}", quantity, ingredient.name).replace("-  ", "- "));
    }

    lines.push(String::new());
    lines.push(label(MessageKey::Instructions, locale));
    lines.push(recipe.instructions.clone());
    lines.join("\n")
}
