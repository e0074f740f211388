//! Ingredient merging
//!
//! Two policies combine the same ingredient appearing in several recipes:
//!
//! - [`merge_for_export`] feeds shopping lists and exported notes. Lines
//!   with the same name and unit are summed; a different unit for the same
//!   name stays a separate line.
//! - [`merge_for_cart`] feeds product resolution. The first unit seen for a
//!   name wins and later lines with another unit are dropped.
//!
//! Names are compared case-insensitively after trimming. On every merge the
//! `optional` and `already_available` flags are ANDed, so one required or
//! missing source keeps the merged line required or missing.

use sdk::types::Ingredient;
use std::collections::HashMap;

fn absorb(into: &mut Ingredient, other: &Ingredient) {
    into.quantity += other.quantity;
    into.optional = into.optional && other.optional;
    into.already_available = into.already_available && other.already_available;
}

/// Merge for display and export
///
/// Output order follows the first appearance of each name; the units of one
/// name are listed in the order they first appeared.
pub fn merge_for_export<'a, I>(ingredients: I) -> Vec<Ingredient>
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let mut names: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Vec<Ingredient>> = HashMap::new();

    for ingredient in ingredients {
        let key = ingredient.normalized_name();
        let lines = by_name.entry(key.clone()).or_insert_with(|| {
            names.push(key);
            Vec::new()
        });

        match lines.iter_mut().find(|line| line.unit == ingredient.unit) {
            Some(line) => absorb(line, ingredient),
            None => lines.push(ingredient.clone()),
        }
    }

    names
        .into_iter()
        .flat_map(|name| by_name.remove(&name).unwrap_or_default())
        .collect()
}

/// Merge for cart filling
///
/// A later line whose unit differs from the first-seen unit contributes
/// nothing to the output, not even its quantity.
pub fn merge_for_cart<'a, I>(ingredients: I) -> Vec<Ingredient>
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, Ingredient> = HashMap::new();

    for ingredient in ingredients {
        let key = ingredient.normalized_name();
        match merged.get_mut(&key) {
            Some(existing) if existing.unit == ingredient.unit => absorb(existing, ingredient),
            Some(_) => {}
            None => {
                order.push(key.clone());
                merged.insert(key, ingredient.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| merged.remove(&key))
        .collect()
}

/// Whether any required merged ingredient is a pantry staple worth asking about
pub fn needs_pantry_check(merged: &[Ingredient]) -> bool {
    merged
        .iter()
        .any(|ingredient| ingredient.is_pantry_staple() && !ingredient.optional)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ing(name: &str, quantity: f64, unit: &str) -> Ingredient {
        Ingredient::new(name, quantity, unit, "produce")
    }

    #[test]
    fn test_single_entry_is_unchanged() {
        let only = vec![ing("ui", 1.0, "stuks")];
        assert_eq!(merge_for_export(&only), only);
        assert_eq!(merge_for_cart(&only), only);
    }

    #[test]
    fn test_export_sums_same_unit() {
        let merged = merge_for_export(&[ing("ui", 1.0, "stuks"), ing("ui", 2.0, "stuks")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 3.0);
        assert_eq!(merged[0].unit, "stuks");
    }

    #[test]
    fn test_export_keeps_other_units_separate() {
        let merged = merge_for_export(&[ing("water", 200.0, "ml"), ing("water", 1.0, "l")]);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].quantity, merged[0].unit.as_str()), (200.0, "ml"));
        assert_eq!((merged[1].quantity, merged[1].unit.as_str()), (1.0, "l"));
    }

    #[test]
    fn test_export_groups_units_under_first_appearance() {
        let merged = merge_for_export(&[
            ing("water", 200.0, "ml"),
            ing("kip", 500.0, "g"),
            ing("Water", 1.0, "l"),
            ing("water ", 100.0, "ml"),
        ]);
        let lines: Vec<(String, f64)> = merged
            .iter()
            .map(|i| (format!("{} {}", i.normalized_name(), i.unit), i.quantity))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("water ml".to_string(), 300.0),
                ("water l".to_string(), 1.0),
                ("kip g".to_string(), 500.0),
            ]
        );
    }

    #[test]
    fn test_cart_drops_later_unit() {
        let merged = merge_for_cart(&[ing("water", 200.0, "ml"), ing("water", 1.0, "l")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 200.0);
        assert_eq!(merged[0].unit, "ml");
    }

    #[test]
    fn test_cart_is_case_insensitive() {
        let merged = merge_for_cart(&[ing("Ui", 1.0, "stuks"), ing(" ui", 2.0, "stuks")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 3.0);
        assert_eq!(merged[0].name, "Ui");
    }

    #[test]
    fn test_optional_flag_is_anded() {
        let mut optional = ing("peterselie", 1.0, "bos");
        optional.optional = true;
        let required = ing("peterselie", 1.0, "bos");

        assert!(!merge_for_export(&[optional.clone(), required.clone()])[0].optional);
        assert!(!merge_for_cart(&[optional.clone(), required])[0].optional);
        assert!(merge_for_cart(&[optional.clone(), optional])[0].optional);
    }

    #[test]
    fn test_available_flag_is_anded() {
        let mut have = ing("zout", 1.0, "tl");
        have.already_available = true;
        let missing = ing("zout", 1.0, "tl");

        assert!(merge_for_export(&[have.clone(), have.clone()])[0].already_available);
        assert!(!merge_for_cart(&[have, missing])[0].already_available);
    }

    #[test]
    fn test_needs_pantry_check() {
        let mut salt = Ingredient::new("zout", 1.0, "tl", "spice");
        assert!(needs_pantry_check(&[salt.clone()]));

        salt.optional = true;
        assert!(!needs_pantry_check(&[salt, ing("ui", 1.0, "stuks")]));
    }
}
