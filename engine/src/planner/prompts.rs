//! Prompt templates for the LLM assistant
//!
//! Every prompt asks for bare JSON. Placeholders use `{name}` and are filled
//! with [`fill`].

pub const SYSTEM_JSON: &str = "You help a household plan its dinners. \
Answer with a single JSON value and nothing else: no prose, no code fences.";

pub const CLASSIFY: &str = r#"Decide what a family member means in a dinner planning chat.

Message: "{text}"
Planning phase: {state}
Sender: {role}

Possible intents:
- trigger: wants to start planning dinners or shopping
- preference: tells what they like, dislike or wish to eat
- approval: accepts the proposed menu
- rejection: wants a completely new menu
- change_request: wants specific meals changed
- pantry_response: says which ingredients are already at home
- cancel: wants to stop planning
- greeting: only says hello
- other: anything else

Respond with:
{"intent": "<one of the intents>", "confidence": <0.0-1.0>, "summary": "<short paraphrase>"}"#;

pub const EXTRACT_PREFERENCES: &str = r#"Pull food preferences out of a message from {name} ({role}).

Message: "{text}"

Already known about {name}:
{known}

Categories: likes, dislikes, allergy, dietary, cuisine_preference, general.
Put concrete requests for this week's dinners in "wishes".
Mark a fact that repeats a known one with "is_update": true.
Set "has_food_content" to false when the message is not about food.

Respond with:
{"preferences": [{"category": "...", "detail": "...", "confidence": 0.0, "is_update": false}], "wishes": ["..."], "has_food_content": true}"#;

pub const GENERATE_PLAN: &str = r#"Plan {days} dinners, one per day, starting {start}.

Household:
{members}

Wishes for this week:
{wishes}

Known preferences:
{preferences}

Eaten recently, do not repeat:
{history}

It is {month}, {season}. Favour seasonal produce sold in Dutch supermarkets.

Requirements:
- no cuisine or main protein on two consecutive days
- at least one vegetarian dinner
- at least two dinners children will like
- mix quick dinners (under 30 minutes) with longer ones
- Dutch ingredient names and metric units so products can be found online
- categories: produce, meat, fish, dairy, bakery, pantry, spice, frozen, other
- servings: {servings}
- write names, descriptions and instructions in {language}
- honour the wishes

Respond with:
{"plan": [{"date": "YYYY-MM-DD", "recipe": {"name": "...", "description": "...", "servings": 4, "prep_time_minutes": 10, "cook_time_minutes": 20, "cuisine": "...", "tags": ["..."], "ingredients": [{"name": "...", "quantity": 1, "unit": "g", "category": "produce", "optional": false}], "instructions": "..."}}], "reasoning": "..."}"#;

pub const REVISE_PLAN: &str = r#"A parent asked for changes to this dinner plan.

Current plan:
{plan}

Feedback: "{feedback}"

Replace only the dinners the feedback is about and return every other dinner
unchanged, with the same date and ingredients. Replacements need full
ingredient lists and instructions, Dutch ingredient names and metric units.

Respond with the complete plan in the same shape:
{"plan": [{"date": "YYYY-MM-DD", "recipe": {...}}], "reasoning": "..."}"#;

pub const MATCH_PANTRY: &str = r#"A parent said what is already at home.

Message: "{text}"

Ingredients needed this week:
{ingredients}

Return the ingredients from the list that the message clearly covers. The
parent may use English, informal, singular or plural names, or a general word
covering several items ("oil" covers every oil). If they have nothing, return
an empty list. Use the names exactly as listed.

Respond with:
["name", "name"]"#;

pub const SEARCH_TERMS: &str = r#"Suggest Dutch supermarket search terms for one ingredient.

Ingredient: {name}, {quantity} {unit}
Category: {category}

Give two or three terms as they would appear on a product label, best first.

Respond with:
["term", "term"]"#;

pub const SELECT_PRODUCT: &str = r#"Choose the product that best covers a recipe ingredient.

Needed: {quantity} {unit} {name}

Products:
{products}

Prefer the plain, common and cheaper option. When one pack is not enough,
raise "count". When nothing fits, use null for product_id and confidence 0.

Respond with:
{"product_id": "...", "product_name": "...", "count": 1, "confidence": 0.0, "note": "..."}"#;

/// Replace `{key}` placeholders in a template
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_leaves_json_braces() {
        let text = fill(SEARCH_TERMS, &[("name", "ui"), ("quantity", "2"), ("unit", "stuks"), ("category", "produce")]);
        assert!(text.contains("Ingredient: ui, 2 stuks"));
        assert!(text.contains(r#"["term", "term"]"#));
    }
}
