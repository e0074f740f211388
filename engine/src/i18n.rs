//! Localized user-facing text
//!
//! All text sent to the family lives in one table keyed by message and
//! locale. A message missing for a locale falls back to English, and a
//! message missing everywhere renders as `[key]` so gaps are visible.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    Nl,
    En,
}

impl Locale {
    pub const FALLBACK: Locale = Locale::En;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nl => "nl",
            Self::En => "en",
        }
    }

    /// Language name used in collaborator prompts
    pub fn language_name(&self) -> &'static str {
        match self {
            Self::Nl => "Dutch",
            Self::En => "English",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nl" => Ok(Self::Nl),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    AskPreferences,
    ThanksPreference,
    AllResponded,
    AskApproval,
    PlanApproved,
    FullRejection,
    AdjustingPlan,
    RevisionFailed,
    PlanFailed,
    FillingCart,
    PantryMarked,
    PantryNone,
    SessionActive,
    Cancelled,
    CartFailed,
    MenuHeader,
    PantryQuestion,
    PantryFooter,
    ShoppingList,
    CartAdded,
    CartNotFound,
    CartErrors,
    CartFooter,
    PrepTime,
    Servings,
    Ingredients,
    Instructions,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AskPreferences => "ask_preferences",
            Self::ThanksPreference => "thanks_preference",
            Self::AllResponded => "all_responded",
            Self::AskApproval => "ask_approval",
            Self::PlanApproved => "plan_approved",
            Self::FullRejection => "full_rejection",
            Self::AdjustingPlan => "adjusting_plan",
            Self::RevisionFailed => "revision_failed",
            Self::PlanFailed => "plan_failed",
            Self::FillingCart => "filling_cart",
            Self::PantryMarked => "pantry_marked",
            Self::PantryNone => "pantry_none",
            Self::SessionActive => "session_active",
            Self::Cancelled => "cancelled",
            Self::CartFailed => "cart_failed",
            Self::MenuHeader => "menu_header",
            Self::PantryQuestion => "pantry_question",
            Self::PantryFooter => "pantry_footer",
            Self::ShoppingList => "shopping_list",
            Self::CartAdded => "cart_added",
            Self::CartNotFound => "cart_not_found",
            Self::CartErrors => "cart_errors",
            Self::CartFooter => "cart_footer",
            Self::PrepTime => "prep_time",
            Self::Servings => "servings",
            Self::Ingredients => "ingredients",
            Self::Instructions => "instructions",
        }
    }
}

type Entry = (MessageKey, Locale, &'static str);

const TEMPLATES: &[Entry] = &[
    (
        MessageKey::AskPreferences,
        Locale::Nl,
        "Hoi! Het is weer tijd om het eten te plannen. Waar hebben jullie de komende dagen zin in?\n\nStuur me je wensen, dan maak ik er een weekmenu van.",
    ),
    (
        MessageKey::AskPreferences,
        Locale::En,
        "Hi! It's time to plan dinner again. What do you feel like eating the next few days?\n\nSend me your wishes and I'll turn them into a menu.",
    ),
    (MessageKey::ThanksPreference, Locale::Nl, "Dank je {name}! Ik neem het mee."),
    (MessageKey::ThanksPreference, Locale::En, "Thanks {name}! I'll take that into account."),
    (MessageKey::AllResponded, Locale::Nl, "Iedereen heeft gereageerd, ik ga het menu maken..."),
    (MessageKey::AllResponded, Locale::En, "Everyone has answered, I'm putting the menu together..."),
    (
        MessageKey::AskApproval,
        Locale::Nl,
        "Ziet dit er goed uit? Stuur 'ok' om verder te gaan, of laat weten wat er anders moet.",
    ),
    (
        MessageKey::AskApproval,
        Locale::En,
        "Does this look good? Send 'ok' to continue, or tell me what should change.",
    ),
    (MessageKey::PlanApproved, Locale::Nl, "Top! Ik maak de boodschappenlijst."),
    (MessageKey::PlanApproved, Locale::En, "Great! I'll put the shopping list together."),
    (MessageKey::FullRejection, Locale::Nl, "Oké, ik begin opnieuw met een heel nieuw menu..."),
    (MessageKey::FullRejection, Locale::En, "Okay, starting over with a whole new menu..."),
    (MessageKey::AdjustingPlan, Locale::Nl, "Ik pas het menu aan, momentje..."),
    (MessageKey::AdjustingPlan, Locale::En, "Adjusting the menu, one moment..."),
    (
        MessageKey::RevisionFailed,
        Locale::Nl,
        "Sorry, aanpassen lukte niet. Probeer het nog eens of stuur 'ok' om verder te gaan.",
    ),
    (
        MessageKey::RevisionFailed,
        Locale::En,
        "Sorry, I couldn't make that change. Try again or send 'ok' to continue.",
    ),
    (
        MessageKey::PlanFailed,
        Locale::Nl,
        "Sorry, het menu maken ging mis. Stuur 'plan eten' om het nog eens te proberen.",
    ),
    (
        MessageKey::PlanFailed,
        Locale::En,
        "Sorry, something went wrong making the menu. Send 'plan dinner' to try again.",
    ),
    (MessageKey::FillingCart, Locale::Nl, "Ik zet de boodschappen in je Picnic mandje..."),
    (MessageKey::FillingCart, Locale::En, "Adding the groceries to your Picnic cart..."),
    (MessageKey::PantryMarked, Locale::Nl, "{count} ingrediënt(en) gemarkeerd als al in huis."),
    (MessageKey::PantryMarked, Locale::En, "Marked {count} ingredient(s) as already at home."),
    (MessageKey::PantryNone, Locale::Nl, "Oké, ik bestel alles."),
    (MessageKey::PantryNone, Locale::En, "Okay, I'll order everything."),
    (
        MessageKey::SessionActive,
        Locale::Nl,
        "Er loopt al een planning. Maak die eerst af of stuur 'stop'.",
    ),
    (
        MessageKey::SessionActive,
        Locale::En,
        "A planning round is already running. Finish it first or send 'stop'.",
    ),
    (MessageKey::Cancelled, Locale::Nl, "Planning gestopt."),
    (MessageKey::Cancelled, Locale::En, "Planning cancelled."),
    (
        MessageKey::CartFailed,
        Locale::Nl,
        "Het bijwerken van de boodschappenlijst ging mis. Kijk in de Picnic app wat er in je mandje zit.",
    ),
    (
        MessageKey::CartFailed,
        Locale::En,
        "Updating the shopping list failed. Check the Picnic app to see what is in your cart.",
    ),
    (MessageKey::MenuHeader, Locale::Nl, "Dit is het menu voor deze week:"),
    (MessageKey::MenuHeader, Locale::En, "Here's the menu for this week:"),
    (MessageKey::PantryQuestion, Locale::Nl, "Welke van deze dingen heb je al in huis?"),
    (MessageKey::PantryQuestion, Locale::En, "Which of these do you already have at home?"),
    (MessageKey::PantryFooter, Locale::Nl, "Stuur me wat je al hebt, dan sla ik dat over."),
    (MessageKey::PantryFooter, Locale::En, "Tell me what you already have and I'll skip it."),
    (MessageKey::ShoppingList, Locale::Nl, "Boodschappenlijst:"),
    (MessageKey::ShoppingList, Locale::En, "Shopping list:"),
    (MessageKey::CartAdded, Locale::Nl, "{count} product(en) in je Picnic mandje gezet!"),
    (MessageKey::CartAdded, Locale::En, "Added {count} product(s) to your Picnic cart!"),
    (MessageKey::CartNotFound, Locale::Nl, "Niet gevonden:"),
    (MessageKey::CartNotFound, Locale::En, "Could not find:"),
    (MessageKey::CartErrors, Locale::Nl, "Problemen bij toevoegen:"),
    (MessageKey::CartErrors, Locale::En, "Problems while adding:"),
    (
        MessageKey::CartFooter,
        Locale::Nl,
        "Open de Picnic app om je mandje na te kijken en te bestellen.",
    ),
    (
        MessageKey::CartFooter,
        Locale::En,
        "Open the Picnic app to check your cart and place the order.",
    ),
    (MessageKey::PrepTime, Locale::Nl, "Bereidingstijd:"),
    (MessageKey::PrepTime, Locale::En, "Prep time:"),
    (MessageKey::Servings, Locale::Nl, "Porties:"),
    (MessageKey::Servings, Locale::En, "Servings:"),
    (MessageKey::Ingredients, Locale::Nl, "Ingrediënten:"),
    (MessageKey::Ingredients, Locale::En, "Ingredients:"),
    (MessageKey::Instructions, Locale::Nl, "Bereiding:"),
    (MessageKey::Instructions, Locale::En, "Instructions:"),
];

fn lookup_in(table: &[Entry], key: MessageKey, locale: Locale) -> Option<&'static str> {
    let find = |wanted: Locale| {
        table
            .iter()
            .find(|(k, l, _)| *k == key && *l == wanted)
            .map(|(_, _, text)| *text)
    };
    find(locale).or_else(|| find(Locale::FALLBACK))
}

/// Template for `key` in `locale`, falling back to English
pub fn template(key: MessageKey, locale: Locale) -> Option<&'static str> {
    lookup_in(TEMPLATES, key, locale)
}

/// Render a message, substituting `{name}` style placeholders
pub fn render(key: MessageKey, locale: Locale, args: &[(&str, &str)]) -> String {
    let mut text = match template(key, locale) {
        Some(text) => text.to_string(),
        None => return format!("[{}]", key.as_str()),
    };
    for (name, value) in args {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}

/// Short weekday label
pub fn weekday_label(weekday: Weekday, locale: Locale) -> &'static str {
    let index = weekday.num_days_from_monday() as usize;
    match locale {
        Locale::Nl => ["ma", "di", "wo", "do", "vr", "za", "zo"][index],
        Locale::En => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"][index],
    }
}

/// Short month label
pub fn month_label(month: u32, locale: Locale) -> &'static str {
    const NL: [&str; 12] = [
        "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
    ];
    const EN: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let index = (month.clamp(1, 12) - 1) as usize;
    match locale {
        Locale::Nl => NL[index],
        Locale::En => EN[index],
    }
}

/// "Mon 03 Mar" style label for a plan day
pub fn day_label(date: NaiveDate, locale: Locale) -> String {
    format!(
        "{} {:02} {}",
        weekday_label(date.weekday(), locale),
        date.day(),
        month_label(date.month(), locale)
    )
}

/// Phrases that start a planning round without asking the classifier
pub const TRIGGER_PHRASES: &[&str] = &[
    "plan dinner",
    "plan eten",
    "plan het eten",
    "wat eten we",
    "meal plan",
    "boodschappen",
    "start planning",
    "plan meals",
    "weekmenu",
    "dinner plan",
    "plan food",
    "plan the food",
    "what's for dinner",
    "what are we eating",
];

pub fn is_trigger_phrase(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    !text.is_empty() && TRIGGER_PHRASES.iter().any(|phrase| text.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_english_text() {
        let keys = TEMPLATES.iter().map(|(key, _, _)| *key);
        for key in keys {
            assert!(
                TEMPLATES
                    .iter()
                    .any(|(k, l, _)| *k == key && *l == Locale::En),
                "{} has no English text",
                key.as_str()
            );
        }
    }

    #[test]
    fn test_missing_locale_falls_back_to_english() {
        let table: &[Entry] = &[(MessageKey::Cancelled, Locale::En, "Planning cancelled.")];
        assert_eq!(
            lookup_in(table, MessageKey::Cancelled, Locale::Nl),
            Some("Planning cancelled.")
        );
        assert_eq!(lookup_in(table, MessageKey::Servings, Locale::Nl), None);
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let text = render(MessageKey::ThanksPreference, Locale::En, &[("name", "Sam")]);
        assert_eq!(text, "Thanks Sam! I'll take that into account.");

        let marked = render(MessageKey::PantryMarked, Locale::Nl, &[("count", "3")]);
        assert!(marked.starts_with("3 "));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("NL".parse::<Locale>(), Ok(Locale::Nl));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_day_label() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(day_label(date, Locale::En), "Mon 04 Mar");
        assert_eq!(day_label(date, Locale::Nl), "ma 04 mrt");
    }

    #[test]
    fn test_trigger_phrases() {
        assert!(is_trigger_phrase("Plan Dinner please"));
        assert!(is_trigger_phrase("  wat eten we vandaag?"));
        assert!(is_trigger_phrase("WHAT'S FOR DINNER"));
        assert!(!is_trigger_phrase("dinner was great"));
        assert!(!is_trigger_phrase("plan"));
        assert!(!is_trigger_phrase(""));
    }
}
