use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

/// Closed vocabulary of recipe category tags. Any persisted category must
/// be a member of this set.
///
/// The set is historical: it carries both `soup` and `soups`, so the
/// plural-stripping heuristic below never fires for either of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    Vegan,
    Carnivore,
    HighFat,
    Baked,
    Vegetarian,
    GlutenFree,
    LowCarb,
    Keto,
    Paleo,
    HighProtein,
    Dessert,
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Soup,
    Pasta,
    QuickMeals,
    Salad,
    Mediterranean,
    Soups,
}

/// Recipes carry at most this many categories.
pub const MAX_CATEGORIES: usize = 4;

/// Used when normalization yields no valid category at all.
pub const FALLBACK_CATEGORY: Category = Category::Dinner;

fn map_synonym(slug: &str) -> &str {
    match slug {
        "meat" | "meat-based" => "carnivore",
        "veggie" | "veggies" => "vegetarian",
        other => other,
    }
}

/// Normalize a list of free-form category candidates against the closed
/// vocabulary: lowercase, hyphenate internal whitespace, strip a plural
/// `s` when the singular form is a member, map synonyms, drop everything
/// still outside the set, de-duplicate, and cap at [`MAX_CATEGORIES`].
///
/// Non-string candidates are ignored. The caller decides whether an empty
/// result falls back to [`FALLBACK_CATEGORY`].
pub fn normalize_categories(raw: &[Value]) -> Vec<Category> {
    let mut out = Vec::new();

    for candidate in raw {
        let Some(text) = candidate.as_str() else {
            continue;
        };
        let mut slug = text
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");

        // Heuristic: strip a trailing `s` only when the singular form is a
        // member of the vocabulary (e.g. "vegans" -> "vegan").
        if Category::from_str(&slug).is_err() {
            if let Some(singular) = slug.strip_suffix('s') {
                if Category::from_str(singular).is_ok() {
                    slug = singular.to_string();
                }
            }
        }

        let Ok(category) = Category::from_str(map_synonym(&slug)) else {
            continue;
        };
        if !out.contains(&category) {
            out.push(category);
        }
        if out.len() == MAX_CATEGORIES {
            break;
        }
    }

    out
}
