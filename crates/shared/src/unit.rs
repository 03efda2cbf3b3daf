use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Measurement units an ingredient can be expressed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    #[default]
    Unit,
    Gr,
    Ml,
    Tsp,
    Tbsp,
    Cloves,
}

/// Map a free-form unit string onto the closed unit set. Unrecognized or
/// absent units default to [`Unit::Unit`].
pub fn normalize_unit(raw: Option<&str>) -> Unit {
    let Some(raw) = raw else {
        return Unit::Unit;
    };
    match raw.trim().to_lowercase().as_str() {
        "g" | "gram" | "grams" | "kg" => Unit::Gr,
        "l" | "liter" | "litre" => Unit::Ml,
        "clove" => Unit::Cloves,
        "pc" | "pcs" | "piece" | "pieces" => Unit::Unit,
        "teaspoon" | "teaspoons" => Unit::Tsp,
        "tablespoon" | "tablespoons" => Unit::Tbsp,
        other => Unit::from_str(other).unwrap_or(Unit::Unit),
    }
}
