//! CSV parsing for the admin bulk-import endpoints and the matching
//! template downloads. Columns holding embedded JSON (ingredients,
//! instructions, categories, utensils) are parsed here; everything else
//! stays a string and the import normalizer does the rest.

use serde_json::{Map, Value};
use tastebook_shared::{Error, Result};

const RECIPE_HEADERS: [&str; 8] = [
    "title",
    "ingredients",
    "instructions",
    "servings",
    "prepTime",
    "categories",
    "utensils",
    "imgUrl",
];

const INGREDIENT_HEADERS: [&str; 2] = ["name", "unit"];

const USER_HEADERS: [&str; 6] = ["name", "email", "password", "role", "shortBio", "isVerified"];

const JSON_COLUMNS: [&str; 4] = ["ingredients", "instructions", "categories", "utensils"];
const NUMERIC_COLUMNS: [&str; 2] = ["servings", "prepTime"];

fn cell_value(header: &str, raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    if JSON_COLUMNS.contains(&header) {
        return serde_json::from_str(raw).unwrap_or(Value::Null);
    }
    if NUMERIC_COLUMNS.contains(&header) {
        return raw.parse::<u64>().map(Value::from).unwrap_or(Value::Null);
    }
    if header == "isVerified" {
        return Value::Bool(raw.eq_ignore_ascii_case("true"));
    }
    Value::String(raw.to_string())
}

/// Parse a CSV body into loosely-typed row documents keyed by header.
pub fn read_rows(content: &[u8]) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|err| Error::BadRequest(format!("Invalid CSV: {err}")))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| Error::BadRequest(format!("Invalid CSV: {err}")))?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            let value = cell_value(header, cell);
            if !value.is_null() {
                row.insert(header.to_string(), value);
            }
        }
        if !row.is_empty() {
            rows.push(Value::Object(row));
        }
    }
    Ok(rows)
}

fn template(headers: &[&str], example: &[&str]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // Header and example row lengths are fixed at compile time.
    let _ = writer.write_record(headers);
    let _ = writer.write_record(example);
    String::from_utf8(writer.into_inner().unwrap_or_default()).unwrap_or_default()
}

pub fn recipes_template() -> String {
    template(
        &RECIPE_HEADERS,
        &[
            "Sugar Cookies",
            r#"[{"ingredientName":"Sugar","unit":"gr","quantity":100},{"ingredientName":"Milk","unit":"ml","quantity":200}]"#,
            r#"["Preheat oven to 180C","Mix sugar and butter until fluffy","Bake for 20 minutes"]"#,
            "4",
            "30",
            r#"["vegan","dessert"]"#,
            r#"["spoon","bowl"]"#,
            "",
        ],
    )
}

pub fn ingredients_template() -> String {
    template(&INGREDIENT_HEADERS, &["Sugar", "gr"])
}

pub fn users_template() -> String {
    template(
        &USER_HEADERS,
        &[
            "Alice Example",
            "alice@example.com",
            "changeme123",
            "user",
            "Short bio",
            "false",
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_csv_parses_embedded_json() {
        let rows = read_rows(recipes_template().as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["title"], "Sugar Cookies");
        assert_eq!(row["servings"], json!(4));
        assert_eq!(row["prepTime"], json!(30));
        assert_eq!(row["ingredients"][0]["ingredientName"], "Sugar");
        assert_eq!(row["ingredients"][1]["quantity"], json!(200));
        assert_eq!(row["categories"], json!(["vegan", "dessert"]));
        assert!(row.get("imgUrl").is_none());
    }

    #[test]
    fn user_csv_parses_booleans() {
        let rows = read_rows(users_template().as_bytes()).unwrap();
        assert_eq!(rows[0]["isVerified"], json!(false));
        assert_eq!(rows[0]["role"], "user");
    }

    #[test]
    fn malformed_json_cells_become_absent() {
        let csv = "title,ingredients,instructions\nSoup,not-json,\"[\"\"Boil\"\"]\"\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert!(rows[0].get("ingredients").is_none());
        assert_eq!(rows[0]["instructions"], json!(["Boil"]));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let csv = "name,unit\nSalt,gr\n,\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Salt");
    }

    #[test]
    fn ingredient_template_round_trips() {
        let rows = read_rows(ingredients_template().as_bytes()).unwrap();
        assert_eq!(rows[0]["name"], "Sugar");
        assert_eq!(rows[0]["unit"], "gr");
    }
}
