use async_trait::async_trait;
use sqlx::SqlitePool;
use tastebook_shared::ingredient::{Ingredient, IngredientInput};
use tastebook_shared::unit::normalize_unit;
use tastebook_shared::{Error, Result};

/// Capability the resolver needs from the ingredient store. The sqlite
/// pool implements it for production; tests substitute mocks.
#[async_trait]
pub trait IngredientStore: Send + Sync {
    async fn find_by_strict_name(&self, name: &str) -> Result<Option<Ingredient>>;
    async fn create(&self, input: &IngredientInput) -> Result<Ingredient>;
}

#[async_trait]
impl IngredientStore for SqlitePool {
    async fn find_by_strict_name(&self, name: &str) -> Result<Option<Ingredient>> {
        tastebook_db::ingredients::find_by_strict_name(self, name).await
    }

    async fn create(&self, input: &IngredientInput) -> Result<Ingredient> {
        tastebook_db::ingredients::create(self, input).await
    }
}

/// Canonical ingredient name: trimmed, lowercased, internal whitespace
/// collapsed to single spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve a free-text ingredient name to an existing record, or create
/// one. Creation is optimistic: on the store's tagged `Conflict` (a
/// concurrent caller won the insert) the existing record is fetched and
/// returned. No other error kind is recovered here.
pub async fn resolve_or_create<S: IngredientStore + ?Sized>(
    store: &S,
    name: &str,
    unit: Option<&str>,
) -> Result<Ingredient> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(Error::BadRequest("Ingredient name is required".to_string()));
    }

    if let Some(existing) = store.find_by_strict_name(&name).await? {
        // Existing record wins; the unit argument is ignored.
        return Ok(existing);
    }

    let input = IngredientInput {
        name: name.clone(),
        unit: normalize_unit(unit),
        owner_id: None,
    };

    match store.create(&input).await {
        Ok(created) => Ok(created),
        Err(err) if err.is_conflict() => {
            store.find_by_strict_name(&name).await?.ok_or_else(|| {
                Error::Internal(format!(
                    "ingredient '{name}' missing after create conflict"
                ))
            })
        }
        Err(err) => Err(err),
    }
}
