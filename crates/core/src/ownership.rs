use std::future::Future;

use serde_json::Value;
use tastebook_shared::id::is_object_id;
use tastebook_shared::user::Role;
use tastebook_shared::{Error, Result};

/// The authenticated principal an authorization decision is made for.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Pull the owner id out of a resource document. Tolerates the field
/// holding a raw id string or an embedded object carrying `id`/`_id`;
/// anything else resolves to `None` rather than an error.
pub fn extract_owner_id(resource: &Value, field: &str) -> Option<String> {
    match resource.get(field)? {
        Value::String(id) => Some(id.clone()),
        Value::Object(embedded) => embedded
            .get("id")
            .or_else(|| embedded.get("_id"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

/// Decide whether `acting` may manage the resource behind `resource_id`.
///
/// The resolver is injected per resource kind (bound to that repository's
/// `find_by_id`), `owner_field` names the document field holding the
/// owner. Admins always pass; otherwise the extracted owner id must equal
/// the principal's id. Read-only: no side effects on any outcome.
pub async fn authorize<F, Fut>(
    resource_id: &str,
    find_by_id: F,
    owner_field: &str,
    resource_name: &str,
    acting: &Principal,
) -> Result<()>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Option<Value>>>,
{
    if !is_object_id(resource_id) {
        return Err(Error::InvalidInput("Invalid ID".to_string()));
    }

    let Some(resource) = find_by_id(resource_id.to_string()).await? else {
        return Err(Error::NotFound(format!("{resource_name} not found")));
    };

    if acting.is_admin() {
        return Ok(());
    }

    match extract_owner_id(&resource, owner_field) {
        Some(owner_id) if owner_id.eq_ignore_ascii_case(&acting.id) => Ok(()),
        _ => Err(Error::Forbidden(format!(
            "Not authorized to manage this {resource_name}"
        ))),
    }
}
