use super::object_id;
use log::debug;
use nsx::{ApiError, NsxApi, ObjectKind, References};
use serde_json::Value;

/// Looks up the ids of `names` on the manager.
///
/// Each kind is listed once, whatever the number of names of that kind. A name with
/// no match fails with [`ApiError::UnresolvedReference`].
pub async fn resolve_references<A>(
    api: &A,
    names: &[(ObjectKind, String)],
) -> Result<References, ApiError>
where
    A: NsxApi + ?Sized,
{
    let mut kinds: Vec<ObjectKind> = Vec::new();
    for (kind, _) in names {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }

    let mut refs = References::new();
    for kind in kinds {
        let objects = api.list(kind).await?;
        for (_, name) in names.iter().filter(|(k, _)| *k == kind) {
            let found = objects
                .iter()
                .find(|o| o.get(kind.natural_key()).and_then(Value::as_str) == Some(name.as_str()))
                .ok_or_else(|| ApiError::UnresolvedReference {
                    kind,
                    name: name.clone(),
                })?;
            let id = object_id(kind, found)?;
            debug!("Resolved {} '{}' to {}", kind, name, id);
            refs.insert(kind, name.clone(), id);
        }
    }
    Ok(refs)
}
