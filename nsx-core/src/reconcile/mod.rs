//! Idempotent create/update/delete on top of [`NsxApi`].
//!
//! Objects are matched by their natural key (`display_name`, or `license_key` for
//! licenses). An existing object is only rewritten when the desired body is not
//! already contained in it. License keys only reach the log through
//! [`ObjectKind::redact`].

pub mod references;
pub mod typed;

use log::{debug, info, warn};
use nsx::{ApiError, NsxApi, ObjectId, ObjectKind};
use serde_json::Value;

pub use references::resolve_references;
pub use typed::{
    ensure_compute_manager, ensure_edge_cluster, ensure_ip_pool, ensure_license,
    ensure_transport_node, ensure_transport_zone, ensure_uplink_profile,
};

/// Fields the manager accepts but never returns. They are left out of the
/// comparison, so changing only a password does not trigger an update.
const WRITE_ONLY_FIELDS: &[&str] = &[
    "credential",
    "node_user_settings",
    "password",
    "cli_password",
    "root_password",
    "audit_password",
];

const REVISION_FIELD: &str = "_revision";

/// True when every field of `desired` is present with the same value in `existing`.
///
/// Objects are compared key by key, arrays element by element (same length) and
/// scalars by equality. Keys listed in `WRITE_ONLY_FIELDS` are ignored.
pub fn is_subset(desired: &Value, existing: &Value) -> bool {
    match (desired, existing) {
        (Value::Object(want), Value::Object(have)) => want.iter().all(|(key, value)| {
            WRITE_ONLY_FIELDS.contains(&key.as_str())
                || have
                    .get(key)
                    .map(|current| is_subset(value, current))
                    .unwrap_or(false)
        }),
        (Value::Array(want), Value::Array(have)) => {
            want.len() == have.len() && want.iter().zip(have).all(|(w, h)| is_subset(w, h))
        }
        _ => desired == existing,
    }
}

fn natural_key(kind: ObjectKind, body: &Value) -> Result<&str, ApiError> {
    body.get(kind.natural_key())
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "{} body has no '{}'",
                kind,
                kind.natural_key()
            ))
        })
}

/// Server-assigned id of an object returned by the manager.
pub fn object_id(kind: ObjectKind, object: &Value) -> Result<ObjectId, ApiError> {
    object
        .get(kind.id_field())
        .and_then(Value::as_str)
        .map(ObjectId::new)
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!("{} has no '{}'", kind, kind.id_field()))
        })
}

/// Finds the object of `kind` whose natural key equals `name`.
pub async fn find_existing<A>(api: &A, kind: ObjectKind, name: &str) -> Result<Option<Value>, ApiError>
where
    A: NsxApi + ?Sized,
{
    let mut matches = api
        .list(kind)
        .await?
        .into_iter()
        .filter(|o| o.get(kind.natural_key()).and_then(Value::as_str) == Some(name));
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        warn!("More than one {} named '{}', using the first", kind, kind.redact(name));
    }
    Ok(first)
}

/// Makes sure an object matching `desired` exists.
///
/// # Arguments
///
/// * `api` - The manager to talk to.
/// * `kind` - Collection of the object.
/// * `desired` - Full request body, natural key included.
///
/// # Returns
///
/// * `Ok(ObjectId)` - Id of the created, updated or untouched object.
/// * `Err(ApiError)` - The first failed call.
pub async fn ensure_present<A>(api: &A, kind: ObjectKind, desired: &Value) -> Result<ObjectId, ApiError>
where
    A: NsxApi + ?Sized,
{
    let name = natural_key(kind, desired)?;
    let shown = kind.redact(name);

    let Some(existing) = find_existing(api, kind, name).await? else {
        info!("Creating {} '{}'", kind, shown);
        return match api.create(kind, desired).await {
            Ok(created) => object_id(kind, &created),
            Err(err @ ApiError::Unconfirmed { .. }) => {
                confirm_created(api, kind, name, &shown, err).await
            }
            Err(err) => Err(err),
        };
    };

    let id = object_id(kind, &existing)?;
    if is_subset(desired, &existing) {
        debug!("{} '{}' is up to date", kind, shown);
        return Ok(id);
    }

    let mut body = desired.clone();
    if let (Some(fields), Some(revision)) = (body.as_object_mut(), existing.get(REVISION_FIELD)) {
        fields.insert(REVISION_FIELD.to_string(), revision.clone());
    }
    info!("Updating {} '{}'", kind, shown);
    api.update(kind, &id, &body).await?;
    Ok(id)
}

/// Looks for an object whose create was not confirmed. Found, it counts as
/// created; missing, the original error stands.
async fn confirm_created<A>(
    api: &A,
    kind: ObjectKind,
    name: &str,
    shown: &str,
    err: ApiError,
) -> Result<ObjectId, ApiError>
where
    A: NsxApi + ?Sized,
{
    warn!("{}; checking whether {} '{}' exists", err, kind, shown);
    match find_existing(api, kind, name).await? {
        Some(created) => {
            info!("{} '{}' was created", kind, shown);
            object_id(kind, &created)
        }
        None => Err(err),
    }
}

/// Deletes the object of `kind` named `name` when it exists.
pub async fn ensure_absent<A>(api: &A, kind: ObjectKind, name: &str) -> Result<(), ApiError>
where
    A: NsxApi + ?Sized,
{
    match find_existing(api, kind, name).await? {
        Some(existing) => {
            let id = object_id(kind, &existing)?;
            info!("Deleting {} '{}'", kind, kind.redact(name));
            api.delete(kind, &id).await
        }
        None => {
            debug!("{} '{}' already absent", kind, kind.redact(name));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{Call, InMemoryNsx, Op};
    use nsx::NetworkError;
    use serde_json::json;

    fn unconfirmed() -> ApiError {
        ApiError::Unconfirmed {
            request: "POST /api/v1/transport-nodes".into(),
            last: NetworkError::Timeout,
        }
    }

    #[test]
    fn test_subset_ignores_server_fields_and_secrets() {
        let desired = json!({
            "display_name": "vcenter-01",
            "server": "vc.lab",
            "credential": {"password": "new"},
        });
        let existing = json!({
            "id": "cm-1",
            "_revision": 3,
            "display_name": "vcenter-01",
            "server": "vc.lab",
            "credential": {"credential_type": "UsernamePasswordLoginCredential"},
        });
        assert!(is_subset(&desired, &existing));
        assert!(!is_subset(&json!({"server": "other"}), &existing));
    }

    #[test]
    fn test_subset_compares_arrays_by_length() {
        let existing = json!({"zones": [{"id": "a", "extra": 1}]});
        assert!(is_subset(&json!({"zones": [{"id": "a"}]}), &existing));
        assert!(!is_subset(&json!({"zones": []}), &existing));
    }

    #[tokio::test]
    async fn test_ensure_present_updates_with_revision() {
        let nsx = InMemoryNsx::new();
        let id = nsx.seed(
            ObjectKind::ComputeManager,
            json!({"display_name": "vcenter-01", "server": "old.lab"}),
        );

        let got = ensure_present(
            &nsx,
            ObjectKind::ComputeManager,
            &json!({"display_name": "vcenter-01", "server": "new.lab"}),
        )
        .await
        .unwrap();

        assert_eq!(got, id);
        match nsx.writes().as_slice() {
            [Call::Update(ObjectKind::ComputeManager, updated, body)] => {
                assert_eq!(updated, &id);
                assert_eq!(body["_revision"], 0);
            }
            other => panic!("unexpected writes {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ensure_absent_is_a_noop_when_missing() {
        let nsx = InMemoryNsx::new();
        ensure_absent(&nsx, ObjectKind::TransportNode, "edge-09")
            .await
            .unwrap();
        assert!(nsx.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_create_adopts_the_stored_object() {
        let nsx = InMemoryNsx::new();
        nsx.lose_create_reply(ObjectKind::TransportNode, "edge-01", unconfirmed());

        let id = ensure_present(&nsx, ObjectKind::TransportNode, &json!({"display_name": "edge-01"}))
            .await
            .unwrap();

        let creates = nsx
            .writes()
            .into_iter()
            .filter(|call| matches!(call, Call::Create(..)))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(nsx.objects(ObjectKind::TransportNode).len(), 1);
        assert_eq!(object_id(ObjectKind::TransportNode, &nsx.objects(ObjectKind::TransportNode)[0]), Ok(id));
    }

    #[tokio::test]
    async fn test_unconfirmed_create_of_missing_object_fails() {
        let nsx = InMemoryNsx::new();
        nsx.fail(Op::Create, Some(ObjectKind::TransportNode), Some("edge-01"), unconfirmed());

        let err = ensure_present(&nsx, ObjectKind::TransportNode, &json!({"display_name": "edge-01"}))
            .await
            .unwrap_err();

        assert_eq!(err, unconfirmed());
        assert!(nsx.objects(ObjectKind::TransportNode).is_empty());
    }

    #[tokio::test]
    async fn test_body_without_name_is_rejected() {
        let nsx = InMemoryNsx::new();
        let err = ensure_present(&nsx, ObjectKind::IpPool, &json!({"description": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(nsx.calls().is_empty());
    }
}
