//! In-memory NSX Manager used by tests.
//!
//! Objects live in per-kind collections, every call is recorded in order and
//! failures can be injected per operation and display name.

use async_trait::async_trait;
use nsx::{ApiError, NsxApi, ObjectId, ObjectKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One recorded call against the fake manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(ObjectKind),
    Create(ObjectKind, Value),
    Update(ObjectKind, ObjectId, Value),
    Delete(ObjectKind, ObjectId),
    AcceptEula,
}

impl Call {
    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            Call::List(kind)
            | Call::Create(kind, _)
            | Call::Update(kind, _, _)
            | Call::Delete(kind, _) => Some(*kind),
            Call::AcceptEula => None,
        }
    }

    /// True for calls that change state on the manager.
    pub fn is_write(&self) -> bool {
        !matches!(self, Call::List(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Update,
    Delete,
    AcceptEula,
}

#[derive(Debug)]
struct Injected {
    op: Op,
    kind: Option<ObjectKind>,
    display_name: Option<String>,
    error: ApiError,
    remaining: Option<u32>,
}

impl Injected {
    fn matches(&self, op: Op, kind: Option<ObjectKind>, name: Option<&str>) -> bool {
        self.op == op
            && (self.kind.is_none() || self.kind == kind)
            && match &self.display_name {
                Some(expected) => name == Some(expected.as_str()),
                None => true,
            }
    }
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<ObjectKind, Vec<Value>>,
    calls: Vec<Call>,
    failures: Vec<Injected>,
    lost_replies: Vec<(ObjectKind, String, ApiError)>,
    next_id: u64,
    eula_accepted: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryNsx {
    state: Mutex<State>,
    delay: Option<Duration>,
}

impl InMemoryNsx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before doing anything.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores an object as if it already existed and returns its id.
    pub fn seed(&self, kind: ObjectKind, mut object: Value) -> ObjectId {
        let mut state = self.state();
        let id = assign_id(&mut state, kind, &mut object);
        state.objects.entry(kind).or_default().push(object);
        id
    }

    /// Seeds one object carrying only a display name.
    pub fn seed_named(&self, kind: ObjectKind, display_name: &str) -> ObjectId {
        self.seed(kind, json!({ "display_name": display_name }))
    }

    /// Fails every matching call with `error`.
    pub fn fail(&self, op: Op, kind: Option<ObjectKind>, display_name: Option<&str>, error: ApiError) {
        self.push_failure(op, kind, display_name, error, None);
    }

    /// Fails the next `times` matching calls with `error`.
    pub fn fail_times(
        &self,
        op: Op,
        kind: Option<ObjectKind>,
        display_name: Option<&str>,
        error: ApiError,
        times: u32,
    ) {
        self.push_failure(op, kind, display_name, error, Some(times));
    }

    /// The next create of `display_name` is stored, then answered with `error`, as
    /// when the reply to a POST never arrives.
    pub fn lose_create_reply(&self, kind: ObjectKind, display_name: &str, error: ApiError) {
        self.state()
            .lost_replies
            .push((kind, display_name.to_string(), error));
    }

    fn push_failure(
        &self,
        op: Op,
        kind: Option<ObjectKind>,
        display_name: Option<&str>,
        error: ApiError,
        remaining: Option<u32>,
    ) {
        self.state().failures.push(Injected {
            op,
            kind,
            display_name: display_name.map(str::to_string),
            error,
            remaining,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls that changed state, in order.
    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn objects(&self, kind: ObjectKind) -> Vec<Value> {
        self.state().objects.get(&kind).cloned().unwrap_or_default()
    }

    pub fn find(&self, kind: ObjectKind, display_name: &str) -> Option<Value> {
        self.objects(kind)
            .into_iter()
            .find(|o| o.get(kind.natural_key()).and_then(Value::as_str) == Some(display_name))
    }

    pub fn eula_accepted(&self) -> bool {
        self.state().eula_accepted
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn assign_id(state: &mut State, kind: ObjectKind, object: &mut Value) -> ObjectId {
    let field = kind.id_field();
    let id = match object.get(field).and_then(Value::as_str) {
        Some(existing) => existing.to_string(),
        None => {
            state.next_id += 1;
            format!("{}-{:04}", kind.collection_path().rsplit('/').next().unwrap_or("obj"), state.next_id)
        }
    };
    object[field] = Value::from(id.as_str());
    if object.get("_revision").is_none() {
        object["_revision"] = Value::from(0);
    }
    ObjectId::new(id)
}

fn name_of<'a>(kind: ObjectKind, body: &'a Value) -> Option<&'a str> {
    body.get(kind.natural_key()).and_then(Value::as_str)
}

fn position(state: &State, kind: ObjectKind, id: &ObjectId) -> Option<usize> {
    state.objects.get(&kind).and_then(|objects| {
        objects
            .iter()
            .position(|o| o.get(kind.id_field()).and_then(Value::as_str) == Some(id.as_str()))
    })
}

fn not_found(method: &str, kind: ObjectKind, id: &ObjectId) -> ApiError {
    ApiError::Status {
        status: 404,
        method: method.to_string(),
        path: format!("{}/{}", kind.collection_path(), id),
        body: "{\"error_message\": \"not found\"}".to_string(),
    }
}

impl State {
    fn record(&mut self, call: Call, op: Op, name: Option<&str>) -> Result<(), ApiError> {
        let kind = call.kind();
        self.calls.push(call);
        let hit = self
            .failures
            .iter_mut()
            .position(|f| f.matches(op, kind, name) && f.remaining != Some(0));
        match hit {
            Some(index) => {
                let failure = &mut self.failures[index];
                if let Some(remaining) = failure.remaining.as_mut() {
                    *remaining -= 1;
                }
                Err(failure.error.clone())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NsxApi for InMemoryNsx {
    async fn list(&self, kind: ObjectKind) -> Result<Vec<Value>, ApiError> {
        self.pause().await;
        let mut state = self.state();
        state.record(Call::List(kind), Op::List, None)?;
        Ok(state.objects.get(&kind).cloned().unwrap_or_default())
    }

    async fn create(&self, kind: ObjectKind, body: &Value) -> Result<Value, ApiError> {
        self.pause().await;
        let mut state = self.state();
        state.record(Call::Create(kind, body.clone()), Op::Create, name_of(kind, body))?;

        if let Some(name) = name_of(kind, body) {
            let taken = state
                .objects
                .get(&kind)
                .map(|objects| objects.iter().any(|o| name_of(kind, o) == Some(name)))
                .unwrap_or(false);
            if taken {
                return Err(ApiError::Status {
                    status: 409,
                    method: "POST".into(),
                    path: kind.collection_path().into(),
                    body: format!("{{\"error_message\": \"{} already exists\"}}", name),
                });
            }
        }

        let mut object = body.clone();
        assign_id(&mut state, kind, &mut object);
        state.objects.entry(kind).or_default().push(object.clone());

        let lost = state
            .lost_replies
            .iter()
            .position(|(k, name, _)| *k == kind && name_of(kind, body) == Some(name.as_str()));
        if let Some(index) = lost {
            let (_, _, error) = state.lost_replies.remove(index);
            return Err(error);
        }
        Ok(object)
    }

    async fn update(&self, kind: ObjectKind, id: &ObjectId, body: &Value) -> Result<Value, ApiError> {
        self.pause().await;
        let mut state = self.state();
        state.record(
            Call::Update(kind, id.clone(), body.clone()),
            Op::Update,
            name_of(kind, body),
        )?;

        let index = position(&state, kind, id).ok_or_else(|| not_found("PUT", kind, id))?;
        let objects = state.objects.entry(kind).or_default();
        let current = objects[index].get("_revision").and_then(Value::as_i64).unwrap_or(0);
        if body.get("_revision").and_then(Value::as_i64) != Some(current) {
            return Err(ApiError::Status {
                status: 412,
                method: "PUT".into(),
                path: format!("{}/{}", kind.collection_path(), id),
                body: "{\"error_message\": \"revision mismatch\"}".into(),
            });
        }

        let mut object = body.clone();
        object[kind.id_field()] = Value::from(id.as_str());
        object["_revision"] = Value::from(current + 1);
        objects[index] = object.clone();
        Ok(object)
    }

    async fn delete(&self, kind: ObjectKind, id: &ObjectId) -> Result<(), ApiError> {
        self.pause().await;
        let mut state = self.state();
        let name = position(&state, kind, id)
            .and_then(|i| state.objects.get(&kind).map(|o| o[i].clone()))
            .and_then(|o| name_of(kind, &o).map(str::to_string));
        state.record(Call::Delete(kind, id.clone()), Op::Delete, name.as_deref())?;

        let index = position(&state, kind, id).ok_or_else(|| not_found("DELETE", kind, id))?;
        state.objects.entry(kind).or_default().remove(index);
        Ok(())
    }

    async fn accept_eula(&self) -> Result<(), ApiError> {
        self.pause().await;
        let mut state = self.state();
        state.record(Call::AcceptEula, Op::AcceptEula, None)?;
        state.eula_accepted = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id_and_revision() {
        let nsx = InMemoryNsx::new();
        let created = nsx
            .create(ObjectKind::TransportNode, &json!({"display_name": "edge-01"}))
            .await
            .unwrap();
        assert!(created["node_id"].as_str().unwrap().starts_with("transport-nodes-"));
        assert_eq!(created["_revision"], 0);
        assert_eq!(nsx.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_requires_current_revision() {
        let nsx = InMemoryNsx::new();
        let id = nsx.seed_named(ObjectKind::ComputeManager, "vcenter-01");

        let stale = nsx
            .update(ObjectKind::ComputeManager, &id, &json!({"display_name": "vcenter-01", "_revision": 7}))
            .await;
        assert_eq!(stale.unwrap_err().status(), Some(412));

        let fresh = nsx
            .update(ObjectKind::ComputeManager, &id, &json!({"display_name": "vcenter-01", "_revision": 0}))
            .await
            .unwrap();
        assert_eq!(fresh["_revision"], 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed() {
        let nsx = InMemoryNsx::new();
        nsx.fail_times(Op::List, None, None, ApiError::InvalidResponse("x".into()), 1);
        assert!(nsx.list(ObjectKind::IpPool).await.is_err());
        assert!(nsx.list(ObjectKind::IpPool).await.is_ok());
    }
}
