use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use store::UserId;

use crate::error::{GatewayFailure, Operation};
use crate::gateway::{Collection, Gateway, OWNER_PARAM};

/// A call received by a [`MemoryGateway`], in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayCall {
    FetchAll(Collection),
    FetchByOwner(Collection, UserId),
    Update(Collection, u64),
    Delete(Collection, u64),
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<Collection, Vec<Value>>,
    update_responses: HashMap<(Collection, u64), Value>,
    calls: Vec<GatewayCall>,
    failing: bool,
}

/// In-memory Gateway for testing and offline runs.
///
/// Behaves like a permissive REST backend: updates replace the stored record and
/// echo it back, deletes succeed whether or not the record exists.
#[derive(Clone, Debug, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append records to a collection.
    ///
    /// Nothing is added unless every record serializes.
    pub fn seed<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), serde_json::Error> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.state()
            .records
            .entry(collection)
            .or_default()
            .extend(values);
        Ok(())
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    /// Answer the next update of `collection/id` with `response` instead of an echo.
    pub fn respond_to_update(&self, collection: Collection, id: u64, response: Value) {
        self.state().update_responses.insert((collection, id), response);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Current contents of a collection.
    pub fn records(&self, collection: Collection) -> Vec<Value> {
        self.state()
            .records
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the call and fail it if the gateway is in failing mode.
    fn receive(
        &self,
        call: GatewayCall,
        operation: Operation,
        collection: Collection,
        id: Option<u64>,
    ) -> Result<MutexGuard<'_, MemoryState>, GatewayFailure> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing {
            return Err(GatewayFailure::new(operation, collection, id, "gateway unavailable"));
        }
        Ok(state)
    }
}

fn decode<T: DeserializeOwned>(
    values: Vec<Value>,
    operation: Operation,
    collection: Collection,
    id: Option<u64>,
) -> Result<Vec<T>, GatewayFailure> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| GatewayFailure::new(operation, collection, id, e))
        })
        .collect()
}

fn has_id(value: &Value, id: u64) -> bool {
    value.get("id").and_then(Value::as_u64) == Some(id)
}

impl Gateway for MemoryGateway {
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, GatewayFailure> {
        let values = {
            let state = self.receive(
                GatewayCall::FetchAll(collection),
                Operation::FetchAll,
                collection,
                None,
            )?;
            state.records.get(&collection).cloned().unwrap_or_default()
        };
        decode(values, Operation::FetchAll, collection, None)
    }

    async fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner: UserId,
    ) -> Result<Vec<T>, GatewayFailure> {
        let values: Vec<Value> = {
            let state = self.receive(
                GatewayCall::FetchByOwner(collection, owner),
                Operation::FetchByOwner,
                collection,
                None,
            )?;
            state
                .records
                .get(&collection)
                .into_iter()
                .flatten()
                .filter(|value| value.get(OWNER_PARAM).and_then(Value::as_u64) == Some(owner))
                .cloned()
                .collect()
        };
        decode(values, Operation::FetchByOwner, collection, None)
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        id: u64,
        record: &T,
    ) -> Result<T, GatewayFailure> {
        let fail = |message: String| GatewayFailure::new(Operation::Update, collection, Some(id), message);

        let stored = {
            let mut state = self.receive(
                GatewayCall::Update(collection, id),
                Operation::Update,
                collection,
                Some(id),
            )?;

            let mut value = match state.update_responses.remove(&(collection, id)) {
                Some(response) => response,
                None => serde_json::to_value(record).map_err(|e| fail(e.to_string()))?,
            };
            if let Value::Object(fields) = &mut value {
                fields.insert("id".to_string(), Value::from(id));
            }

            let slot = state
                .records
                .get_mut(&collection)
                .and_then(|values| values.iter_mut().find(|value| has_id(value, id)))
                .ok_or_else(|| fail(format!("no record with id {id}")))?;
            *slot = value.clone();
            value
        };

        serde_json::from_value(stored).map_err(|e| fail(e.to_string()))
    }

    async fn delete(&self, collection: Collection, id: u64) -> Result<(), GatewayFailure> {
        let mut state = self.receive(
            GatewayCall::Delete(collection, id),
            Operation::Delete,
            collection,
            Some(id),
        )?;
        if let Some(values) = state.records.get_mut(&collection) {
            values.retain(|value| !has_id(value, id));
        }
        Ok(())
    }
}
