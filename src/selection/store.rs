use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::policy::PersistPolicy;
use super::storage::SessionStorage;
use crate::vacancy::types::VacancyRecord;

/// The one record the user is looking at, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
  #[default]
  Empty,
  Holding(VacancyRecord),
}

impl SelectionState {
  pub fn record(&self) -> Option<&VacancyRecord> {
    match self {
      SelectionState::Empty => None,
      SelectionState::Holding(record) => Some(record),
    }
  }
}

impl From<Option<VacancyRecord>> for SelectionState {
  fn from(record: Option<VacancyRecord>) -> Self {
    record.map_or(SelectionState::Empty, SelectionState::Holding)
  }
}

/// Stored envelope: `{"vacancy": <record|null>}`
#[derive(Debug, Serialize, Deserialize)]
struct Persisted {
  #[serde(default)]
  vacancy: Option<Value>,
}

/// Holds the selected vacancy and mirrors it into session storage.
///
/// The in-memory copy is authoritative: a failing storage backend is logged
/// and otherwise ignored.
pub struct SelectionStore {
  state: SelectionState,
  policy: PersistPolicy,
  storage: Arc<dyn SessionStorage>,
}

impl SelectionStore {
  /// Create the store, restoring whatever the session last persisted.
  pub fn hydrate(storage: Arc<dyn SessionStorage>, policy: PersistPolicy) -> Self {
    let state = match storage.get_item(policy.storage_key()) {
      Ok(Some(blob)) => Self::decode(&policy, &blob),
      Ok(None) => SelectionState::Empty,
      Err(e) => {
        warn!(error = %e, "could not read persisted selection");
        SelectionState::Empty
      }
    };
    debug!(uid = ?state.record().map(|r| &r.uid), "selection hydrated");

    Self {
      state,
      policy,
      storage,
    }
  }

  pub fn current(&self) -> Option<VacancyRecord> {
    self.state.record().cloned()
  }

  pub fn state(&self) -> &SelectionState {
    &self.state
  }

  pub fn policy(&self) -> &PersistPolicy {
    &self.policy
  }

  /// Replace the selection. Selecting what is already selected does nothing.
  pub fn select(&mut self, record: Option<VacancyRecord>) {
    let next = SelectionState::from(record);
    if next == self.state {
      return;
    }
    self.state = next;
    self.persist();
  }

  pub fn clear(&mut self) {
    self.select(None);
  }

  fn persist(&self) {
    let key = self.policy.storage_key();
    let blob = match self.encode() {
      Ok(blob) => blob,
      Err(e) => {
        warn!(error = %e, "could not encode selection");
        return;
      }
    };
    match self.storage.set_item(key, &blob) {
      Ok(()) => debug!(key, "selection persisted"),
      Err(e) => warn!(key, error = %e, "could not persist selection"),
    }
  }

  fn encode(&self) -> serde_json::Result<String> {
    let vacancy = match self.state.record() {
      Some(record) => {
        let mut value = serde_json::to_value(record)?;
        if let Value::Object(fields) = &mut value {
          self.policy.project(fields);
        }
        Some(value)
      }
      None => None,
    };
    serde_json::to_string(&Persisted { vacancy })
  }

  /// Undecodable blobs hydrate as empty. Excluded fields are stripped again
  /// in case the blob predates the current policy.
  fn decode(policy: &PersistPolicy, blob: &str) -> SelectionState {
    let persisted: Persisted = match serde_json::from_str(blob) {
      Ok(persisted) => persisted,
      Err(e) => {
        warn!(error = %e, "discarding unreadable persisted selection");
        return SelectionState::Empty;
      }
    };

    let Some(mut value) = persisted.vacancy else {
      return SelectionState::Empty;
    };
    if let Value::Object(fields) = &mut value {
      policy.project(fields);
    }

    match serde_json::from_value::<VacancyRecord>(value) {
      Ok(record) => SelectionState::Holding(record),
      Err(e) => {
        warn!(error = %e, "discarding persisted selection with invalid record");
        SelectionState::Empty
      }
    }
  }
}
