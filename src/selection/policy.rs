use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

use crate::vacancy::types::{FIELD_NAMES, REQUIRED_FIELDS};

pub const DEFAULT_STORAGE_KEY: &str = "jobs-storage";

/// Fields left out of the persisted selection by default. They are either
/// large or change server-side, so a stale copy is worse than none.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &["dateCreated", "dateModified", "description"];

/// Where the selection is persisted and which fields are kept out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistPolicy {
  storage_key: String,
  excluded: BTreeSet<String>,
}

impl PersistPolicy {
  /// Build a policy from wire field names.
  ///
  /// Names that match no record field are kept (they exclude nothing) but
  /// logged. Excluding `uid` or another field that cannot be absent is an
  /// error.
  pub fn new<I, S>(storage_key: impl Into<String>, excluded: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let storage_key = storage_key.into();
    if storage_key.trim().is_empty() {
      return Err(eyre!("Selection storage key must not be empty"));
    }

    let excluded: BTreeSet<String> = excluded.into_iter().map(Into::into).collect();
    if let Some(name) = excluded.iter().find(|n| REQUIRED_FIELDS.contains(&n.as_str())) {
      return Err(eyre!(
        "Field '{}' cannot be excluded from the persisted selection",
        name
      ));
    }
    for name in excluded.iter().filter(|n| !FIELD_NAMES.contains(&n.as_str())) {
      warn!(field = %name, "excluded field does not exist on vacancies");
    }

    Ok(Self {
      storage_key,
      excluded,
    })
  }

  pub fn storage_key(&self) -> &str {
    &self.storage_key
  }

  pub fn is_excluded(&self, field: &str) -> bool {
    self.excluded.contains(field)
  }

  pub fn excluded(&self) -> impl Iterator<Item = &str> {
    self.excluded.iter().map(String::as_str)
  }

  /// Strip excluded fields from a serialized record in place.
  pub fn project(&self, record: &mut Map<String, Value>) {
    record.retain(|field, _| !self.excluded.contains(field));
  }
}

impl Default for PersistPolicy {
  fn default() -> Self {
    Self {
      storage_key: DEFAULT_STORAGE_KEY.to_string(),
      excluded: DEFAULT_EXCLUDED_FIELDS.iter().map(|s| s.to_string()).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_default_policy() {
    let policy = PersistPolicy::default();
    assert_eq!(policy.storage_key(), "jobs-storage");
    assert_eq!(
      policy.excluded().collect::<Vec<_>>(),
      vec!["dateCreated", "dateModified", "description"]
    );
  }

  #[test]
  fn test_uid_cannot_be_excluded() {
    assert!(PersistPolicy::new("jobs-storage", ["description", "uid"]).is_err());
  }

  #[test]
  fn test_fields_without_absent_form_cannot_be_excluded() {
    for field in ["status", "company", "title", "url", "companyUrl"] {
      let err = PersistPolicy::new("jobs-storage", [field]).unwrap_err();
      assert!(err.to_string().contains(field));
    }
    assert!(PersistPolicy::new("jobs-storage", ["companyLogo", "location"]).is_ok());
  }

  #[test]
  fn test_empty_storage_key_is_rejected() {
    assert!(PersistPolicy::new(" ", ["description"]).is_err());
  }

  #[test]
  fn test_unknown_field_is_accepted() {
    let policy = PersistPolicy::new("jobs-storage", ["salary"]).unwrap();
    assert!(policy.is_excluded("salary"));
  }

  #[test]
  fn test_project_removes_only_excluded_fields() {
    let policy = PersistPolicy::new("jobs-storage", ["description"]).unwrap();
    let mut record = json!({ "uid": "a", "description": "long", "title": "Engineer" })
      .as_object()
      .cloned()
      .unwrap();
    policy.project(&mut record);
    assert_eq!(
      Value::Object(record),
      json!({ "uid": "a", "title": "Engineer" })
    );
  }
}
