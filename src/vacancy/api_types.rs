//! GraphQL request/response envelopes and operation documents.
//!
//! These types are separate from domain types so the transport shape of the
//! endpoint stays out of the cache and the UI.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{StatusUpdate, VacancyRecord};
use crate::error::SyncError;

pub const ALL_VACANCIES_QUERY: &str = r#"
query AllVacancies {
  allVacancies {
    uid
    company
    companyLogo
    title
    description
    experienceLevel
    contractType
    workplaceType
    location
    url
    companyUrl
    dateCreated
    dateModified
    status
  }
}
"#;

pub const UPDATE_VACANCY_MUTATION: &str = r#"
mutation UpdateVacancy($input: VacancyMutation!) {
  updateVacancy(input: $input) {
    uid
    status
  }
}
"#;

pub const DELETE_VACANCY_MUTATION: &str = r#"
mutation DeleteVacancy($uid: String!) {
  deleteVacancy(uid: $uid)
}
"#;

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
  pub query: &'a str,
  pub variables: Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
  pub message: String,
  #[serde(default)]
  pub path: Vec<Value>,
}

// ============================================================================
// Operation payloads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllVacanciesData {
  pub all_vacancies: Vec<VacancyRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVacancyData {
  pub update_vacancy: StatusUpdate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVacancyData {
  pub delete_vacancy: bool,
}

/// Decode a GraphQL response body.
///
/// An `errors` payload wins over partial `data`; a body without either is a
/// decoding failure.
pub fn decode_response<T: DeserializeOwned>(operation: &str, body: &[u8]) -> Result<T, SyncError> {
  let response: GraphqlResponse<T> =
    serde_json::from_slice(body).map_err(|e| SyncError::serialization(operation, e))?;

  if !response.errors.is_empty() {
    let messages: Vec<String> = response
      .errors
      .iter()
      .map(|err| {
        if err.path.is_empty() {
          err.message.clone()
        } else {
          let path: Vec<String> = err
            .path
            .iter()
            .map(|p| p.as_str().map(String::from).unwrap_or_else(|| p.to_string()))
            .collect();
          format!("{} (at {})", err.message, path.join("."))
        }
      })
      .collect();
    return Err(SyncError::RemoteError(format!(
      "{}: {}",
      operation,
      messages.join("; ")
    )));
  }

  response
    .data
    .ok_or_else(|| SyncError::serialization(operation, "response has no data"))
}
