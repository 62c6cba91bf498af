use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::{
  decode_response, AllVacanciesData, DeleteVacancyData, GraphqlRequest, UpdateVacancyData,
  ALL_VACANCIES_QUERY, DELETE_VACANCY_MUTATION, UPDATE_VACANCY_MUTATION,
};
use super::types::{StatusUpdate, VacancyRecord, VacancyStatus};
use crate::config::RemoteConfig;
use crate::error::SyncError;

/// Operations the vacancy backend exposes.
///
/// Implemented by the HTTP client and by in-memory fakes in tests.
pub trait RemoteStore: Send + Sync + 'static {
  /// Read the whole collection
  fn all_vacancies(&self) -> impl Future<Output = Result<Vec<VacancyRecord>, SyncError>> + Send;

  /// Set the status of one vacancy
  fn update_vacancy(
    &self,
    uid: &str,
    status: VacancyStatus,
  ) -> impl Future<Output = Result<StatusUpdate, SyncError>> + Send;

  /// Delete one vacancy; `false` means the server removed nothing
  fn delete_vacancy(&self, uid: &str) -> impl Future<Output = Result<bool, SyncError>> + Send;
}

/// GraphQL client for the vacancy backend
#[derive(Clone)]
pub struct VacancyClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl VacancyClient {
  pub fn new(config: &RemoteConfig) -> Result<Self> {
    let endpoint = config.endpoint_url()?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("jobdesk/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, endpoint })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  /// POST one GraphQL operation and decode its `data`.
  async fn execute<T: DeserializeOwned>(
    &self,
    operation: &str,
    query: &str,
    variables: Value,
  ) -> Result<T, SyncError> {
    debug!(operation, endpoint = %self.endpoint, "sending GraphQL request");

    let response = self
      .http
      .post(self.endpoint.clone())
      .json(&GraphqlRequest { query, variables })
      .send()
      .await
      .map_err(|e| SyncError::network(operation, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(SyncError::network(operation, format!("HTTP {}", status)));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| SyncError::network(operation, e))?;

    decode_response(operation, &body)
  }
}

impl RemoteStore for VacancyClient {
  async fn all_vacancies(&self) -> Result<Vec<VacancyRecord>, SyncError> {
    let data: AllVacanciesData = self
      .execute("allVacancies", ALL_VACANCIES_QUERY, json!({}))
      .await?;
    Ok(data.all_vacancies)
  }

  async fn update_vacancy(
    &self,
    uid: &str,
    status: VacancyStatus,
  ) -> Result<StatusUpdate, SyncError> {
    let variables = json!({
      "input": {
        "uid": uid,
        "status": status.as_str(),
      }
    });
    let data: UpdateVacancyData = self
      .execute("updateVacancy", UPDATE_VACANCY_MUTATION, variables)
      .await?;
    Ok(data.update_vacancy)
  }

  async fn delete_vacancy(&self, uid: &str) -> Result<bool, SyncError> {
    let data: DeleteVacancyData = self
      .execute("deleteVacancy", DELETE_VACANCY_MUTATION, json!({ "uid": uid }))
      .await?;
    Ok(data.delete_vacancy)
  }
}
