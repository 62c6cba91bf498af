//! In-memory remote store for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::client::RemoteStore;
use super::types::{StatusUpdate, VacancyRecord, VacancyStatus};
use crate::error::SyncError;

pub fn record(uid: &str, company: &str) -> VacancyRecord {
  VacancyRecord {
    uid: uid.to_string(),
    company: company.to_string(),
    company_logo: String::new(),
    title: format!("Engineer at {}", company),
    description: Some(format!("{} is hiring", company)),
    experience_level: Some("Mid-Senior".to_string()),
    contract_type: Some("Full-time".to_string()),
    workplace_type: Some("Remote".to_string()),
    location: Some("Berlin".to_string()),
    url: format!("https://jobs.example/{}", uid),
    company_url: format!("https://{}.example", company.to_lowercase()),
    date_created: chrono::DateTime::from_timestamp(1_700_000_000, 0),
    date_modified: chrono::DateTime::from_timestamp(1_700_000_000, 0),
    status: VacancyStatus::Created,
  }
}

#[derive(Default)]
pub struct FakeRemote {
  records: Mutex<Vec<VacancyRecord>>,
  reads: AtomicUsize,
  writes: AtomicUsize,
  fail_writes: AtomicBool,
}

impl FakeRemote {
  pub fn with_records(records: Vec<VacancyRecord>) -> Self {
    Self {
      records: Mutex::new(records),
      ..Default::default()
    }
  }

  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  pub fn reads(&self) -> usize {
    self.reads.load(Ordering::SeqCst)
  }

  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  fn begin_write(&self) -> Result<(), SyncError> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      Err(SyncError::NetworkFailure("connection reset".to_string()))
    } else {
      Ok(())
    }
  }
}

impl RemoteStore for FakeRemote {
  async fn all_vacancies(&self) -> Result<Vec<VacancyRecord>, SyncError> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    Ok(self.records.lock().unwrap().clone())
  }

  async fn update_vacancy(
    &self,
    uid: &str,
    status: VacancyStatus,
  ) -> Result<StatusUpdate, SyncError> {
    self.begin_write()?;
    let mut records = self.records.lock().unwrap();
    let record = records
      .iter_mut()
      .find(|r| r.uid == uid)
      .ok_or_else(|| SyncError::RemoteError(format!("updateVacancy: no vacancy {}", uid)))?;
    record.status = status;
    Ok(StatusUpdate {
      uid: uid.to_string(),
      status,
    })
  }

  async fn delete_vacancy(&self, uid: &str) -> Result<bool, SyncError> {
    self.begin_write()?;
    let mut records = self.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.uid != uid);
    Ok(records.len() < before)
  }
}
