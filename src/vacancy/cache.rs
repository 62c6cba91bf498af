//! Caching bindings for vacancy queries.

use std::sync::Arc;

use super::client::RemoteStore;
use super::types::VacancyRecord;
use crate::cache::{QueryCache, QueryKey};

/// Query keys for vacancy reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VacancyQuery {
  /// The whole collection, as served by `allVacancies`
  AllVacancies,
}

impl QueryKey for VacancyQuery {
  fn description(&self) -> String {
    match self {
      Self::AllVacancies => "all vacancies".to_string(),
    }
  }
}

pub type VacancyCache = QueryCache<VacancyQuery, Vec<VacancyRecord>>;

/// Build the vacancy cache on top of a remote store.
pub fn vacancy_cache<R: RemoteStore>(remote: Arc<R>) -> VacancyCache {
  QueryCache::new(move |key: &VacancyQuery| {
    let remote = Arc::clone(&remote);
    let key = *key;
    async move {
      match key {
        VacancyQuery::AllVacancies => remote.all_vacancies().await,
      }
    }
  })
}
