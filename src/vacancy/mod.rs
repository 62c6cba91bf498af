//! Vacancy domain: record types, the GraphQL remote, cache bindings and the
//! mutation gateway.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod gateway;
pub mod listing;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{vacancy_cache, VacancyCache, VacancyQuery};
pub use client::{RemoteStore, VacancyClient};
pub use gateway::{Mutation, MutationGateway, MutationOutcome};
pub use types::{StatusUpdate, VacancyRecord, VacancyStatus};
