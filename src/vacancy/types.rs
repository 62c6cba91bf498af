use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire names of every `VacancyRecord` field, in display order.
pub const FIELD_NAMES: &[&str] = &[
  "uid",
  "company",
  "companyLogo",
  "title",
  "description",
  "experienceLevel",
  "contractType",
  "workplaceType",
  "location",
  "url",
  "companyUrl",
  "dateCreated",
  "dateModified",
  "status",
];

/// Fields with no absent form: a missing `status` would read as `Created`
/// and missing text as "", neither of which the server said.
pub const REQUIRED_FIELDS: &[&str] = &["uid", "company", "title", "url", "companyUrl", "status"];

/// Triage status of a vacancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacancyStatus {
  #[default]
  Created,
  Applied,
  Interviewing,
  Rejected,
  Withdrawn,
}

impl VacancyStatus {
  pub const ALL: [VacancyStatus; 5] = [
    VacancyStatus::Created,
    VacancyStatus::Applied,
    VacancyStatus::Interviewing,
    VacancyStatus::Rejected,
    VacancyStatus::Withdrawn,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      VacancyStatus::Created => "Created",
      VacancyStatus::Applied => "Applied",
      VacancyStatus::Interviewing => "Interviewing",
      VacancyStatus::Rejected => "Rejected",
      VacancyStatus::Withdrawn => "Withdrawn",
    }
  }
}

impl fmt::Display for VacancyStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for VacancyStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    VacancyStatus::ALL
      .into_iter()
      .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown status '{}'", s))
  }
}

/// One captured job posting.
///
/// Only `uid` is required on decode; every other field tolerates absence so a
/// projected record (some fields stripped) still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyRecord {
  pub uid: String,
  #[serde(default)]
  pub company: String,
  /// Empty when the posting had no logo
  #[serde(default)]
  pub company_logo: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub experience_level: Option<String>,
  #[serde(default)]
  pub contract_type: Option<String>,
  #[serde(default)]
  pub workplace_type: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub company_url: String,
  #[serde(default, with = "epoch_seconds")]
  pub date_created: Option<DateTime<Utc>>,
  #[serde(default, with = "epoch_seconds")]
  pub date_modified: Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "nullable_status")]
  pub status: VacancyStatus,
}

/// Acknowledgement of a status update
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUpdate {
  pub uid: String,
  #[serde(default, deserialize_with = "nullable_status")]
  pub status: VacancyStatus,
}

/// The status column is nullable server-side; null means the creation default.
fn nullable_status<'de, D>(deserializer: D) -> Result<VacancyStatus, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<VacancyStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps travel as seconds since the epoch, integer or float.
mod epoch_seconds {
  use chrono::{DateTime, Utc};
  use serde::{de, Deserialize, Deserializer, Serializer};

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Seconds {
    Int(i64),
    Float(f64),
  }

  pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match value {
      Some(dt) => serializer.serialize_i64(dt.timestamp()),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let seconds = match Option::<Seconds>::deserialize(deserializer)? {
      Some(Seconds::Int(secs)) => secs,
      Some(Seconds::Float(secs)) => secs.trunc() as i64,
      None => return Ok(None),
    };
    DateTime::from_timestamp(seconds, 0)
      .map(Some)
      .ok_or_else(|| de::Error::custom(format!("timestamp {} out of range", seconds)))
  }
}
