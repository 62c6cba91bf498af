//! Client-side filtering and ordering of the vacancy collection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::types::VacancyRecord;

/// Column the listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
  #[default]
  Created,
  Company,
  Title,
  Location,
  Status,
}

impl SortColumn {
  pub const ALL: [SortColumn; 5] = [
    SortColumn::Created,
    SortColumn::Company,
    SortColumn::Title,
    SortColumn::Location,
    SortColumn::Status,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      SortColumn::Created => "created",
      SortColumn::Company => "company",
      SortColumn::Title => "title",
      SortColumn::Location => "location",
      SortColumn::Status => "status",
    }
  }

  /// The column after this one, wrapping around
  pub fn next(&self) -> SortColumn {
    let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }

  fn compare(&self, a: &VacancyRecord, b: &VacancyRecord) -> Ordering {
    match self {
      SortColumn::Created => a.date_created.cmp(&b.date_created),
      SortColumn::Company => cmp_text(&a.company, &b.company),
      SortColumn::Title => cmp_text(&a.title, &b.title),
      SortColumn::Location => cmp_text(
        a.location.as_deref().unwrap_or_default(),
        b.location.as_deref().unwrap_or_default(),
      ),
      SortColumn::Status => (a.status as u8).cmp(&(b.status as u8)),
    }
  }
}

impl fmt::Display for SortColumn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for SortColumn {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown sort column '{}'", s))
  }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase())
}

/// How the listing is narrowed and ordered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingView {
  /// Case-insensitive substring of the company name; empty shows everything
  pub company_filter: String,
  pub sort: SortColumn,
  pub descending: bool,
}

impl ListingView {
  /// Newest first, unfiltered
  pub fn new() -> Self {
    Self {
      descending: true,
      ..Default::default()
    }
  }

  /// Select this column, or flip direction if it is already selected.
  pub fn toggle_sort(&mut self, column: SortColumn) {
    if self.sort == column {
      self.descending = !self.descending;
    } else {
      self.sort = column;
      self.descending = false;
    }
  }

  pub fn matches(&self, record: &VacancyRecord) -> bool {
    let needle = self.company_filter.trim();
    needle.is_empty()
      || record
        .company
        .to_lowercase()
        .contains(&needle.to_lowercase())
  }

  /// Borrowing projection of `records` in display order.
  pub fn apply<'a>(&self, records: &'a [VacancyRecord]) -> Vec<&'a VacancyRecord> {
    let mut rows: Vec<&VacancyRecord> = records.iter().filter(|r| self.matches(r)).collect();
    // Stable sort; uid breaks ties so equal keys keep a fixed order across refetches
    rows.sort_by(|a, b| {
      let ord = self.sort.compare(a, b).then_with(|| a.uid.cmp(&b.uid));
      if self.descending {
        ord.reverse()
      } else {
        ord
      }
    });
    rows
  }
}
