//! Monthly task generation from each client's active obligations.
//!
//! A task is identified by its (client id, obligation, competence) triple;
//! a triple already on the board is never generated twice.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::models::{Client, NewTask, Priority, TaxRegime};
use super::state::BoardState;
use crate::errors::{BoardError, BoardResult};

/// Where generated tasks go and which day of the month each obligation
/// falls due.
#[derive(Debug, Clone, PartialEq)]
pub struct ObligationRules {
    pub intake_column: String,
    pub default_due_day: u32,
    pub due_days: BTreeMap<String, u32>,
}

impl Default for ObligationRules {
    fn default() -> Self {
        Self {
            intake_column: "To Do".to_string(),
            default_due_day: 15,
            due_days: default_due_days(),
        }
    }
}

pub fn default_due_days() -> BTreeMap<String, u32> {
    BTreeMap::from([
        ("PGDAS".to_string(), 20),
        ("FGTS".to_string(), 7),
        ("Folha de Pagamento".to_string(), 7),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Monthly,
    Annual,
}

/// A known obligation type and the regimes it is usually filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObligationInfo {
    pub id: &'static str,
    pub label: &'static str,
    /// Human-readable deadline, e.g. "Day 20" or "March".
    pub due: &'static str,
    pub periodicity: Periodicity,
    pub suggested_regimes: &'static [TaxRegime],
}

const ALL_REGIMES: &[TaxRegime] = &TaxRegime::ALL;
const PRESUMIDO_REAL: &[TaxRegime] = &[TaxRegime::LucroPresumido, TaxRegime::LucroReal];
const SIMPLES_MEI: &[TaxRegime] = &[TaxRegime::SimplesNacional, TaxRegime::Mei];

pub const CATALOG: [ObligationInfo; 11] = [
    ObligationInfo { id: "PGDAS", label: "PGDAS", due: "Day 20", periodicity: Periodicity::Monthly, suggested_regimes: SIMPLES_MEI },
    ObligationInfo { id: "DCTF", label: "DCTF", due: "Day 15", periodicity: Periodicity::Monthly, suggested_regimes: PRESUMIDO_REAL },
    ObligationInfo { id: "REINF", label: "REINF", due: "Day 15", periodicity: Periodicity::Monthly, suggested_regimes: PRESUMIDO_REAL },
    ObligationInfo { id: "Folha de Pagamento", label: "Folha", due: "Day 7", periodicity: Periodicity::Monthly, suggested_regimes: ALL_REGIMES },
    ObligationInfo { id: "FGTS", label: "FGTS", due: "Day 7", periodicity: Periodicity::Monthly, suggested_regimes: ALL_REGIMES },
    ObligationInfo { id: "NFS-e", label: "NFS-e", due: "Per municipality", periodicity: Periodicity::Monthly, suggested_regimes: &[] },
    ObligationInfo { id: "SPED", label: "SPED", due: "Varies", periodicity: Periodicity::Annual, suggested_regimes: PRESUMIDO_REAL },
    ObligationInfo { id: "ECD", label: "ECD", due: "June", periodicity: Periodicity::Annual, suggested_regimes: PRESUMIDO_REAL },
    ObligationInfo { id: "ECF", label: "ECF", due: "July", periodicity: Periodicity::Annual, suggested_regimes: PRESUMIDO_REAL },
    ObligationInfo { id: "DEFIS", label: "DEFIS", due: "March", periodicity: Periodicity::Annual, suggested_regimes: &[TaxRegime::SimplesNacional] },
    ObligationInfo { id: "Simples Nacional", label: "DAS Anual", due: "March", periodicity: Periodicity::Annual, suggested_regimes: SIMPLES_MEI },
];

pub fn catalog_entry(id: &str) -> Option<&'static ObligationInfo> {
    CATALOG.iter().find(|info| info.id == id)
}

/// Catalog obligations suggested for a regime, in catalog order.
pub fn suggested_obligations(regime: TaxRegime) -> Vec<String> {
    CATALOG
        .iter()
        .filter(|info| info.suggested_regimes.contains(&regime))
        .map(|info| info.id.to_string())
        .collect()
}

impl ObligationRules {
    pub fn due_day(&self, obligation: &str) -> u32 {
        self.due_days
            .get(obligation)
            .copied()
            .unwrap_or(self.default_due_day)
    }

    /// Due date within `today`'s month; days past the month end land on
    /// its last day.
    pub fn due_date(&self, obligation: &str, today: NaiveDate) -> NaiveDate {
        let day = self.due_day(obligation).clamp(1, last_day_of_month(today));
        today.with_day(day).unwrap_or(today)
    }
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Reporting period label, `MM/YYYY`.
pub fn competence(today: NaiveDate) -> String {
    today.format("%m/%Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GenerationSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Create this month's obligation tasks for every client in scope.
///
/// With `target_client_id` only that client is processed. Tasks are
/// appended to the intake column through the board's batch path, so a
/// failure partway leaves the already-created tasks in place and returns
/// the error.
pub async fn generate_monthly(
    state: &mut BoardState,
    clients: &[Client],
    target_client_id: Option<i64>,
    today: NaiveDate,
    rules: &ObligationRules,
) -> BoardResult<GenerationSummary> {
    let intake_id = state.column_named(&rules.intake_column)?.id;

    let scope: Vec<&Client> = match target_client_id {
        Some(id) => {
            let client = clients
                .iter()
                .find(|c| c.id == id)
                .ok_or(BoardError::client_not_found(id))?;
            vec![client]
        }
        None => clients.iter().collect(),
    };

    let competence = competence(today);
    let mut existing: HashSet<(i64, String, String)> = state
        .board()?
        .tasks
        .iter()
        .filter_map(|t| {
            Some((
                t.client_id?,
                t.obligation_type.clone()?,
                t.competence.clone()?,
            ))
        })
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0;
    for client in scope {
        for obligation in client
            .active_obligations
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
        {
            let key = (client.id, obligation.to_string(), competence.clone());
            if !existing.insert(key) {
                tracing::debug!(client = %client.name, obligation, competence = %competence, "Obligation already on board");
                skipped += 1;
                continue;
            }
            rows.push(NewTask {
                title: format!("{} - {}", obligation, client.name),
                obligation_type: Some(obligation.to_string()),
                due_date: Some(rules.due_date(obligation, today)),
                competence: Some(competence.clone()),
                priority: Some(Priority::Medium),
                ..NewTask::default().with_client(client)
            });
        }
    }

    let created = state.add_tasks(intake_id, rows).await?;
    tracing::info!(created, skipped, competence = %competence, "Monthly obligations generated");
    Ok(GenerationSummary { created, skipped })
}
