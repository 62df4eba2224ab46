use crate::config::GenerationRequest;
use crate::model::{GroupId, PersonId, Schedule, ScheduleGeneration, ScheduleStatus, TeamId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options de génération (politique, pas données).
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    /// Au-delà de ce nombre de créneaux consécutifs, avertissement de fatigue.
    pub max_consecutive_slots: u32,
    /// Graine de l'ordre `random`.
    pub seed: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_consecutive_slots: 3,
            seed: 0x5EED_CAFE,
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenerationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Constat attaché à un créneau. Les erreurs bloquent la validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotFinding {
    pub severity: Severity,
    pub message: String,
    pub slot_index: usize,
}

impl SlotFinding {
    pub fn warning(slot_index: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            slot_index,
        }
    }
    pub fn error(slot_index: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            slot_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionBalance {
    Balanced,
    Moderate,
    Critical,
}

impl DistributionBalance {
    /// Verdict à partir de l'écart max - min des compteurs d'affectation.
    pub fn from_spread(spread: usize) -> Self {
        match spread {
            0..=1 => Self::Balanced,
            2..=3 => Self::Moderate,
            _ => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub total_schedules: usize,
    pub total_participants: usize,
    pub warnings: usize,
    pub errors: usize,
    pub distribution_balance: DistributionBalance,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: PersonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAssignment {
    pub group_id: GroupId,
    pub name: String,
    pub members: Vec<PersonRef>,
}

/// Participants d'un créneau, selon le type de génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Participants {
    Groups {
        groups: Vec<GroupAssignment>,
    },
    #[serde(rename_all = "camelCase")]
    Team {
        team_id: TeamId,
        members: Vec<PersonRef>,
    },
    People {
        members: Vec<PersonRef>,
    },
}

impl Participants {
    /// Personnes effectivement affectées (membres des groupes inclus).
    pub fn people(&self) -> Vec<&PersonRef> {
        match self {
            Participants::Groups { groups } => groups.iter().flat_map(|g| g.members.iter()).collect(),
            Participants::Team { members, .. } | Participants::People { members } => {
                members.iter().collect()
            }
        }
    }

    /// Unités affectées : groupes pour GROUP, personnes sinon.
    pub fn units(&self) -> usize {
        match self {
            Participants::Groups { groups } => groups.len(),
            Participants::Team { members, .. } | Participants::People { members } => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.units() == 0
    }
}

/// Créneau calculé, non persisté.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSlot {
    pub index: usize,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub participants: Participants,
    #[serde(default)]
    pub findings: Vec<SlotFinding>,
}

impl ShiftSlot {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub configuration: GenerationRequest,
    pub schedules: Vec<ShiftSlot>,
    pub summary: GenerationSummary,
}

impl PreviewResult {
    pub fn findings(&self) -> impl Iterator<Item = &SlotFinding> {
        self.schedules.iter().flat_map(|s| s.findings.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub generation: ScheduleGeneration,
    pub schedules: Vec<Schedule>,
    pub summary: GenerationSummary,
}

/// Génération et créneaux qu'elle possède.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDetails {
    pub generation: ScheduleGeneration,
    pub schedules: Vec<Schedule>,
}
