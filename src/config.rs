//! Configuration d'une génération automatique.
//!
//! Deux formes coexistent :
//! - [`GenerationRequest`] : forme « fil » (JSON camelCase), telle que soumise
//!   et telle que conservée dans la trace de génération ;
//! - [`GenerationConfiguration`] : forme typée, où la sous-configuration est
//!   portée par la variante de [`GenerationKind`]. La conversion échoue en
//!   `BadRequest` si la sous-configuration ne correspond pas au type.

use crate::generation::GenerationError;
use crate::model::{GroupId, PersonId, TeamId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationType {
    Group,
    People,
    TeamUnrestricted,
    TeamRestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    Daily,
    Weekly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionOrder {
    #[default]
    Balanced,
    Sequential,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    All,
    Subset,
}

fn default_interval() -> u32 {
    1
}

fn default_one() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Récurrence : masque de jours (0 = dimanche … 6 = samedi), horaires et dérogations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodConfig {
    #[serde(default)]
    pub weekdays: Vec<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub excluded_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub included_dates: Vec<NaiveDate>,
    /// Pas en semaines pour `WEEKLY` ; ignoré sinon.
    #[serde(default = "default_interval")]
    pub interval: u32,
}

impl PeriodConfig {
    pub fn new(weekdays: impl IntoIterator<Item = u8>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            weekdays: weekdays.into_iter().collect(),
            start_time,
            end_time,
            excluded_dates: Vec::new(),
            included_dates: Vec::new(),
            interval: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    pub group_ids: Vec<GroupId>,
    #[serde(default = "default_one")]
    pub groups_per_schedule: usize,
    #[serde(default)]
    pub distribution_order: DistributionOrder,
    #[serde(default)]
    pub honor_absences: bool,
    #[serde(default)]
    pub excluded_people: Vec<PersonId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleConfig {
    #[serde(default)]
    pub honor_absences: bool,
    #[serde(default)]
    pub excluded_people: Vec<PersonId>,
    /// `None` ⇒ toute personne éligible est affectée à chaque créneau.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_per_schedule: Option<usize>,
    #[serde(default)]
    pub distribution_order: DistributionOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamConfig {
    pub team_id: TeamId,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default)]
    pub honor_absences: bool,
    /// Pris en compte uniquement pour `TEAM_RESTRICTED`.
    #[serde(default = "default_true")]
    pub require_responsibilities: bool,
    #[serde(default = "default_one")]
    pub members_per_schedule: usize,
    #[serde(default)]
    pub distribution_order: DistributionOrder,
    #[serde(default)]
    pub excluded_people: Vec<PersonId>,
}

impl TeamConfig {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            selection_mode: SelectionMode::All,
            honor_absences: false,
            require_responsibilities: true,
            members_per_schedule: 1,
            distribution_order: DistributionOrder::Balanced,
            excluded_people: Vec::new(),
        }
    }
}

/// Requête de génération telle que reçue (et archivée).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub generation_type: GenerationType,
    pub period_type: PeriodType,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_config: Option<GroupConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_config: Option<PeopleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_config: Option<TeamConfig>,
    pub period_config: PeriodConfig,
}

/// Stratégie de sélection, ne portant que les champs de sa variante.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationKind {
    Group(GroupConfig),
    People(PeopleConfig),
    TeamUnrestricted(TeamConfig),
    TeamRestricted(TeamConfig),
}

impl GenerationKind {
    pub fn generation_type(&self) -> GenerationType {
        match self {
            GenerationKind::Group(_) => GenerationType::Group,
            GenerationKind::People(_) => GenerationType::People,
            GenerationKind::TeamUnrestricted(_) => GenerationType::TeamUnrestricted,
            GenerationKind::TeamRestricted(_) => GenerationType::TeamRestricted,
        }
    }

    pub fn honor_absences(&self) -> bool {
        match self {
            GenerationKind::Group(c) => c.honor_absences,
            GenerationKind::People(c) => c.honor_absences,
            GenerationKind::TeamUnrestricted(c) | GenerationKind::TeamRestricted(c) => {
                c.honor_absences
            }
        }
    }

    pub fn excluded_people(&self) -> &[PersonId] {
        match self {
            GenerationKind::Group(c) => &c.excluded_people,
            GenerationKind::People(c) => &c.excluded_people,
            GenerationKind::TeamUnrestricted(c) | GenerationKind::TeamRestricted(c) => {
                &c.excluded_people
            }
        }
    }
}

/// Configuration validée d'une génération.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfiguration {
    pub period_type: PeriodType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: PeriodConfig,
    pub kind: GenerationKind,
}

impl GenerationConfiguration {
    pub fn generation_type(&self) -> GenerationType {
        self.kind.generation_type()
    }
}

impl TryFrom<&GenerationRequest> for GenerationConfiguration {
    type Error = GenerationError;

    fn try_from(req: &GenerationRequest) -> Result<Self, Self::Error> {
        let kind = select_kind(req)?;

        if req.period_start_date > req.period_end_date {
            return Err(GenerationError::BadRequest(format!(
                "period start date {} is after end date {}",
                req.period_start_date, req.period_end_date
            )));
        }

        validate_period(&req.period_config)?;
        validate_kind(&kind)?;

        Ok(Self {
            period_type: req.period_type,
            start: req.period_start_date,
            end: req.period_end_date,
            period: req.period_config.clone(),
            kind,
        })
    }
}

impl TryFrom<GenerationRequest> for GenerationConfiguration {
    type Error = GenerationError;

    fn try_from(req: GenerationRequest) -> Result<Self, Self::Error> {
        GenerationConfiguration::try_from(&req)
    }
}

fn select_kind(req: &GenerationRequest) -> Result<GenerationKind, GenerationError> {
    let present = [
        req.group_config.is_some(),
        req.people_config.is_some(),
        req.team_config.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    if present > 1 {
        return Err(GenerationError::BadRequest(
            "exactly one of groupConfig, peopleConfig or teamConfig must be provided".into(),
        ));
    }

    let missing = |field: &str| {
        GenerationError::BadRequest(format!(
            "{field} is required for generation type {:?}",
            req.generation_type
        ))
    };

    let kind = match req.generation_type {
        GenerationType::Group => GenerationKind::Group(
            req.group_config.clone().ok_or_else(|| missing("groupConfig"))?,
        ),
        GenerationType::People => GenerationKind::People(
            req.people_config.clone().ok_or_else(|| missing("peopleConfig"))?,
        ),
        GenerationType::TeamUnrestricted => GenerationKind::TeamUnrestricted(
            req.team_config.clone().ok_or_else(|| missing("teamConfig"))?,
        ),
        GenerationType::TeamRestricted => GenerationKind::TeamRestricted(
            req.team_config.clone().ok_or_else(|| missing("teamConfig"))?,
        ),
    };
    Ok(kind)
}

fn validate_period(period: &PeriodConfig) -> Result<(), GenerationError> {
    if let Some(day) = period.weekdays.iter().find(|d| **d > 6) {
        return Err(GenerationError::BadRequest(format!(
            "weekday {day} out of range 0-6"
        )));
    }
    if period.interval == 0 {
        return Err(GenerationError::BadRequest("interval must be >= 1".into()));
    }
    if period.start_time == period.end_time {
        return Err(GenerationError::BadRequest(
            "start time and end time cannot be equal".into(),
        ));
    }
    Ok(())
}

fn validate_kind(kind: &GenerationKind) -> Result<(), GenerationError> {
    match kind {
        GenerationKind::Group(cfg) => {
            if cfg.group_ids.is_empty() {
                return Err(GenerationError::BadRequest(
                    "groupConfig.groupIds cannot be empty".into(),
                ));
            }
            let distinct: BTreeSet<&GroupId> = cfg.group_ids.iter().collect();
            if distinct.len() != cfg.group_ids.len() {
                return Err(GenerationError::BadRequest(
                    "groupConfig.groupIds contains duplicates".into(),
                ));
            }
            if cfg.groups_per_schedule == 0 {
                return Err(GenerationError::BadRequest(
                    "groupsPerSchedule must be >= 1".into(),
                ));
            }
        }
        GenerationKind::People(cfg) => {
            if cfg.people_per_schedule == Some(0) {
                return Err(GenerationError::BadRequest(
                    "peoplePerSchedule must be >= 1".into(),
                ));
            }
        }
        GenerationKind::TeamUnrestricted(cfg) | GenerationKind::TeamRestricted(cfg) => {
            if cfg.selection_mode == SelectionMode::Subset && cfg.members_per_schedule == 0 {
                return Err(GenerationError::BadRequest(
                    "membersPerSchedule must be >= 1".into(),
                ));
            }
        }
    }
    Ok(())
}
