//! Créneaux manuels et édition des créneaux existants.
//!
//! Un créneau généré (`generation_id` renseigné) garde ses horaires et sa
//! composition : seuls le statut et le commentaire restent modifiables.

use crate::generation::GenerationError;
use crate::model::{AreaId, Member, Schedule, ScheduleId, ScheduleMembership, ScheduleStatus, TeamId};
use crate::store::ScheduleStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Saisie d'un créneau manuel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub status: ScheduleStatus,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Modification partielle ; `None` ⇒ champ inchangé.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub members: Option<Vec<Member>>,
    #[serde(default)]
    pub status: Option<ScheduleStatus>,
    #[serde(default)]
    pub comments: Option<String>,
}

pub fn create_manual<S: ScheduleStore>(
    store: &mut S,
    area: &AreaId,
    input: ManualSchedule,
) -> Result<Schedule, GenerationError> {
    store.find_area(area)?;
    let mut schedule = Schedule::new(area.clone(), input.start, input.end)
        .map_err(GenerationError::BadRequest)?;
    schedule.status = input.status;
    schedule.team_id = input.team_id;
    schedule.comments = input.comments;

    let members = dedup(input.members);
    store.in_transaction(|tx| {
        let id = tx.persist_schedule(schedule.clone())?;
        for member in members {
            tx.persist_membership(ScheduleMembership::new(id.clone(), member))?;
        }
        Ok(())
    })?;
    tracing::info!(area = %area, schedule = %schedule.id, "manual schedule created");
    Ok(schedule)
}

pub fn update<S: ScheduleStore>(
    store: &mut S,
    area: &AreaId,
    id: &ScheduleId,
    change: ScheduleUpdate,
) -> Result<Schedule, GenerationError> {
    let mut schedule = store.find_schedule(area, id)?;

    if schedule.is_generated() {
        let current = store.schedule_members(id)?;
        if let Some(field) = generator_owned_change(&schedule, &current, &change) {
            return Err(GenerationError::BadRequest(format!(
                "{field} of generated schedule {id} cannot be modified"
            )));
        }
    }

    if let Some(start) = change.start {
        schedule.start = start;
    }
    if let Some(end) = change.end {
        schedule.end = end;
    }
    if schedule.end <= schedule.start {
        return Err(GenerationError::BadRequest(
            "end must be strictly after start".into(),
        ));
    }
    if change.team_id.is_some() {
        schedule.team_id = change.team_id;
    }
    if let Some(status) = change.status {
        schedule.status = status;
    }
    if change.comments.is_some() {
        schedule.comments = change.comments;
    }

    let members = if schedule.is_generated() {
        None
    } else {
        change.members.map(dedup)
    };
    store.update_schedule(schedule.clone(), members)?;
    Ok(schedule)
}

/// Un créneau généré ne se supprime qu'avec sa génération.
pub fn remove_schedule<S: ScheduleStore>(
    store: &mut S,
    area: &AreaId,
    id: &ScheduleId,
) -> Result<(), GenerationError> {
    let schedule = store.find_schedule(area, id)?;
    if let Some(generation) = &schedule.generation_id {
        return Err(GenerationError::BadRequest(format!(
            "schedule {id} belongs to generation {generation}; remove the generation instead"
        )));
    }
    store.delete_schedule(id)
}

pub fn list_schedules<S: ScheduleStore>(
    store: &S,
    area: &AreaId,
) -> Result<Vec<Schedule>, GenerationError> {
    store.find_area(area)?;
    store.list_schedules(area)
}

/// Premier champ réservé au générateur que la modification changerait.
fn generator_owned_change(
    schedule: &Schedule,
    current: &[Member],
    change: &ScheduleUpdate,
) -> Option<&'static str> {
    if change.start.is_some_and(|s| s != schedule.start) {
        return Some("start");
    }
    if change.end.is_some_and(|e| e != schedule.end) {
        return Some("end");
    }
    if change.team_id.is_some() && change.team_id != schedule.team_id {
        return Some("team");
    }
    if let Some(members) = &change.members {
        let wanted: HashSet<&Member> = members.iter().collect();
        let existing: HashSet<&Member> = current.iter().collect();
        if wanted != existing {
            return Some("participants");
        }
    }
    None
}

fn dedup(members: Vec<Member>) -> Vec<Member> {
    let mut seen = HashSet::new();
    members
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}
