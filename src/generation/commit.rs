use super::{preview, GenerationError, GenerationOptions, GenerationResult, Participants, ShiftSlot};
use crate::config::GenerationRequest;
use crate::model::{
    AreaId, GenerationId, Member, PersonId, Schedule, ScheduleGeneration, ScheduleId,
    ScheduleMembership,
};
use crate::store::ScheduleStore;
use chrono::Utc;

/// Prévisualise puis persiste le planning dans une seule transaction.
pub(super) fn create<S: ScheduleStore>(
    store: &mut S,
    area: &AreaId,
    request: &GenerationRequest,
    actor: &PersonId,
    opts: GenerationOptions,
) -> Result<GenerationResult, GenerationError> {
    let preview = preview::preview(&*store, area, request, opts)?;

    if preview.summary.errors > 0 {
        let first = preview
            .findings()
            .find(|f| f.severity == super::Severity::Error)
            .map(|f| format!(" (schedule #{}: {})", f.slot_index, f.message))
            .unwrap_or_default();
        tracing::warn!(area = %area, errors = preview.summary.errors, "generation rejected");
        return Err(GenerationError::BadRequest(format!(
            "generation contains {} error(s){first}",
            preview.summary.errors
        )));
    }

    let generation = ScheduleGeneration {
        id: GenerationId::random(),
        area_id: area.clone(),
        configuration: request.clone(),
        total_schedules: preview.schedules.len(),
        created_by: actor.clone(),
        created_at: Utc::now(),
    };

    let schedules = store.in_transaction(|tx| {
        let generation_id = tx.persist_generation(generation.clone())?;
        let mut out = Vec::with_capacity(preview.schedules.len());
        for slot in &preview.schedules {
            let schedule = schedule_from_slot(area, &generation_id, slot);
            tx.persist_schedule(schedule.clone())?;
            out.push(schedule);
        }
        for (schedule, slot) in out.iter().zip(&preview.schedules) {
            for member in members_of(&slot.participants) {
                tx.persist_membership(ScheduleMembership::new(schedule.id.clone(), member))?;
            }
        }
        Ok(out)
    })?;

    tracing::info!(
        area = %area,
        generation = %generation.id,
        schedules = schedules.len(),
        "generation committed"
    );

    Ok(GenerationResult {
        generation,
        schedules,
        summary: preview.summary,
    })
}

fn schedule_from_slot(area: &AreaId, generation: &GenerationId, slot: &ShiftSlot) -> Schedule {
    let team_id = match &slot.participants {
        Participants::Team { team_id, .. } => Some(team_id.clone()),
        _ => None,
    };
    Schedule {
        id: ScheduleId::random(),
        area_id: area.clone(),
        start: slot.start,
        end: slot.end,
        status: slot.status,
        team_id,
        comments: None,
        generation_id: Some(generation.clone()),
    }
}

/// Lignes d'appartenance : le groupe choisi suivi de ses membres présents, sinon une par personne.
fn members_of(participants: &Participants) -> Vec<Member> {
    match participants {
        Participants::Groups { groups } => groups
            .iter()
            .flat_map(|g| {
                std::iter::once(Member::Group(g.group_id.clone()))
                    .chain(g.members.iter().map(|p| Member::Person(p.id.clone())))
            })
            .collect(),
        Participants::Team { members, .. } | Participants::People { members } => members
            .iter()
            .map(|p| Member::Person(p.id.clone()))
            .collect(),
    }
}
