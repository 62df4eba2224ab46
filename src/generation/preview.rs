use super::{
    calendar, selector, DistributionBalance, GenerationError, GenerationOptions,
    GenerationSummary, PreviewResult, Severity, ShiftSlot,
};
use crate::config::{GenerationConfiguration, GenerationRequest};
use crate::model::{AreaId, PersonId, ScheduleStatus};
use crate::store::Directory;
use std::collections::HashSet;

/// Calcule le planning complet sans rien écrire.
pub(super) fn preview<D: Directory + ?Sized>(
    directory: &D,
    area: &AreaId,
    request: &GenerationRequest,
    opts: GenerationOptions,
) -> Result<PreviewResult, GenerationError> {
    directory.find_area(area)?;
    let config = GenerationConfiguration::try_from(request)?;

    let slots = calendar::enumerate(config.period_type, config.start, config.end, &config.period)?;
    tracing::info!(
        area = %area,
        generation_type = ?config.generation_type(),
        slots = slots.len(),
        "previewing generation"
    );

    let mut selector = selector::resolve(directory, area, &config, opts)?;
    let schedules: Vec<ShiftSlot> = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let selection = selector.select(index, slot);
            tracing::debug!(
                index,
                date = %slot.date,
                assigned = selection.participants.units(),
                findings = selection.findings.len(),
                "slot assigned"
            );
            ShiftSlot {
                index,
                date: slot.date,
                start: slot.start,
                end: slot.end,
                status: ScheduleStatus::Pending,
                participants: selection.participants,
                findings: selection.findings,
            }
        })
        .collect();

    let summary = summarize(&schedules, selector.verdict());
    tracing::info!(
        area = %area,
        total = summary.total_schedules,
        warnings = summary.warnings,
        errors = summary.errors,
        balance = ?summary.distribution_balance,
        "preview ready"
    );

    Ok(PreviewResult {
        configuration: request.clone(),
        schedules,
        summary,
    })
}

fn summarize(schedules: &[ShiftSlot], balance: DistributionBalance) -> GenerationSummary {
    let participants: HashSet<&PersonId> = schedules
        .iter()
        .flat_map(|s| s.participants.people())
        .map(|p| &p.id)
        .collect();
    let (warnings, errors) = schedules
        .iter()
        .flat_map(|s| s.findings.iter())
        .fold((0, 0), |(w, e), f| match f.severity {
            Severity::Warning => (w + 1, e),
            Severity::Error => (w, e + 1),
        });

    GenerationSummary {
        total_schedules: schedules.len(),
        total_participants: participants.len(),
        warnings,
        errors,
        distribution_balance: balance,
    }
}
