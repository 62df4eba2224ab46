use crate::generation::PreviewResult;
use crate::model::{Absence, AreaId, Dataset, Member, Person, PersonId, ResponsibilityId, ScheduleStatus};
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import de personnes depuis CSV: header `id,name,areas[,responsibilities]`
/// (listes séparées par `;`, id vide ⇒ généré).
pub fn import_people_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Person>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid people row (empty name)");
        }
        let areas = rec.get(2).context("missing areas")?;
        let mut person = Person {
            id: if id.is_empty() { PersonId::random() } else { PersonId::new(id) },
            name: name.to_string(),
            area_ids: split_list(areas).map(AreaId::new).collect(),
            responsibilities: Vec::new(),
        };
        if person.area_ids.is_empty() {
            bail!("person {name} must belong to at least one area");
        }
        if let Some(raw) = rec.get(3) {
            person.responsibilities = split_list(raw).map(ResponsibilityId::new).collect();
        }
        out.push(person);
    }
    Ok(out)
}

/// Import d'absences: header `person_id,start_date,end_date[,reason]` (bornes incluses).
pub fn import_absences_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Absence>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let person = rec.get(0).context("missing person_id")?.trim();
        if person.is_empty() {
            bail!("invalid absence row (empty person_id)");
        }
        let start = parse_date(rec.get(1).context("missing start_date")?.trim())?;
        let end = parse_date(rec.get(2).context("missing end_date")?.trim())?;
        let mut absence = Absence::new(PersonId::new(person), start, end)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid absence for {person}"))?;
        absence.reason = rec
            .get(3)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        out.push(absence);
    }
    Ok(out)
}

/// Accepte `YYYY-MM-DD` ou un horodatage RFC3339 (on garde la date UTC).
fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Ok(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Export JSON d'une prévisualisation (jolie mise en forme)
pub fn export_preview_json<P: AsRef<Path>>(path: P, preview: &PreviewResult) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(preview)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des créneaux d'une zone: header `id,generation_id,start,end,status,members`
pub fn export_schedules_csv<P: AsRef<Path>>(
    path: P,
    data: &Dataset,
    area: &AreaId,
) -> anyhow::Result<usize> {
    let mut schedules: Vec<_> = data.schedules.iter().filter(|s| &s.area_id == area).collect();
    schedules.sort_by_key(|s| s.start);

    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["id", "generation_id", "start", "end", "status", "members"])?;
    for s in &schedules {
        let members = data
            .members_of(&s.id)
            .iter()
            .map(|m| member_label(data, m))
            .collect::<Vec<_>>()
            .join(";");
        let start = s.start.to_rfc3339();
        let end = s.end.to_rfc3339();
        w.write_record([
            s.id.as_str(),
            s.generation_id.as_ref().map_or("", |g| g.as_str()),
            start.as_str(),
            end.as_str(),
            status_label(s.status),
            members.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(schedules.len())
}

fn member_label(data: &Dataset, member: &Member) -> String {
    match member {
        Member::Person(id) => data
            .find_person_by_id(id)
            .map_or_else(|| id.to_string(), |p| p.name.clone()),
        Member::Group(id) => data
            .groups
            .iter()
            .find(|g| &g.id == id)
            .map_or_else(|| id.to_string(), |g| g.name.clone()),
    }
}

fn status_label(status: ScheduleStatus) -> &'static str {
    match status {
        ScheduleStatus::Pending => "pending",
        ScheduleStatus::Confirmed => "confirmed",
        ScheduleStatus::Completed => "completed",
        ScheduleStatus::Cancelled => "cancelled",
    }
}
