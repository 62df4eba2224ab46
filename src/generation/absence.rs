use super::GenerationError;
use crate::model::{Absence, PersonId};
use crate::store::Directory;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Indique si une personne est indisponible à une date donnée.
pub trait AbsenceOracle {
    fn is_unavailable(&self, person: &PersonId, date: NaiveDate) -> bool;
}

/// Calendrier d'absences chargé en une seule requête pour toute la période.
#[derive(Debug, Clone, Default)]
pub struct AbsenceCalendar {
    by_person: HashMap<PersonId, Vec<(NaiveDate, NaiveDate)>>,
}

impl AbsenceCalendar {
    /// Calendrier vide : tout le monde est disponible (absences ignorées).
    pub fn ignoring() -> Self {
        Self::default()
    }

    pub fn from_absences<'a, I>(absences: I) -> Self
    where
        I: IntoIterator<Item = &'a Absence>,
    {
        let mut by_person: HashMap<PersonId, Vec<(NaiveDate, NaiveDate)>> = HashMap::new();
        for absence in absences {
            by_person
                .entry(absence.person_id.clone())
                .or_default()
                .push((absence.start_date, absence.end_date));
        }
        Self { by_person }
    }

    pub fn load<D: Directory + ?Sized>(
        directory: &D,
        people: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self, GenerationError> {
        if people.is_empty() {
            return Ok(Self::ignoring());
        }
        let absences = directory.list_absences(people, from, to)?;
        tracing::debug!(
            people = people.len(),
            absences = absences.len(),
            "absence calendar loaded"
        );
        Ok(Self::from_absences(&absences))
    }
}

impl AbsenceOracle for AbsenceCalendar {
    fn is_unavailable(&self, person: &PersonId, date: NaiveDate) -> bool {
        self.by_person
            .get(person)
            .is_some_and(|ranges| ranges.iter().any(|(start, end)| *start <= date && date <= *end))
    }
}
