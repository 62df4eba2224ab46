use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Déclare un identifiant fort adossé à une `String`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Area
    AreaId
);
string_id!(
    /// Identifiant fort pour Person
    PersonId
);
string_id!(GroupId);
string_id!(TeamId);
string_id!(ResponsibilityId);
string_id!(AbsenceId);
string_id!(
    /// Identifiant fort pour Schedule (créneau persisté)
    ScheduleId
);
string_id!(GenerationId);
string_id!(MembershipId);

/// Zone organisationnelle : tout planning appartient à une zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
}

/// Personne du personnel, rattachée à une ou plusieurs zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub area_ids: Vec<AreaId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responsibilities: Vec<ResponsibilityId>,
}

impl Person {
    pub fn belongs_to(&self, area: &AreaId) -> bool {
        self.area_ids.contains(area)
    }
}

/// Responsabilité définie pour une zone (ex. « chef d'équipe »).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responsibility {
    pub id: ResponsibilityId,
    pub area_id: AreaId,
    pub name: String,
}

/// Groupe fixe de personnes ; la rotation GROUP se fait à la granularité du groupe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub area_id: AreaId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<PersonId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub area_id: AreaId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<PersonId>,
}

/// Absence d'une personne, intervalle de dates inclusif [start_date, end_date].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub id: AbsenceId,
    pub person_id: PersonId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Absence {
    pub fn new(person_id: PersonId, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, String> {
        if end_date < start_date {
            return Err("absence end date must not precede start date".to_string());
        }
        Ok(Self {
            id: AbsenceId::random(),
            person_id,
            start_date,
            end_date,
            reason: None,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Créneau persisté. `generation_id == None` ⇒ créé manuellement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub area_id: AreaId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub status: ScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default)]
    pub generation_id: Option<GenerationId>,
}

impl Schedule {
    /// Crée un créneau en validant que `end > start`.
    pub fn new(area_id: AreaId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if end <= start {
            return Err("end must be strictly after start".to_string());
        }
        Ok(Self {
            id: ScheduleId::random(),
            area_id,
            start,
            end,
            status: ScheduleStatus::Pending,
            team_id: None,
            comments: None,
            generation_id: None,
        })
    }

    pub fn is_generated(&self) -> bool {
        self.generation_id.is_some()
    }

    /// Durée en minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Participant rattaché à un créneau : un groupe entier ou une personne.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Member {
    Group(GroupId),
    Person(PersonId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMembership {
    pub id: MembershipId,
    pub schedule_id: ScheduleId,
    pub member: Member,
}

impl ScheduleMembership {
    pub fn new(schedule_id: ScheduleId, member: Member) -> Self {
        Self {
            id: MembershipId::random(),
            schedule_id,
            member,
        }
    }
}

/// Trace persistée d'une génération automatique ; possède les créneaux produits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGeneration {
    pub id: GenerationId,
    pub area_id: AreaId,
    pub configuration: crate::config::GenerationRequest,
    pub total_schedules: usize,
    pub created_by: PersonId,
    pub created_at: DateTime<Utc>,
}

/// Jeu de données complet (zones, personnel, plannings).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub responsibilities: Vec<Responsibility>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub generations: Vec<ScheduleGeneration>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub memberships: Vec<ScheduleMembership>,
}

impl Dataset {
    pub fn find_area<'a>(&'a self, id: &AreaId) -> Option<&'a Area> {
        self.areas.iter().find(|a| &a.id == id)
    }
    pub fn find_person_by_id<'a>(&'a self, id: &PersonId) -> Option<&'a Person> {
        self.people.iter().find(|p| &p.id == id)
    }
    pub fn find_schedule_mut(&mut self, id: &ScheduleId) -> Option<&mut Schedule> {
        self.schedules.iter_mut().find(|s| &s.id == id)
    }
    pub fn members_of(&self, schedule: &ScheduleId) -> Vec<Member> {
        self.memberships
            .iter()
            .filter(|m| &m.schedule_id == schedule)
            .map(|m| m.member.clone())
            .collect()
    }
}
