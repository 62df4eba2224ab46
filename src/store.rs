//! Collaborateurs du moteur : lecture du référentiel (zones, personnel,
//! absences) et écriture transactionnelle des plannings.
//!
//! [`MemoryStore`] implémente les deux côtés sur un [`Dataset`] en mémoire ;
//! [`JsonStorage`] le charge et le sauvegarde de manière atomique.

use crate::generation::GenerationError;
use crate::model::{
    Absence, Area, AreaId, Dataset, GenerationId, Group, GroupId, Member, MembershipId, Person,
    PersonId, ResponsibilityId, Schedule, ScheduleGeneration, ScheduleId, ScheduleMembership,
    TeamId,
};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Groupe et ses membres résolus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembers {
    pub group: Group,
    pub members: Vec<Person>,
}

/// Lecture seule : ce que le moteur consulte pendant une prévisualisation.
pub trait Directory {
    fn find_area(&self, id: &AreaId) -> Result<Area, GenerationError>;

    /// Groupes dans l'ordre demandé ; `NotFound` si l'un d'eux n'existe pas dans la zone.
    fn list_group_members(
        &self,
        area: &AreaId,
        groups: &[GroupId],
    ) -> Result<Vec<GroupMembers>, GenerationError>;

    /// Membres de l'équipe, filtrés sur les responsabilités de la zone si demandé.
    fn list_team_members(
        &self,
        area: &AreaId,
        team: &TeamId,
        require_responsibility: bool,
    ) -> Result<Vec<Person>, GenerationError>;

    fn list_eligible_people(
        &self,
        area: &AreaId,
        excluded: &[PersonId],
    ) -> Result<Vec<Person>, GenerationError>;

    /// Absences des personnes données qui chevauchent [from, to].
    fn list_absences(
        &self,
        people: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Absence>, GenerationError>;
}

/// Écritures d'une transaction ; rien n'est visible avant la validation.
pub trait Transaction {
    fn persist_generation(&mut self, record: ScheduleGeneration)
        -> Result<GenerationId, GenerationError>;
    fn persist_schedule(&mut self, record: Schedule) -> Result<ScheduleId, GenerationError>;
    fn persist_membership(
        &mut self,
        record: ScheduleMembership,
    ) -> Result<MembershipId, GenerationError>;
}

pub trait ScheduleStore: Directory {
    /// Exécute `f` dans une transaction : tout est écrit si `f` réussit, rien sinon.
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, GenerationError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, GenerationError>;

    fn list_generations(&self, area: &AreaId) -> Result<Vec<ScheduleGeneration>, GenerationError>;
    fn find_generation(
        &self,
        area: &AreaId,
        id: &GenerationId,
    ) -> Result<ScheduleGeneration, GenerationError>;
    fn schedules_of_generation(&self, id: &GenerationId) -> Result<Vec<Schedule>, GenerationError>;
    /// Supprime la génération et, en cascade, ses créneaux. Retourne le nombre de créneaux supprimés.
    fn delete_generation(&mut self, area: &AreaId, id: &GenerationId)
        -> Result<usize, GenerationError>;

    fn list_schedules(&self, area: &AreaId) -> Result<Vec<Schedule>, GenerationError>;
    fn find_schedule(&self, area: &AreaId, id: &ScheduleId) -> Result<Schedule, GenerationError>;
    fn schedule_members(&self, id: &ScheduleId) -> Result<Vec<Member>, GenerationError>;
    /// Remplace le créneau ; `members == Some(..)` remplace aussi sa composition.
    fn update_schedule(
        &mut self,
        record: Schedule,
        members: Option<Vec<Member>>,
    ) -> Result<(), GenerationError>;
    fn delete_schedule(&mut self, id: &ScheduleId) -> Result<(), GenerationError>;
}

/// Magasin en mémoire au-dessus d'un [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }
    pub fn data(&self) -> &Dataset {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut Dataset {
        &mut self.data
    }

    fn area_responsibilities(&self, area: &AreaId) -> HashSet<&ResponsibilityId> {
        self.data
            .responsibilities
            .iter()
            .filter(|r| &r.area_id == area)
            .map(|r| &r.id)
            .collect()
    }

    fn resolve_people(&self, ids: &[PersonId]) -> Vec<Person> {
        ids.iter()
            .filter_map(|id| self.data.find_person_by_id(id))
            .cloned()
            .collect()
    }
}

impl Directory for MemoryStore {
    fn find_area(&self, id: &AreaId) -> Result<Area, GenerationError> {
        self.data
            .find_area(id)
            .cloned()
            .ok_or_else(|| GenerationError::not_found("area", id))
    }

    fn list_group_members(
        &self,
        area: &AreaId,
        groups: &[GroupId],
    ) -> Result<Vec<GroupMembers>, GenerationError> {
        groups
            .iter()
            .map(|gid| -> Result<GroupMembers, GenerationError> {
                let group = self
                    .data
                    .groups
                    .iter()
                    .find(|g| &g.id == gid && &g.area_id == area)
                    .ok_or_else(|| GenerationError::not_found("group", gid))?;
                Ok(GroupMembers {
                    group: group.clone(),
                    members: self.resolve_people(&group.members),
                })
            })
            .collect()
    }

    fn list_team_members(
        &self,
        area: &AreaId,
        team: &TeamId,
        require_responsibility: bool,
    ) -> Result<Vec<Person>, GenerationError> {
        let team = self
            .data
            .teams
            .iter()
            .find(|t| &t.id == team && &t.area_id == area)
            .ok_or_else(|| GenerationError::not_found("team", team))?;
        let mut members = self.resolve_people(&team.members);
        if require_responsibility {
            let recognised = self.area_responsibilities(area);
            members.retain(|p| p.responsibilities.iter().any(|r| recognised.contains(r)));
        }
        Ok(members)
    }

    fn list_eligible_people(
        &self,
        area: &AreaId,
        excluded: &[PersonId],
    ) -> Result<Vec<Person>, GenerationError> {
        Ok(self
            .data
            .people
            .iter()
            .filter(|p| p.belongs_to(area) && !excluded.contains(&p.id))
            .cloned()
            .collect())
    }

    fn list_absences(
        &self,
        people: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Absence>, GenerationError> {
        let wanted: HashSet<&PersonId> = people.iter().collect();
        Ok(self
            .data
            .absences
            .iter()
            .filter(|a| wanted.contains(&a.person_id))
            .filter(|a| a.start_date <= to && from <= a.end_date)
            .cloned()
            .collect())
    }
}

/// Écritures en attente d'une transaction [`MemoryStore`].
struct StagedWrites<'a> {
    committed: &'a Dataset,
    generations: Vec<ScheduleGeneration>,
    schedules: Vec<Schedule>,
    memberships: Vec<ScheduleMembership>,
}

impl<'a> StagedWrites<'a> {
    fn new(committed: &'a Dataset) -> Self {
        Self {
            committed,
            generations: Vec::new(),
            schedules: Vec::new(),
            memberships: Vec::new(),
        }
    }

    fn into_writes(
        self,
    ) -> (
        Vec<ScheduleGeneration>,
        Vec<Schedule>,
        Vec<ScheduleMembership>,
    ) {
        (self.generations, self.schedules, self.memberships)
    }

    fn schedule_known(&self, id: &ScheduleId) -> bool {
        self.schedules.iter().any(|s| &s.id == id)
            || self.committed.schedules.iter().any(|s| &s.id == id)
    }

    fn generation_known(&self, id: &GenerationId) -> bool {
        self.generations.iter().any(|g| &g.id == id)
            || self.committed.generations.iter().any(|g| &g.id == id)
    }
}

impl Transaction for StagedWrites<'_> {
    fn persist_generation(
        &mut self,
        record: ScheduleGeneration,
    ) -> Result<GenerationId, GenerationError> {
        if self.generation_known(&record.id) {
            return Err(GenerationError::Conflict(format!(
                "generation {} already exists",
                record.id
            )));
        }
        let id = record.id.clone();
        self.generations.push(record);
        Ok(id)
    }

    fn persist_schedule(&mut self, record: Schedule) -> Result<ScheduleId, GenerationError> {
        if let Some(parent) = &record.generation_id {
            if !self.generation_known(parent) {
                return Err(GenerationError::not_found("generation", parent));
            }
        }
        if self.schedule_known(&record.id) {
            return Err(GenerationError::Conflict(format!(
                "schedule {} already exists",
                record.id
            )));
        }
        let id = record.id.clone();
        self.schedules.push(record);
        Ok(id)
    }

    fn persist_membership(
        &mut self,
        record: ScheduleMembership,
    ) -> Result<MembershipId, GenerationError> {
        if !self.schedule_known(&record.schedule_id) {
            return Err(GenerationError::not_found("schedule", &record.schedule_id));
        }
        let id = record.id.clone();
        self.memberships.push(record);
        Ok(id)
    }
}

impl ScheduleStore for MemoryStore {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, GenerationError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, GenerationError>,
    {
        let mut staged = StagedWrites::new(&self.data);
        let out = match f(&mut staged) {
            Ok(out) => out,
            Err(err) => {
                tracing::warn!(
                    generations = staged.generations.len(),
                    schedules = staged.schedules.len(),
                    memberships = staged.memberships.len(),
                    "transaction rolled back"
                );
                return Err(err);
            }
        };
        let (generations, schedules, memberships) = staged.into_writes();
        self.data.generations.extend(generations);
        self.data.schedules.extend(schedules);
        self.data.memberships.extend(memberships);
        Ok(out)
    }

    fn list_generations(&self, area: &AreaId) -> Result<Vec<ScheduleGeneration>, GenerationError> {
        let mut out: Vec<ScheduleGeneration> = self
            .data
            .generations
            .iter()
            .filter(|g| &g.area_id == area)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    fn find_generation(
        &self,
        area: &AreaId,
        id: &GenerationId,
    ) -> Result<ScheduleGeneration, GenerationError> {
        self.data
            .generations
            .iter()
            .find(|g| &g.id == id && &g.area_id == area)
            .cloned()
            .ok_or_else(|| GenerationError::not_found("generation", id))
    }

    fn schedules_of_generation(&self, id: &GenerationId) -> Result<Vec<Schedule>, GenerationError> {
        let mut out: Vec<Schedule> = self
            .data
            .schedules
            .iter()
            .filter(|s| s.generation_id.as_ref() == Some(id))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.start);
        Ok(out)
    }

    fn delete_generation(
        &mut self,
        area: &AreaId,
        id: &GenerationId,
    ) -> Result<usize, GenerationError> {
        self.find_generation(area, id)?;
        let owned: HashSet<ScheduleId> = self
            .data
            .schedules
            .iter()
            .filter(|s| s.generation_id.as_ref() == Some(id))
            .map(|s| s.id.clone())
            .collect();
        self.data
            .memberships
            .retain(|m| !owned.contains(&m.schedule_id));
        self.data.schedules.retain(|s| !owned.contains(&s.id));
        self.data.generations.retain(|g| &g.id != id);
        Ok(owned.len())
    }

    fn list_schedules(&self, area: &AreaId) -> Result<Vec<Schedule>, GenerationError> {
        let mut out: Vec<Schedule> = self
            .data
            .schedules
            .iter()
            .filter(|s| &s.area_id == area)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.start);
        Ok(out)
    }

    fn find_schedule(&self, area: &AreaId, id: &ScheduleId) -> Result<Schedule, GenerationError> {
        self.data
            .schedules
            .iter()
            .find(|s| &s.id == id && &s.area_id == area)
            .cloned()
            .ok_or_else(|| GenerationError::not_found("schedule", id))
    }

    fn schedule_members(&self, id: &ScheduleId) -> Result<Vec<Member>, GenerationError> {
        Ok(self.data.members_of(id))
    }

    fn update_schedule(
        &mut self,
        record: Schedule,
        members: Option<Vec<Member>>,
    ) -> Result<(), GenerationError> {
        let id = record.id.clone();
        let slot = self
            .data
            .find_schedule_mut(&id)
            .ok_or_else(|| GenerationError::not_found("schedule", &id))?;
        *slot = record;
        if let Some(members) = members {
            self.data.memberships.retain(|m| m.schedule_id != id);
            self.data.memberships.extend(
                members
                    .into_iter()
                    .map(|m| ScheduleMembership::new(id.clone(), m)),
            );
        }
        Ok(())
    }

    fn delete_schedule(&mut self, id: &ScheduleId) -> Result<(), GenerationError> {
        let before = self.data.schedules.len();
        self.data.schedules.retain(|s| &s.id != id);
        if self.data.schedules.len() == before {
            return Err(GenerationError::not_found("schedule", id));
        }
        self.data.memberships.retain(|m| &m.schedule_id != id);
        Ok(())
    }
}

pub trait Storage {
    /// Charge un jeu de données depuis un support.
    fn load(&self) -> anyhow::Result<Dataset>;
    /// Sauvegarde de manière atomique.
    fn save(&self, data: &Dataset) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Dataset> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let dataset: Dataset = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(dataset)
    }

    fn save(&self, data: &Dataset) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(data)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
