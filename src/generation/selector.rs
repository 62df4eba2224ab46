use super::absence::{AbsenceCalendar, AbsenceOracle};
use super::balancer::Balancer;
use super::calendar::TimeSlot;
use super::{
    DistributionBalance, GenerationError, GenerationOptions, GroupAssignment, Participants,
    PersonRef, SlotFinding,
};
use crate::config::{
    GenerationConfiguration, GenerationKind, GroupConfig, PeopleConfig, SelectionMode, TeamConfig,
};
use crate::model::{AreaId, GroupId, Person, PersonId, TeamId};
use crate::store::{Directory, GroupMembers};
use std::collections::HashSet;

/// Participants et constats d'un créneau.
#[derive(Debug, Clone)]
pub struct SlotSelection {
    pub participants: Participants,
    pub findings: Vec<SlotFinding>,
}

/// Résout et affecte les candidats d'un créneau.
pub trait SlotSelector {
    fn select(&mut self, index: usize, slot: &TimeSlot) -> SlotSelection;
    fn verdict(&self) -> DistributionBalance;
}

/// Charge les collaborateurs nécessaires au type de génération et construit le sélecteur.
pub fn resolve<D: Directory + ?Sized>(
    directory: &D,
    area: &AreaId,
    config: &GenerationConfiguration,
    opts: GenerationOptions,
) -> Result<Box<dyn SlotSelector>, GenerationError> {
    let excluded: HashSet<&PersonId> = config.kind.excluded_people().iter().collect();

    let selector: Box<dyn SlotSelector> = match &config.kind {
        GenerationKind::Group(cfg) => {
            let mut groups = directory.list_group_members(area, &cfg.group_ids)?;
            for g in groups.iter_mut() {
                g.members.retain(|p| !excluded.contains(&p.id));
            }
            let people: Vec<PersonId> = groups
                .iter()
                .flat_map(|g| g.members.iter().map(|p| p.id.clone()))
                .collect();
            let absences = load_absences(directory, config, &people)?;
            Box::new(GroupSelector::new(cfg, groups, absences, opts))
        }
        GenerationKind::People(cfg) => {
            let people = directory.list_eligible_people(area, &cfg.excluded_people)?;
            let ids: Vec<PersonId> = people.iter().map(|p| p.id.clone()).collect();
            let absences = load_absences(directory, config, &ids)?;
            Box::new(PeopleSelector::new(cfg, people, absences, opts))
        }
        GenerationKind::TeamUnrestricted(cfg) => {
            let mut members = directory.list_team_members(area, &cfg.team_id, false)?;
            members.retain(|p| !excluded.contains(&p.id));
            let ids: Vec<PersonId> = members.iter().map(|p| p.id.clone()).collect();
            let absences = load_absences(directory, config, &ids)?;
            Box::new(TeamSelector::new(cfg, members, absences, opts))
        }
        GenerationKind::TeamRestricted(cfg) => {
            let mut members =
                directory.list_team_members(area, &cfg.team_id, cfg.require_responsibilities)?;
            members.retain(|p| !excluded.contains(&p.id));
            let ids: Vec<PersonId> = members.iter().map(|p| p.id.clone()).collect();
            let absences = load_absences(directory, config, &ids)?;
            Box::new(TeamSelector::new(cfg, members, absences, opts))
        }
    };
    Ok(selector)
}

fn load_absences<D: Directory + ?Sized>(
    directory: &D,
    config: &GenerationConfiguration,
    people: &[PersonId],
) -> Result<AbsenceCalendar, GenerationError> {
    if !config.kind.honor_absences() {
        return Ok(AbsenceCalendar::ignoring());
    }
    AbsenceCalendar::load(directory, people, config.start, config.end)
}

fn person_ref(p: &Person) -> PersonRef {
    PersonRef {
        id: p.id.clone(),
        name: p.name.clone(),
    }
}

/// Constats communs : vide ⇒ erreur, sous le minimum ⇒ avertissement.
fn staffing_findings(index: usize, assigned: usize, minimum: usize, unit: &str) -> Vec<SlotFinding> {
    if assigned == 0 {
        return vec![SlotFinding::error(
            index,
            format!("no eligible {unit} available for this schedule"),
        )];
    }
    if assigned < minimum {
        return vec![SlotFinding::warning(
            index,
            format!("only {assigned} {unit}(s) assigned, {minimum} expected"),
        )];
    }
    Vec::new()
}

fn fatigue_finding(index: usize, name: &str, opts: GenerationOptions) -> SlotFinding {
    SlotFinding::warning(
        index,
        format!(
            "{name} assigned to more than {} consecutive schedules",
            opts.max_consecutive_slots
        ),
    )
}

struct GroupSelector {
    groups: Vec<GroupMembers>,
    per_schedule: usize,
    absences: AbsenceCalendar,
    balancer: Balancer<GroupId>,
    opts: GenerationOptions,
}

impl GroupSelector {
    fn new(
        cfg: &GroupConfig,
        groups: Vec<GroupMembers>,
        absences: AbsenceCalendar,
        opts: GenerationOptions,
    ) -> Self {
        let declared = groups.iter().map(|g| g.group.id.clone()).collect();
        Self {
            groups,
            per_schedule: cfg.groups_per_schedule,
            absences,
            balancer: Balancer::new(cfg.distribution_order, declared, opts),
            opts,
        }
    }
}

impl SlotSelector for GroupSelector {
    fn select(&mut self, index: usize, slot: &TimeSlot) -> SlotSelection {
        let available: Vec<(&GroupMembers, Vec<PersonRef>)> = self
            .groups
            .iter()
            .map(|g| {
                let members = g
                    .members
                    .iter()
                    .filter(|p| !self.absences.is_unavailable(&p.id, slot.date))
                    .map(person_ref)
                    .collect::<Vec<_>>();
                (g, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect();

        let pool: Vec<GroupId> = available.iter().map(|(g, _)| g.group.id.clone()).collect();
        let assignment = self.balancer.assign(&pool, self.per_schedule);

        let mut findings =
            staffing_findings(index, assignment.chosen.len(), self.per_schedule, "group");
        let mut groups = Vec::with_capacity(assignment.chosen.len());
        for gid in &assignment.chosen {
            if let Some((g, members)) = available.iter().find(|(g, _)| &g.group.id == gid) {
                let missing = g.members.len() - members.len();
                if missing > 0 {
                    findings.push(SlotFinding::warning(
                        index,
                        format!("group {}: {missing} member(s) absent", g.group.name),
                    ));
                }
                groups.push(GroupAssignment {
                    group_id: gid.clone(),
                    name: g.group.name.clone(),
                    members: members.clone(),
                });
            }
        }
        for gid in &assignment.fatigued {
            let name = self
                .groups
                .iter()
                .find(|g| &g.group.id == gid)
                .map_or(gid.as_str(), |g| g.group.name.as_str());
            findings.push(fatigue_finding(index, &format!("group {name}"), self.opts));
        }

        SlotSelection {
            participants: Participants::Groups { groups },
            findings,
        }
    }

    fn verdict(&self) -> DistributionBalance {
        self.balancer.verdict()
    }
}

/// Sélection de personnes individuelles (PEOPLE et TEAM_*).
struct PersonRotation {
    people: Vec<Person>,
    wanted: Option<usize>,
    absences: AbsenceCalendar,
    balancer: Balancer<PersonId>,
    opts: GenerationOptions,
}

impl PersonRotation {
    fn select(&mut self, index: usize, slot: &TimeSlot) -> (Vec<PersonRef>, Vec<SlotFinding>) {
        let pool: Vec<PersonId> = self
            .people
            .iter()
            .filter(|p| !self.absences.is_unavailable(&p.id, slot.date))
            .map(|p| p.id.clone())
            .collect();

        let wanted = self.wanted.unwrap_or(pool.len());
        let minimum = self.wanted.unwrap_or(1);
        let assignment = self.balancer.assign(&pool, wanted);

        let members: Vec<PersonRef> = assignment
            .chosen
            .iter()
            .filter_map(|id| self.people.iter().find(|p| &p.id == id))
            .map(person_ref)
            .collect();

        let mut findings = staffing_findings(index, members.len(), minimum, "person");
        for id in &assignment.fatigued {
            let name = self
                .people
                .iter()
                .find(|p| &p.id == id)
                .map_or(id.as_str(), |p| p.name.as_str());
            findings.push(fatigue_finding(index, name, self.opts));
        }
        (members, findings)
    }
}

struct PeopleSelector {
    rotation: PersonRotation,
}

impl PeopleSelector {
    fn new(
        cfg: &PeopleConfig,
        people: Vec<Person>,
        absences: AbsenceCalendar,
        opts: GenerationOptions,
    ) -> Self {
        let declared = people.iter().map(|p| p.id.clone()).collect();
        Self {
            rotation: PersonRotation {
                people,
                wanted: cfg.people_per_schedule,
                absences,
                balancer: Balancer::new(cfg.distribution_order, declared, opts),
                opts,
            },
        }
    }
}

impl SlotSelector for PeopleSelector {
    fn select(&mut self, index: usize, slot: &TimeSlot) -> SlotSelection {
        let (members, findings) = self.rotation.select(index, slot);
        SlotSelection {
            participants: Participants::People { members },
            findings,
        }
    }

    fn verdict(&self) -> DistributionBalance {
        self.rotation.balancer.verdict()
    }
}

struct TeamSelector {
    team_id: TeamId,
    rotation: PersonRotation,
}

impl TeamSelector {
    fn new(
        cfg: &TeamConfig,
        members: Vec<Person>,
        absences: AbsenceCalendar,
        opts: GenerationOptions,
    ) -> Self {
        let declared = members.iter().map(|p| p.id.clone()).collect();
        let wanted = match cfg.selection_mode {
            SelectionMode::All => None,
            SelectionMode::Subset => Some(cfg.members_per_schedule),
        };
        Self {
            team_id: cfg.team_id.clone(),
            rotation: PersonRotation {
                people: members,
                wanted,
                absences,
                balancer: Balancer::new(cfg.distribution_order, declared, opts),
                opts,
            },
        }
    }
}

impl SlotSelector for TeamSelector {
    fn select(&mut self, index: usize, slot: &TimeSlot) -> SlotSelection {
        let (members, findings) = self.rotation.select(index, slot);
        SlotSelection {
            participants: Participants::Team {
                team_id: self.team_id.clone(),
                members,
            },
            findings,
        }
    }

    fn verdict(&self) -> DistributionBalance {
        self.rotation.balancer.verdict()
    }
}
