#![forbid(unsafe_code)]
mod common;

use chrono::NaiveDate;
use common::{d, dataset, north, people_request, pid, request};
use planif::model::{GenerationId, Member, MembershipId, ScheduleId, ScheduleMembership};
use planif::schedule::{self, ManualSchedule};
use planif::{
    Absence, AreaId, Area, Directory, GenerationError, GenerationType, Generator, GroupConfig,
    GroupId, MemoryStore, PeopleConfig, Person, PersonId, Schedule, ScheduleGeneration,
    ScheduleStore, TeamId, Transaction,
};
use chrono::{TimeZone, Utc};

#[test]
fn create_persists_generation_schedules_and_memberships() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let result = gen.create(&north(), &people_request(true), &pid("alice")).unwrap();

    assert_eq!(result.generation.total_schedules, 5);
    assert_eq!(result.generation.created_by, pid("alice"));
    assert_eq!(result.schedules.len(), 5);
    assert!(result
        .schedules
        .iter()
        .all(|s| s.generation_id.as_ref() == Some(&result.generation.id)));

    let data = gen.store().data();
    assert_eq!(data.generations.len(), 1);
    assert_eq!(data.schedules.len(), 5);
    // 5 + 4 + 4 + 5 + 5 (Bob absent les 2 et 3 janvier)
    assert_eq!(data.memberships.len(), 23);

    let details = gen.find_one(&north(), &result.generation.id).unwrap();
    assert_eq!(details.schedules.len(), 5);
    assert_eq!(gen.find_all(&north()).unwrap().len(), 1);
}

#[test]
fn create_matches_preview() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let req = people_request(true);
    let preview = gen.preview(&north(), &req).unwrap();
    let result = gen.create(&north(), &req, &pid("alice")).unwrap();

    assert_eq!(result.summary, preview.summary);
    let starts: Vec<_> = preview.schedules.iter().map(|s| s.start).collect();
    let persisted: Vec<_> = result.schedules.iter().map(|s| s.start).collect();
    assert_eq!(starts, persisted);
}

#[test]
fn group_generation_links_groups_and_their_members() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let mut req = request(GenerationType::Group, d(2025, 1, 6), d(2025, 1, 7));
    req.group_config = Some(GroupConfig {
        group_ids: vec![GroupId::new("g1"), GroupId::new("g3")],
        groups_per_schedule: 1,
        distribution_order: Default::default(),
        honor_absences: false,
        excluded_people: Vec::new(),
    });
    let result = gen.create(&north(), &req, &pid("carol")).unwrap();

    let members: Vec<Vec<Member>> = result
        .schedules
        .iter()
        .map(|s| gen.store().data().members_of(&s.id))
        .collect();
    assert_eq!(
        members,
        vec![
            vec![
                Member::Group(GroupId::new("g1")),
                Member::Person(pid("alice")),
                Member::Person(pid("bob")),
            ],
            vec![
                Member::Group(GroupId::new("g3")),
                Member::Person(pid("dave")),
                Member::Person(pid("erin")),
            ],
        ]
    );
}

#[test]
fn absent_group_member_is_not_persisted() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let mut req = request(GenerationType::Group, d(2025, 1, 2), d(2025, 1, 2));
    req.group_config = Some(GroupConfig {
        group_ids: vec![GroupId::new("g1")],
        groups_per_schedule: 1,
        distribution_order: Default::default(),
        honor_absences: true,
        excluded_people: Vec::new(),
    });
    let preview = gen.preview(&north(), &req).unwrap();
    let result = gen.create(&north(), &req, &pid("carol")).unwrap();

    let previewed: Vec<PersonId> = preview.schedules[0]
        .participants
        .people()
        .into_iter()
        .map(|p| p.id.clone())
        .collect();
    let persisted: Vec<PersonId> = gen
        .store()
        .data()
        .members_of(&result.schedules[0].id)
        .into_iter()
        .filter_map(|m| match m {
            Member::Person(id) => Some(id),
            Member::Group(_) => None,
        })
        .collect();
    assert_eq!(previewed, vec![pid("alice")]);
    assert_eq!(persisted, previewed);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("schedules.csv");
    planif::io::export_schedules_csv(&out, gen.store().data(), &north()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.lines().nth(1).unwrap().ends_with("pending,Day crew;Alice"));
}

#[test]
fn plan_with_errors_is_rejected_and_nothing_written() {
    let mut data = dataset();
    data.absences
        .push(Absence::new(pid("carol"), d(2025, 1, 7), d(2025, 1, 7)).unwrap());
    let mut gen = Generator::new(MemoryStore::new(data));
    let mut req = request(GenerationType::Group, d(2025, 1, 6), d(2025, 1, 8));
    req.group_config = Some(GroupConfig {
        group_ids: vec![GroupId::new("g2")],
        groups_per_schedule: 1,
        distribution_order: Default::default(),
        honor_absences: true,
        excluded_people: Vec::new(),
    });

    let preview = gen.preview(&north(), &req).unwrap();
    assert!(preview.summary.errors >= 1);

    let err = gen.create(&north(), &req, &pid("alice")).unwrap_err();
    assert!(matches!(err, GenerationError::BadRequest(_)));
    let data = gen.store().data();
    assert!(data.generations.is_empty());
    assert!(data.schedules.is_empty());
    assert!(data.memberships.is_empty());
}

#[test]
fn team_generation_keeps_team_reference() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let mut req = request(GenerationType::TeamUnrestricted, d(2025, 1, 6), d(2025, 1, 6));
    req.team_config = Some(planif::TeamConfig::new(TeamId::new("t1")));
    let result = gen.create(&north(), &req, &pid("alice")).unwrap();
    assert_eq!(result.schedules[0].team_id, Some(TeamId::new("t1")));
    assert_eq!(gen.store().data().memberships.len(), 4);
}

/// Magasin qui journalise les écritures et fait échouer la n-ième écriture d'appartenance.
struct FailingStore {
    inner: MemoryStore,
    fail_at: usize,
    log: Vec<&'static str>,
}

impl FailingStore {
    fn new(fail_at: usize) -> Self {
        Self {
            inner: MemoryStore::new(dataset()),
            fail_at,
            log: Vec::new(),
        }
    }
}

struct FailingTx<'a> {
    inner: &'a mut dyn Transaction,
    log: &'a mut Vec<&'static str>,
    memberships: usize,
    fail_at: usize,
}

impl Transaction for FailingTx<'_> {
    fn persist_generation(&mut self, record: ScheduleGeneration) -> Result<GenerationId, GenerationError> {
        self.log.push("generation");
        self.inner.persist_generation(record)
    }
    fn persist_schedule(&mut self, record: Schedule) -> Result<ScheduleId, GenerationError> {
        self.log.push("schedule");
        self.inner.persist_schedule(record)
    }
    fn persist_membership(&mut self, record: ScheduleMembership) -> Result<MembershipId, GenerationError> {
        self.log.push("membership");
        self.memberships += 1;
        if self.memberships == self.fail_at {
            return Err(GenerationError::Other(anyhow::anyhow!("membership insert failed")));
        }
        self.inner.persist_membership(record)
    }
}

impl Directory for FailingStore {
    fn find_area(&self, id: &AreaId) -> Result<Area, GenerationError> {
        self.inner.find_area(id)
    }
    fn list_group_members(
        &self,
        area: &AreaId,
        groups: &[GroupId],
    ) -> Result<Vec<planif::store::GroupMembers>, GenerationError> {
        self.inner.list_group_members(area, groups)
    }
    fn list_team_members(
        &self,
        area: &AreaId,
        team: &TeamId,
        require_responsibility: bool,
    ) -> Result<Vec<Person>, GenerationError> {
        self.inner.list_team_members(area, team, require_responsibility)
    }
    fn list_eligible_people(&self, area: &AreaId, excluded: &[PersonId]) -> Result<Vec<Person>, GenerationError> {
        self.inner.list_eligible_people(area, excluded)
    }
    fn list_absences(
        &self,
        people: &[PersonId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Absence>, GenerationError> {
        self.inner.list_absences(people, from, to)
    }
}

impl ScheduleStore for FailingStore {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, GenerationError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, GenerationError>,
    {
        let fail_at = self.fail_at;
        let log = &mut self.log;
        self.inner.in_transaction(|tx| {
            let mut failing = FailingTx {
                inner: tx,
                log: &mut *log,
                memberships: 0,
                fail_at,
            };
            f(&mut failing)
        })
    }
    fn list_generations(&self, area: &AreaId) -> Result<Vec<ScheduleGeneration>, GenerationError> {
        self.inner.list_generations(area)
    }
    fn find_generation(&self, area: &AreaId, id: &GenerationId) -> Result<ScheduleGeneration, GenerationError> {
        self.inner.find_generation(area, id)
    }
    fn schedules_of_generation(&self, id: &GenerationId) -> Result<Vec<Schedule>, GenerationError> {
        self.inner.schedules_of_generation(id)
    }
    fn delete_generation(&mut self, area: &AreaId, id: &GenerationId) -> Result<usize, GenerationError> {
        self.inner.delete_generation(area, id)
    }
    fn list_schedules(&self, area: &AreaId) -> Result<Vec<Schedule>, GenerationError> {
        self.inner.list_schedules(area)
    }
    fn find_schedule(&self, area: &AreaId, id: &ScheduleId) -> Result<Schedule, GenerationError> {
        self.inner.find_schedule(area, id)
    }
    fn schedule_members(&self, id: &ScheduleId) -> Result<Vec<Member>, GenerationError> {
        self.inner.schedule_members(id)
    }
    fn update_schedule(&mut self, record: Schedule, members: Option<Vec<Member>>) -> Result<(), GenerationError> {
        self.inner.update_schedule(record, members)
    }
    fn delete_schedule(&mut self, id: &ScheduleId) -> Result<(), GenerationError> {
        self.inner.delete_schedule(id)
    }
}

#[test]
fn failure_on_last_membership_rolls_everything_back() {
    let mut gen = Generator::new(FailingStore::new(3));
    let mut req = request(GenerationType::People, d(2025, 1, 6), d(2025, 1, 8));
    req.people_config = Some(PeopleConfig {
        people_per_schedule: Some(1),
        ..PeopleConfig::default()
    });

    let err = gen.create(&north(), &req, &pid("alice")).unwrap_err();
    assert!(matches!(err, GenerationError::Other(_)));

    let data = gen.store().inner.data();
    assert!(data.generations.is_empty());
    assert!(data.schedules.is_empty());
    assert!(data.memberships.is_empty());
}

#[test]
fn writes_generation_then_schedules_then_memberships() {
    let mut gen = Generator::new(FailingStore::new(usize::MAX));
    let mut req = request(GenerationType::People, d(2025, 1, 6), d(2025, 1, 8));
    req.people_config = Some(PeopleConfig {
        people_per_schedule: Some(1),
        ..PeopleConfig::default()
    });

    gen.create(&north(), &req, &pid("alice")).unwrap();
    assert_eq!(
        gen.store().log,
        vec![
            "generation",
            "schedule",
            "schedule",
            "schedule",
            "membership",
            "membership",
            "membership",
        ]
    );
    assert_eq!(gen.store().inner.data().memberships.len(), 3);
}

#[test]
fn remove_cascades_to_generated_schedules_only() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let manual = schedule::create_manual(
        gen.store_mut(),
        &north(),
        ManualSchedule {
            start: Utc.with_ymd_and_hms(2025, 1, 4, 8, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 4, 12, 0, 0).unwrap(),
            team_id: None,
            members: vec![Member::Person(pid("dave"))],
            status: Default::default(),
            comments: Some("weekend cover".into()),
        },
    )
    .unwrap();
    let result = gen.create(&north(), &people_request(true), &pid("alice")).unwrap();

    let removed = gen.remove(&north(), &result.generation.id).unwrap();
    assert_eq!(removed, 5);

    let data = gen.store().data();
    assert!(data.generations.is_empty());
    assert_eq!(data.schedules.len(), 1);
    assert_eq!(data.schedules[0].id, manual.id);
    assert_eq!(data.memberships.len(), 1);

    let err = gen.find_one(&north(), &result.generation.id).unwrap_err();
    assert!(matches!(err, GenerationError::NotFound { .. }));
}

#[test]
fn generations_are_scoped_to_their_area() {
    let mut gen = Generator::new(MemoryStore::new(dataset()));
    let result = gen.create(&north(), &people_request(true), &pid("alice")).unwrap();
    let south = AreaId::new("south");

    assert!(gen.find_all(&south).unwrap().is_empty());
    assert!(matches!(
        gen.find_one(&south, &result.generation.id),
        Err(GenerationError::NotFound { .. })
    ));
    assert!(matches!(
        gen.remove(&south, &result.generation.id),
        Err(GenerationError::NotFound { .. })
    ));
    assert!(matches!(
        gen.find_all(&AreaId::new("nowhere")),
        Err(GenerationError::NotFound { entity: "area", .. })
    ));
}
