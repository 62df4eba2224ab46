#![allow(dead_code)]
use chrono::{NaiveDate, NaiveTime};
use planif::{
    Absence, Area, AreaId, Dataset, GenerationRequest, GenerationType, Group, GroupId,
    PeopleConfig, PeriodConfig, PeriodType, Person, PersonId, Responsibility, ResponsibilityId,
    Team, TeamId,
};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn north() -> AreaId {
    AreaId::new("north")
}

pub fn pid(s: &str) -> PersonId {
    PersonId::new(s)
}

fn person(id: &str, name: &str, area: &str, responsibilities: &[&str]) -> Person {
    Person {
        id: PersonId::new(id),
        name: name.to_string(),
        area_ids: vec![AreaId::new(area)],
        responsibilities: responsibilities.iter().map(ResponsibilityId::new).collect(),
    }
}

/// Zone « north » : 5 personnes, 3 groupes, une équipe ; Bob absent du 2 au 3 janvier 2025.
pub fn dataset() -> Dataset {
    let mut data = Dataset::default();
    data.areas.push(Area {
        id: north(),
        name: "North wing".into(),
    });
    data.areas.push(Area {
        id: AreaId::new("south"),
        name: "South wing".into(),
    });
    data.people = vec![
        person("alice", "Alice", "north", &["lead"]),
        person("bob", "Bob", "north", &[]),
        person("carol", "Carol", "north", &["lead"]),
        person("dave", "Dave", "north", &["other-area-role"]),
        person("erin", "Erin", "north", &[]),
        person("zed", "Zed", "south", &[]),
    ];
    data.responsibilities = vec![
        Responsibility {
            id: ResponsibilityId::new("lead"),
            area_id: north(),
            name: "Team lead".into(),
        },
        Responsibility {
            id: ResponsibilityId::new("other-area-role"),
            area_id: AreaId::new("south"),
            name: "Dispatcher".into(),
        },
    ];
    data.groups = vec![
        group("g1", "Day crew", &["alice", "bob"]),
        group("g2", "Solo", &["carol"]),
        group("g3", "Night crew", &["dave", "erin"]),
    ];
    data.teams = vec![Team {
        id: TeamId::new("t1"),
        area_id: north(),
        name: "Response".into(),
        members: vec![pid("alice"), pid("bob"), pid("carol"), pid("dave")],
    }];
    data.absences = vec![Absence::new(pid("bob"), d(2025, 1, 2), d(2025, 1, 3)).unwrap()];
    data
}

fn group(id: &str, name: &str, members: &[&str]) -> Group {
    Group {
        id: GroupId::new(id),
        area_id: north(),
        name: name.to_string(),
        members: members.iter().map(PersonId::new).collect(),
    }
}

/// Du 1er au 7 janvier 2025, lundi–vendredi, 08:00–16:00.
pub fn weekday_period() -> PeriodConfig {
    PeriodConfig::new([1, 2, 3, 4, 5], t(8, 0), t(16, 0))
}

pub fn request(generation_type: GenerationType, start: NaiveDate, end: NaiveDate) -> GenerationRequest {
    GenerationRequest {
        generation_type,
        period_type: PeriodType::Daily,
        period_start_date: start,
        period_end_date: end,
        group_config: None,
        people_config: None,
        team_config: None,
        period_config: weekday_period(),
    }
}

pub fn people_request(honor_absences: bool) -> GenerationRequest {
    let mut req = request(GenerationType::People, d(2025, 1, 1), d(2025, 1, 7));
    req.people_config = Some(PeopleConfig {
        honor_absences,
        ..PeopleConfig::default()
    });
    req
}
