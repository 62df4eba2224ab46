#![forbid(unsafe_code)]
//! Planif — génération automatique de plannings par zone.
//!
//! - Récurrence jour/semaine/personnalisée avec dates exclues et incluses.
//! - Sélection par groupes, personnes ou équipe (avec ou sans responsabilités).
//! - Répartition équilibrée, séquentielle ou aléatoire (graine fixe).
//! - Prévisualisation pure, puis validation atomique.
//! - Tout en UTC ; les dates de période sont des dates calendaires.

pub mod config;
pub mod generation;
pub mod io;
pub mod model;
pub mod schedule;
pub mod store;

pub use config::{
    DistributionOrder, GenerationConfiguration, GenerationKind, GenerationRequest,
    GenerationType, GroupConfig, PeopleConfig, PeriodConfig, PeriodType, SelectionMode,
    TeamConfig,
};
pub use generation::{
    DistributionBalance, GenerationError, GenerationOptions, GenerationResult,
    GenerationSummary, Generator, Participants, PreviewResult, Severity, ShiftSlot, SlotFinding,
};
pub use model::{
    Absence, Area, AreaId, Dataset, GenerationId, Group, GroupId, Member, Person, PersonId,
    Responsibility, ResponsibilityId, Schedule, ScheduleGeneration, ScheduleId, ScheduleStatus,
    Team, TeamId,
};
pub use schedule::{ManualSchedule, ScheduleUpdate};
pub use store::{Directory, JsonStorage, MemoryStore, ScheduleStore, Storage, Transaction};
