//! Moteur de génération automatique de plannings.
//!
//! `preview` : calendrier → sélection → répartition, sans écriture.
//! `create` : la même prévisualisation, refusée si elle contient une erreur,
//! puis persistée dans une seule transaction.

mod absence;
mod balancer;
mod calendar;
mod commit;
mod preview;
mod selector;
mod types;

pub use absence::{AbsenceCalendar, AbsenceOracle};
pub use balancer::{Assignment, Balancer};
pub use calendar::{enumerate, TimeSlot};
pub use selector::{resolve, SlotSelection, SlotSelector};
pub use types::{
    DistributionBalance, GenerationDetails, GenerationError, GenerationOptions, GenerationResult,
    GenerationSummary, GroupAssignment, Participants, PersonRef, PreviewResult, Severity,
    ShiftSlot, SlotFinding,
};

use crate::config::GenerationRequest;
use crate::model::{AreaId, GenerationId, PersonId, ScheduleGeneration};
use crate::store::{Directory, ScheduleStore};

/// Generator : encapsule le magasin et la politique de génération
#[derive(Debug, Default)]
pub struct Generator<S> {
    store: S,
    opts: GenerationOptions,
}

impl<S> Generator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            opts: GenerationOptions::default(),
        }
    }

    pub fn with_options(store: S, opts: GenerationOptions) -> Self {
        Self { store, opts }
    }

    pub fn options(&self) -> GenerationOptions {
        self.opts
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: Directory> Generator<S> {
    /// Rapport complet (créneaux, constats, synthèse) ; n'écrit rien.
    pub fn preview(
        &self,
        area: &AreaId,
        request: &GenerationRequest,
    ) -> Result<PreviewResult, GenerationError> {
        preview::preview(&self.store, area, request, self.opts)
    }
}

impl<S: ScheduleStore> Generator<S> {
    pub fn create(
        &mut self,
        area: &AreaId,
        request: &GenerationRequest,
        actor: &PersonId,
    ) -> Result<GenerationResult, GenerationError> {
        commit::create(&mut self.store, area, request, actor, self.opts)
    }

    pub fn find_all(&self, area: &AreaId) -> Result<Vec<ScheduleGeneration>, GenerationError> {
        self.store.find_area(area)?;
        self.store.list_generations(area)
    }

    pub fn find_one(
        &self,
        area: &AreaId,
        id: &GenerationId,
    ) -> Result<GenerationDetails, GenerationError> {
        let generation = self.store.find_generation(area, id)?;
        let schedules = self.store.schedules_of_generation(id)?;
        Ok(GenerationDetails {
            generation,
            schedules,
        })
    }

    /// Supprime la génération et ses créneaux ; les créneaux manuels ne sont jamais touchés.
    pub fn remove(&mut self, area: &AreaId, id: &GenerationId) -> Result<usize, GenerationError> {
        let removed = self.store.delete_generation(area, id)?;
        tracing::info!(area = %area, generation = %id, schedules = removed, "generation removed");
        Ok(removed)
    }
}
