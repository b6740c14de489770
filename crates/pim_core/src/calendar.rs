use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::instrument;

use crate::{
    error::{CalendarError, Result},
    incidence::Incidence,
};

/// The store of live incidences that edit history replays against.
pub trait Calendar {
    fn add_incidence(&self, incidence: Incidence) -> Result<()>;
    fn delete_incidence(&self, incidence: &Incidence) -> Result<()>;
    fn incidence_by_uid(&self, uid: &str) -> Option<Incidence>;
}

pub struct MemoryCalendar {
    incidences: RwLock<HashMap<String, Incidence>>,
}

pub struct MemoryCalendarBuilder {
    incidences: Vec<Incidence>,
}

impl MemoryCalendarBuilder {
    pub fn new() -> Self {
        Self {
            incidences: Vec::new(),
        }
    }

    pub fn add_incidence(mut self, incidence: impl Into<Incidence>) -> Self {
        self.incidences.push(incidence.into());
        self
    }

    pub fn add_incidences(mut self, incidences: impl IntoIterator<Item = Incidence>) -> Self {
        self.incidences.extend(incidences);
        self
    }

    pub fn build(self) -> Result<MemoryCalendar> {
        let calendar = MemoryCalendar {
            incidences: RwLock::new(HashMap::with_capacity(self.incidences.len())),
        };
        for incidence in self.incidences {
            calendar.add_incidence(incidence)?;
        }
        Ok(calendar)
    }
}

impl Default for MemoryCalendarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalendar {
    pub fn builder() -> MemoryCalendarBuilder {
        MemoryCalendarBuilder::new()
    }

    pub fn new() -> Self {
        Self {
            incidences: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the stored incidence carrying the same uid.
    #[instrument(skip(self, incidence), fields(uid = %incidence.uid()))]
    pub fn modify_incidence(&self, incidence: Incidence) -> Result<()> {
        let mut incidences = self.incidences.write();
        let slot = incidences
            .get_mut(incidence.uid())
            .ok_or_else(|| CalendarError::NotFound {
                uid: incidence.uid().to_string(),
            })?;
        *slot = incidence;
        Ok(())
    }

    pub fn incidences(&self) -> Vec<Incidence> {
        let incidences = self.incidences.read();
        let mut entries: Vec<Incidence> = incidences.values().cloned().collect();
        entries.sort_by(|a, b| a.uid().cmp(b.uid()));
        entries
    }

    pub fn len(&self) -> usize {
        self.incidences.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidences.read().is_empty()
    }
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl Calendar for MemoryCalendar {
    #[instrument(skip(self, incidence), fields(uid = %incidence.uid()))]
    fn add_incidence(&self, incidence: Incidence) -> Result<()> {
        let mut incidences = self.incidences.write();
        if incidences.contains_key(incidence.uid()) {
            return Err(CalendarError::DuplicateUid {
                uid: incidence.uid().to_string(),
            });
        }
        incidences.insert(incidence.uid().to_string(), incidence);
        Ok(())
    }

    #[instrument(skip(self, incidence), fields(uid = %incidence.uid()))]
    fn delete_incidence(&self, incidence: &Incidence) -> Result<()> {
        self.incidences
            .write()
            .remove(incidence.uid())
            .map(|_| ())
            .ok_or_else(|| CalendarError::NotFound {
                uid: incidence.uid().to_string(),
            })
    }

    fn incidence_by_uid(&self, uid: &str) -> Option<Incidence> {
        self.incidences.read().get(uid).cloned()
    }
}
