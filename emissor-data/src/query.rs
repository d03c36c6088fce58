//! Read-only lookups over the open scenario

use crate::error::{DataError, DataResult};
use crate::ingest::EmissorDataStore;

impl EmissorDataStore {
    /// Id of the open scenario, if any
    pub fn current_scenario_id(&self) -> Option<String> {
        self.session().current_id().map(str::to_string)
    }

    /// Scenario of a signal, mention or nested annotation container
    ///
    /// Fails with [`DataError::NotFound`] for ids not seen in the open
    /// scenario; callers decide whether to fall back to the current one.
    pub fn scenario_for_element(&self, element_id: &str) -> DataResult<String> {
        let session = self.session();
        session
            .resolve_owner(element_id)
            .and_then(|owner| session.signal(owner))
            .map(|signal| signal.scenario_id().to_string())
            .ok_or_else(|| DataError::NotFound(element_id.to_string()))
    }
}
