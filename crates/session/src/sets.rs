//! Set completion.

use std::sync::Arc;
use gymtrack_core::{Error, Result, SetId, WorkoutSet};
use gymtrack_storage::Storage;
use tracing::info;

/// Marks sets done and undone.
pub struct SetTracker<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> SetTracker<S> {
    /// Create a tracker over shared storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Toggle a set's completion and return the saved set.
    ///
    /// Completing stamps `completed_at`; calling again un-completes the set
    /// and clears the stamp.
    pub async fn complete_by_id(&self, set_id: SetId) -> Result<WorkoutSet> {
        let mut set = self
            .storage
            .load_set(set_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("set {}", set_id)))?;

        set.toggle_completed(chrono::Utc::now());
        self.storage.save_set(&set).await?;

        info!(
            "Set {} of exercise {} marked {}",
            set.id,
            set.exercise_id,
            if set.completed { "done" } else { "not done" }
        );
        Ok(set)
    }
}
