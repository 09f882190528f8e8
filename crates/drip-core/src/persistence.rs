//! Loads and saves drip chains through the course backend.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::backend::CourseBackend;
use crate::error::{DripError, Result};
use crate::inventory::Inventory;
use crate::model::{DripChain, LessonRef};
use crate::wire::{chains_to_edges, edges_to_lesson_lists};

/// Converts between chains and backend edges and talks to the backend.
///
/// Saves are serialized per adapter: a save started while another is in
/// flight fails with [`DripError::SaveInProgress`] instead of queueing.
pub struct DripPersistence {
    backend: Arc<dyn CourseBackend>,
    save_guard: Mutex<()>,
    placeholder_prefix: String,
}

impl std::fmt::Debug for DripPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DripPersistence")
            .field("placeholder_prefix", &self.placeholder_prefix)
            .finish_non_exhaustive()
    }
}

impl DripPersistence {
    /// Creates an adapter over `backend`.
    ///
    /// `placeholder_prefix` titles lessons the inventory does not know.
    pub fn new(backend: Arc<dyn CourseBackend>, placeholder_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            save_guard: Mutex::new(()),
            placeholder_prefix: placeholder_prefix.into(),
        }
    }

    /// Fetches the saved edges of a course as one lesson list per chain.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the fetch fails.
    pub async fn load(&self, course_id: &str, inventory: &Inventory) -> Result<Vec<Vec<LessonRef>>> {
        let edges = self.backend.fetch_drips(course_id).await?;
        let lists = edges_to_lesson_lists(&edges, inventory, &self.placeholder_prefix);
        info!(course_id, chains = lists.len(), "Drip chains loaded");
        Ok(lists)
    }

    /// Replaces the course's saved drips with `chains`.
    ///
    /// Returns the number of edges sent.
    ///
    /// # Errors
    ///
    /// - `DripError::SaveInProgress` if another save has not finished
    /// - `DripError::InvalidLessonId` if a lesson id is not numeric; nothing
    ///   is sent in that case
    /// - the backend error if the update fails
    pub async fn save(&self, course_id: &str, chains: &[DripChain]) -> Result<usize> {
        let Ok(_guard) = self.save_guard.try_lock() else {
            debug!(course_id, "Save rejected, another save is running");
            return Err(DripError::save_in_progress(course_id));
        };

        let edges = chains_to_edges(chains).map_err(|e| {
            error!(course_id, error = %e, "Failed to convert drip chains");
            e
        })?;

        match self.backend.update_drips(course_id, &edges).await {
            Ok(()) => {
                info!(course_id, edges = edges.len(), "Drip chains saved");
                Ok(edges.len())
            }
            Err(e) => {
                error!(course_id, error = %e, "Failed to save drip chains");
                Err(e)
            }
        }
    }
}
