//! A course's drip editing session: the inventory plus the chain store.

use crate::config::MembershipPolicy;
use crate::coordinator::{self, DragResult, ReorderTarget};
use crate::error::Result;
use crate::inventory::Inventory;
use crate::model::{ContainerId, DripChain};
use crate::store::{DripChainStore, EditOutcome, IgnoreReason};

/// Editing session for one course.
#[derive(Debug, Clone)]
pub struct DripEditor {
    inventory: Inventory,
    store: DripChainStore,
}

impl DripEditor {
    /// Creates an editor with no chains.
    #[must_use]
    pub fn new(inventory: Inventory, policy: MembershipPolicy) -> Self {
        Self {
            inventory,
            store: DripChainStore::new(policy),
        }
    }

    /// The read-only inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The chain store.
    #[must_use]
    pub const fn store(&self) -> &DripChainStore {
        &self.store
    }

    /// Mutable access to the chain store.
    pub fn store_mut(&mut self) -> &mut DripChainStore {
        &mut self.store
    }

    /// Current chains.
    #[must_use]
    pub fn chains(&self) -> &[DripChain] {
        self.store.chains()
    }

    /// Applies a drop reported by the UI.
    ///
    /// # Errors
    ///
    /// Returns an error if the drop names an unknown chain or section.
    pub fn apply_drag(&mut self, drag: &DragResult) -> Result<EditOutcome> {
        coordinator::dispatch(self, drag)
    }
}

impl ReorderTarget for DripEditor {
    fn on_reorder(
        &mut self,
        container: &ContainerId,
        from: usize,
        to: usize,
    ) -> Result<EditOutcome> {
        match container {
            ContainerId::Chain(chain_id) => self.store.reorder_within_chain(chain_id, from, to),
            ContainerId::Section(_) => Ok(EditOutcome::Ignored(IgnoreReason::DropDisabled)),
        }
    }

    fn on_transfer(
        &mut self,
        from_container: &ContainerId,
        to_container: &ContainerId,
        from: usize,
        to: usize,
    ) -> Result<EditOutcome> {
        let ContainerId::Chain(dest_id) = to_container else {
            return Ok(EditOutcome::Ignored(IgnoreReason::DropDisabled));
        };
        match from_container {
            ContainerId::Section(section_id) => {
                self.store
                    .insert_from_inventory(&self.inventory, section_id, from, dest_id, to)
            }
            ContainerId::Chain(source_id) => {
                self.store.move_across_chains(source_id, dest_id, from, to)
            }
        }
    }
}
