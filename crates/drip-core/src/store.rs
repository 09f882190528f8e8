//! In-memory store of drip chains.
//!
//! All mutations are synchronous and local; nothing reaches the backend
//! until an explicit save. Operations that cannot apply (bad indices,
//! duplicates) leave the store untouched and report why through
//! [`EditOutcome::Ignored`]. Naming a chain or section that does not exist
//! is an error.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MembershipPolicy;
use crate::error::{DripError, Result};
use crate::inventory::Inventory;
use crate::model::{DripChain, LessonRef};

/// Prefix of synthesized chain ids.
pub const CHAIN_ID_PREFIX: &str = "drip-";

// ============================================================================
// EditOutcome
// ============================================================================

/// Why an edit left the store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The drop had no destination (cancelled, or outside any container).
    NoDestination,
    /// The destination is a drop-disabled inventory section.
    DropDisabled,
    /// Source and target positions are the same.
    SameIndex,
    /// An index points outside its container.
    IndexOutOfBounds,
    /// The destination chain already holds this lesson.
    Duplicate,
    /// The chain does not hold the lesson.
    NotInChain,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDestination => write!(f, "no_destination"),
            Self::DropDisabled => write!(f, "drop_disabled"),
            Self::SameIndex => write!(f, "same_index"),
            Self::IndexOutOfBounds => write!(f, "index_out_of_bounds"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::NotInChain => write!(f, "not_in_chain"),
        }
    }
}

/// Result of an edit that named valid chains and sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EditOutcome {
    /// The store changed.
    Applied,
    /// The store is unchanged.
    Ignored(IgnoreReason),
}

impl EditOutcome {
    /// Returns `true` if the edit changed the store.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

// ============================================================================
// DripChainStore
// ============================================================================

/// Ordered list of drip chains being edited for one course.
#[derive(Debug, Clone)]
pub struct DripChainStore {
    chains: Vec<DripChain>,
    policy: MembershipPolicy,
    /// lesson id -> chain id; maintained only under `MembershipPolicy::Exclusive`.
    membership: HashMap<String, String>,
    next_chain_number: u64,
}

impl Default for DripChainStore {
    fn default() -> Self {
        Self::new(MembershipPolicy::default())
    }
}

impl DripChainStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(policy: MembershipPolicy) -> Self {
        Self {
            chains: Vec::new(),
            policy,
            membership: HashMap::new(),
            next_chain_number: 1,
        }
    }

    /// The membership policy this store enforces.
    #[must_use]
    pub const fn policy(&self) -> MembershipPolicy {
        self.policy
    }

    /// All chains in display order.
    #[must_use]
    pub fn chains(&self) -> &[DripChain] {
        &self.chains
    }

    /// Returns the chain with the given id.
    #[must_use]
    pub fn chain(&self, chain_id: &str) -> Option<&DripChain> {
        self.chains.iter().find(|c| c.id == chain_id)
    }

    /// Number of chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if there are no chains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Total number of lesson references across all chains.
    #[must_use]
    pub fn lesson_ref_count(&self) -> usize {
        self.chains.iter().map(DripChain::len).sum()
    }

    /// Returns the chain currently holding `lesson_id` under the exclusive
    /// policy.
    #[must_use]
    pub fn chain_of(&self, lesson_id: &str) -> Option<&str> {
        self.membership.get(lesson_id).map(String::as_str)
    }

    /// Lesson ids that appear in more than one chain, in first-seen order.
    #[must_use]
    pub fn shared_lessons(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for chain in &self.chains {
            let mut seen_here = HashSet::new();
            for lesson in &chain.lessons {
                if !seen_here.insert(lesson.id.as_str()) {
                    continue;
                }
                let count = counts.entry(lesson.id.as_str()).or_insert(0);
                if *count == 0 {
                    order.push(lesson.id.as_str());
                }
                *count += 1;
            }
        }
        order
            .into_iter()
            .filter(|id| counts.get(id).copied().unwrap_or(0) > 1)
            .map(str::to_string)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Chain lifecycle
    // ------------------------------------------------------------------------

    /// Appends a new empty chain with a synthesized id.
    pub fn add_chain(&mut self) -> &DripChain {
        let id = self.next_chain_id();
        debug!(chain_id = %id, "Chain added");
        let index = self.chains.len();
        self.chains.push(DripChain::new(id));
        &self.chains[index]
    }

    /// Removes a chain and every lesson reference it holds.
    ///
    /// # Errors
    ///
    /// Returns `DripError::ChainNotFound` if no such chain exists.
    pub fn remove_chain(&mut self, chain_id: &str) -> Result<DripChain> {
        let index = self.index_of(chain_id)?;
        let removed = self.chains.remove(index);
        if self.policy == MembershipPolicy::Exclusive {
            for lesson in &removed.lessons {
                self.membership.remove(&lesson.id);
            }
        }
        debug!(chain_id, lessons = removed.len(), "Chain removed");
        Ok(removed)
    }

    /// Replaces every chain with the given lesson lists.
    ///
    /// Chain ids are synthesized afresh. Repeated lessons within one list are
    /// dropped; under the exclusive policy a lesson already placed in an
    /// earlier chain is dropped too.
    pub fn replace_chains(&mut self, lesson_lists: Vec<Vec<LessonRef>>) {
        self.chains.clear();
        self.membership.clear();

        for lessons in lesson_lists {
            let id = self.next_chain_id();
            let mut chain = DripChain::new(id);
            for lesson in lessons {
                if chain.contains(&lesson.id) {
                    warn!(chain_id = %chain.id, lesson_id = %lesson.id, "Dropping repeated lesson in chain");
                    continue;
                }
                if self.policy == MembershipPolicy::Exclusive {
                    if let Some(owner) = self.membership.get(&lesson.id) {
                        warn!(
                            chain_id = %chain.id,
                            lesson_id = %lesson.id,
                            owner = %owner,
                            "Dropping lesson already placed in another chain"
                        );
                        continue;
                    }
                    self.membership.insert(lesson.id.clone(), chain.id.clone());
                }
                chain.lessons.push(lesson);
            }
            self.chains.push(chain);
        }
        debug!(chains = self.chains.len(), "Chains replaced");
    }

    // ------------------------------------------------------------------------
    // Lesson edits
    // ------------------------------------------------------------------------

    /// Removes the first entry with `lesson_id` from a chain.
    ///
    /// # Errors
    ///
    /// Returns `DripError::ChainNotFound` if no such chain exists.
    pub fn remove_lesson_from_chain(
        &mut self,
        chain_id: &str,
        lesson_id: &str,
    ) -> Result<EditOutcome> {
        let index = self.index_of(chain_id)?;
        let chain = &mut self.chains[index];
        let Some(position) = chain.position(lesson_id) else {
            return Ok(ignored(IgnoreReason::NotInChain));
        };
        chain.lessons.remove(position);
        if self.policy == MembershipPolicy::Exclusive {
            self.membership.remove(lesson_id);
        }
        debug!(chain_id, lesson_id, "Lesson removed from chain");
        Ok(EditOutcome::Applied)
    }

    /// Moves the lesson at `from` to position `to` within one chain.
    ///
    /// No-op when `from == to` or either index is out of bounds.
    ///
    /// # Errors
    ///
    /// Returns `DripError::ChainNotFound` if no such chain exists.
    pub fn reorder_within_chain(
        &mut self,
        chain_id: &str,
        from: usize,
        to: usize,
    ) -> Result<EditOutcome> {
        let index = self.index_of(chain_id)?;
        let chain = &mut self.chains[index];
        if from >= chain.len() || to >= chain.len() {
            return Ok(ignored(IgnoreReason::IndexOutOfBounds));
        }
        if from == to {
            return Ok(ignored(IgnoreReason::SameIndex));
        }
        let lesson = chain.lessons.remove(from);
        chain.lessons.insert(to, lesson);
        debug!(chain_id, from, to, "Lesson reordered");
        Ok(EditOutcome::Applied)
    }

    /// Moves the lesson at `from` in `source_id` to position `to` in `dest_id`.
    ///
    /// `to` may equal the destination length (append). The move is ignored
    /// when the destination already holds the lesson.
    ///
    /// # Errors
    ///
    /// Returns `DripError::ChainNotFound` if either chain does not exist.
    pub fn move_across_chains(
        &mut self,
        source_id: &str,
        dest_id: &str,
        from: usize,
        to: usize,
    ) -> Result<EditOutcome> {
        let source = self.index_of(source_id)?;
        let dest = self.index_of(dest_id)?;
        if source == dest {
            return self.reorder_within_chain(source_id, from, to);
        }

        let Some(lesson) = self.chains[source].lessons.get(from) else {
            return Ok(ignored(IgnoreReason::IndexOutOfBounds));
        };
        if to > self.chains[dest].len() {
            return Ok(ignored(IgnoreReason::IndexOutOfBounds));
        }
        if self.chains[dest].contains(&lesson.id) {
            return Ok(ignored(IgnoreReason::Duplicate));
        }

        let lesson = self.chains[source].lessons.remove(from);
        if self.policy == MembershipPolicy::Exclusive {
            self.membership
                .insert(lesson.id.clone(), dest_id.to_string());
        }
        debug!(source_id, dest_id, from, to, lesson_id = %lesson.id, "Lesson moved across chains");
        self.chains[dest].lessons.insert(to, lesson);
        Ok(EditOutcome::Applied)
    }

    /// Copies the inventory lesson at `lesson_index` of `section_id` into
    /// `dest_id` at position `to`.
    ///
    /// Ignored when the destination already holds the lesson. Under the
    /// exclusive policy the lesson is first removed from any other chain.
    ///
    /// # Errors
    ///
    /// Returns `DripError::SectionNotFound` or `DripError::ChainNotFound` if
    /// the section or chain does not exist.
    pub fn insert_from_inventory(
        &mut self,
        inventory: &Inventory,
        section_id: &str,
        lesson_index: usize,
        dest_id: &str,
        to: usize,
    ) -> Result<EditOutcome> {
        let section = inventory
            .section(section_id)
            .ok_or_else(|| DripError::section_not_found(section_id))?;
        let dest = self.index_of(dest_id)?;

        let Some(lesson) = section.lessons.get(lesson_index) else {
            return Ok(ignored(IgnoreReason::IndexOutOfBounds));
        };
        if to > self.chains[dest].len() {
            return Ok(ignored(IgnoreReason::IndexOutOfBounds));
        }
        if self.chains[dest].contains(&lesson.id) {
            return Ok(ignored(IgnoreReason::Duplicate));
        }

        if self.policy == MembershipPolicy::Exclusive {
            if let Some(owner) = self.membership.get(&lesson.id).cloned() {
                if let Some(chain) = self.chains.iter_mut().find(|c| c.id == owner) {
                    chain.lessons.retain(|l| l.id != lesson.id);
                    debug!(lesson_id = %lesson.id, from_chain = %owner, "Lesson released from previous chain");
                }
            }
            self.membership
                .insert(lesson.id.clone(), dest_id.to_string());
        }

        debug!(section_id, dest_id, to, lesson_id = %lesson.id, "Lesson inserted from inventory");
        self.chains[dest].lessons.insert(to, lesson.clone());
        Ok(EditOutcome::Applied)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn index_of(&self, chain_id: &str) -> Result<usize> {
        self.chains
            .iter()
            .position(|c| c.id == chain_id)
            .ok_or_else(|| DripError::chain_not_found(chain_id))
    }

    fn next_chain_id(&mut self) -> String {
        let id = format!("{CHAIN_ID_PREFIX}{}", self.next_chain_number);
        self.next_chain_number += 1;
        id
    }
}

fn ignored(reason: IgnoreReason) -> EditOutcome {
    debug!(%reason, "Edit ignored");
    EditOutcome::Ignored(reason)
}

// ============================================================================
// Tests
// ============================================================================
