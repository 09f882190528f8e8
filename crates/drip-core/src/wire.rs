//! Backend wire form of drip chains.
//!
//! The backend stores one edge per chain: the first lesson is `prevId` and
//! the rest of the chain, in order, is `nextDrips`. Lesson ids are integers
//! on the wire. Edges carry no lesson metadata, so titles and types are
//! resolved from the inventory when converting back.

use serde::{Deserialize, Serialize};

use crate::error::{DripError, Result};
use crate::inventory::Inventory;
use crate::model::{DripChain, LessonRef, LessonType};

/// Kind of node an edge endpoint refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DripNodeType {
    /// A lesson.
    #[default]
    Lesson,
}

const fn default_required_completion() -> bool {
    true
}

/// One successor in a prerequisite edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDrip {
    /// Backend id of the successor lesson.
    pub next_id: i64,
    /// Node type of the successor.
    #[serde(default)]
    pub next_type: DripNodeType,
    /// Whether the predecessor must be completed (not merely started).
    #[serde(default = "default_required_completion")]
    pub required_completion: bool,
}

/// The backend's representation of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DripEdge {
    /// Backend id of the first lesson of the chain.
    pub prev_id: i64,
    /// Node type of the first lesson.
    #[serde(default)]
    pub prev_type: DripNodeType,
    /// Whether the first lesson must be completed.
    #[serde(default = "default_required_completion")]
    pub required_completion: bool,
    /// The rest of the chain, in unlock order.
    #[serde(default)]
    pub next_drips: Vec<NextDrip>,
}

impl DripEdge {
    /// Lesson ids of the whole chain this edge encodes, in order.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<i64> {
        std::iter::once(self.prev_id)
            .chain(self.next_drips.iter().map(|n| n.next_id))
            .collect()
    }
}

/// Parses a model lesson id into a backend id.
///
/// # Errors
///
/// Returns `DripError::InvalidLessonId` if the id is not an integer.
pub fn parse_lesson_id(id: &str) -> Result<i64> {
    id.trim()
        .parse()
        .map_err(|_| DripError::invalid_lesson_id(id))
}

/// Flattens chains into backend edges.
///
/// Empty chains are dropped. A one-lesson chain becomes an edge with no
/// successors.
///
/// # Errors
///
/// Returns `DripError::InvalidLessonId` for the first non-integer lesson id.
pub fn chains_to_edges(chains: &[DripChain]) -> Result<Vec<DripEdge>> {
    chains
        .iter()
        .filter_map(|chain| chain.lessons.split_first())
        .map(|(first, rest)| {
            let next_drips = rest
                .iter()
                .map(|lesson| {
                    Ok(NextDrip {
                        next_id: parse_lesson_id(&lesson.id)?,
                        next_type: DripNodeType::Lesson,
                        required_completion: true,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(DripEdge {
                prev_id: parse_lesson_id(&first.id)?,
                prev_type: DripNodeType::Lesson,
                required_completion: true,
                next_drips,
            })
        })
        .collect()
}

/// Expands backend edges into one lesson list per chain.
///
/// Lessons are looked up in the inventory by id; ids the inventory does not
/// know get a placeholder title (`"<prefix> <id>"`) and the text type.
#[must_use]
pub fn edges_to_lesson_lists(
    edges: &[DripEdge],
    inventory: &Inventory,
    placeholder_prefix: &str,
) -> Vec<Vec<LessonRef>> {
    edges
        .iter()
        .map(|edge| {
            edge.lesson_ids()
                .into_iter()
                .map(|id| resolve_lesson(id, inventory, placeholder_prefix))
                .collect()
        })
        .collect()
}

fn resolve_lesson(id: i64, inventory: &Inventory, placeholder_prefix: &str) -> LessonRef {
    let id = id.to_string();
    inventory.find_lesson(&id).cloned().unwrap_or_else(|| {
        let title = format!("{placeholder_prefix} {id}");
        LessonRef::new(id, title, LessonType::Text)
    })
}
