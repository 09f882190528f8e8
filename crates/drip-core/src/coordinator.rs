//! Drag-and-drop dispatch.
//!
//! A drag-and-drop UI reports each drop as a source and an optional
//! destination, each a container id plus an index. [`dispatch`] turns that
//! into one of two calls on a [`ReorderTarget`]: a reorder within a chain or
//! a transfer between containers. Any UI that can express those two calls,
//! including keyboard-driven reordering, can drive the same store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::ContainerId;
use crate::store::{EditOutcome, IgnoreReason};

/// One end of a drag: a container and a position in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragLocation {
    /// Container the position refers to.
    pub droppable_id: ContainerId,
    /// Position within the container.
    pub index: usize,
}

impl DragLocation {
    /// Creates a location from a raw container id.
    #[must_use]
    pub fn new(droppable_id: &str, index: usize) -> Self {
        Self {
            droppable_id: ContainerId::parse(droppable_id),
            index,
        }
    }
}

/// A completed drag as reported by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragResult {
    /// Id of the dragged item (`lesson-<id>`), informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable_id: Option<String>,
    /// Where the item was picked up.
    pub source: DragLocation,
    /// Where it was dropped; `None` when the drop was cancelled.
    #[serde(default)]
    pub destination: Option<DragLocation>,
}

impl DragResult {
    /// Creates a drop from `source` onto `destination`.
    #[must_use]
    pub const fn new(source: DragLocation, destination: Option<DragLocation>) -> Self {
        Self {
            draggable_id: None,
            source,
            destination,
        }
    }
}

/// Receiver of interpreted drag operations.
pub trait ReorderTarget {
    /// Moves the item at `from` to `to` inside one container.
    fn on_reorder(&mut self, container: &ContainerId, from: usize, to: usize)
        -> Result<EditOutcome>;

    /// Moves or copies the item at `from` in `from_container` to `to` in
    /// `to_container`.
    fn on_transfer(
        &mut self,
        from_container: &ContainerId,
        to_container: &ContainerId,
        from: usize,
        to: usize,
    ) -> Result<EditOutcome>;
}

/// Interprets a drop and applies it to `target`.
///
/// Rules, in order:
/// 1. no destination: ignored;
/// 2. destination is an inventory section: ignored, sections are drop-disabled;
/// 3. same chain on both ends: reorder;
/// 4. otherwise: transfer (a copy when the source is a section, a move
///    between chains otherwise).
///
/// # Errors
///
/// Propagates errors from the target, such as unknown chains.
pub fn dispatch<T: ReorderTarget + ?Sized>(target: &mut T, drag: &DragResult) -> Result<EditOutcome> {
    let Some(destination) = &drag.destination else {
        debug!(source = %drag.source.droppable_id, "Drop without destination");
        return Ok(EditOutcome::Ignored(IgnoreReason::NoDestination));
    };

    let source = &drag.source;
    if destination.droppable_id.is_section() {
        debug!(destination = %destination.droppable_id, "Drop onto section ignored");
        return Ok(EditOutcome::Ignored(IgnoreReason::DropDisabled));
    }

    if source.droppable_id == destination.droppable_id {
        return target.on_reorder(&source.droppable_id, source.index, destination.index);
    }

    target.on_transfer(
        &source.droppable_id,
        &destination.droppable_id,
        source.index,
        destination.index,
    )
}
