//! Drip Content Model
//!
//! Course inventory, drip chain store, drag-drop dispatch, backend
//! persistence, and the editor HTTP API.

pub mod api;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod inventory;
pub mod model;
pub mod persistence;
pub mod store;
pub mod wire;

#[cfg(test)]
mod testing;

pub use api::{
    create_router, AppState, ChainsResponse, EditResponse, ErrorResponse, SaveResponse,
    SettingsResponse,
};
pub use backend::CourseBackend;
pub use config::{Config, MembershipPolicy};
pub use coordinator::{dispatch, DragLocation, DragResult, ReorderTarget};
pub use editor::DripEditor;
pub use error::{BackendErrorKind, DripError, Result};
pub use inventory::Inventory;
pub use model::{
    ContainerId, DripChain, LessonRef, LessonType, Section, LESSON_DRAGGABLE_PREFIX,
    SECTION_CONTAINER_PREFIX,
};
pub use persistence::DripPersistence;
pub use store::{DripChainStore, EditOutcome, IgnoreReason, CHAIN_ID_PREFIX};
pub use wire::{
    chains_to_edges, edges_to_lesson_lists, parse_lesson_id, DripEdge, DripNodeType, NextDrip,
};
