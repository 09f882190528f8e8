//! Shared test fixtures: a sample course and an in-memory backend.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::CourseBackend;
use crate::error::{BackendErrorKind, DripError, Result};
use crate::inventory::Inventory;
use crate::model::{LessonRef, LessonType, Section};
use crate::wire::DripEdge;

/// Two sections, five lessons:
///
/// - `1` Getting Started: 101 Welcome, 102 Installing Rust, 103 Quiz: Setup
/// - `2` Core Concepts: 201 Ownership, 202 Borrowing
pub fn sample_inventory() -> Inventory {
    let mut getting_started = Section::new("1", "Getting Started");
    getting_started.lessons = vec![
        LessonRef::new("101", "Welcome", LessonType::Text),
        LessonRef::new("102", "Installing Rust", LessonType::Video),
        LessonRef::new("103", "Quiz: Setup", LessonType::Test),
    ];

    let mut core_concepts = Section::new("2", "Core Concepts");
    core_concepts.lessons = vec![
        LessonRef::new("201", "Ownership", LessonType::Text),
        LessonRef::new("202", "Borrowing", LessonType::Audio),
    ];

    Inventory::new(vec![getting_started, core_concepts])
}

#[derive(Debug, Default)]
struct MemoryState {
    sections: Vec<Section>,
    lessons: HashMap<String, Vec<LessonRef>>,
    drips: Vec<DripEdge>,
    fail_sections: Option<BackendErrorKind>,
    fail_lessons: HashSet<String>,
    fail_drips: Option<BackendErrorKind>,
    fail_updates: Option<BackendErrorKind>,
    update_delay: Option<Duration>,
    update_calls: usize,
}

/// In-memory [`CourseBackend`] with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Serves the sections and lessons of `inventory` for any course.
    pub fn with_inventory(inventory: &Inventory) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            for section in &inventory.sections {
                state
                    .lessons
                    .insert(section.id.clone(), section.lessons.clone());
                state.sections.push(Section::new(&section.id, &section.title));
            }
        }
        backend
    }

    pub fn set_drips(&self, edges: Vec<DripEdge>) {
        self.state.lock().unwrap().drips = edges;
    }

    pub fn drips(&self) -> Vec<DripEdge> {
        self.state.lock().unwrap().drips.clone()
    }

    pub fn fail_sections(&self, kind: BackendErrorKind) {
        self.state.lock().unwrap().fail_sections = Some(kind);
    }

    pub fn fail_lessons_for(&self, section_id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_lessons
            .insert(section_id.to_string());
    }

    pub fn fail_drips(&self, kind: BackendErrorKind) {
        self.state.lock().unwrap().fail_drips = Some(kind);
    }

    pub fn fail_updates(&self, kind: BackendErrorKind) {
        self.state.lock().unwrap().fail_updates = Some(kind);
    }

    pub fn delay_updates(&self, delay: Duration) {
        self.state.lock().unwrap().update_delay = Some(delay);
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }
}

fn failure(kind: BackendErrorKind, what: &str) -> DripError {
    DripError::backend(kind, format!("injected failure: {what}"))
}

#[async_trait]
impl CourseBackend for MemoryBackend {
    async fn fetch_sections(&self, _course_id: &str) -> Result<Vec<Section>> {
        let state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_sections {
            return Err(failure(kind, "sections"));
        }
        Ok(state.sections.clone())
    }

    async fn fetch_lessons(&self, section_id: &str) -> Result<Vec<LessonRef>> {
        let state = self.state.lock().unwrap();
        if state.fail_lessons.contains(section_id) {
            return Err(failure(BackendErrorKind::Status(500), "lessons"));
        }
        Ok(state.lessons.get(section_id).cloned().unwrap_or_default())
    }

    async fn fetch_drips(&self, _course_id: &str) -> Result<Vec<DripEdge>> {
        let state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_drips {
            return Err(failure(kind, "drips"));
        }
        Ok(state.drips.clone())
    }

    async fn update_drips(&self, _course_id: &str, edges: &[DripEdge]) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.update_calls += 1;
            state.update_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_updates {
            return Err(failure(kind, "update"));
        }
        state.drips = edges.to_vec();
        Ok(())
    }
}
