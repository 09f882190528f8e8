//! Read-only inventory of a course's sections and lessons.
//!
//! The inventory is the drag origin of the editor. It is loaded once per
//! course and never mutated afterwards.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::CourseBackend;
use crate::error::Result;
use crate::model::{LessonRef, Section};

/// Sections and lessons of one course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Sections in course order.
    pub sections: Vec<Section>,
}

impl Inventory {
    /// Creates an inventory from already-assembled sections.
    #[must_use]
    pub const fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Fetches all sections of a course, then the lessons of each section.
    ///
    /// # Errors
    ///
    /// Returns the first backend error encountered.
    pub async fn fetch(backend: &dyn CourseBackend, course_id: &str) -> Result<Self> {
        let mut sections = backend.fetch_sections(course_id).await?;
        for section in &mut sections {
            section.lessons = backend.fetch_lessons(&section.id).await?;
            debug!(
                section_id = %section.id,
                lessons = section.lessons.len(),
                "Fetched section lessons"
            );
        }
        let inventory = Self::new(sections);
        info!(
            course_id,
            sections = inventory.sections.len(),
            lessons = inventory.lesson_count(),
            "Inventory loaded"
        );
        Ok(inventory)
    }

    /// Fetches the inventory, degrading instead of failing.
    ///
    /// A failed section fetch yields an empty inventory; a failed lesson
    /// fetch leaves that section without lessons. Failures are logged and
    /// not retried.
    pub async fn load_or_empty(backend: &dyn CourseBackend, course_id: &str) -> Self {
        let mut sections = match backend.fetch_sections(course_id).await {
            Ok(sections) => sections,
            Err(e) => {
                warn!(course_id, error = %e, "Failed to fetch sections; inventory is empty");
                return Self::default();
            }
        };

        for section in &mut sections {
            match backend.fetch_lessons(&section.id).await {
                Ok(lessons) => section.lessons = lessons,
                Err(e) => {
                    warn!(
                        section_id = %section.id,
                        error = %e,
                        "Failed to fetch lessons; section left empty"
                    );
                    section.lessons.clear();
                }
            }
        }

        let inventory = Self::new(sections);
        info!(
            course_id,
            sections = inventory.sections.len(),
            lessons = inventory.lesson_count(),
            "Inventory loaded"
        );
        inventory
    }

    /// Returns the section with the given id.
    #[must_use]
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Returns the lesson at `index` within a section.
    #[must_use]
    pub fn lesson_at(&self, section_id: &str, index: usize) -> Option<&LessonRef> {
        self.section(section_id)
            .and_then(|section| section.lessons.get(index))
    }

    /// Finds a lesson anywhere in the course by id.
    #[must_use]
    pub fn find_lesson(&self, lesson_id: &str) -> Option<&LessonRef> {
        self.lessons().find(|lesson| lesson.id == lesson_id)
    }

    /// Iterates over every lesson in course order.
    pub fn lessons(&self) -> impl Iterator<Item = &LessonRef> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }

    /// Total number of lessons across all sections.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    /// Returns `true` if the inventory has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
