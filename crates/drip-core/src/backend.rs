//! The course backend port.
//!
//! The section, lesson, and drip services live outside this crate. Anything
//! that can answer these four calls can feed the editor; `drip-http`
//! provides the REST implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{LessonRef, Section};
use crate::wire::DripEdge;

/// Calls the editor makes against the course backend.
#[async_trait]
pub trait CourseBackend: Send + Sync {
    /// Fetches the sections of a course, in course order.
    ///
    /// The returned sections need not carry lessons; the inventory fetches
    /// those separately.
    async fn fetch_sections(&self, course_id: &str) -> Result<Vec<Section>>;

    /// Fetches the lessons of a section, in course order.
    async fn fetch_lessons(&self, section_id: &str) -> Result<Vec<LessonRef>>;

    /// Fetches the saved prerequisite edges of a course.
    async fn fetch_drips(&self, course_id: &str) -> Result<Vec<DripEdge>>;

    /// Replaces the full prerequisite graph of a course.
    async fn update_drips(&self, course_id: &str, edges: &[DripEdge]) -> Result<()>;
}
