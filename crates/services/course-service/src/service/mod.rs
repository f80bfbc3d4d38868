//! Service layer - course business logic.

mod course_service;

pub use course_service::{CourseManager, CourseService};
