//! SeaORM entities for the course schema.

pub mod course;
