//! gRPC protocol buffer definitions.
//!
//! This crate contains the generated gRPC service definitions for:
//! - LedgerService: accounting documents, journal, bank feed, reports
//! - CourseService: course catalogue and publishing lifecycle

/// Ledger service definitions.
pub mod ledger {
    tonic::include_proto!("ledger");
}

/// Course service definitions.
pub mod course {
    tonic::include_proto!("course");
}

// Re-export commonly used items
pub use course::course_service_client::CourseServiceClient;
pub use course::course_service_server::{CourseService, CourseServiceServer};
pub use ledger::ledger_service_client::LedgerServiceClient;
pub use ledger::ledger_service_server::{LedgerService, LedgerServiceServer};
