//! gRPC layer for the course service.

mod course_grpc;

pub use course_grpc::CourseGrpcService;
