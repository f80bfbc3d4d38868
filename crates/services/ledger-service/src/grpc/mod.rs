//! gRPC layer.

mod convert;
mod ledger_grpc;

pub use ledger_grpc::LedgerGrpcService;
