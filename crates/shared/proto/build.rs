fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile ledger service proto
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/ledger.proto"], &["proto/"])?;

    // Compile course service proto
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/course.proto"], &["proto/"])?;

    Ok(())
}
