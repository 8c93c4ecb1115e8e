fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .bytes(["."])
        .compile_protos(&["proto/shardkv.proto"], &["proto"])?;
    println!("cargo:rerun-if-changed=proto/shardkv.proto");
    Ok(())
}
