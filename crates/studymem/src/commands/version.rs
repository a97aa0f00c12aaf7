pub fn run() -> anyhow::Result<()> {
    println!("studymem {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
