//! Signature stamp CLI tool
//!
//! Command-line front end over the sigstamp library: one-shot, interactive
//! loop, or HTTP form server.

#[cfg(feature = "cli")]
use sigstamp::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
