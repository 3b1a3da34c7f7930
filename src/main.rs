use anyhow::Result;
use gog::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
