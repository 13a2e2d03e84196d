use anyhow::Result;

mod async_hid_impl;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::execute().await
}
