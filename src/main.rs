use std::path::Path;
use std::time::Duration;

use crate::client::ApiClient;
use crate::report::ResponseLog;

pub mod client;
pub mod report;
pub mod runner;

const SERVER_URL: &str = "http://localhost:8081";
const OUTPUT_PATH: &str = "endpoint_responses.txt";
const SERVER_WAIT_ATTEMPTS: u32 = 30;
const SERVER_WAIT_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = smoke_test().await {
        eprintln!("Smoke test failed: {:?}", e);
    }
    Ok(())
}

async fn smoke_test() -> anyhow::Result<()> {
    let client = ApiClient::new(SERVER_URL)?;
    if !client
        .wait_for_server(SERVER_WAIT_ATTEMPTS, SERVER_WAIT_DELAY)
        .await
    {
        return Ok(());
    }

    let mut log = ResponseLog::create(Path::new(OUTPUT_PATH))?;
    runner::run(&client, &mut log).await
}
