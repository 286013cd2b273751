//! Messages service entry point.

use flock_server::Service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    flock_server::run(Service::Messages).await
}
