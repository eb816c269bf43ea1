use std::io::Result;

#[tokio::main]
async fn main() -> Result<()> {
    world_server::frameworks::server::run_with_config().await
}
