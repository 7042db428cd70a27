use anyhow::Context;
use helios::domain::config::ApiConfig;
use helios::kernel::config::load_config;
use helios_server::{Server, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: ApiConfig =
        load_config(Some("server")).context("Critical: Configuration is malformed")?;

    let _log = init_logger(env!("CARGO_PKG_NAME"), &cfg.log)?;

    Server::builder().config(cfg).build()?.run().await
}
