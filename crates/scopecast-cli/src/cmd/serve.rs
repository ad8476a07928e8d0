use crate::context::Context;
use anyhow::Context as _;

pub fn run(ctx: &Context, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(ctx.config.server.port);
    for w in ctx.config.validate() {
        tracing::warn!("config: {}", w.message);
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    rt.block_on(scopecast_server::serve(ctx.config.clone(), port))
}
