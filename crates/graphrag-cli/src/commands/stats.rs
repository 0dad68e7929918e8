use crate::cli::OutputFormat;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use graphrag_core::Namespace;

pub async fn execute(ctx: &Context, namespace: &Namespace, format: OutputFormat) -> Result<String> {
    let stats = ctx.service.statistics(namespace).await;
    output::format_stats(&stats, format)
}
