use crate::cli::OutputFormat;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use graphrag_core::Namespace;

pub async fn execute(ctx: &Context, namespace: &Namespace, format: OutputFormat) -> Result<String> {
    let schema = ctx.service.schema(namespace).await;
    output::format_schema(&schema, format)
}
