use crate::context::Context;
use anyhow::Result;
use graphrag_core::Namespace;

pub async fn execute(ctx: &Context, namespace: &Namespace, question: Option<&str>) -> Result<String> {
    let prompt = ctx.service.build_query_prompt(namespace).await;
    Ok(match question {
        Some(question) => prompt.replace("{question}", question),
        None => prompt,
    })
}
