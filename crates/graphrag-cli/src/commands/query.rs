use crate::cli::{OutputFormat, RetrievalArgs};
use crate::context::Context;
use crate::output;
use anyhow::Result;
use graphrag_core::{HybridOptions, HybridRetrieval, Namespace};
use std::time::Duration;

/// Configured defaults with per-call flags applied
pub fn options(ctx: &Context, args: &RetrievalArgs) -> HybridOptions {
    let mut options = ctx.service.defaults().clone();
    if let Some(hop_depth) = args.hop_depth {
        options = options.with_hop_depth(hop_depth);
    }
    if let Some(max_triples) = args.max_triples {
        options = options.with_max_triples(max_triples);
    }
    if let Some(threshold) = args.threshold {
        options = options.with_score_threshold(threshold.clamp(0.0, 1.0));
    }
    if let Some(secs) = args.timeout_secs {
        options = options.with_timeout(Duration::from_secs(secs.max(1)));
    }
    options
}

/// Triples for a question. With `diagnostics`, a failure of both paths is
/// reported as an error instead of an empty result.
pub async fn execute(
    ctx: &Context,
    namespace: &Namespace,
    question: &str,
    options: &HybridOptions,
    diagnostics: bool,
    format: OutputFormat,
) -> Result<String> {
    let retrieval = if diagnostics {
        ctx.service
            .try_retrieve_hybrid(namespace, question, Some(options))
            .await?
    } else {
        HybridRetrieval {
            triples: ctx
                .service
                .retrieve_hybrid(namespace, question, Some(options))
                .await,
            ..Default::default()
        }
    };
    output::format_retrieval(&retrieval, format, diagnostics)
}

pub async fn ask(
    ctx: &Context,
    namespace: &Namespace,
    question: &str,
    options: &HybridOptions,
    format: OutputFormat,
) -> Result<String> {
    let answer = ctx
        .service
        .retrieve_with_answer_hybrid(namespace, question, Some(options))
        .await;
    output::format_answer(&answer, format)
}
