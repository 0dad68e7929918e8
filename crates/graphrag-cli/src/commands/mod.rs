//! Subcommand implementations. Each returns the text to print.

pub mod delete;
pub mod export;
pub mod ingest;
pub mod prompt;
pub mod query;
pub mod schema;
pub mod stats;

use crate::cli::{Commands, OutputFormat};
use crate::context::Context;
use anyhow::Result;

/// Run one subcommand against an open context
pub async fn dispatch(ctx: &Context, command: Commands, format: OutputFormat) -> Result<String> {
    match command {
        Commands::Ingest {
            kb,
            files,
            text,
            graph,
            no_source,
            no_embedding,
        } => {
            let namespace = Context::namespace(&kb.namespace)?;
            let options = ingest::IngestOptions {
                include_source: !no_source && ctx.config.extraction.include_source,
                with_embedding: !no_embedding && ctx.config.extraction.with_embedding,
            };
            match graph {
                Some(path) => ingest::import_graph(ctx, &namespace, &path, options, format).await,
                None => {
                    let documents = ingest::load_documents(&files, &text)?;
                    ingest::execute(ctx, &namespace, &documents, options, format).await
                }
            }
        }

        Commands::Query {
            kb,
            question,
            answer,
            diagnostics,
            retrieval,
        } => {
            let namespace = Context::namespace(&kb.namespace)?;
            let options = query::options(ctx, &retrieval);
            if answer {
                query::ask(ctx, &namespace, &question, &options, format).await
            } else {
                query::execute(ctx, &namespace, &question, &options, diagnostics, format).await
            }
        }

        Commands::Ask {
            kb,
            question,
            retrieval,
        } => {
            let namespace = Context::namespace(&kb.namespace)?;
            let options = query::options(ctx, &retrieval);
            query::ask(ctx, &namespace, &question, &options, format).await
        }

        Commands::Stats { kb } => {
            stats::execute(ctx, &Context::namespace(&kb.namespace)?, format).await
        }

        Commands::Schema { kb } => {
            schema::execute(ctx, &Context::namespace(&kb.namespace)?, format).await
        }

        Commands::Export { kb, output } => {
            export::execute(ctx, &Context::namespace(&kb.namespace)?, output.as_deref()).await
        }

        Commands::Delete { kb, document } => {
            let namespace = Context::namespace(&kb.namespace)?;
            delete::execute(ctx, &namespace, document.as_deref(), format).await
        }

        Commands::Prompt { kb, question } => {
            prompt::execute(ctx, &Context::namespace(&kb.namespace)?, question.as_deref()).await
        }
    }
}
