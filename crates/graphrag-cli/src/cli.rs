use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages (default for verbose)
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and text
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "grag")]
#[command(about = "grag - knowledge-graph question answering with hybrid retrieval")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace).
    /// Falls back to RUST_LOG, then 'warn'.
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/graphrag/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides config file and GRAPHRAG_DB_PATH)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Use a throwaway in-memory graph instead of the configured store
    #[arg(long, global = true, conflicts_with = "db_path")]
    pub memory: bool,

    /// Embedding service URL for every configured model (overrides config file)
    #[arg(long, global = true)]
    pub embedding_url: Option<String>,

    /// Chat model name (overrides config file)
    #[arg(long, global = true)]
    pub chat_model: Option<String>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl Cli {
    /// Effective log level: explicit flag, then --verbose, else none
    pub fn log_filter(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}

/// Knowledge base selector shared by every command
#[derive(Args, Debug, Clone)]
pub struct NamespaceArg {
    /// Knowledge base (namespace) to operate on
    #[arg(short = 'n', long = "kb", env = "GRAPHRAG_KB")]
    pub namespace: String,
}

/// Per-call retrieval overrides
#[derive(Args, Debug, Clone, Default)]
pub struct RetrievalArgs {
    /// Expansion depth (1 or 2)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub hop_depth: Option<u8>,

    /// Maximum triples returned
    #[arg(long)]
    pub max_triples: Option<usize>,

    /// Minimum similarity for vector anchors (0-1)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Per-path timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a knowledge graph from documents and store it
    Ingest {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Text files to ingest, one document per file
        files: Vec<PathBuf>,

        /// Inline document text (repeatable)
        #[arg(short, long)]
        text: Vec<String>,

        /// Import an already extracted graph (JSON with "nodes" and "edges",
        /// as written by `export`) instead of calling the chat model
        #[arg(long, conflicts_with_all = ["files", "text"])]
        graph: Option<PathBuf>,

        /// Do not link entities to a source document node
        #[arg(long)]
        no_source: bool,

        /// Skip node embeddings
        #[arg(long)]
        no_embedding: bool,
    },

    /// Retrieve the fact triples relevant to a question
    Query {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Natural language question
        question: String,

        /// Also generate an answer from the retrieved facts
        #[arg(short, long)]
        answer: bool,

        /// Show per-path anchors and errors
        #[arg(long)]
        diagnostics: bool,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Answer a question from the knowledge graph (same as `query --answer`)
    Ask {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Natural language question
        question: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Node, edge and document counts for a knowledge base
    Stats {
        #[command(flatten)]
        kb: NamespaceArg,
    },

    /// Node labels, relation types and patterns present in a knowledge base
    Schema {
        #[command(flatten)]
        kb: NamespaceArg,
    },

    /// Dump a knowledge base's nodes and edges as JSON
    Export {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a whole knowledge base, or one document and its orphaned entities
    Delete {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Document id (SHA-256 of its text) to remove
        #[arg(short, long)]
        document: Option<String>,
    },

    /// Print the text-to-query prompt for a knowledge base's schema
    Prompt {
        #[command(flatten)]
        kb: NamespaceArg,

        /// Fill the question slot
        question: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_flags() {
        let cli = Cli::try_parse_from([
            "grag", "query", "--kb", "kb-1", "Who runs OpenAI?", "--answer", "--hop-depth", "2",
            "--max-triples", "10", "-f", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Query {
                kb,
                question,
                answer,
                retrieval,
                ..
            } => {
                assert_eq!(kb.namespace, "kb-1");
                assert_eq!(question, "Who runs OpenAI?");
                assert!(answer);
                assert_eq!(retrieval.hop_depth, Some(2));
                assert_eq!(retrieval.max_triples, Some(10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_hop_depth_out_of_range() {
        let result = Cli::try_parse_from(["grag", "ask", "--kb", "kb", "q", "--hop-depth", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_graph_import_conflicts_with_text() {
        let result = Cli::try_parse_from([
            "grag", "ingest", "--kb", "kb", "--graph", "g.json", "--text", "hello",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::try_parse_from(["grag", "-v", "stats", "--kb", "kb"]).unwrap();
        assert_eq!(cli.log_filter(), Some(LevelFilter::DEBUG));
        let cli = Cli::try_parse_from(["grag", "-l", "trace", "stats", "--kb", "kb"]).unwrap();
        assert_eq!(cli.log_filter(), Some(LevelFilter::TRACE));
        let cli = Cli::try_parse_from(["grag", "stats", "--kb", "kb"]).unwrap();
        assert_eq!(cli.log_filter(), None);
    }
}
