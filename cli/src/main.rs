use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::{IndexConfig, SearchIndex};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Query a TF-IDF index built from a corpus directory", long_about = None)]
struct Cli {
    /// Corpus directory; every file is one document
    #[arg(long, global = true, default_value = "./corpus")]
    corpus: String,
    /// Posting list depth (K)
    #[arg(long, global = true, default_value_t = 10)]
    depth: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the best matching document and its cosine score
    Query {
        /// Fall back to a full scan when the posting lists are inconclusive
        #[arg(long, default_value_t = false)]
        exhaustive: bool,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the normalized weight of an already stemmed term in a document
    Weight { document: String, term: String },
    /// Print log10(N / df) for an already stemmed term, -1 if unseen
    Idf { term: String },
    /// Print corpus statistics
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    println!("{}", run(cli)?);
    Ok(())
}

fn run(cli: Cli) -> Result<String> {
    let config = IndexConfig { posting_depth: cli.depth };
    let engine = SearchIndex::from_directory(&cli.corpus, config)
        .with_context(|| format!("building index from {}", cli.corpus))?;

    let out = match cli.command {
        Commands::Query { exhaustive, text } => {
            let text = text.join(" ");
            let result = if exhaustive { engine.query_exhaustive(&text) } else { engine.query(&text) };
            if result.needs_deeper_scan() {
                tracing::warn!(query = %text, "posting lists too shallow, rerun with --exhaustive or a larger --depth");
            }
            result.to_string()
        }
        Commands::Weight { document, term } => format!("{:.12}", engine.weight(&document, &term)),
        Commands::Idf { term } => format!("{:.12}", engine.idf(&term)),
        Commands::Stats => format!(
            "documents={} terms={} depth={}",
            engine.index().total_docs(),
            engine.index().total_terms(),
            engine.postings().depth()
        ),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "the cat sat").unwrap();
        fs::write(dir.path().join("b.txt"), "the dog sat").unwrap();
        fs::write(dir.path().join("c.txt"), "cat dog bird").unwrap();
        dir
    }

    fn run_args(dir: &tempfile::TempDir, args: &[&str]) -> Result<String> {
        let corpus = dir.path().to_string_lossy().to_string();
        let mut argv = vec!["search", "--corpus", corpus.as_str()];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prints_query_weight_and_idf() {
        let dir = corpus();
        assert!(run_args(&dir, &["query", "cat"]).unwrap().starts_with("(a.txt, "));
        assert_eq!(run_args(&dir, &["query", "the"]).unwrap(), "(None, 0.000000000000)");
        assert_eq!(run_args(&dir, &["idf", "cat"]).unwrap(), format!("{:.12}", 1.5f64.log10()));
        assert_eq!(run_args(&dir, &["idf", "vector"]).unwrap(), "-1.000000000000");
        assert_eq!(run_args(&dir, &["weight", "a.txt", "dog"]).unwrap(), "0.000000000000");
        assert_eq!(run_args(&dir, &["stats"]).unwrap(), "documents=3 terms=4 depth=10");
    }

    #[test]
    fn missing_corpus_is_an_error() {
        let dir = corpus();
        let missing = dir.path().join("missing").to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["search", "--corpus", missing.as_str(), "stats"]).unwrap();
        assert!(run(cli).is_err());
    }
}
