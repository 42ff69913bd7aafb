use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use vecrank_core::persist::{load_index, save_index, save_results, save_weights, write_results};
use vecrank_core::weighting::{IdfMode, TfMode};
use vecrank_core::{load_corpus, Corpus, EngineConfig, EnglishNormalizer, InvertedIndex, MissingDocumentPolicy, QueryEngine};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build TF-IDF inverted indexes and run ranked queries over a document directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the inverted index and write it as a plain-text snapshot
    Build {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Snapshot file to write
        #[arg(long)]
        output: PathBuf,
    },
    /// Rank the corpus against a free-text query
    Query {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Read postings from this snapshot instead of indexing the corpus
        #[arg(long)]
        index: Option<PathBuf>,
        /// Query text
        #[arg(long)]
        query: String,
        /// Number of results (defaults to the config's top_k)
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Dump every document's TF-IDF vector
    Weights {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// Directory holding the documents; file names become document IDs
    #[arg(long)]
    input: PathBuf,
    /// JSON engine config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use smoothed IDF = ln(N/df) + 1 instead of ln(N/df)
    #[arg(long, default_value_t = false)]
    smoothed_idf: bool,
    /// Term-frequency dampening
    #[arg(long, value_enum)]
    tf_mode: Option<TfModeArg>,
    /// Fail the build on an unreadable document instead of skipping it
    #[arg(long, default_value_t = false)]
    abort_on_unreadable: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TfModeArg {
    /// ln(1 + count)
    LogOnePlus,
    /// 1 + ln(count)
    OnePlusLog,
}

impl From<TfModeArg> for TfMode {
    fn from(arg: TfModeArg) -> Self {
        match arg {
            TfModeArg::LogOnePlus => TfMode::LogOnePlus,
            TfModeArg::OnePlusLog => TfMode::OnePlusLog,
        }
    }
}

impl CorpusArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load(self.config.as_deref())?;
        if self.smoothed_idf {
            config.weighting.idf = IdfMode::Smoothed;
        }
        if let Some(tf) = self.tf_mode {
            config.weighting.tf = tf.into();
        }
        if self.abort_on_unreadable {
            config.missing_documents = MissingDocumentPolicy::Abort;
        }
        Ok(config)
    }

    fn load(&self) -> Result<(Corpus, EngineConfig)> {
        let config = self.engine_config()?;
        let corpus = load_corpus(&self.input, config.missing_documents)
            .with_context(|| format!("loading corpus from {}", self.input.display()))?;
        Ok((corpus, config))
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, output } => build_index(&corpus, &output),
        Commands::Query { corpus, index, query, top_k, output } => {
            run_query(&corpus, index.as_deref(), &query, top_k, output.as_deref())
        }
        Commands::Weights { corpus, output } => dump_weights(&corpus, &output),
    }
}

fn build_index(args: &CorpusArgs, output: &Path) -> Result<()> {
    let start = Instant::now();
    let (corpus, _) = args.load()?;
    let index = InvertedIndex::build(&corpus, &EnglishNormalizer::default());
    save_index(output, index.postings(), index.num_docs())
        .with_context(|| format!("writing index snapshot {}", output.display()))?;
    tracing::info!(
        output = %output.display(),
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        took_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}

fn run_query(args: &CorpusArgs, index: Option<&Path>, query: &str, top_k: Option<usize>, output: Option<&Path>) -> Result<()> {
    let (corpus, config) = args.load()?;
    let engine = match index {
        Some(path) => {
            let postings = load_index(path).with_context(|| format!("reading index snapshot {}", path.display()))?;
            QueryEngine::from_snapshot(postings, &corpus, &config)
        }
        None => QueryEngine::build(&corpus, &config),
    };
    let k = top_k.unwrap_or(config.top_k);
    let results = engine.query(query, k);
    match output {
        Some(path) => {
            save_results(path, query, &results).with_context(|| format!("writing results {}", path.display()))?;
            tracing::info!(output = %path.display(), hits = results.len(), "results written");
        }
        None => {
            let mut out = io::stdout().lock();
            write_results(&mut out, query, &results)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn dump_weights(args: &CorpusArgs, output: &Path) -> Result<()> {
    let (corpus, config) = args.load()?;
    let engine = QueryEngine::build(&corpus, &config);
    save_weights(output, engine.vectors()).with_context(|| format!("writing weights {}", output.display()))?;
    tracing::info!(output = %output.display(), num_docs = engine.num_docs(), "tf-idf weights written");
    Ok(())
}
