//! Verity CLI
//!
//! Claim fact-checking from the command line or over HTTP.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use verity_classifier::{ChatConfig, ChatProvider};
use verity_core::{FactCheckEntry, SearchEntry, VerdictBundle};
use verity_runtime::{ClassifierSettings, Settings};

#[derive(Parser)]
#[command(name = "verity")]
#[command(author, version, about = "Verity: claim fact-checking with NLI and external evidence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        #[command(flatten)]
        sources: SourceArgs,

        /// Address to bind (overrides [server].bind_address)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Browser origin allowed by CORS; repeatable (overrides [server].allowed_origins)
        #[arg(long = "allow-origin")]
        allow_origins: Vec<String>,
    },

    /// Fact-check a single claim
    Check {
        /// The claim to check
        #[arg(short, long)]
        claim: String,

        #[command(flatten)]
        sources: SourceArgs,

        /// Write the verdict bundle to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the verdict bundle to verdict_<timestamp>.json
        #[arg(long)]
        save: bool,

        /// Print the bundle as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show which classifier and sources are configured
    Status {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

/// Classifier backends selectable from the command line
#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    ZeroShot,
    Openai,
    Openrouter,
    Local,
    Anthropic,
}

/// Config file plus credential overrides shared by every subcommand
#[derive(Args)]
struct SourceArgs {
    /// TOML settings file
    #[arg(long, env = "VERITY_CONFIG")]
    config: Option<PathBuf>,

    /// Classifier backend (overrides [classifier])
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Classifier model id
    #[arg(short, long)]
    model: Option<String>,

    /// Google Fact Check Tools API key (or set GOOGLE_FACTCHECK_API_KEY env var)
    #[arg(long, env = "GOOGLE_FACTCHECK_API_KEY", hide_env_values = true)]
    factcheck_key: Option<String>,

    /// Google Custom Search API key (or set GOOGLE_SEARCH_API_KEY env var)
    #[arg(long, env = "GOOGLE_SEARCH_API_KEY", hide_env_values = true)]
    search_key: Option<String>,

    /// Google Custom Search engine id (or set GOOGLE_SEARCH_ENGINE_ID env var)
    #[arg(long, env = "GOOGLE_SEARCH_ENGINE_ID")]
    search_engine: Option<String>,

    /// Hugging Face inference token (or set HF_API_TOKEN env var)
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_key: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: Option<String>,
}

impl SourceArgs {
    /// Load the settings file and apply command-line overrides
    fn load_settings(self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())
            .with_context(|| format!("loading settings from {:?}", self.config))?;

        if self.factcheck_key.is_some() {
            settings.fact_check.api_key = self.factcheck_key;
        }
        if self.search_key.is_some() {
            settings.web_search.api_key = self.search_key;
        }
        if self.search_engine.is_some() {
            settings.web_search.engine_id = self.search_engine;
        }

        if let Some(provider) = self.provider {
            settings.classifier = match provider {
                ProviderArg::ZeroShot => ClassifierSettings::default(),
                ProviderArg::Openai => chat(ChatProvider::OpenAi, "gpt-4o-mini"),
                ProviderArg::Openrouter => chat(ChatProvider::OpenRouter, "openai/gpt-4o-mini"),
                ProviderArg::Local => chat(ChatProvider::Local, "llama3.1"),
                ProviderArg::Anthropic => chat(ChatProvider::Anthropic, "claude-3-5-haiku-latest"),
            };
        }

        match &mut settings.classifier {
            ClassifierSettings::ZeroShot(config) => {
                if let Some(model) = self.model {
                    config.model = model;
                }
                if self.hf_token.is_some() {
                    config.api_token = self.hf_token;
                }
            }
            ClassifierSettings::Chat(config) => {
                if let Some(model) = self.model {
                    config.model = model;
                }
                let key = match config.provider {
                    ChatProvider::OpenAi => self.openai_key,
                    ChatProvider::OpenRouter => self.openrouter_key,
                    ChatProvider::Anthropic => self.anthropic_key,
                    ChatProvider::Local => None,
                };
                if config.api_key.is_empty() {
                    config.api_key = key.unwrap_or_default();
                }
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn chat(provider: ChatProvider, model: &str) -> ClassifierSettings {
    ClassifierSettings::Chat(ChatConfig::new(provider, "", model))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Serve {
            sources,
            bind,
            port,
            allow_origins,
        } => {
            let mut settings = sources.load_settings()?;
            if let Some(bind) = bind {
                settings.server.bind_address = bind;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if !allow_origins.is_empty() {
                settings.server.allowed_origins = allow_origins;
            }
            serve(settings).await?;
        }
        Commands::Check {
            claim,
            sources,
            output,
            save,
            json,
        } => {
            let settings = sources.load_settings()?;
            let output = output.or_else(|| save.then(default_output_path));
            check_claim(settings, &claim, output.as_deref(), json).await?;
        }
        Commands::Status { sources } => {
            show_status(&sources.load_settings()?);
        }
    }

    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    let addr = settings.server.bind_addr()?;
    let aggregator = settings.build_aggregator()?;

    println!("🔎 Verity fact-check gateway");
    println!("📡 Classifier: {}", aggregator.classifier_name());
    println!("🌐 Listening on http://{}\n", addr);

    verity_gateway::start_server(&settings.server, aggregator).await?;
    Ok(())
}

async fn check_claim(settings: Settings, claim: &str, output: Option<&Path>, json: bool) -> Result<()> {
    let aggregator = settings.build_aggregator()?;
    let bundle = aggregator.evaluate(claim).await?;
    let rendered = serde_json::to_string_pretty(&bundle)?;

    if json {
        println!("{}", rendered);
    } else {
        print_summary(&bundle);
    }

    if let Some(path) = output {
        fs::write(path, &rendered).with_context(|| format!("writing {}", path.display()))?;
        println!("\n📄 Verdict saved to: {}", path.display());
    }

    Ok(())
}

fn default_output_path() -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("verdict_{}.json", timestamp))
}

fn print_summary(bundle: &VerdictBundle) {
    println!("🔍 Claim: {}", bundle.claim);
    println!("⚖️  Verdict: {} ({:?})\n", bundle.final_verdict, bundle.basis);

    println!("🤖 Classifier:");
    if bundle.ai_verdicts.is_empty() {
        println!("   (no scores)");
    }
    for score in &bundle.ai_verdicts {
        println!("   {:<9} {:>6.2}%", score.label, score.confidence);
    }

    println!("\n📰 Fact checks:");
    if bundle.fact_checks.is_empty() {
        println!("   (none found)");
    }
    for entry in &bundle.fact_checks {
        match entry {
            FactCheckEntry::Review(review) => println!(
                "   {} - {} ({})",
                review.verdict, review.source, review.source_url
            ),
            FactCheckEntry::Error { message } => println!("   ⚠️  {}", message),
        }
    }

    println!("\n📚 Encyclopedia:");
    match &bundle.encyclopedia {
        Some(summary) => {
            println!("   {} ({})", summary.title, summary.url);
            println!("   {}", summary.summary);
        }
        None => println!("   (no article)"),
    }

    println!("\n🌐 Web search:");
    for entry in &bundle.search_results {
        match entry {
            SearchEntry::Result { title, link, .. } => println!("   {} ({})", title, link),
            SearchEntry::Error { message } | SearchEntry::Disabled { message } => {
                println!("   ⚠️  {}", message)
            }
        }
    }
}

fn show_status(settings: &Settings) {
    println!("🔌 Verity configuration\n");
    for source in settings.source_status() {
        let mark = if source.configured { "✅" } else { "❌" };
        println!("{} {:<13} {}", mark, source.name, source.detail);
    }
    match settings.server.bind_addr() {
        Ok(addr) => println!("\n🌐 Gateway address: {}", addr),
        Err(e) => println!("\n❌ {}", e),
    }
}
