use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use event_log::{EventSink, TracingRenderer};
use loader_core::digest::digest_file;
use loader_core::{BundleEntry, Manifest, Platform};
use manifest_client::ManifestSource;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use update_engine::{
    inventory, plan, Decision, FileConfig, LoaderSettings, Overrides, StaticBundle,
};

#[derive(Parser)]
#[command(name = "loader-cli")]
#[command(about = "Loader CLI - inspect the local bundle and the manifest service")]
#[command(version = loader_core::VERSION)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Print machine-readable JSON instead of a listing
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SettingsArgs {
    /// Base URL of the manifest service API
    #[arg(long, env = "LOADER_API_URL", global = true)]
    api_url: Option<String>,

    /// Operator tag sent with every request
    #[arg(long, env = "LOADER_OPERATOR", global = true)]
    operator: Option<String>,

    /// JSON configuration file
    #[arg(long, env = "LOADER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash every file of the local bundle
    Inventory,
    /// Show the manifest the service publishes for this host
    Manifest,
    /// Show what a run would do, without changing anything
    Plan,
    /// Print the SHA-256 digest of a file
    Hash { file: PathBuf },
}

impl SettingsArgs {
    fn file(&self) -> anyhow::Result<Option<FileConfig>> {
        Ok(self.config.as_deref().map(FileConfig::load).transpose()?)
    }

    fn resolve(&self) -> anyhow::Result<LoaderSettings> {
        let file = self.file()?;
        let overrides = Overrides {
            api_url: self.api_url.clone(),
            operator: self.operator.clone(),
            timeout_secs: self.timeout_secs,
        };
        Ok(LoaderSettings::resolve(overrides, file)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Inventory => handle_inventory(&cli).await,
        Commands::Manifest => handle_manifest(&cli).await,
        Commands::Plan => handle_plan(&cli).await,
        Commands::Hash { file } => handle_hash(file, cli.json),
    }
}

async fn local_bundle(bundle: StaticBundle) -> anyhow::Result<Vec<BundleEntry>> {
    let entries = EventSink::scope(TracingRenderer, |events| async move {
        inventory(&bundle, &events).await
    })
    .await?;
    Ok(entries)
}

async fn remote_manifest(settings: &LoaderSettings) -> anyhow::Result<Manifest> {
    let client = settings.manifest_client()?;
    let manifest = client.fetch_manifest(&settings.parameters()).await?;
    Ok(manifest)
}

async fn handle_inventory(cli: &Cli) -> anyhow::Result<()> {
    // local files only, no API URL required
    let platform = Platform::current();
    let bundle = cli
        .settings
        .file()?
        .unwrap_or_default()
        .bundle_source(&platform)?;
    let entries = local_bundle(bundle).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    println!("📦 Local bundle ({})", platform);
    for entry in &entries {
        println!("  {:<16} {}", entry.name, entry.path.display());
        println!("  {:<16} {}", "", entry.content_hash);
    }
    Ok(())
}

async fn handle_manifest(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.settings.resolve()?;
    let manifest = remote_manifest(&settings).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }
    let params = settings.parameters();
    println!(
        "🌐 Manifest for {}/{} (operator {})",
        params.os, params.arch, params.operator
    );
    if let Some(loader_name) = &manifest.loader_name {
        println!("  issued for loader {}", loader_name);
    }
    for entry in &manifest.entries {
        println!("  {:<16} {}", entry.name, entry.content_hash);
    }
    Ok(())
}

async fn handle_plan(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.settings.resolve()?;
    let have = local_bundle(settings.bundle_source()?).await?;
    let want = remote_manifest(&settings).await?;
    let actions = plan(&have, &want);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
        return Ok(());
    }
    println!("🧭 Planned actions");
    for action in &actions {
        let verdict = match &action.decision {
            Decision::NotManaged => "⏭️  not in manifest, ignored".to_string(),
            Decision::UpToDate { .. } => "✅ up to date".to_string(),
            Decision::Refresh { expected } => format!("🔄 refresh to {}", expected),
        };
        println!("  {:<16} {}", action.entry.name, verdict);
    }
    Ok(())
}

fn handle_hash(file: &Path, json: bool) -> anyhow::Result<()> {
    let digest = digest_file(file).with_context(|| format!("cannot hash {}", file.display()))?;
    if json {
        println!("{}", serde_json::json!({"path": file, "sha256": digest}));
    } else {
        println!("{}  {}", digest, file.display());
    }
    Ok(())
}
