use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use leadscout_common::observability::init_logging;
use leadscout_common::{Lead, OutputFormat, SearchCenter, SearchRequest};
use leadscout_config::{DEFAULT_CONFIG_FILE, LeadscoutConfig, LeadscoutConfigLoader};
use leadscout_search::{LeadSort, MarkerLayer, SortKey, render_table, write_csv};
use leadscout_store::DEFAULT_LIST_LIMIT;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
mod wiring;

#[derive(Parser)]
#[command(name = "leadscout", version, about = "Find local business leads on Google Maps")]
struct Cli {
    /// YAML config file (default: ./leadscout.yaml if present)
    #[arg(long, global = true, env = "LEADSCOUT_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API until Ctrl-C
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one search, store the leads and print them
    Search(SearchArgs),
    /// Work with stored leads
    #[command(subcommand)]
    Leads(LeadsCommand),
}

#[derive(Args)]
struct SearchArgs {
    /// Business type or keyword, e.g. "coffee shops"
    query: String,
    #[arg(long)]
    location: String,
    /// Metres around the location (default: search.default_radius_m)
    #[arg(long)]
    radius: Option<u32>,
    #[arg(long)]
    min_rating: Option<f64>,
    /// Keep only leads with (true) or without (false) a website
    #[arg(long)]
    has_website: Option<bool>,
    /// Google place type to keep; repeatable
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    #[command(flatten)]
    sort: SortArgs,
}

#[derive(Args)]
struct SortArgs {
    /// name, rating, reviews or website
    #[arg(long)]
    sort: Option<SortKey>,
    #[arg(long)]
    desc: bool,
}

impl SortArgs {
    fn apply(&self, leads: &mut [Lead]) {
        if let Some(key) = self.sort {
            LeadSort::new(key, self.desc).apply(leads);
        } else if self.desc {
            LeadSort::new(SortKey::Name, true).apply(leads);
        }
    }
}

#[derive(Subcommand)]
enum LeadsCommand {
    /// Print stored leads
    List {
        #[command(flatten)]
        sort: SortArgs,
        #[arg(long, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Write stored leads to a CSV file
    Export {
        #[arg(long, short)]
        output: PathBuf,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Delete every stored lead
    Clear,
}

fn load_config(path: Option<&PathBuf>) -> Result<LeadscoutConfig> {
    let loader = match path {
        Some(p) => LeadscoutConfigLoader::new().with_file(p),
        None => LeadscoutConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("loading configuration")
}

fn print_leads(leads: &[Lead], center: Option<SearchCenter>, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match format {
        OutputFormat::Table => write!(out, "{}", render_table(leads))?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(leads)?)?,
        OutputFormat::Csv => write_csv(leads, &mut out)?,
        OutputFormat::GeoJson => {
            let mut layer = MarkerLayer::new();
            layer.replace(leads, center);
            writeln!(out, "{}", serde_json::to_string_pretty(&layer.to_collection())?)?;
        }
    }
    out.flush()?;
    Ok(())
}

async fn serve(cfg: LeadscoutConfig, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
    let state = Arc::new(wiring::build_state(&cfg).await?);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    leadscout_server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "app.ctrl_c_failed");
        }
        tracing::info!("app.shutdown");
    })
    .await?;
    Ok(())
}

async fn search(cfg: LeadscoutConfig, args: SearchArgs) -> Result<()> {
    let provider = wiring::places_client(&cfg)?;
    let store = wiring::open_store(&cfg).await?;
    let search = wiring::lead_search(&cfg, provider, &store);

    let req = SearchRequest {
        radius: args.radius.unwrap_or(cfg.search.default_radius_m),
        min_rating: args.min_rating,
        has_website: args.has_website,
        categories: (!args.categories.is_empty()).then_some(args.categories),
        ..SearchRequest::new(args.query, args.location)
    };
    let mut resp = search.run(&req).await?;
    args.sort.apply(&mut resp.leads);

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }
    if args.format == OutputFormat::Table {
        println!(
            "center: {} ({:.5}, {:.5})",
            resp.search_center.address, resp.search_center.lat, resp.search_center.lng
        );
    }
    print_leads(&resp.leads, Some(resp.search_center), args.format)
}

async fn leads(cfg: LeadscoutConfig, cmd: LeadsCommand) -> Result<()> {
    let store = wiring::open_store(&cfg).await?;
    match cmd {
        LeadsCommand::List { sort, format } => {
            let mut leads = store.list_leads(DEFAULT_LIST_LIMIT).await?;
            sort.apply(&mut leads);
            print_leads(&leads, None, format)
        }
        LeadsCommand::Export { output, sort } => {
            let mut leads = store.list_leads(DEFAULT_LIST_LIMIT).await?;
            sort.apply(&mut leads);
            let file = std::fs::File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            write_csv(&leads, BufWriter::new(file))?;
            tracing::info!(path = %output.display(), rows = leads.len(), "app.export");
            eprintln!("wrote {} lead(s) to {}", leads.len(), output.display());
            Ok(())
        }
        LeadsCommand::Clear => {
            let deleted = store.clear_leads().await?;
            println!("deleted {deleted} lead(s)");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from config, so it loads first.
    let cfg = load_config(cli.config.as_ref())?;
    init_logging(cfg.logging.to_log_config())?;

    match cli.command {
        Command::Serve { bind } => serve(cfg, bind).await,
        Command::Search(args) => search(cfg, args).await,
        Command::Leads(cmd) => leads(cfg, cmd).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from([
            "leadscout",
            "search",
            "coffee shops",
            "--location",
            "Toronto, ON",
            "--has-website",
            "false",
            "--category",
            "cafe",
            "--category",
            "bakery",
            "--format",
            "csv",
            "--sort",
            "rating",
            "--desc",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.has_website, Some(false));
        assert_eq!(args.categories, vec!["cafe", "bakery"]);
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.sort.sort, Some(SortKey::Rating));
        assert!(args.sort.desc);
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        assert!(Cli::try_parse_from(["leadscout", "leads", "list", "--sort", "distance"]).is_err());
    }
}
