//! tenantdesk - Terminal admin console for a multi-tenant SaaS backend

mod api;
mod display;
mod export;
mod formatting;
mod list;
mod modal;
mod models;
mod notify;
mod session;
mod tui;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use dialoguer::{Password, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use api::{AdminApi, Backend, HttpClient, MemoryBackend, fetch_page};
use export::ExportFormat;
use list::{FieldKind, FilterField, Filters, ListQuery, PAGE_SIZE_OPTIONS, Resource, ResourceKind, SEARCH_FIELD, SortOrder};
use models::{ActivityLog, AppConfig, DeletedDocument, ErrorLog, Invoice, Tenant, TenantStateRecord};
use notify::{Level, Notifier, StderrNotifier};
use session::{Session, SessionError};

const LOG_ENV: &str = "TENANTDESK_LOG";

/// Demo answers in the TUI are delayed so loading states are visible
const DEMO_LATENCY: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "tenantdesk")]
#[command(about = "Terminal admin console for a multi-tenant SaaS backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Use built-in demo data instead of the API
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Filters shared by the list and export commands
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Free-text search
    #[arg(short, long)]
    search: Option<String>,

    /// Filter by status (tenants, tenant states, invoices)
    #[arg(long)]
    status: Option<String>,

    /// Any filter field, e.g. plan=starter or level=error (repeatable)
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,

    /// Date range on the list's date column, e.g. 2024-01-01..2024-01-31
    #[arg(long, value_name = "FROM..TO")]
    range: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Rows per page (10, 20, 50 or 100)
    #[arg(short, long)]
    limit: Option<u32>,

    /// Column to sort by
    #[arg(long, value_name = "FIELD")]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    #[command(flatten)]
    filter: FilterArgs,

    /// Watch mode: refresh every N seconds
    #[arg(short, long, value_name = "SECONDS", default_value = "0", value_parser = parse_watch_interval)]
    watch: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// List tenants
    Tenants(ListArgs),

    /// List tenant status changes
    #[command(alias = "states")]
    TenantStates(ListArgs),

    /// List invoices
    Invoices(ListArgs),

    /// List admin activity
    #[command(alias = "logs")]
    Activity(ListArgs),

    /// List application errors
    Errors(ListArgs),

    /// List deleted documents awaiting recovery
    #[command(alias = "docs")]
    Documents(ListArgs),

    /// Show platform metrics
    Metrics {
        /// Watch mode: refresh every N seconds
        #[arg(short, long, value_name = "SECONDS", default_value = "0", value_parser = parse_watch_interval)]
        watch: f64,
    },

    /// Download a server-generated export of a list
    Export {
        #[arg(value_enum)]
        resource: ResourceKind,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Upload a replacement file for a deleted document
    Upload {
        document_id: String,
        file: String,
    },

    /// Manage the stored API token
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Launch interactive TUI mode
    #[command(alias = "ui")]
    Tui,
}

#[derive(Subcommand)]
enum TokenCommand {
    /// Store a token (prompts when omitted)
    Set { token: Option<String> },

    /// Show the stored token and its expiry
    Show,

    /// Remove the stored token
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        init_file_logging();
    } else {
        init_stderr_logging();
    }

    let (config, warnings) = AppConfig::load().map_err(anyhow::Error::msg).context("invalid configuration")?;

    let mut notifier = StderrNotifier;
    let backend = match command {
        Commands::Token { action } => return handle_token_command(action),
        // Warnings are shown as toasts once the TUI owns the screen
        Commands::Tui => {
            let backend = build_backend(&config, cli.demo, DEMO_LATENCY, &mut notifier)?;
            return tui::run(config, backend, warnings);
        }
        _ => build_backend(&config, cli.demo, Duration::ZERO, &mut notifier)?,
    };
    for warning in warnings {
        notifier.notify(Level::Warning, warning);
    }

    let rt = Runtime::new().context("failed to start async runtime")?;
    match command {
        Commands::Tenants(args) => run_list::<Tenant>(&rt, &backend, &config, &args)?,
        Commands::TenantStates(args) => run_list::<TenantStateRecord>(&rt, &backend, &config, &args)?,
        Commands::Invoices(args) => run_list::<Invoice>(&rt, &backend, &config, &args)?,
        Commands::Activity(args) => run_list::<ActivityLog>(&rt, &backend, &config, &args)?,
        Commands::Errors(args) => run_list::<ErrorLog>(&rt, &backend, &config, &args)?,
        Commands::Documents(args) => run_list::<DeletedDocument>(&rt, &backend, &config, &args)?,
        Commands::Metrics { watch } => {
            let command = || handle_metrics_command(&rt, &backend);
            if watch > 0.0 {
                watch_loop(watch, command)?;
            } else {
                println!("{}", command()?);
            }
        }
        Commands::Export { resource, format, filter } => {
            let path = handle_export_command(&rt, &backend, &config, resource, format, &filter)?;
            notifier.success(format!("Saved {}", path.display()));
        }
        Commands::Upload { document_id, file } => {
            let message = handle_upload_command(&rt, &backend, &document_id, &file)?;
            notifier.success(message);
        }
        Commands::Token { .. } | Commands::Tui => {}
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for tables
fn init_stderr_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// The TUI owns the terminal, so logs go to `~/.cache/tenantdesk/tenantdesk.log`
fn init_file_logging() {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("tenantdesk")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(dir.join("tenantdesk.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Demo data, or the REST client with whatever session is available
fn build_backend(config: &AppConfig, demo: bool, latency: Duration, notifier: &mut dyn Notifier) -> Result<Backend> {
    if demo {
        return Ok(Backend::Memory(MemoryBackend::demo().with_latency(latency)));
    }

    let token = match session::active_session(Utc::now()) {
        Ok(session) => Some(session.token),
        Err(err @ (SessionError::Missing | SessionError::Expired(_))) => {
            notifier.notify(Level::Warning, err.to_string());
            None
        }
        Err(err) => return Err(err).context("failed to read session"),
    };

    let timeout = Duration::from_secs(config.api.timeout_secs);
    let client = HttpClient::new(&config.api.base_url, token, timeout)
        .with_context(|| format!("failed to create client for {}", config.api.base_url))?;
    tracing::debug!(base_url = %client.base_url(), "using REST backend");
    Ok(Backend::Http(client))
}

fn run_list<R: Resource>(rt: &Runtime, backend: &Backend, config: &AppConfig, args: &ListArgs) -> Result<()> {
    let query = build_query::<R>(config, args)?;
    let command = || handle_list_command::<R>(rt, backend, &query);
    if args.watch > 0.0 {
        watch_loop(args.watch, command)?;
    } else {
        println!("{}", command()?);
    }
    Ok(())
}

fn handle_list_command<R: Resource>(rt: &Runtime, backend: &Backend, query: &ListQuery) -> Result<String> {
    let page = rt
        .block_on(fetch_page::<R, _>(backend, query))
        .inspect_err(session::forget_if_rejected)
        .with_context(|| format!("failed to load {}", R::KIND.title().to_lowercase()))?;

    let mut output = display::format_page(&page, query, Local::now().date_naive());
    if page.is_empty() && query.page() > page.total_pages {
        output.push_str(&format!(
            "\nPage {} is past the last page ({}); try --page {}\n",
            query.page(),
            page.total_pages,
            page.total_pages
        ));
    }
    Ok(output)
}

/// Query for one list command: page, size, sort and filters
fn build_query<R: Resource>(config: &AppConfig, args: &ListArgs) -> Result<ListQuery> {
    let limit = args.limit.unwrap_or(config.list.page_size);
    if !PAGE_SIZE_OPTIONS.contains(&limit) {
        bail!("--limit must be one of {:?}, got {}", PAGE_SIZE_OPTIONS, limit);
    }
    if args.page == 0 {
        bail!("--page starts at 1");
    }

    let (default_field, default_order) = R::default_sort();
    let (field, order) = match &args.sort {
        Some(field) => {
            let columns = R::columns();
            let Some(column) = columns.iter().find(|c| c.sortable && c.field.eq_ignore_ascii_case(field)) else {
                let sortable: Vec<&str> = columns.iter().filter(|c| c.sortable).map(|c| c.field).collect();
                bail!(
                    "{} cannot be sorted by '{}' (choose from: {})",
                    R::KIND.title(),
                    field,
                    sortable.join(", ")
                );
            };
            (column.field, if args.desc { SortOrder::Desc } else { SortOrder::Asc })
        }
        None if args.desc => (default_field, SortOrder::Desc),
        None => (default_field, default_order),
    };

    let mut query = ListQuery::new(limit, field, order);
    query.apply_filters(build_filters(R::KIND, R::filter_fields(), &args.filter)?);
    query.set_page(args.page);
    Ok(query)
}

/// Turn `--search`, `--status`, `--filter` and `--range` into committed filters
fn build_filters(kind: ResourceKind, fields: &[FilterField], args: &FilterArgs) -> Result<Filters> {
    let mut filters = Filters::new();
    let find = |key: &str| -> Result<&FilterField> {
        fields.iter().find(|f| f.key.eq_ignore_ascii_case(key)).with_context(|| {
            let keys: Vec<&str> = fields.iter().map(|f| f.key).collect();
            format!("{} has no '{}' filter (choose from: {})", kind.title(), key, keys.join(", "))
        })
    };

    if let Some(search) = &args.search {
        set_filter(&mut filters, find(SEARCH_FIELD)?, search)?;
    }
    if let Some(status) = &args.status {
        set_filter(&mut filters, find("status")?, status)?;
    }
    for pair in &args.filters {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("--filter expects KEY=VALUE, got '{}'", pair))?;
        set_filter(&mut filters, find(key.trim())?, value.trim())?;
    }
    if let Some(range) = &args.range {
        let field = fields
            .iter()
            .find(|f| f.kind == FieldKind::DateRange)
            .with_context(|| format!("{} has no date filter", kind.title()))?;
        set_filter(&mut filters, field, range)?;
    }
    Ok(filters)
}

fn set_filter(filters: &mut Filters, field: &FilterField, value: &str) -> Result<()> {
    match field.kind {
        FieldKind::Text => filters.set_text(field.key, value),
        FieldKind::Choice(options) => {
            let Some(option) = options.iter().find(|o| o.eq_ignore_ascii_case(value)) else {
                bail!("{} must be one of: {}", field.label, options.join(", "));
            };
            filters.set_text(field.key, *option);
        }
        FieldKind::DateRange => {
            let range = list::filter::parse_range(value)
                .with_context(|| format!("{} expects YYYY-MM-DD..YYYY-MM-DD, got '{}'", field.label, value))?;
            filters.set_range(field.key, range);
        }
    }
    Ok(())
}

fn filter_fields(kind: ResourceKind) -> &'static [FilterField] {
    match kind {
        ResourceKind::Tenants => Tenant::filter_fields(),
        ResourceKind::TenantStates => TenantStateRecord::filter_fields(),
        ResourceKind::Invoices => Invoice::filter_fields(),
        ResourceKind::Activity => ActivityLog::filter_fields(),
        ResourceKind::Errors => ErrorLog::filter_fields(),
        ResourceKind::Documents => DeletedDocument::filter_fields(),
    }
}

fn handle_metrics_command(rt: &Runtime, backend: &Backend) -> Result<String> {
    let metrics = rt
        .block_on(backend.metrics())
        .inspect_err(session::forget_if_rejected)
        .context("failed to load metrics")?;
    Ok(display::format_metrics(&metrics, Local::now()))
}

fn handle_export_command(
    rt: &Runtime,
    backend: &Backend,
    config: &AppConfig,
    kind: ResourceKind,
    format: ExportFormat,
    args: &FilterArgs,
) -> Result<std::path::PathBuf> {
    let filters = build_filters(kind, filter_fields(kind), args)?;
    let bytes = rt
        .block_on(backend.export(kind, format, &filters))
        .inspect_err(session::forget_if_rejected)
        .with_context(|| format!("{} export of {} failed", format.label(), kind.title().to_lowercase()))?;

    let name = export::export_filename(kind, format.extension(), Utc::now());
    let dir = config.export_dir();
    export::write_export(&dir, &name, &bytes).with_context(|| format!("failed to write {} in {}", name, dir.display()))
}

fn handle_upload_command(rt: &Runtime, backend: &Backend, document_id: &str, file: &str) -> Result<String> {
    let request = modal::upload::prepare_upload(document_id, file).context("cannot upload this file")?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .context("Failed to set progress template")?
            .progress_chars("=> "),
    );
    bar.set_message(request.file_name.clone());

    let sink = bar.clone();
    let progress: api::Progress = Arc::new(move |sent, total| {
        sink.set_length(total);
        sink.set_position(sent);
    });

    let result = rt.block_on(api::upload::upload_document(backend, &request, progress));
    match result {
        Ok(message) => {
            bar.finish_and_clear();
            Ok(message)
        }
        Err(err) => {
            bar.abandon();
            session::forget_if_rejected(&err);
            Err(err).with_context(|| format!("upload of {} failed", request.file_name))
        }
    }
}

fn handle_token_command(action: TokenCommand) -> Result<()> {
    let path = session::session_path()?;
    match action {
        TokenCommand::Set { token } => {
            let token = match token {
                Some(token) => token,
                None => Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("API token")
                    .interact()
                    .context("failed to read token")?,
            };
            let token = token.trim();
            if token.is_empty() {
                bail!("token is empty");
            }
            let session = Session::new(token);
            if session.is_expired(Utc::now()) {
                bail!("token already expired");
            }
            session::save_to(&path, &session)?;
            println!("Saved token to {}", path.display());
        }
        TokenCommand::Show => match session::load_from(&path)? {
            Some(session) => {
                println!("Token:   {}", session.masked_token());
                if let Some(user) = &session.user {
                    println!("User:    {} <{}> ({})", user.name, user.email, user.role);
                }
                let now = Utc::now();
                match session.expires_at() {
                    Some(exp) if exp <= now => println!(
                        "Expires: {} (expired {})",
                        exp.with_timezone(&Local),
                        formatting::format_ago(exp, now)
                    ),
                    Some(exp) => println!("Expires: {}", exp.with_timezone(&Local)),
                    None => println!("Expires: unknown"),
                }
            }
            None => println!("No token stored at {}", path.display()),
        },
        TokenCommand::Clear => {
            if session::clear_at(&path)? {
                println!("Removed {}", path.display());
            } else {
                println!("No token stored");
            }
        }
    }
    Ok(())
}

/// Watch loop that repeatedly executes a command with flicker-free updates
/// Longest accepted `--watch` interval
const MAX_WATCH_SECS: f64 = 86_400.0;

/// `--watch` value: 0 disables, otherwise a finite number of seconds up to a day
fn parse_watch_interval(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.trim().parse().map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    let valid = Duration::try_from_secs_f64(secs).is_ok_and(|d| d.as_secs_f64() <= MAX_WATCH_SECS);
    if !valid {
        return Err(format!("interval must be between 0 and {MAX_WATCH_SECS} seconds"));
    }
    Ok(secs)
}

fn watch_loop<F>(interval: f64, command: F) -> Result<()>
where
    F: Fn() -> Result<String>,
{
    let period = Duration::try_from_secs_f64(interval).context("invalid watch interval")?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = (|| -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

            let output = match command() {
                Ok(s) => s,
                Err(e) => format!("Error: {:#}", e),
            };

            let screen_content = format!(
                "{}\n\nLast updated: {} | Refreshing every {}s | Press Ctrl+C to exit",
                output, timestamp, interval
            );

            // Synchronized update (DEC private mode 2026) so the frame lands at once
            write!(stdout, "\x1B[?2026h")?;
            write!(stdout, "\x1B[H{}\x1B[J", screen_content)?;
            write!(stdout, "\x1B[?2026l")?;
            stdout.flush()?;

            // Sleep in short slices so Ctrl+C is honored promptly
            let deadline = std::time::Instant::now() + period;
            while running.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
                thread::sleep(Duration::from_millis(100));
            }
        }
        Ok(())
    })();

    execute!(io::stdout(), Show, LeaveAlternateScreen)?;
    println!("Watch mode stopped.");

    result
}
