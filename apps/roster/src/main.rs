use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    batch::submit_in_batches,
    detail::MemberDetail,
    load_settings,
    seed::generate_members,
    transfer::{
        backup_file_name, ensure_csv_file_name, export_file_name, export_members,
        parse_backup, parse_csv_import, BackupDocument, ExportFormat,
    },
    ClientSettings, DirectoryController, DirectoryStatus, HttpMemberSource, MemberSource,
    NewMember, RegistrationOutcome,
};
use shared::domain::{SortDirection, SortField};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Browse and manage association members")]
struct Cli {
    /// Settings file (defaults to ./roster.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of the member directory.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
        /// 1-based page number; out-of-range pages are clamped.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show the detail card of one member.
    Show { email: String },
    /// Register a new member.
    Add {
        name: String,
        surname: String,
        email: String,
    },
    /// Register generated test members.
    Seed {
        #[arg(long)]
        count: Option<usize>,
    },
    Export {
        #[arg(long, value_enum)]
        format: FormatArg,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Register members from a CSV file or a backup JSON document.
    Import { file: PathBuf },
    Backup {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Name,
    Surname,
}

impl From<SortArg> for SortField {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortField::Name,
            SortArg::Surname => SortField::Surname,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Json,
    Xml,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Xml => ExportFormat::Xml,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
        settings.validate()?;
    }
    let source: Arc<dyn MemberSource> = Arc::new(HttpMemberSource::from_settings(&settings)?);
    info!(server_url = %settings.server_url, "using member service");

    match cli.command {
        Command::List {
            search,
            sort,
            desc,
            page,
        } => list(source, search, sort.into(), desc, page).await,
        Command::Show { email } => show(source, &email).await,
        Command::Add {
            name,
            surname,
            email,
        } => add(source.as_ref(), &name, &surname, &email).await,
        Command::Seed { count } => seed(source.as_ref(), &settings, count).await,
        Command::Export { format, out } => export(source, format.into(), out).await,
        Command::Import { file } => import(source.as_ref(), &settings, file).await,
        Command::Backup { out } => backup(source, out).await,
    }
}

/// Fetches the snapshot, failing with the user-facing message when the
/// member service does not answer.
async fn loaded_controller(source: Arc<dyn MemberSource>) -> Result<DirectoryController> {
    let mut controller = DirectoryController::new(source);
    controller.refresh().await;
    if let DirectoryStatus::Failed(message) = controller.status() {
        bail!("{message}");
    }
    Ok(controller)
}

async fn list(
    source: Arc<dyn MemberSource>,
    search: Option<String>,
    sort: SortField,
    desc: bool,
    page: usize,
) -> Result<()> {
    let mut controller = loaded_controller(source).await?;

    if let Some(term) = search {
        controller.set_search_term(term);
    }
    let direction = if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    controller.sort_by(sort, direction);
    controller.go_to_page(page.saturating_sub(1));

    match controller.status() {
        DirectoryStatus::Ready(projection) => {
            render::print_directory(&projection, controller.engine());
            Ok(())
        }
        DirectoryStatus::Failed(message) => Err(anyhow!("{message}")),
        DirectoryStatus::Pending => Err(anyhow!("member list is still loading")),
    }
}

async fn show(source: Arc<dyn MemberSource>, email: &str) -> Result<()> {
    let controller = loaded_controller(source).await?;
    let member = controller
        .select_email(email)
        .ok_or_else(|| anyhow!("no member with email {email}"))?;
    render::print_detail(&MemberDetail::new(&member, Utc::now()));
    Ok(())
}

async fn add(source: &dyn MemberSource, name: &str, surname: &str, email: &str) -> Result<()> {
    let new_member = NewMember::new(name, surname, email)?;
    let outcome = client_core::register(source, &new_member).await;
    match outcome {
        RegistrationOutcome::Registered => {
            println!("{}", outcome.message());
            Ok(())
        }
        RegistrationOutcome::Rejected(_) | RegistrationOutcome::Failed(_) => {
            bail!("{}", outcome.message())
        }
    }
}

async fn seed(source: &dyn MemberSource, settings: &ClientSettings, count: Option<usize>) -> Result<()> {
    let count = count.unwrap_or(settings.seed_count);
    let members = {
        let mut rng = rand::thread_rng();
        generate_members(&mut rng, count)
    };

    let report = submit_in_batches(source, &members, &settings.batch_options()).await;
    if report.succeeded > 0 {
        println!(
            "Successfully seeded {} test users with diverse email formats!",
            report.succeeded
        );
    }
    match report.failure_summary() {
        Some(summary) => bail!(summary),
        None => Ok(()),
    }
}

async fn export(
    source: Arc<dyn MemberSource>,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let controller = loaded_controller(source).await?;
    let snapshot = controller.engine().snapshot();
    let content = export_members(snapshot, format)?;
    let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(format, Utc::now().date_naive())));

    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("failed to write export to '{}'", path.display()))?;
    println!(
        "Successfully exported {} members as {} to {}",
        snapshot.len(),
        format.extension().to_uppercase(),
        path.display()
    );
    Ok(())
}

async fn import(source: &dyn MemberSource, settings: &ClientSettings, file: PathBuf) -> Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read '{}'", file.display()))?;

    let is_backup = file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let members = if is_backup {
        parse_backup(&text)?
    } else {
        ensure_csv_file_name(&file)?;
        let import = parse_csv_import(&text)?;
        for skipped in &import.skipped {
            eprintln!("skipped {skipped}");
        }
        import.members
    };

    let report = submit_in_batches(source, &members, &settings.batch_options()).await;
    println!(
        "Successfully imported {} members from {}",
        report.succeeded,
        file.display()
    );
    match report.failure_summary() {
        Some(summary) => bail!(summary),
        None => Ok(()),
    }
}

async fn backup(source: Arc<dyn MemberSource>, out: Option<PathBuf>) -> Result<()> {
    let controller = loaded_controller(source).await?;
    let now = Utc::now();
    let document = BackupDocument::new(controller.engine().snapshot(), now);
    let path = out.unwrap_or_else(|| PathBuf::from(backup_file_name(now.date_naive())));

    tokio::fs::write(&path, document.to_json()?)
        .await
        .with_context(|| format!("failed to write backup to '{}'", path.display()))?;
    println!(
        "System backup of {} members written to {}",
        document.metadata.total_members,
        path.display()
    );
    Ok(())
}
