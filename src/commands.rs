//! Command implementations for sheetwatch CLI

use crate::cli::{Commands, OutputFormat};
use crate::config::WatchConfig;
use crate::error::{Result, SheetwatchError};
use crate::export::CsvExporter;
use crate::notify::{CommandNotifier, FileNotifier};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::runner::RunCoordinator;
use crate::snapshot::SnapshotStore;
use crate::source::source_for_locator;
use crate::workspace::SheetwatchWorkspace;
use std::path::Path;

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Run {
            input,
            dry_run,
            notify_command,
            no_export,
            id_column,
            cap,
            json,
        } => run_command(
            workspace_path,
            input.as_deref(),
            dry_run,
            notify_command.as_deref(),
            no_export,
            id_column.as_deref(),
            cap,
            json,
        ),
        Commands::Status { json } => status_command(workspace_path, json),
        Commands::List { format } => list_command(workspace_path, &format),
        Commands::Show { tab, rows, format } => show_command(workspace_path, &tab, rows, &format),
    }
}

/// Initialize sheetwatch workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // For init, always create in the specified directory rather than
    // searching parent directories for an existing workspace
    let workspace = SheetwatchWorkspace::create_new(root.to_path_buf())?;

    if force {
        // Reset any existing configuration to defaults
        WatchConfig::default().save(&workspace.config_path())?;
    }

    println!(
        "✅ Initialized sheetwatch workspace at: {}",
        workspace.root.display()
    );
    println!(
        "📁 Workspace directory: {}",
        workspace.sheetwatch_dir.display()
    );

    Ok(())
}

/// Run one check against the watched document
fn run_command(
    workspace_path: Option<&Path>,
    input: Option<&str>,
    dry_run: bool,
    notify_command: Option<&str>,
    no_export: bool,
    id_column: Option<&str>,
    cap: Option<usize>,
    json: bool,
) -> Result<()> {
    let workspace = SheetwatchWorkspace::find_or_create(workspace_path)?;
    let mut config = WatchConfig::load_or_default(&workspace.config_path())?;

    // CLI flags override workspace configuration for this run only
    if let Some(id_column) = id_column {
        config.id_column = id_column.to_string();
    }
    if let Some(cap) = cap {
        config.tab_change_cap = cap;
    }
    if let Some(command) = notify_command {
        config.notify_command = Some(command.to_string());
    }

    let locator = match input {
        Some(input) => input.to_string(),
        None => config.source.clone().ok_or_else(|| {
            SheetwatchError::invalid_input(
                "no document given; pass one or set \"source\" in the workspace config",
            )
        })?,
    };

    let source = source_for_locator(&locator)?;

    let mut coordinator = RunCoordinator::new(workspace.clone(), config.clone(), source)
        .with_notifier(Box::new(FileNotifier::new(workspace.reports_dir.clone())));

    if let Some(command) = &config.notify_command {
        coordinator = coordinator.with_notifier(Box::new(CommandNotifier::new(
            command.clone(),
            config.notify_timeout_ms,
        )));
    }

    if config.export_changed_tabs && !no_export {
        coordinator = coordinator.with_exporter(Box::new(CsvExporter));
    }

    // Progress spinners would corrupt machine-readable output
    if !json {
        coordinator = coordinator.with_progress(ProgressReporter::new_for_run());
    }

    let report = coordinator.run(&locator, dry_run)?;

    if json {
        println!("{}", JsonFormatter::format(&report)?);
    } else {
        PrettyPrinter::print_run_report(&report);
    }

    Ok(())
}

/// Show the last committed state
fn status_command(workspace_path: Option<&Path>, json: bool) -> Result<()> {
    let workspace = SheetwatchWorkspace::find_or_create(workspace_path)?;
    let store = SnapshotStore::new(workspace.clone());
    let state = store.load_state()?;
    let stats = workspace.stats()?;

    if json {
        println!("{}", JsonFormatter::format_status(state.as_ref(), &stats)?);
        return Ok(());
    }

    PrettyPrinter::print_status(state.as_ref(), &stats);

    if let Some(marker) = crate::lock::read_marker(&workspace.lock_path()) {
        println!(
            "⚠️  A run appears active since {} (owner {})",
            marker.started_at.to_rfc3339(),
            marker.owner_id
        );
    }

    Ok(())
}

/// List tabs with committed snapshots
fn list_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let workspace = SheetwatchWorkspace::find_or_create(workspace_path)?;
    let format = OutputFormat::parse(format).map_err(SheetwatchError::invalid_input)?;
    let tabs = workspace.list_snapshot_tabs()?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_tab_list(&tabs),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&tabs)?),
    }

    Ok(())
}

/// Show the committed snapshot of one tab
fn show_command(workspace_path: Option<&Path>, tab: &str, rows: usize, format: &str) -> Result<()> {
    let workspace = SheetwatchWorkspace::find_or_create(workspace_path)?;
    let format = OutputFormat::parse(format).map_err(SheetwatchError::invalid_input)?;
    let store = SnapshotStore::new(workspace);
    let snapshot = store.load_snapshot(tab)?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_snapshot(&snapshot, rows),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&snapshot)?),
    }

    Ok(())
}
