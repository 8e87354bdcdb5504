//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use sheetwatch::cli::{Cli, Commands, OutputFormat};

#[test]
fn test_cli_init_command() {
    let cli = Cli::try_parse_from(["sheetwatch", "init"]).unwrap();
    match cli.command {
        Commands::Init { force } => {
            assert!(!force);
        }
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_cli_init_command_with_force() {
    let cli = Cli::try_parse_from(["sheetwatch", "init", "--force"]).unwrap();
    match cli.command {
        Commands::Init { force } => {
            assert!(force);
        }
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_cli_run_command_defaults() {
    let cli = Cli::try_parse_from(["sheetwatch", "run", "data.json"]).unwrap();
    match cli.command {
        Commands::Run {
            input,
            dry_run,
            notify_command,
            no_export,
            id_column,
            cap,
            json,
        } => {
            assert_eq!(input.as_deref(), Some("data.json"));
            assert!(!dry_run);
            assert!(notify_command.is_none());
            assert!(!no_export);
            assert!(id_column.is_none());
            assert!(cap.is_none());
            assert!(!json);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_run_command_without_input() {
    // The document locator can come from workspace config instead
    let cli = Cli::try_parse_from(["sheetwatch", "run"]).unwrap();
    match cli.command {
        Commands::Run { input, .. } => {
            assert!(input.is_none());
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_run_command_with_options() {
    let cli = Cli::try_parse_from([
        "sheetwatch",
        "run",
        "data.json",
        "--dry-run",
        "--notify-command",
        "cat > /dev/null",
        "--no-export",
        "--id-column",
        "SKU",
        "--cap",
        "50",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Run {
            input,
            dry_run,
            notify_command,
            no_export,
            id_column,
            cap,
            json,
        } => {
            assert_eq!(input.as_deref(), Some("data.json"));
            assert!(dry_run);
            assert_eq!(notify_command.as_deref(), Some("cat > /dev/null"));
            assert!(no_export);
            assert_eq!(id_column.as_deref(), Some("SKU"));
            assert_eq!(cap, Some(50));
            assert!(json);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_status_command() {
    let cli = Cli::try_parse_from(["sheetwatch", "status"]).unwrap();
    match cli.command {
        Commands::Status { json } => {
            assert!(!json);
        }
        _ => panic!("Expected Status command"),
    }
}

#[test]
fn test_cli_status_command_json() {
    let cli = Cli::try_parse_from(["sheetwatch", "status", "--json"]).unwrap();
    match cli.command {
        Commands::Status { json } => {
            assert!(json);
        }
        _ => panic!("Expected Status command"),
    }
}

#[test]
fn test_cli_list_command() {
    let cli = Cli::try_parse_from(["sheetwatch", "list"]).unwrap();
    match cli.command {
        Commands::List { format } => {
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected List command"),
    }
}

#[test]
fn test_cli_list_command_with_format() {
    let cli = Cli::try_parse_from(["sheetwatch", "list", "--format", "json"]).unwrap();
    match cli.command {
        Commands::List { format } => {
            assert_eq!(format, "json");
        }
        _ => panic!("Expected List command"),
    }
}

#[test]
fn test_cli_show_command() {
    let cli = Cli::try_parse_from(["sheetwatch", "show", "Products"]).unwrap();
    match cli.command {
        Commands::Show { tab, rows, format } => {
            assert_eq!(tab, "Products");
            assert_eq!(rows, 20);
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected Show command"),
    }
}

#[test]
fn test_cli_show_command_with_options() {
    let cli = Cli::try_parse_from([
        "sheetwatch",
        "show",
        "Products",
        "--rows",
        "5",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Show { tab, rows, format } => {
            assert_eq!(tab, "Products");
            assert_eq!(rows, 5);
            assert_eq!(format, "json");
        }
        _ => panic!("Expected Show command"),
    }
}

#[test]
fn test_cli_global_options() {
    let cli = Cli::try_parse_from(["sheetwatch", "--workspace", "/tmp/test", "--verbose", "init"])
        .unwrap();

    assert_eq!(cli.workspace.unwrap().to_str().unwrap(), "/tmp/test");
    assert!(cli.verbose);
}

#[test]
fn test_cli_global_options_after_subcommand() {
    let cli = Cli::try_parse_from(["sheetwatch", "status", "--workspace", "/tmp/test"]).unwrap();
    assert_eq!(cli.workspace.unwrap().to_str().unwrap(), "/tmp/test");
}

#[test]
fn test_output_format_parse() {
    assert!(matches!(
        OutputFormat::parse("pretty"),
        Ok(OutputFormat::Pretty)
    ));
    assert!(matches!(OutputFormat::parse("json"), Ok(OutputFormat::Json)));

    // Test case insensitive
    assert!(matches!(
        OutputFormat::parse("PRETTY"),
        Ok(OutputFormat::Pretty)
    ));
    assert!(matches!(OutputFormat::parse("Json"), Ok(OutputFormat::Json)));

    // Test invalid
    assert!(OutputFormat::parse("yaml").is_err());
    assert!(OutputFormat::parse("").is_err());
}

#[test]
fn test_cli_missing_required_args() {
    // Missing tab name for show
    assert!(Cli::try_parse_from(["sheetwatch", "show"]).is_err());

    // Missing subcommand entirely
    assert!(Cli::try_parse_from(["sheetwatch"]).is_err());
}

#[test]
fn test_cli_invalid_cap_values() {
    assert!(Cli::try_parse_from(["sheetwatch", "run", "data.json", "--cap", "0"]).is_err());
    assert!(Cli::try_parse_from(["sheetwatch", "run", "data.json", "--cap", "-5"]).is_err());
    assert!(Cli::try_parse_from(["sheetwatch", "run", "data.json", "--cap", "abc"]).is_err());

    let cli = Cli::try_parse_from(["sheetwatch", "run", "data.json", "--cap", "1"]).unwrap();
    match cli.command {
        Commands::Run { cap, .. } => assert_eq!(cap, Some(1)),
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_cli_invalid_format_parses() {
    // Format validation happens at runtime, not at CLI parsing time
    assert!(Cli::try_parse_from(["sheetwatch", "list", "--format", "invalid"]).is_ok());
    assert!(Cli::try_parse_from(["sheetwatch", "show", "Products", "--format", "invalid"]).is_ok());
}

#[test]
fn test_cli_help_messages() {
    // Test that help can be generated without panicking
    let result = Cli::try_parse_from(["sheetwatch", "--help"]);
    assert!(result.is_err()); // Help exits with error code

    let result = Cli::try_parse_from(["sheetwatch", "run", "--help"]);
    assert!(result.is_err()); // Help exits with error code
}

#[test]
fn test_cli_version() {
    let result = Cli::try_parse_from(["sheetwatch", "--version"]);
    assert!(result.is_err()); // Version exits with error code
}

#[test]
fn test_path_handling() {
    let cli = Cli::try_parse_from(["sheetwatch", "run", "/absolute/path/data.json"]).unwrap();
    match cli.command {
        Commands::Run { input, .. } => {
            assert_eq!(input.as_deref(), Some("/absolute/path/data.json"));
        }
        _ => panic!("Expected Run command"),
    }

    let cli = Cli::try_parse_from(["sheetwatch", "run", "./relative/tabs"]).unwrap();
    match cli.command {
        Commands::Run { input, .. } => {
            assert_eq!(input.as_deref(), Some("./relative/tabs"));
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_special_characters_in_tab_names() {
    let cli = Cli::try_parse_from(["sheetwatch", "show", "Q1/Q2 Forecast"]).unwrap();
    match cli.command {
        Commands::Show { tab, .. } => {
            assert_eq!(tab, "Q1/Q2 Forecast");
        }
        _ => panic!("Expected Show command"),
    }

    // Unicode tab names
    let cli = Cli::try_parse_from(["sheetwatch", "show", "予算"]).unwrap();
    match cli.command {
        Commands::Show { tab, .. } => {
            assert_eq!(tab, "予算");
        }
        _ => panic!("Expected Show command"),
    }
}
