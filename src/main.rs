use anyhow::{bail, Context, Result};
use std::env;
use tracing::info;

use spoolstock::{telemetry, Config, DbType, SqliteVendorStore, VendorFilter};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = Config::from_env().context("Failed to read configuration")?;
    telemetry::init_tracing(&config.log_level, config.log_format);

    match args.get(1).map(String::as_str) {
        Some("migrate") => run_migrate(&config),
        Some("vendors") => run_vendors(&config, &args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("spoolstock {}", spoolstock::VERSION);
    println!();
    println!("Usage:");
    println!("  spoolstock migrate                 create the vendor database schema");
    println!("  spoolstock vendors [--name NAME]   print vendors as JSON");
    println!();
    println!("Run the HTTP API with: spoolstock-server");
}

/// A memory store starts empty in every process, so CLI commands need the database
fn require_database(config: &Config, command: &str) -> Result<()> {
    if config.db_type == DbType::Memory {
        bail!(
            "`{}` needs SPOOLSTOCK_DB_TYPE=sqlite; a memory store is empty outside the server",
            command
        );
    }
    Ok(())
}

fn run_migrate(config: &Config) -> Result<()> {
    require_database(config, "migrate")?;

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    let path = config.db_path();
    let store = SqliteVendorStore::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    info!(path = %path.display(), vendors = store.count()?, "database ready");
    Ok(())
}

fn run_vendors(config: &Config, args: &[String]) -> Result<()> {
    let filter = match args {
        [] => VendorFilter::all(),
        [flag, name] if flag == "--name" => VendorFilter::by_name(name.clone()),
        _ => bail!("usage: spoolstock vendors [--name NAME]"),
    };
    require_database(config, "vendors")?;

    let store = config.open_store()?;
    let vendors = store.list(&filter)?;

    println!("{}", serde_json::to_string_pretty(&vendors)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendors_rejects_memory_store() {
        let config = Config {
            db_type: DbType::Memory,
            ..Config::default()
        };

        let err = run_vendors(&config, &[]).unwrap_err();
        assert!(err.to_string().contains("vendors"));
        assert!(run_migrate(&config).is_err());
    }
}
