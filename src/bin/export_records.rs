//! Write the CSV export archive without starting the MCP server

use predicare::config::AppConfig;
use predicare::db::{migrations, Database};
use predicare::tools::export;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    config.ensure_dirs()?;
    println!("Database path: {}", config.database_path.display());

    let database = Database::new(&config.database_path)?;
    database.with_conn(migrations::run_migrations)?;

    let summary = export::export_records(&database, &config.export_dir)?;
    println!("Archive: {}", summary.archive_path);
    println!("  meals:      {}", summary.meals);
    println!("  activities: {}", summary.activities);
    println!("  weights:    {}", summary.weights);

    Ok(())
}
