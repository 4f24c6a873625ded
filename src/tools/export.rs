//! CSV export
//!
//! Dumps the meals, activities and weights tables as CSV files inside a
//! single zip archive.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::db::Database;
use crate::models::{ActivityRecord, MealRecord, WeightEntry};

pub const ARCHIVE_NAME: &str = "export_predicare.zip";

const MEALS_HEADER: &[&str] = &["id", "dt", "label", "items", "calories", "carbs_g", "photo_path", "created_at"];
const ACTIVITIES_HEADER: &[&str] = &[
    "id", "dt", "kind", "minutes", "steps", "distance_km", "pace_kmh", "calories", "created_at",
];
const WEIGHTS_HEADER: &[&str] = &["id", "d", "weight_kg", "created_at"];

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub archive_path: String,
    pub meals: usize,
    pub activities: usize,
    pub weights: usize,
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_document(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let line = row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn meals_csv(meals: &[MealRecord]) -> String {
    csv_document(
        MEALS_HEADER,
        meals.iter().map(|m| {
            vec![
                m.id.to_string(),
                m.timestamp.clone(),
                m.label.as_str().to_string(),
                m.items.clone(),
                m.calories.to_string(),
                m.carb_grams.to_string(),
                opt(m.photo_path.as_deref()),
                m.created_at.clone(),
            ]
        }),
    )
}

pub fn activities_csv(activities: &[ActivityRecord]) -> String {
    csv_document(
        ACTIVITIES_HEADER,
        activities.iter().map(|a| {
            vec![
                a.id.to_string(),
                a.timestamp.clone(),
                a.kind.as_str().to_string(),
                a.minutes.to_string(),
                opt(a.steps),
                opt(a.distance_km),
                opt(a.pace_kmh),
                a.calories.to_string(),
                a.created_at.clone(),
            ]
        }),
    )
}

pub fn weights_csv(weights: &[WeightEntry]) -> String {
    csv_document(
        WEIGHTS_HEADER,
        weights.iter().map(|w| {
            vec![
                w.id.to_string(),
                w.date.to_string(),
                w.weight_kg.to_string(),
                w.created_at.clone(),
            ]
        }),
    )
}

fn write_archive(path: &Path, files: &[(&str, String)]) -> zip::result::ZipResult<()> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);

    for (name, contents) in files {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(*name, options)?;
        writer.write_all(contents.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

/// Write every record into `<export_dir>/export_predicare.zip`, replacing any
/// earlier archive
pub fn export_records(db: &Database, export_dir: &Path) -> Result<ExportResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meals = MealRecord::list_all(&conn).map_err(|e| format!("Failed to load meals: {}", e))?;
    let activities =
        ActivityRecord::list_all(&conn).map_err(|e| format!("Failed to load activities: {}", e))?;
    let weights = WeightEntry::list_all(&conn).map_err(|e| format!("Failed to load weights: {}", e))?;
    drop(conn);

    std::fs::create_dir_all(export_dir)
        .map_err(|e| format!("Failed to create export directory {}: {}", export_dir.display(), e))?;
    let archive_path: PathBuf = export_dir.join(ARCHIVE_NAME);

    let files = [
        ("meals.csv", meals_csv(&meals)),
        ("activities.csv", activities_csv(&activities)),
        ("weights.csv", weights_csv(&weights)),
    ];
    write_archive(&archive_path, &files)
        .map_err(|e| format!("Failed to write {}: {}", archive_path.display(), e))?;

    tracing::info!(
        "Exported {} meals, {} activities, {} weights to {}",
        meals.len(),
        activities.len(),
        weights.len(),
        archive_path.display()
    );

    Ok(ExportResponse {
        archive_path: archive_path.display().to_string(),
        meals: meals.len(),
        activities: activities.len(),
        weights: weights.len(),
    })
}
