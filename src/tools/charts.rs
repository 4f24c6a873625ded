//! Chart rendering
//!
//! Draws the statistics series with plotters into an RGB buffer and encodes
//! it as PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use serde::Serialize;

use crate::db::Database;
use crate::tools::stats::{daily_stats, DailyStats};

pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 450;

const COLOR_WEIGHT: RGBColor = RGBColor(0, 112, 192);
const COLOR_INTAKE: RGBColor = RGBColor(255, 107, 107);
const COLOR_BURN: RGBColor = RGBColor(78, 205, 196);
const COLOR_CARBS: RGBColor = RGBColor(112, 48, 160);
const COLOR_TARGET: RGBColor = RGBColor(192, 0, 0);

#[derive(Debug, Serialize)]
pub struct ChartFile {
    pub chart: &'static str,
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct RenderChartsResponse {
    pub charts: Vec<ChartFile>,
    /// Charts not drawn because their series was empty
    pub skipped: Vec<&'static str>,
    pub days: usize,
}

/// Days that have a weight entry
pub fn weight_points(days: &[DailyStats]) -> Vec<(NaiveDate, f64)> {
    days.iter()
        .filter_map(|d| d.weight_kg.map(|kg| (d.date, kg)))
        .collect()
}

fn month_day(date: &NaiveDate) -> String {
    date.format("%m/%d").to_string()
}

/// Encode a packed RGB buffer as PNG bytes
pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, String> {
    let img = RgbImage::from_raw(width, height, buffer).ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(png_bytes)
}

/// Weight trend line as PNG bytes
pub fn render_weight_chart(points: &[(NaiveDate, f64)], width: u32, height: u32) -> Result<Vec<u8>, String> {
    if points.is_empty() {
        return Err("No weight data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) - 1.0;
        let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) + 1.0;
        let n = points.len() as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption("Weight (kg)", ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..n.max(1), y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(points.len().min(10))
            .x_label_formatter(&|x| {
                points
                    .get(*x as usize)
                    .filter(|_| *x >= 0)
                    .map(|p| month_day(&p.0))
                    .unwrap_or_default()
            })
            .y_desc("kg")
            .draw()
            .map_err(|e| e.to_string())?;

        let series: Vec<(i32, f64)> = points.iter().enumerate().map(|(i, p)| (i as i32, p.1)).collect();

        chart
            .draw_series(LineSeries::new(series.clone(), COLOR_WEIGHT.stroke_width(2)))
            .map_err(|e| e.to_string())?;
        chart
            .draw_series(series.iter().map(|(x, y)| Circle::new((*x, *y), 4, COLOR_WEIGHT.filled())))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

/// Grouped intake/burn bars with the calorie target as a reference line
pub fn render_calorie_chart(
    days: &[DailyStats],
    target_kcal: Option<i64>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    if days.is_empty() {
        return Err("No calorie data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let n = days.len() as f64;
        let data_max = days
            .iter()
            .map(|d| d.intake_kcal.max(d.burn_kcal))
            .fold(0.0, f64::max);
        let y_max = data_max.max(target_kcal.unwrap_or(0) as f64) * 1.1 + 10.0;

        let mut chart = ChartBuilder::on(&root)
            .caption("Calories in / out (kcal)", ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(n - 0.5), 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(days.len().min(10))
            .x_label_formatter(&|x| {
                let i = x.round();
                if i >= 0.0 && (i as usize) < days.len() && (x - i).abs() < 1e-6 {
                    month_day(&days[i as usize].date)
                } else {
                    String::new()
                }
            })
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(days.iter().enumerate().map(|(i, d)| {
                let x = i as f64;
                Rectangle::new([(x - 0.35, 0.0), (x, d.intake_kcal)], COLOR_INTAKE.filled())
            }))
            .map_err(|e| e.to_string())?
            .label("Intake")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], COLOR_INTAKE.filled()));

        chart
            .draw_series(days.iter().enumerate().map(|(i, d)| {
                let x = i as f64;
                Rectangle::new([(x, 0.0), (x + 0.35, d.burn_kcal)], COLOR_BURN.filled())
            }))
            .map_err(|e| e.to_string())?
            .label("Burn")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], COLOR_BURN.filled()));

        if let Some(target) = target_kcal {
            let y = target as f64;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(-0.5, y), (n - 0.5, y)],
                    COLOR_TARGET.mix(0.7).stroke_width(2),
                )))
                .map_err(|e| e.to_string())?
                .label("Target")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], COLOR_TARGET.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

/// Daily carbohydrate line with the carb target as a reference line
pub fn render_carb_chart(
    days: &[DailyStats],
    target_grams: Option<i64>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    if days.is_empty() {
        return Err("No carbohydrate data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let n = days.len() as i32;
        let data_max = days.iter().map(|d| d.carb_grams).fold(0.0, f64::max);
        let y_max = data_max.max(target_grams.unwrap_or(0) as f64) * 1.1 + 5.0;

        let mut chart = ChartBuilder::on(&root)
            .caption("Carbohydrates (g)", ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..n.max(1), 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(days.len().min(10))
            .x_label_formatter(&|x| {
                days.get(*x as usize)
                    .filter(|_| *x >= 0)
                    .map(|d| month_day(&d.date))
                    .unwrap_or_default()
            })
            .y_desc("g")
            .draw()
            .map_err(|e| e.to_string())?;

        if let Some(target) = target_grams {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(0, target as f64), (n, target as f64)],
                    COLOR_TARGET.mix(0.7).stroke_width(1),
                )))
                .map_err(|e| e.to_string())?;
        }

        let series: Vec<(i32, f64)> = days.iter().enumerate().map(|(i, d)| (i as i32, d.carb_grams)).collect();
        chart
            .draw_series(LineSeries::new(series.clone(), COLOR_CARBS.stroke_width(2)))
            .map_err(|e| e.to_string())?;
        chart
            .draw_series(series.iter().map(|(x, y)| Circle::new((*x, *y), 3, COLOR_CARBS.filled())))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

fn write_chart(dir: &Path, name: &str, stamp: &str, png: &[u8]) -> Result<PathBuf, String> {
    let path = dir.join(format!("{}_{}.png", name, stamp));
    std::fs::write(&path, png).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(path)
}

/// Render the weight, calorie and carbohydrate charts into `out_dir`
pub fn render_charts(
    db: &Database,
    out_dir: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    now: NaiveDateTime,
) -> Result<RenderChartsResponse, String> {
    let stats = daily_stats(db, start, end)?;
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create chart directory {}: {}", out_dir.display(), e))?;

    let stamp = now.format("%Y%m%d_%H%M%S").to_string();
    let mut charts = Vec::new();
    let mut skipped = Vec::new();

    let weights = weight_points(&stats.days);
    if weights.is_empty() {
        skipped.push("weight_trend");
    } else {
        let png = render_weight_chart(&weights, CHART_WIDTH, CHART_HEIGHT)?;
        let path = write_chart(out_dir, "weight_trend", &stamp, &png)?;
        charts.push(ChartFile { chart: "weight_trend", file_path: path.display().to_string() });
    }

    if stats.days.is_empty() {
        skipped.push("calories");
        skipped.push("carbs");
    } else {
        let png = render_calorie_chart(&stats.days, stats.daily_calorie_target, CHART_WIDTH, CHART_HEIGHT)?;
        let path = write_chart(out_dir, "calories", &stamp, &png)?;
        charts.push(ChartFile { chart: "calories", file_path: path.display().to_string() });

        let png = render_carb_chart(&stats.days, stats.daily_carb_target_g, CHART_WIDTH, CHART_HEIGHT)?;
        let path = write_chart(out_dir, "carbs", &stamp, &png)?;
        charts.push(ChartFile { chart: "carbs", file_path: path.display().to_string() });
    }

    tracing::info!("Rendered {} chart(s) into {}", charts.len(), out_dir.display());

    Ok(RenderChartsResponse {
        charts,
        skipped,
        days: stats.days.len(),
    })
}
