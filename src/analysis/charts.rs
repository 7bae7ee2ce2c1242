//! PNG rendering of stat distributions and correlations
//!
//! Plain raster charts: bars for histograms, coloured cells for the heatmap.
//! No axes or text; the correlation values also go to a CSV next to the image.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use super::stats::{correlation_matrix, stat_column, Histogram};
use crate::data::Pokedex;
use crate::{Result, Stat};

pub const HISTOGRAM_BINS: usize = 30;
const HIST_WIDTH: u32 = 600;
const HIST_HEIGHT: u32 = 400;
const HIST_MARGIN: u32 = 20;
const HEATMAP_CELL_SIZE: u32 = 60;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);
const BAR_EDGE: Rgb<u8> = Rgb([70, 130, 180]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);

/// Write every figure into `output_dir`, returning the paths written
pub fn write_figures(pokedex: &Pokedex, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    for stat in Stat::ALL {
        let hist = Histogram::new(&stat_column(pokedex, stat), HISTOGRAM_BINS);
        let path = output_dir.join(format!("{}_distribution.png", stat.name()));
        render_histogram(&hist).save(&path)?;
        log::debug!("{}: range {}..{}, tallest bin {}", stat, hist.min, hist.max, hist.max_count());
        written.push(path);
    }

    let matrix = correlation_matrix(pokedex);
    let png_path = output_dir.join("base_stats_correlation.png");
    render_heatmap(&matrix).save(&png_path)?;
    written.push(png_path);

    let csv_path = output_dir.join("base_stats_correlation.csv");
    write_correlation_csv(&matrix, &csv_path)?;
    written.push(csv_path);

    log::info!("Wrote {} figures to {}", written.len(), output_dir.display());
    Ok(written)
}

pub fn render_histogram(hist: &Histogram) -> RgbImage {
    let mut img = RgbImage::from_pixel(HIST_WIDTH, HIST_HEIGHT, BACKGROUND);
    let plot_w = HIST_WIDTH - 2 * HIST_MARGIN;
    let plot_h = HIST_HEIGHT - 2 * HIST_MARGIN;
    let baseline = HIST_HEIGHT - HIST_MARGIN;

    let bins = hist.counts.len() as u32;
    let bar_w = (plot_w / bins.max(1)).max(1);
    let tallest = hist.max_count().max(1) as f64;

    for (i, &count) in hist.counts.iter().enumerate() {
        let bar_h = ((count as f64 / tallest) * plot_h as f64).round() as u32;
        if bar_h == 0 {
            continue;
        }
        let x0 = HIST_MARGIN + i as u32 * bar_w;
        let y0 = baseline - bar_h;
        fill_rect(&mut img, x0, y0, bar_w, bar_h, BAR);
        // edges
        fill_rect(&mut img, x0, y0, bar_w, 1, BAR_EDGE);
        fill_rect(&mut img, x0, y0, 1, bar_h, BAR_EDGE);
        fill_rect(&mut img, x0 + bar_w - 1, y0, 1, bar_h, BAR_EDGE);
    }

    fill_rect(&mut img, HIST_MARGIN, baseline, plot_w, 1, AXIS);
    fill_rect(&mut img, HIST_MARGIN, HIST_MARGIN, 1, plot_h, AXIS);
    img
}

pub fn render_heatmap(matrix: &[Vec<f64>]) -> RgbImage {
    let n = matrix.len() as u32;
    let mut img = RgbImage::from_pixel(
        (n * HEATMAP_CELL_SIZE).max(1),
        (n * HEATMAP_CELL_SIZE).max(1),
        BACKGROUND,
    );
    for (cy, row) in matrix.iter().enumerate() {
        for (cx, &value) in row.iter().enumerate() {
            fill_rect(
                &mut img,
                cx as u32 * HEATMAP_CELL_SIZE,
                cy as u32 * HEATMAP_CELL_SIZE,
                HEATMAP_CELL_SIZE,
                HEATMAP_CELL_SIZE,
                correlation_to_color(value),
            );
        }
    }
    img
}

/// Diverging palette: -1 blue, 0 white, +1 red; NaN grey
pub fn correlation_to_color(value: f64) -> Rgb<u8> {
    if value.is_nan() {
        return Rgb([200, 200, 200]);
    }
    let v = value.clamp(-1.0, 1.0);
    let fade = (255.0 * (1.0 - v.abs())).round() as u8;
    if v >= 0.0 {
        Rgb([255, fade, fade])
    } else {
        Rgb([fade, fade, 255])
    }
}

fn write_correlation_csv(matrix: &[Vec<f64>], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec![String::new()];
    header.extend(Stat::ALL.iter().map(|s| s.name().to_string()));
    wtr.write_record(&header)?;
    for (stat, row) in Stat::ALL.iter().zip(matrix) {
        let mut record = vec![stat.name().to_string()];
        record.extend(row.iter().map(|v| format!("{:.4}", v)));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..(y0 + h) {
        for x in x0..(x0 + w) {
            if x < img.width() && y < img.height() {
                img.put_pixel(x, y, color);
            }
        }
    }
}
