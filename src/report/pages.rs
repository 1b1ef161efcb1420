//! Visual review pages and the bucket distribution chart, rendered with
//! plotters.
//!
//! Each reviewable record gets one PNG page: the original image, the
//! contrast-enhanced image the OCR backend actually saw, and the textual
//! comparison. A failed page is skipped with a warning; it never aborts
//! report generation.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use image::imageops::FilterType;
use log::warn;
use plotters::element::BitMapElement;
use plotters::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dataset::DatasetItem;
use crate::eval::{BatchSummary, Bucket, BucketCounts, DiscrepancyRecord, NoPlateRecord};
use crate::ocr::enhance_contrast;
use crate::paths::OutputPaths;

const PAGE_WIDTH: u32 = 1400;
const PAGE_HEIGHT: u32 = 480;
const PANEL_WIDTH: u32 = 420;
const PANEL_HEIGHT: u32 = 360;
const PANEL_TOP: i32 = 90;
const TEXT_X: i32 = 920;

/// Renders one page per record with a non-zero discrepancy and per no-plate
/// record. Returns the paths of the pages that were written.
pub fn render_review_pages(
    summary: &BatchSummary,
    items: &[DatasetItem],
    paths: &OutputPaths,
    contrast_boost: f32,
) -> Result<Vec<PathBuf>> {
    let by_id: HashMap<&str, &DatasetItem> =
        items.iter().map(|item| (item.image_id.as_str(), item)).collect();

    let mut pages = Vec::new();
    for record in summary.scored.iter().filter(|r| r.discrepancy > 0) {
        match render_discrepancy_page(record, &by_id, paths, contrast_boost) {
            Ok(page) => pages.push(page),
            Err(e) => warn!("skipping review page for {}: {}", record.image_id, e),
        }
    }
    for record in &summary.no_plate {
        match render_no_plate_page(record, &by_id, paths, contrast_boost) {
            Ok(page) => pages.push(page),
            Err(e) => warn!("skipping review page for {}: {}", record.image_id, e),
        }
    }
    Ok(pages)
}

fn render_discrepancy_page(
    record: &DiscrepancyRecord,
    by_id: &HashMap<&str, &DatasetItem>,
    paths: &OutputPaths,
    contrast_boost: f32,
) -> Result<PathBuf> {
    let lines = vec![
        (format!("Real plate: {}", record.ground_truth), BLACK),
        (format!("Predicted plate: {}", record.prediction), BLACK),
        (format!("Discrepancy: {}", record.discrepancy), BLACK),
    ];
    render_page(&record.image_id, by_id, paths, contrast_boost, &lines)
}

fn render_no_plate_page(
    record: &NoPlateRecord,
    by_id: &HashMap<&str, &DatasetItem>,
    paths: &OutputPaths,
    contrast_boost: f32,
) -> Result<PathBuf> {
    let verdict = match &record.prediction {
        Some(_) => "Predicted plate: (empty)".to_string(),
        None => "No number plate detected".to_string(),
    };
    let lines = vec![
        (format!("Real plate: {}", record.ground_truth), BLACK),
        (verdict, RED),
    ];
    render_page(&record.image_id, by_id, paths, contrast_boost, &lines)
}

fn render_page(
    image_id: &str,
    by_id: &HashMap<&str, &DatasetItem>,
    paths: &OutputPaths,
    contrast_boost: f32,
    lines: &[(String, RGBColor)],
) -> Result<PathBuf> {
    let item = by_id
        .get(image_id)
        .ok_or_else(|| anyhow!("no dataset item for {image_id}"))?;
    let original = image::open(&item.image_path)
        .context(format!("Failed to reopen {}", item.image_path.display()))?;
    let enhanced = enhance_contrast(&original, contrast_boost);

    let page_path = paths.review_page(image_id);
    {
        let root =
            BitMapBackend::new(&page_path, (PAGE_WIDTH, PAGE_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let title_font = ("sans-serif", 28).into_font().style(FontStyle::Bold);
        root.draw_text(
            &format!("OCR result for {image_id}"),
            &title_font.color(&BLACK),
            (20, 20),
        )?;

        draw_image_panel(&root, &original, 20, "Original")?;
        draw_image_panel(&root, &enhanced, 40 + PANEL_WIDTH as i32, "Contrast enhanced")?;

        let label_font = ("sans-serif", 20).into_font();
        let mut y = PANEL_TOP + 40;
        for (line, color) in lines {
            root.draw_text(line, &label_font.color(color), (TEXT_X, y))?;
            y += 34;
        }

        root.present()
            .context(format!("Failed to save {}", page_path.display()))?;
    }
    Ok(page_path)
}

fn draw_image_panel(
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    image: &DynamicImage,
    x: i32,
    caption: &str,
) -> Result<()> {
    let caption_font = ("sans-serif", 16).into_font();
    root.draw_text(caption, &caption_font.color(&BLACK), (x, PANEL_TOP - 24))?;

    let scaled = fit_into(image, PANEL_WIDTH, PANEL_HEIGHT);
    let size = (scaled.width(), scaled.height());
    let raw = scaled.to_rgb8().into_raw();
    // Built from the raw RGB buffer, so the element is independent of the
    // image crate version plotters links against.
    let element: BitMapElement<(i32, i32)> =
        BitMapElement::with_owned_buffer((x, PANEL_TOP), size, raw)
            .ok_or_else(|| anyhow!("bitmap buffer size mismatch"))?;
    root.draw(&element)?;
    Ok(())
}

/// Scales an image to fit the panel while preserving aspect ratio.
fn fit_into(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    image.resize(max_width, max_height, FilterType::Triangle)
}

/// Renders the five-bucket discrepancy distribution as a bar chart.
pub fn render_bucket_chart(counts: &BucketCounts, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = Bucket::ALL
        .iter()
        .map(|bucket| counts.get(*bucket))
        .max()
        .unwrap_or(0)
        .max(1)
        + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Discrepancy distribution", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0usize..Bucket::ALL.len()).into_segmented(), 0usize..y_max)
        .context("Failed to build bucket chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) if *i < Bucket::ALL.len() => {
                Bucket::ALL[*i].label().to_string()
            }
            _ => String::new(),
        })
        .y_desc("Images")
        .draw()
        .context("Failed to draw bucket chart mesh")?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.6).filled())
            .margin(8)
            .data(
                Bucket::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, bucket)| (i, counts.get(*bucket))),
            ),
    )?;

    root.present()
        .context(format!("Failed to save {}", path.display()))?;
    Ok(())
}
