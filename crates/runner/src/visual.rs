//! Pixel comparison of a captured screenshot against its baseline

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{GenericImageView, Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shotdiff_common::{slugify, DiffImageResult, Error, ReportMeta, Result, Screenshot};
use tracing::{debug, info, warn};

use crate::collaborators::ResultComparer;

/// Result of a visual comparison
#[derive(Debug, Clone)]
pub struct VisualDiff {
    /// Whether the images match (within threshold)
    pub matches: bool,

    /// Percentage of pixels that differ
    pub diff_percent: f64,

    pub diff_pixels: u64,
    pub total_pixels: u64,

    /// Path to the diff image (if generated)
    pub diff_image_path: Option<PathBuf>,
}

/// Configuration for visual comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Directory diff images are written to
    pub diff_dir: PathBuf,

    /// Percentage of differing pixels tolerated (0.0 - 100.0)
    pub threshold: f64,

    /// Per-channel difference ignored as anti-aliasing noise
    pub tolerance: u8,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            diff_dir: PathBuf::from("screenshot-report/diffs"),
            threshold: 0.5,
            tolerance: 5,
        }
    }
}

/// Compares screenshots with the `image` crate
#[derive(Debug, Clone)]
pub struct ImageDiffer {
    config: VisualConfig,
}

impl ImageDiffer {
    pub fn new(config: VisualConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Compare `actual` against `baseline`, writing `<name>-diff.png` on differences
    pub fn compare_files(&self, name: &str, actual: &Path, baseline: &Path) -> Result<VisualDiff> {
        let actual_hash = hash_file(actual)?;
        let baseline_hash = hash_file(baseline)?;

        let actual_img = image::open(actual)?;

        if actual_hash == baseline_hash {
            debug!("Screenshots match exactly (same hash): {}", name);
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: (actual_img.width() as u64) * (actual_img.height() as u64),
                diff_image_path: None,
            });
        }

        let baseline_img = image::open(baseline)?;
        let (actual_w, actual_h) = actual_img.dimensions();
        let (baseline_w, baseline_h) = baseline_img.dimensions();
        if (actual_w, actual_h) != (baseline_w, baseline_h) {
            warn!(
                "Screenshot dimensions differ for '{}': actual {:?} vs baseline {:?}",
                name,
                (actual_w, actual_h),
                (baseline_w, baseline_h)
            );
        }

        // Pixels outside the overlapping region count as different.
        let width = actual_w.max(baseline_w);
        let height = actual_h.max(baseline_h);
        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = (width as u64) * (height as u64);

        for y in 0..height {
            for x in 0..width {
                let inside = x < actual_w.min(baseline_w) && y < actual_h.min(baseline_h);
                if !inside {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                    continue;
                }

                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);
                if self.pixels_differ(actual_pixel, baseline_pixel) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                } else {
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_percent = if total_pixels == 0 {
            0.0
        } else {
            (diff_pixels as f64 / total_pixels as f64) * 100.0
        };
        let matches = diff_percent <= self.config.threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{}-diff.png", name));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            info!(
                "Visual change in '{}': {:.2}% pixels differ (threshold: {:.2}%)",
                name, diff_percent, self.config.threshold
            );
        }

        Ok(VisualDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
        })
    }

    fn pixels_differ(&self, a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
        let tolerance = self.config.tolerance as i32;
        a.channels()
            .iter()
            .zip(b.channels())
            .any(|(x, y)| (*x as i32 - *y as i32).abs() > tolerance)
    }
}

#[async_trait]
impl ResultComparer for ImageDiffer {
    async fn compare_one_screenshot(
        &self,
        meta: &ReportMeta,
        screenshot: &Screenshot,
    ) -> Result<DiffImageResult> {
        let Some(actual) = screenshot.actual_image_file.clone() else {
            warn!("{} was not captured; treating it as changed", screenshot);
            return Ok(DiffImageResult::changed(None, 100.0));
        };
        if !tokio::fs::try_exists(&actual).await? {
            warn!("Capture {} is missing; treating {} as changed", actual.display(), screenshot);
            return Ok(DiffImageResult::changed(None, 100.0));
        }
        let Some(baseline) = screenshot.expected_image_file.clone() else {
            info!("No baseline for {}; treating it as changed", screenshot);
            return Ok(DiffImageResult::changed(None, 100.0));
        };
        if !tokio::fs::try_exists(&baseline).await? {
            info!("Baseline {} is missing; treating {} as changed", baseline.display(), screenshot);
            return Ok(DiffImageResult::changed(None, 100.0));
        }

        let name = format!("{}-{}", slugify(&meta.diff_base), screenshot.slug());
        let label = screenshot.to_string();
        let differ = self.clone();
        let diff = tokio::task::spawn_blocking(move || differ.compare_files(&name, &actual, &baseline))
            .await
            .map_err(|e| Error::compare(label.clone(), e.to_string()))?
            .map_err(|e| Error::compare(label, e.to_string()))?;

        Ok(DiffImageResult {
            has_changed: !diff.matches,
            diff_image_file: diff.diff_image_path,
            diff_percent: diff.diff_percent,
        })
    }
}

/// Hash a file using SHA256
fn hash_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
