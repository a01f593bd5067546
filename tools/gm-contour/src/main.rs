//! Contour-map renderer: turns a saved metric bundle into one filled
//! contour PNG per metric, plus a re-loadable figure JSON so maps can be
//! re-rendered without re-running the grid sweep.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use gm_core::field::{FieldBundle, MetricField};

/// Filled-contour level count (values are quantized to these bands).
const N_LEVELS: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "gm-contour",
    about = "Render filled-contour maps from a saved intensity-measure bundle"
)]
struct Args {
    /// Metric bundle written by gm-map
    #[arg(short, long, default_value = "gmMetricsValues.json.gz")]
    input: PathBuf,

    /// Output directory for PNGs and figure JSON files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Approximate output image width in pixels
    #[arg(long, default_value = "600")]
    width: u32,
}

/// Everything needed to re-render one map later: the field itself plus
/// the styling that was applied.
#[derive(Serialize, Deserialize)]
struct FigureDoc {
    title: String,
    units: String,
    cmap: String,
    levels: usize,
    field: MetricField,
}

// ── Colour helpers ────────────────────────────────────────────────────────────

/// Inferno colormap: linear interpolation between sampled control points.
fn inferno(t: f64) -> [u8; 3] {
    const STOPS: [(f64, [f64; 3]); 9] = [
        (0.000, [0.0, 0.0, 4.0]),
        (0.125, [31.0, 12.0, 72.0]),
        (0.250, [85.0, 15.0, 109.0]),
        (0.375, [136.0, 34.0, 106.0]),
        (0.500, [186.0, 54.0, 85.0]),
        (0.625, [227.0, 89.0, 51.0]),
        (0.750, [249.0, 140.0, 10.0]),
        (0.875, [249.0, 201.0, 50.0]),
        (1.000, [252.0, 255.0, 164.0]),
    ];
    let t = t.clamp(0.0, 1.0);
    for w in STOPS.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return [
                (c0[0] + f * (c1[0] - c0[0])) as u8,
                (c0[1] + f * (c1[1] - c0[1])) as u8,
                (c0[2] + f * (c1[2] - c0[2])) as u8,
            ];
        }
    }
    [252, 255, 164]
}

/// Quantize to N_LEVELS bands before colour lookup (contourf look).
fn level_color(t: f64) -> [u8; 3] {
    let band = ((t * N_LEVELS as f64) as usize).min(N_LEVELS - 1);
    inferno(band as f64 / (N_LEVELS - 1) as f64)
}

/// Axis units for a metric label: acceleration-like metrics in cm/s/s,
/// velocity-like in cm/s, displacement in cm.
fn units_for(label: &str) -> &'static str {
    if label.contains("RSA") || label.contains("PGA") {
        "cm/s/s"
    } else if label.contains("PGV") || label.contains("CAV") {
        "cm/s"
    } else if label.contains("PGD") {
        "cm"
    } else {
        ""
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn render(field: &MetricField, width: u32) -> image::RgbImage {
    let scale = (width as usize / field.nx.max(1)).max(1);
    let (w, h) = (field.nx * scale, field.ny * scale);
    let (lo, hi) = (field.min_value(), field.max_value());
    let range = (hi - lo).max(f64::MIN_POSITIVE);

    let mut img = image::RgbImage::new(w as u32, h as u32);
    for py in 0..h {
        // Row 0 of the field is min_y; image rows grow downwards, so
        // flip vertically to keep north up.
        let j = field.ny - 1 - py / scale;
        for px in 0..w {
            let i = px / scale;
            let v = field.get(j, i);
            let px_color = if v.is_nan() {
                [255u8, 255, 255]
            } else {
                level_color((v - lo) / range)
            };
            img.put_pixel(px as u32, py as u32, image::Rgb(px_color));
        }
    }
    img
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bundle = FieldBundle::load_gz(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    for (label, field) in &bundle.fields {
        let img = render(field, args.width);
        let png_path = args.out_dir.join(format!("gmContour{label}.png"));
        img.save(&png_path)
            .with_context(|| format!("saving {}", png_path.display()))?;

        let doc = FigureDoc {
            title: label.clone(),
            units: units_for(label).to_string(),
            cmap: "inferno".to_string(),
            levels: N_LEVELS,
            field: field.clone(),
        };
        let json_path = args.out_dir.join(format!("gmContour{label}.json"));
        fs::write(&json_path, serde_json::to_string(&doc)?)
            .with_context(|| format!("saving {}", json_path.display()))?;

        println!(
            "Wrote {} ({} .. {} {})",
            png_path.display(),
            field.min_value(),
            field.max_value(),
            doc.units
        );
    }
    Ok(())
}
