//! Wavefield snapshot renderer: reads one velocity component for every
//! surface station at a chosen time instant and rasterizes the samples
//! into a colormapped PNG plus a tab-delimited (x, y, z, value) dump.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use gm_core::extract::{read_snapshot, N_COMPONENTS};
use gm_core::index::load_chunk_coords;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Component {
    /// Along-strike horizontal velocity
    Strike,
    /// Fault-normal horizontal velocity
    Norm,
    /// Vertical velocity
    Vert,
}

#[derive(Parser, Debug)]
#[command(
    name = "gm-snapshot",
    about = "Render the surface velocity wavefield at a single time instant"
)]
struct Args {
    /// Directory holding surface_coor.txt<N> and gm<N> chunk files
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Snapshot time in seconds
    #[arg(short, long, default_value = "5")]
    time: f64,

    /// Sampling interval of the surface output in seconds
    #[arg(long, default_value = "0.05")]
    dt: f64,

    #[arg(long, value_enum, default_value = "strike")]
    component: Component,

    /// Raster cell size in metres
    #[arg(long, default_value = "500")]
    cell: f64,

    /// Colour scale bounds (m/s), symmetric about zero by default
    #[arg(long, allow_hyphen_values = true, default_value = "-1")]
    vmin: f64,

    #[arg(long, default_value = "1")]
    vmax: f64,

    /// Chunk ids 0..max-chunks are scanned; absent ids are skipped
    #[arg(long, default_value = "1000")]
    max_chunks: u32,

    /// Output file prefix; writes <prefix><time>.png and <prefix><time>.txt
    #[arg(short, long, default_value = "gm")]
    out_prefix: String,
}

/// Plasma colormap: linear interpolation between sampled control points.
fn plasma(t: f64) -> [u8; 3] {
    const STOPS: [(f64, [f64; 3]); 8] = [
        (0.000, [13.0, 8.0, 135.0]),
        (0.143, [84.0, 2.0, 163.0]),
        (0.286, [139.0, 10.0, 165.0]),
        (0.429, [185.0, 50.0, 137.0]),
        (0.571, [219.0, 92.0, 104.0]),
        (0.714, [244.0, 136.0, 73.0]),
        (0.857, [254.0, 188.0, 43.0]),
        (1.000, [240.0, 249.0, 33.0]),
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
    [240, 249, 33]
}

fn main() -> Result<()> {
    let args = Args::parse();
    let component = args.component as usize;
    let time_step = (args.time / args.dt).round() as usize;

    // Gather (x, y, z, value) for every station of every present chunk.
    let mut samples: Vec<[f64; 4]> = Vec::new();
    for chunk_id in 0..args.max_chunks {
        let Some(coords) = load_chunk_coords(&args.data_dir, "surface_coor.txt", chunk_id)?
        else {
            continue;
        };
        let values = read_snapshot(
            &args.data_dir,
            "gm",
            chunk_id,
            coords.len(),
            time_step,
            component,
            N_COMPONENTS,
        )
        .with_context(|| format!("reading snapshot from chunk {chunk_id}"))?;
        for (c, v) in coords.iter().zip(values) {
            samples.push([c[0], c[1], c[2], v]);
        }
    }
    if samples.is_empty() {
        bail!("no station data found under {}", args.data_dir.display());
    }

    // Text dump, 6-decimal tab-delimited.
    let txt_path = format!("{}{}.txt", args.out_prefix, args.time);
    let mut w = BufWriter::new(File::create(&txt_path)?);
    for s in &samples {
        writeln!(w, "{:.6}\t{:.6}\t{:.6}\t{:.6}", s[0], s[1], s[2], s[3])?;
    }
    w.flush()?;
    println!("Wrote {txt_path} ({} stations)", samples.len());

    // Rasterize: splat each sample into its cell; untouched cells stay
    // white. Station layouts are dense enough that nearest-sample
    // splatting reads like the interpolated map.
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in &samples {
        min_x = min_x.min(s[0]);
        max_x = max_x.max(s[0]);
        min_y = min_y.min(s[1]);
        max_y = max_y.max(s[1]);
    }
    let nx = (((max_x - min_x) / args.cell).round() as usize).max(1) + 1;
    let ny = (((max_y - min_y) / args.cell).round() as usize).max(1) + 1;

    let mut cells = vec![f64::NAN; nx * ny];
    for s in &samples {
        let i = (((s[0] - min_x) / (max_x - min_x).max(f64::MIN_POSITIVE)) * (nx - 1) as f64)
            .round() as usize;
        let j = (((s[1] - min_y) / (max_y - min_y).max(f64::MIN_POSITIVE)) * (ny - 1) as f64)
            .round() as usize;
        cells[j * nx + i] = s[3];
    }

    let range = (args.vmax - args.vmin).max(f64::MIN_POSITIVE);
    let mut img = image::RgbImage::new(nx as u32, ny as u32);
    for j in 0..ny {
        for i in 0..nx {
            let v = cells[(ny - 1 - j) * nx + i]; // north up
            let color = if v.is_nan() {
                [255u8, 255, 255]
            } else {
                plasma((v - args.vmin) / range)
            };
            img.put_pixel(i as u32, j as u32, image::Rgb(color));
        }
    }
    let png_path = format!("{}{}.png", args.out_prefix, args.time);
    img.save(&png_path)
        .with_context(|| format!("saving {png_path}"))?;
    println!("Wrote {png_path} ({nx}x{ny} cells)");

    Ok(())
}
