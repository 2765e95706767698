use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ccc_formats::{Ccc1Frame, Ccc1Video};
use clap::{Parser, ValueEnum};
use serde::Serialize;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export CCC1 frames as raw indexed, RGBA or packed 4bpp dumps."
)]
struct Args {
    /// Path to the input .ccc1 file.
    input: PathBuf,
    /// Output directory where frames will be written (not needed with --json).
    output: Option<PathBuf>,
    /// Output pixel format for exported frames (default: rgba).
    #[arg(long, value_enum, default_value_t = OutputFormat::Rgba)]
    format: OutputFormat,
    /// Optional limit on the number of frames to export.
    #[arg(long)]
    limit: Option<usize>,
    /// Print video metadata as JSON instead of exporting frames.
    #[arg(long)]
    json: bool,
    /// Skip overwriting frames that already exist on disk.
    #[arg(long)]
    skip_existing: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    /// RGBA8888 scanlines through the palette.
    Rgba,
    /// One palette index per byte, scanline order.
    Indexed,
    /// Big-endian 4bpp cell words, two per cell (VRAM layout).
    #[value(name = "4bpp", alias = "packed")]
    Packed4bpp,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Rgba => "rgba",
            OutputFormat::Indexed => "idx8",
            OutputFormat::Packed4bpp => "4bpp",
        }
    }

    fn frame_bytes(self, frame: &Ccc1Frame<'_>) -> Vec<u8> {
        match self {
            OutputFormat::Rgba => frame.rgba_pixels(),
            OutputFormat::Indexed => frame.indexed_pixels(),
            OutputFormat::Packed4bpp => frame
                .cell_words()
                .into_iter()
                .flat_map(u32::to_be_bytes)
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct VideoMetadata {
    width: u16,
    height: u16,
    cells_wide: usize,
    cells_high: usize,
    frame_count: usize,
    frame_bytes: usize,
    palette: [[u8; 3]; 16],
}

fn main() -> Result<()> {
    let args = Args::parse();
    let video = Ccc1Video::open(&args.input)?;

    if args.json {
        let header = video.header();
        let metadata = VideoMetadata {
            width: header.width,
            height: header.height,
            cells_wide: header.cells_wide(),
            cells_high: header.cells_high(),
            frame_count: video.frame_count(),
            frame_bytes: header.frame_len(),
            palette: header.palette,
        };
        serde_json::to_writer_pretty(std::io::stdout().lock(), &metadata)?;
        println!();
        return Ok(());
    }

    let Some(output) = args.output else {
        bail!("an output directory is required unless --json is given");
    };
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let mut written = 0usize;
    for (index, frame) in video.frames().enumerate() {
        if let Some(limit) = args.limit {
            if written >= limit {
                break;
            }
        }

        let filename = format!("frame_{:05}.{}", index, args.format.extension());
        let output_path = output.join(filename);
        if args.skip_existing && output_path.exists() {
            continue;
        }

        let bytes = args.format.frame_bytes(&frame);
        let mut file = File::create(&output_path)
            .with_context(|| format!("failed to create {}", output_path.display()))?;
        file.write_all(&bytes)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        written += 1;
    }

    println!(
        "Exported {written} frame(s) from {} into {} ({:?} pixels)",
        args.input.display(),
        output.display(),
        args.format
    );

    Ok(())
}
