use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use ccc_formats::Ccc1Video;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let arg = env::args()
        .nth(1)
        .context("usage: ccc1_info <CCC1 file or directory>")?;
    let path = Path::new(&arg);

    if path.is_dir() {
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_ccc1 = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ccc1"));
            if !is_ccc1 {
                continue;
            }
            match Ccc1Video::open(entry.path()) {
                Ok(video) => print_summary(&video),
                Err(err) => eprintln!("{}: {err:#}", entry.path().display()),
            }
        }
    } else {
        let video = Ccc1Video::open(path)?;
        print_details(&video);
    }

    Ok(())
}

fn print_summary(video: &Ccc1Video) {
    let header = video.header();
    println!(
        "{path}: {width}x{height}, {frames} frame(s)",
        path = video.path().display(),
        width = header.width,
        height = header.height,
        frames = video.frame_count()
    );
}

fn print_details(video: &Ccc1Video) {
    let header = video.header();
    println!(
        "{}: {}x{} pixels, {}x{} cells, {} frame(s)",
        video.path().display(),
        header.width,
        header.height,
        header.cells_wide(),
        header.cells_high(),
        video.frame_count()
    );
    println!(
        "frame size: {} bytes ({} cells)",
        header.frame_len(),
        header.cells_per_frame()
    );
    println!("palette:");
    for (slot, [r, g, b]) in header.palette.iter().enumerate() {
        print!("  {slot:2}: #{r:02X}{g:02X}{b:02X}");
        if slot % 4 == 3 {
            println!();
        }
    }
}
