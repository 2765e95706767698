//! Estimates how large a CCC1 video would be after cell-stream compression:
//! one byte per solid cell, two per cataloged shape, three per explicit
//! shape, plus the 512-byte shape dictionary and (optionally) a one-bit-
//! per-cell interframe elision map.

use std::collections::HashMap;
use std::env;

use anyhow::{Result, anyhow, ensure};
use ccc_formats::Ccc1Video;

fn main() -> Result<()> {
    let mut inter = false;
    let mut path = None;
    for arg in env::args().skip(1) {
        if arg == "--inter" {
            inter = true;
        } else if path.is_none() {
            path = Some(arg);
        } else {
            return Err(anyhow!("unexpected argument {arg}"));
        }
    }
    let path = path.ok_or_else(|| {
        anyhow!("usage: cargo run -p ccc_formats --example ccc1_stats -- <ccc1> [--inter]")
    })?;

    let video = Ccc1Video::open(&path)?;
    let header = *video.header();
    let frame_count = video.frame_count();
    let total_cells = header.cells_per_frame() * frame_count;
    ensure!(total_cells > 0, "{path} contains no complete frames");

    println!(
        "{path}: {}x{} pixels, {}x{} cells, {} bytes/frame",
        header.width,
        header.height,
        header.cells_wide(),
        header.cells_high(),
        header.frame_len()
    );
    if inter {
        println!("with interframe coding");
    } else {
        println!("intra coding only");
    }

    let mut shape_counts: HashMap<u16, usize> = HashMap::new();
    let mut coded_cells = 0usize;
    let mut full_matches = 0usize;
    let mut color_matches = 0usize;

    for index in 0..frame_count {
        let frame = video.frame(index)?;
        let prev = if index > 0 {
            Some(video.frame(index - 1)?)
        } else {
            None
        };

        let mut last: Option<(u8, u16)> = None;
        for (cell_pos, record) in frame.record_bytes().chunks_exact(3).enumerate() {
            if inter {
                if let Some(prev) = &prev {
                    if &prev.record_bytes()[cell_pos * 3..cell_pos * 3 + 3] == record {
                        continue;
                    }
                }
            }
            coded_cells += 1;

            let color = record[0];
            let shape = u16::from_be_bytes([record[1], record[2]]);
            *shape_counts.entry(shape).or_insert(0) += 1;
            if let Some((last_color, last_shape)) = last {
                if last_color == color {
                    if last_shape == shape {
                        full_matches += 1;
                    } else {
                        color_matches += 1;
                    }
                }
            }
            last = Some((color, shape));
        }
    }

    // The 256 most used non-solid shapes become the dictionary; everything
    // beyond them has to carry its shape inline.
    let solid_cells = shape_counts.get(&0).copied().unwrap_or(0);
    let mut common: Vec<(u16, usize)> = shape_counts
        .iter()
        .filter(|&(&shape, _)| shape != 0)
        .map(|(&shape, &count)| (shape, count))
        .collect();
    common.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    common.truncate(256);
    let common_cells: usize = common.iter().map(|&(_, count)| count).sum();
    let full_cells = coded_cells - solid_cells - common_cells;

    println!("top dictionary shapes:");
    for (rank, (shape, count)) in common.iter().take(16).enumerate() {
        println!("  {rank:02x} {shape:016b} {count:6}");
    }

    let elided = total_cells - coded_cells;
    let inter_map = if inter {
        frame_count * header.cells_per_frame().div_ceil(8)
    } else {
        0
    };
    let before = 3 * total_cells;
    let total = solid_cells + 2 * common_cells + 3 * full_cells + 512 + inter_map;

    println!(
        "of {total_cells} cells: {elided} inter elided, {full_matches} full match, \
         {color_matches} color match, {} none",
        coded_cells - full_matches - color_matches
    );
    println!("before ({frame_count:4} frames): {before:8} bytes");
    println!(
        "inter: {elided:7} ({:4.1}%), {inter_map:8} bytes",
        pct(elided, total_cells)
    );
    println!(
        "solid: {solid_cells:7} ({:4.1}%), {solid_cells:8} bytes",
        pct(solid_cells, total_cells)
    );
    println!(
        "common:{common_cells:7} ({:4.1}%), {:8} bytes",
        pct(common_cells, total_cells),
        2 * common_cells
    );
    println!("common shape dictionary:      512 bytes");
    println!(
        "full:  {full_cells:7} ({:4.1}%), {:8} bytes",
        pct(full_cells, total_cells),
        3 * full_cells
    );
    println!("total: {total_cells:7} (100.%), {total:8} bytes");
    println!(
        "saved {:.1}%",
        (before.saturating_sub(total)) as f64 * 100.0 / before as f64
    );

    Ok(())
}

fn pct(part: usize, total: usize) -> f64 {
    part as f64 * 100.0 / total as f64
}
