// CCC1 is the uncompressed Color Cell Compression interchange container:
// a 52-byte header (big-endian dimensions plus a 16-color RGB palette)
// followed by fixed-stride frames of 3-byte cell records. The authoring
// pipeline writes it; the cell codec's compressed stream is produced from
// it offline.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use byteorder::{BigEndian, ByteOrder};
use memmap2::{Mmap, MmapOptions};
use serde::Serialize;

use crate::cell::{CELL_SIZE, FULL_BLOCK_MASKS, WORDS_PER_CELL, flat_color};

pub const CCC1_HEADER_SIZE: usize = 52;
const PALETTE_COLORS: usize = 16;
const CELL_RECORD_SIZE: usize = 3;

/// Fixed per-file metadata from the CCC1 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ccc1Header {
    pub width: u16,
    pub height: u16,
    /// 16 RGB triplets, palette slots 0-15.
    pub palette: [[u8; 3]; PALETTE_COLORS],
}

impl Ccc1Header {
    pub fn cells_wide(&self) -> usize {
        self.width as usize / CELL_SIZE
    }

    pub fn cells_high(&self) -> usize {
        self.height as usize / CELL_SIZE
    }

    pub fn cells_per_frame(&self) -> usize {
        self.cells_wide() * self.cells_high()
    }

    /// Size of one frame on disk.
    pub fn frame_len(&self) -> usize {
        self.cells_per_frame() * CELL_RECORD_SIZE
    }

    pub fn palette_rgb(&self, index: u8) -> [u8; 3] {
        self.palette[(index & 0xF) as usize]
    }
}

/// Parse and validate the fixed-size CCC1 header.
pub fn parse_ccc1_header(bytes: &[u8]) -> Result<Ccc1Header> {
    ensure!(
        bytes.len() >= CCC1_HEADER_SIZE,
        "CCC1 payload shorter than {CCC1_HEADER_SIZE}-byte header"
    );
    let width = BigEndian::read_u16(&bytes[0..2]);
    let height = BigEndian::read_u16(&bytes[2..4]);
    ensure!(
        width > 0 && height > 0,
        "CCC1 header reports zero width or height"
    );
    ensure!(
        width as usize % CELL_SIZE == 0 && height as usize % CELL_SIZE == 0,
        "CCC1 dimensions {width}x{height} are not cell aligned"
    );

    let mut palette = [[0u8; 3]; PALETTE_COLORS];
    for (slot, triplet) in palette.iter_mut().enumerate() {
        let offset = 4 + slot * 3;
        triplet.copy_from_slice(&bytes[offset..offset + 3]);
    }

    Ok(Ccc1Header {
        width,
        height,
        palette,
    })
}

/// Memory-mapped CCC1 video.
#[derive(Debug)]
pub struct Ccc1Video {
    path: PathBuf,
    mmap: Mmap,
    header: Ccc1Header,
}

impl Ccc1Video {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening CCC1 video at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping CCC1 video {}", path_buf.display()))?;

        let header = parse_ccc1_header(&mmap)
            .with_context(|| format!("parsing CCC1 header of {}", path_buf.display()))?;

        Ok(Ccc1Video {
            path: path_buf,
            mmap,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Ccc1Header {
        &self.header
    }

    /// Number of complete frames; a truncated trailing frame is ignored.
    pub fn frame_count(&self) -> usize {
        (self.mmap.len() - CCC1_HEADER_SIZE) / self.header.frame_len()
    }

    pub fn frame(&self, index: usize) -> Result<Ccc1Frame<'_>> {
        ensure!(
            index < self.frame_count(),
            "frame {index} out of range ({} frames in {})",
            self.frame_count(),
            self.path.display()
        );
        Ok(self.frame_unchecked(index))
    }

    pub fn frames(&self) -> impl Iterator<Item = Ccc1Frame<'_>> {
        (0..self.frame_count()).map(|index| self.frame_unchecked(index))
    }

    fn frame_unchecked(&self, index: usize) -> Ccc1Frame<'_> {
        let len = self.header.frame_len();
        let start = CCC1_HEADER_SIZE + index * len;
        Ccc1Frame {
            header: self.header,
            bytes: &self.mmap[start..start + len],
        }
    }
}

/// One cell record: two palette indices plus a 16-bit shape whose set bits
/// (bit 15 = top-left pixel, row-major) pick `color1` over `color0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ccc1Cell {
    pub color0: u8,
    pub color1: u8,
    pub shape: u16,
}

impl Ccc1Cell {
    pub fn is_solid(&self) -> bool {
        self.shape == 0
    }
}

/// Borrowed view of one frame's cell records.
#[derive(Debug, Clone, Copy)]
pub struct Ccc1Frame<'a> {
    header: Ccc1Header,
    bytes: &'a [u8],
}

impl<'a> Ccc1Frame<'a> {
    /// Wrap raw frame bytes; the length must match the header's frame size.
    pub fn new(header: Ccc1Header, bytes: &'a [u8]) -> Result<Self> {
        ensure!(
            bytes.len() == header.frame_len(),
            "frame payload is {} bytes, expected {}",
            bytes.len(),
            header.frame_len()
        );
        Ok(Ccc1Frame { header, bytes })
    }

    pub fn header(&self) -> &Ccc1Header {
        &self.header
    }

    pub fn record_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn cell_count(&self) -> usize {
        self.bytes.len() / CELL_RECORD_SIZE
    }

    pub fn cells(&self) -> impl Iterator<Item = Ccc1Cell> + 'a {
        self.bytes.chunks_exact(CELL_RECORD_SIZE).map(|record| {
            Ccc1Cell {
                color0: record[0] >> 4,
                color1: record[0] & 0x0F,
                shape: u16::from_be_bytes([record[1], record[2]]),
            }
        })
    }

    /// Expand the frame to one palette index per byte, in scanline order.
    pub fn indexed_pixels(&self) -> Vec<u8> {
        let width = self.header.width as usize;
        let cells_wide = self.header.cells_wide();
        let mut pixels = vec![0u8; width * self.header.height as usize];

        for (cell_index, cell) in self.cells().enumerate() {
            let origin_x = (cell_index % cells_wide) * CELL_SIZE;
            let origin_y = (cell_index / cells_wide) * CELL_SIZE;
            let mut shape = cell.shape;
            for row in 0..CELL_SIZE {
                let line = (origin_y + row) * width + origin_x;
                for pixel in &mut pixels[line..line + CELL_SIZE] {
                    *pixel = if shape & 0x8000 != 0 {
                        cell.color1
                    } else {
                        cell.color0
                    };
                    shape <<= 1;
                }
            }
        }
        pixels
    }

    /// Expand the frame through the palette to RGBA8888, for previews only.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        let indexed = self.indexed_pixels();
        let mut rgba = Vec::with_capacity(indexed.len() * 4);
        for index in indexed {
            let [r, g, b] = self.header.palette_rgb(index);
            rgba.extend_from_slice(&[r, g, b, 0xFF]);
        }
        rgba
    }

    /// Pack the frame into per-cell 4bpp VRAM words (two per cell, top half
    /// first), the same layout the compressed-stream decoder emits.
    pub fn cell_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(self.cell_count() * WORDS_PER_CELL);
        for cell in self.cells() {
            let color0 = flat_color(cell.color0);
            let color1 = flat_color(cell.color1);
            let top = FULL_BLOCK_MASKS[(cell.shape >> 8) as usize];
            let bottom = FULL_BLOCK_MASKS[(cell.shape & 0xFF) as usize];
            words.push((color0 & !top) | (color1 & top));
            words.push((color0 & !bottom) | (color1 & bottom));
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_header_bytes(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(CCC1_HEADER_SIZE);
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        for slot in 0..PALETTE_COLORS as u8 {
            bytes.extend_from_slice(&[slot * 0x10, slot, 0xFF - slot]);
        }
        bytes
    }

    #[test]
    fn parses_minimal_header() {
        let header = parse_ccc1_header(&test_header_bytes(8, 4)).expect("parse succeeds");
        assert_eq!(header.width, 8);
        assert_eq!(header.height, 4);
        assert_eq!(header.cells_wide(), 2);
        assert_eq!(header.cells_high(), 1);
        assert_eq!(header.frame_len(), 6);
        assert_eq!(header.palette_rgb(0), [0x00, 0x00, 0xFF]);
        assert_eq!(header.palette_rgb(3), [0x30, 0x03, 0xFC]);
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(parse_ccc1_header(&[0u8; 10]).is_err());
        assert!(parse_ccc1_header(&test_header_bytes(0, 4)).is_err());
        assert!(parse_ccc1_header(&test_header_bytes(10, 4)).is_err());
        assert!(parse_ccc1_header(&test_header_bytes(8, 6)).is_err());
    }

    #[test]
    fn reads_frames_from_mapped_file() {
        let mut data = test_header_bytes(8, 4);
        // Frame 0: a top-row split cell and a solid cell.
        data.extend_from_slice(&[0x12, 0xF0, 0x00, 0x33, 0x00, 0x00]);
        // Frame 1: two solid cells.
        data.extend_from_slice(&[0x44, 0x00, 0x00, 0x55, 0x00, 0x00]);
        // Truncated trailing frame, must be ignored.
        data.extend_from_slice(&[0x66, 0x00]);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let video = Ccc1Video::open(file.path()).expect("open succeeds");
        assert_eq!(video.header().width, 8);
        assert_eq!(video.frame_count(), 2);
        assert!(video.frame(2).is_err());

        let frame = video.frame(0).unwrap();
        let cells: Vec<Ccc1Cell> = frame.cells().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(
            cells[0],
            Ccc1Cell {
                color0: 1,
                color1: 2,
                shape: 0xF000
            }
        );
        assert!(!cells[0].is_solid());
        assert!(cells[1].is_solid());

        let last: Vec<Ccc1Cell> = video.frames().last().unwrap().cells().collect();
        assert_eq!(last[0].color0, 4);
        assert_eq!(last[1].color0, 5);
    }

    #[test]
    fn expands_cells_to_scanlines() {
        let header = parse_ccc1_header(&test_header_bytes(8, 4)).unwrap();
        let frame =
            Ccc1Frame::new(header, &[0x12, 0xF0, 0x00, 0x33, 0x00, 0x00]).expect("sized frame");

        let pixels = frame.indexed_pixels();
        assert_eq!(pixels.len(), 8 * 4);
        // Top scanline: the split cell's color1 row, then the solid cell.
        assert_eq!(&pixels[0..8], &[2, 2, 2, 2, 3, 3, 3, 3]);
        // Remaining scanlines: color0 on the left, solid color on the right.
        for line in pixels[8..].chunks_exact(8) {
            assert_eq!(line, &[1, 1, 1, 1, 3, 3, 3, 3]);
        }

        let rgba = frame.rgba_pixels();
        assert_eq!(rgba.len(), 8 * 4 * 4);
        assert_eq!(&rgba[0..4], &[0x20, 0x02, 0xFD, 0xFF]);
        let bottom_left = (3 * 8) * 4;
        assert_eq!(&rgba[bottom_left..bottom_left + 4], &[0x10, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn packs_cells_into_vram_words() {
        let header = parse_ccc1_header(&test_header_bytes(8, 4)).unwrap();
        let frame =
            Ccc1Frame::new(header, &[0x12, 0xF0, 0x00, 0x33, 0x00, 0x00]).expect("sized frame");
        assert_eq!(
            frame.cell_words(),
            vec![0x2222_1111, 0x1111_1111, 0x3333_3333, 0x3333_3333]
        );
    }

    #[test]
    fn rejects_mis_sized_frame_payload() {
        let header = parse_ccc1_header(&test_header_bytes(8, 4)).unwrap();
        assert!(Ccc1Frame::new(header, &[0u8; 5]).is_err());
    }
}
