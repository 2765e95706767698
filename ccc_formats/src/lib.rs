pub mod ccc1;
pub mod cell;

pub use ccc1::{CCC1_HEADER_SIZE, Ccc1Cell, Ccc1Frame, Ccc1Header, Ccc1Video, parse_ccc1_header};
pub use cell::{
    CELL_SIZE, CODEBOOK, CODEBOOK_SHAPES, COLOR_LUT, CodebookEntry, ColorLutEntry,
    FULL_BLOCK_MASKS, WORDS_PER_CELL, decode_cells, flat_color,
};
