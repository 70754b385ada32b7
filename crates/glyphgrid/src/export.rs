//! Debug dump of the atlas as an uncompressed 24-bit BMP.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::atlas::TextureAtlas;
use crate::rasterizer::GlyphRasterizer;

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
/// 72 DPI.
const PIXELS_PER_METER: i32 = 2835;

/// Encode an R8 buffer as a bottom-up 24-bit BMP with grey B = G = R.
///
/// Fails with [`io::ErrorKind::InvalidInput`] when the file would exceed the
/// 4 GiB a BMP header can describe.
pub fn encode_bmp(width: u16, height: u16, pixels: &[u8]) -> io::Result<Vec<u8>> {
    let w = usize::from(width);
    let h = usize::from(height);
    let row_len = (3 * w + 3) & !3;
    let image_len = row_len * h;
    let data_offset = FILE_HEADER_LEN + INFO_HEADER_LEN;
    let too_large = || {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{width}x{height} image is too large for a BMP file"),
        )
    };
    let image_size = u32::try_from(image_len).map_err(|_| too_large())?;
    let file_size = data_offset.checked_add(image_size).ok_or_else(too_large)?;

    let mut out = Vec::with_capacity(file_size as usize);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data_offset.to_le_bytes());

    out.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
    out.extend_from_slice(&i32::from(width).to_le_bytes());
    out.extend_from_slice(&i32::from(height).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let padding = row_len - 3 * w;
    for y in (0..h).rev() {
        for x in 0..w {
            let luma = pixels.get(y * w + x).copied().unwrap_or(0);
            out.extend_from_slice(&[luma, luma, luma]);
        }
        out.extend(std::iter::repeat_n(0u8, padding));
    }
    Ok(out)
}

impl<R: GlyphRasterizer> TextureAtlas<R> {
    /// The atlas as BMP bytes. A released atlas encodes a 0x0 image.
    pub fn encode_bmp(&self) -> io::Result<Vec<u8>> {
        encode_bmp(self.width(), self.height(), self.pixels())
    }

    /// Write the atlas to `path` as a BMP for inspection.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.encode_bmp()?)?;
        debug!(path = %path.display(), "atlas written");
        Ok(())
    }
}
