//! Text image format shared by the texture-driven effects and the converter.
//!
//! ```text
//! 4x2
//! 0 0 0 255
//! 255 255 255 255
//!
//! 0 1 1 0
//! 1 0 0 1
//! ```
//!
//! Line 1 is `{width}x{height}`, then one `r g b a` palette entry per line up
//! to a blank line, then `height` rows of `width` palette indices.

use crate::grid::Grid;
use crate::palette::{Palette, Rgba, PALETTE_SIZE};
use std::{
    fmt, fs,
    io::{self, Write},
    path::Path,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AssetImage {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) palette: Vec<Rgba>,
    pub(crate) pixels: Vec<u8>,
}

impl AssetImage {
    pub(crate) fn palette_table(&self) -> Palette {
        Palette::from_entries(&self.palette)
    }

    pub(crate) fn to_grid(&self) -> Grid<u8> {
        // width * height == pixels.len() is checked by the parser
        Grid::from_vec(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| Grid::new(self.width, self.height))
    }
}

#[derive(Debug)]
pub(crate) enum AssetError {
    Io(io::Error),
    /// First line is not `{w}x{h}` with positive sizes.
    Header(String),
    /// Palette line without exactly four byte values.
    PaletteRow { line: usize, text: String },
    /// Pixel row with a bad token or the wrong number of values.
    PixelRow { line: usize, text: String },
    PixelCount { expected: usize, found: usize },
    IndexOutOfRange { index: usize, value: u8, palette_len: usize },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read asset: {err}"),
            Self::Header(h) => write!(f, "bad asset header {h:?}, expected WIDTHxHEIGHT"),
            Self::PaletteRow { line, text } => {
                write!(f, "line {line}: palette entry {text:?} is not four bytes")
            }
            Self::PixelRow { line, text } => write!(f, "line {line}: bad pixel row {text:?}"),
            Self::PixelCount { expected, found } => {
                write!(f, "expected {expected} pixels, found {found}")
            }
            Self::IndexOutOfRange {
                index,
                value,
                palette_len,
            } => write!(
                f,
                "pixel {index} uses palette slot {value} but the palette has {palette_len} entries"
            ),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub(crate) fn load_asset(path: &Path) -> Result<AssetImage, AssetError> {
    let text = fs::read_to_string(path)?;
    let img = parse_asset(&text)?;
    tracing::info!(
        path = %path.display(),
        width = img.width,
        height = img.height,
        colours = img.palette.len(),
        "asset loaded"
    );
    Ok(img)
}

// Older files separate palette values with ", ".
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}

/// `(width, height, width * height)`. Sizes whose product could never be
/// allocated are rejected.
fn parse_header(line: &str) -> Option<(usize, usize, usize)> {
    let (w, h) = line.trim().split_once('x')?;
    let w: usize = w.trim().parse().ok()?;
    let h: usize = h.trim().parse().ok()?;
    let n = w.checked_mul(h).filter(|&n| n <= isize::MAX as usize)?;
    (w > 0 && h > 0).then_some((w, h, n))
}

pub(crate) fn parse_asset(text: &str) -> Result<AssetImage, AssetError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let header = lines.next().map(|(_, l)| l).unwrap_or_default();
    let (width, height, expected) =
        parse_header(header).ok_or_else(|| AssetError::Header(header.to_string()))?;

    let mut palette = Vec::new();
    for (line, text) in lines.by_ref() {
        if text.trim().is_empty() {
            break;
        }
        let bytes: Vec<u8> = tokens(text)
            .map(str::parse::<u8>)
            .collect::<Result<_, _>>()
            .map_err(|_| AssetError::PaletteRow {
                line,
                text: text.to_string(),
            })?;
        match bytes[..] {
            [r, g, b, a] if palette.len() < PALETTE_SIZE => palette.push(Rgba { r, g, b, a }),
            _ => {
                return Err(AssetError::PaletteRow {
                    line,
                    text: text.to_string(),
                })
            }
        }
    }

    // every pixel needs at least two bytes of text, so a lying header cannot
    // force a huge allocation
    let mut pixels = Vec::with_capacity(expected.min(text.len() / 2));
    for (line, text) in lines {
        if text.trim().is_empty() {
            continue;
        }
        let row: Vec<u8> = tokens(text)
            .map(str::parse::<u8>)
            .collect::<Result<_, _>>()
            .map_err(|_| AssetError::PixelRow {
                line,
                text: text.to_string(),
            })?;
        if row.len() != width {
            return Err(AssetError::PixelRow {
                line,
                text: text.to_string(),
            });
        }
        pixels.extend(row);
    }

    if pixels.len() != expected {
        return Err(AssetError::PixelCount {
            expected,
            found: pixels.len(),
        });
    }

    if let Some((index, &value)) = pixels
        .iter()
        .enumerate()
        .find(|(_, &v)| v as usize >= palette.len())
    {
        return Err(AssetError::IndexOutOfRange {
            index,
            value,
            palette_len: palette.len(),
        });
    }

    Ok(AssetImage {
        width,
        height,
        palette,
        pixels,
    })
}

pub(crate) fn write_asset<W: Write>(out: &mut W, img: &AssetImage) -> io::Result<()> {
    writeln!(out, "{}x{}", img.width, img.height)?;
    for c in &img.palette {
        writeln!(out, "{} {} {} {}", c.r, c.g, c.b, c.a)?;
    }
    writeln!(out)?;
    for row in img.pixels.chunks(img.width.max(1)) {
        let line: Vec<String> = row.iter().map(u8::to_string).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn loads_minimal_image() {
        let img = parse_asset("4x2\n0 0 0 255\n\n0 0 0 0\n0 0 0 0\n").unwrap();
        assert_eq!((img.width, img.height), (4, 2));
        assert_eq!(img.palette, vec![Rgba::rgb(0, 0, 0)]);
        assert_eq!(img.pixels, vec![0; 8]);
    }

    #[test]
    fn accepts_comma_separated_palette_and_trailing_spaces() {
        let img = parse_asset("2x1\n10, 20, 30, 255\n1, 2, 3, 4\n\n1 0 \n").unwrap();
        assert_eq!(img.palette[0], Rgba::rgb(10, 20, 30));
        assert_eq!(img.palette[1], Rgba { r: 1, g: 2, b: 3, a: 4 });
        assert_eq!(img.pixels, vec![1, 0]);
    }

    #[test]
    fn rejects_bad_header() {
        for text in ["", "4by2\n", "0x2\n", "4x\n"] {
            assert!(matches!(parse_asset(text), Err(AssetError::Header(_))), "{text:?}");
        }
    }

    #[test]
    fn rejects_headers_too_large_to_allocate() {
        for header in ["4294967296x4294967296", "1x18446744073709551615"] {
            let text = format!("{header}\n0 0 0 255\n\n0\n");
            assert!(matches!(parse_asset(&text), Err(AssetError::Header(_))), "{header}");
        }
    }

    #[test]
    fn oversized_but_valid_header_reports_pixel_count() {
        let err = parse_asset("100000x100000\n0 0 0 255\n\n0\n").unwrap_err();
        assert!(matches!(err, AssetError::PixelCount { expected: 10_000_000_000, found: 1 }));
    }

    #[test]
    fn rejects_short_palette_row() {
        let err = parse_asset("1x1\n0 0 0\n\n0\n").unwrap_err();
        assert!(matches!(err, AssetError::PaletteRow { line: 2, .. }));
    }

    #[test]
    fn rejects_ragged_pixel_row() {
        let err = parse_asset("3x2\n0 0 0 255\n\n0 0 0\n0 0\n").unwrap_err();
        assert!(matches!(err, AssetError::PixelRow { line: 5, .. }));
    }

    #[test]
    fn rejects_missing_rows() {
        let err = parse_asset("2x2\n0 0 0 255\n\n0 0\n").unwrap_err();
        assert!(matches!(
            err,
            AssetError::PixelCount {
                expected: 4,
                found: 2
            }
        ));
    }

    #[test]
    fn rejects_index_past_palette() {
        let err = parse_asset("2x1\n0 0 0 255\n\n0 1\n").unwrap_err();
        assert!(matches!(
            err,
            AssetError::IndexOutOfRange {
                index: 1,
                value: 1,
                palette_len: 1
            }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_asset(Path::new("/nonexistent/definitely/missing.custom")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    fn image_strategy() -> impl Strategy<Value = AssetImage> {
        (1usize..8, 1usize..8, 1usize..6).prop_flat_map(|(w, h, n)| {
            (
                proptest::collection::vec(any::<[u8; 4]>(), n),
                proptest::collection::vec(0..n as u8, w * h),
            )
                .prop_map(move |(pal, pixels)| AssetImage {
                    width: w,
                    height: h,
                    palette: pal
                        .into_iter()
                        .map(|[r, g, b, a]| Rgba { r, g, b, a })
                        .collect(),
                    pixels,
                })
        })
    }

    proptest! {
        #[test]
        fn writer_output_parses_back(img in image_strategy()) {
            let mut buf = Vec::new();
            write_asset(&mut buf, &img).unwrap();
            let text = String::from_utf8(buf).unwrap();
            prop_assert_eq!(parse_asset(&text).unwrap(), img);
        }
    }
}
