//! Tile coordinates, row-convention conversion and tile format helpers.

use std::fmt::{Display, Formatter};

use enum_display::EnumDisplay;

/// The highest zoom level the server will look up.
pub const MAX_ZOOM: u8 = 30;

pub type TileData = Vec<u8>;

/// A tile address in the [xyz Slippy map](https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames)
/// convention, where row `0` is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Returns `Some` only if the zoom is supported and both `x` and `y` are within `[0, 2^z)`.
    #[must_use]
    pub fn new_checked(z: u8, x: u32, y: u32) -> Option<Self> {
        Self::is_possible_on_zoom_level(z, x, y).then_some(Self { z, x, y })
    }

    #[must_use]
    pub fn is_possible_on_zoom_level(z: u8, x: u32, y: u32) -> bool {
        if z > MAX_ZOOM {
            return false;
        }
        let side_len = 1_u32 << z;
        x < side_len && y < side_len
    }

    /// Row of this tile in the `MBTiles` native ([TMS](https://wiki.openstreetmap.org/wiki/TMS))
    /// convention, where row `0` is the southernmost row.
    #[must_use]
    pub fn native_y(&self) -> u32 {
        invert_y_value(self.z, self.y)
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}/{}/{}", self.z, self.x, self.y)
        } else {
            write!(f, "{},{},{}", self.z, self.x, self.y)
        }
    }
}

/// Convert a row between the slippy (north-origin) and native (south-origin) conventions.
///
/// The conversion is its own inverse. `y` must be within `[0, 2^z)` and `z` must not exceed
/// [`MAX_ZOOM`].
#[must_use]
pub fn invert_y_value(zoom: u8, y: u32) -> u32 {
    (1_u32 << zoom) - 1 - y
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumDisplay)]
#[enum_display(case = "Kebab")]
pub enum Format {
    Png,
    Jpeg,
    Webp,
    Gif,
    /// Mapbox vector tile, `pbf` in `MBTiles` metadata.
    Mvt,
}

impl Format {
    /// Parse the value of the `MBTiles` `format` metadata key.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            "pbf" | "mvt" => Self::Mvt,
            _ => None?,
        })
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match *self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Mvt => "application/x-protobuf",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumDisplay)]
#[enum_display(case = "Kebab")]
pub enum Encoding {
    /// Data is not compressed at the transport level.
    #[default]
    Uncompressed,
    Gzip,
}

impl Encoding {
    #[must_use]
    pub fn content_encoding(&self) -> Option<&'static str> {
        match *self {
            Self::Uncompressed => None,
            Self::Gzip => Some("gzip"),
        }
    }
}

/// How a stored tile payload must be labelled when it is sent over HTTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileInfo {
    pub format: Format,
    pub encoding: Encoding,
}

impl TileInfo {
    #[must_use]
    pub fn new(format: Format, encoding: Encoding) -> Self {
        Self { format, encoding }
    }

    /// Derive the transport labelling from the declared `MBTiles` `format` value.
    ///
    /// Vector tiles in `MBTiles` are stored gzip-compressed, so they are declared as such and
    /// passed through untouched. Raster payloads are sent as-is.
    #[must_use]
    pub fn from_declared_format(value: &str) -> Option<Self> {
        let format = Format::parse(value)?;
        let encoding = if format == Format::Mvt {
            Encoding::Gzip
        } else {
            Encoding::Uncompressed
        };
        Some(Self::new(format, encoding))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn invert_zoom_zero() {
        assert_eq!(invert_y_value(0, 0), 0);
        assert_eq!(TileCoord { z: 0, x: 0, y: 0 }.native_y(), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    #[case(9)]
    fn invert_is_involution(#[case] zoom: u8) {
        for y in 0..(1_u32 << zoom) {
            let native = invert_y_value(zoom, y);
            assert!(native < 1 << zoom);
            assert_eq!(invert_y_value(zoom, native), y, "z={zoom} y={y}");
        }
    }

    #[test]
    fn invert_at_max_zoom_edges() {
        let last = (1_u32 << MAX_ZOOM) - 1;
        assert_eq!(invert_y_value(MAX_ZOOM, 0), last);
        assert_eq!(invert_y_value(MAX_ZOOM, last), 0);
    }

    #[rstest]
    #[case(0, 0, 0, true)]
    #[case(0, 1, 0, false)]
    #[case(0, 0, 1, false)]
    #[case(3, 7, 7, true)]
    #[case(3, 8, 0, false)]
    #[case(3, 0, 8, false)]
    #[case(30, 0, (1 << 30) - 1, true)]
    #[case(31, 0, 0, false)]
    #[case(255, 0, 0, false)]
    fn coord_validity(#[case] z: u8, #[case] x: u32, #[case] y: u32, #[case] valid: bool) {
        assert_eq!(TileCoord::new_checked(z, x, y).is_some(), valid);
    }

    #[test]
    fn coord_display() {
        let coord = TileCoord { z: 3, x: 1, y: 2 };
        assert_eq!(coord.to_string(), "3,1,2");
        assert_eq!(format!("{coord:#}"), "3/1/2");
    }

    #[rstest]
    #[case("png", Some(Format::Png))]
    #[case("PNG", Some(Format::Png))]
    #[case("jpg", Some(Format::Jpeg))]
    #[case("jpeg", Some(Format::Jpeg))]
    #[case("webp", Some(Format::Webp))]
    #[case("gif", Some(Format::Gif))]
    #[case("pbf", Some(Format::Mvt))]
    #[case("mvt", Some(Format::Mvt))]
    #[case("tiff", None)]
    #[case("", None)]
    fn parse_format(#[case] value: &str, #[case] expected: Option<Format>) {
        assert_eq!(Format::parse(value), expected);
    }

    #[test]
    fn declared_format_encoding() {
        let info = TileInfo::from_declared_format("pbf").unwrap();
        assert_eq!(info.format.content_type(), "application/x-protobuf");
        assert_eq!(info.encoding.content_encoding(), Some("gzip"));

        let info = TileInfo::from_declared_format("jpg").unwrap();
        assert_eq!(info.format.content_type(), "image/jpeg");
        assert_eq!(info.encoding, Encoding::Uncompressed);
        assert_eq!(info.encoding.content_encoding(), None);

        assert_eq!(TileInfo::from_declared_format("geojson"), None);
    }

    #[test]
    fn format_display() {
        assert_eq!(Format::Mvt.to_string(), "mvt");
        assert_eq!(Encoding::Uncompressed.to_string(), "uncompressed");
    }
}
