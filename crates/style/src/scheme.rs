//! Density-class color table and outline symbology values.

use urbanmatrix_core::DensityClass;

/// RGBA color with channel values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully transparent (white with zero alpha).
    pub const TRANSPARENT: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 0,
    };

    /// Hex color string, `#rrggbb`. Alpha is carried separately as opacity.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha channel as an opacity in [0, 1].
    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

/// Stroke symbology: color plus line width in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub color: Rgba,
    pub width: f64,
}

/// Subtle gray border for grid cells.
pub const GRID_OUTLINE: Outline = Outline {
    color: Rgba::opaque(0x88, 0x88, 0x88),
    width: 0.3,
};

/// Purple border for building footprints.
pub const FOOTPRINT_OUTLINE: Outline = Outline {
    color: Rgba::opaque(0x37, 0x04, 0xba),
    width: 0.8,
};

/// Fill color for a density class.
///
/// `NoData` cells render transparent; the four active classes ramp from
/// teal through yellow and red to dark purple.
pub fn class_color(class: DensityClass) -> Rgba {
    match class {
        DensityClass::NoData => Rgba::TRANSPARENT,
        DensityClass::Low => Rgba::opaque(0x66, 0xc2, 0xa5),
        DensityClass::Moderate => Rgba::opaque(0xff, 0xd9, 0x2f),
        DensityClass::High => Rgba::opaque(0xe4, 0x1a, 0x1c),
        DensityClass::VeryHigh => Rgba::opaque(0x7a, 0x01, 0x77),
    }
}
