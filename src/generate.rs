use rand::Rng;

use crate::color::Color;

/// Color-theory rule used to derive a palette from a base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Combination {
    Complementary,
    Monochromatic,
    Analogous,
    Triadic,
    Tetradic,
    Random,
}

impl Combination {
    pub const ALL: [Combination; 6] = [
        Combination::Complementary,
        Combination::Monochromatic,
        Combination::Analogous,
        Combination::Triadic,
        Combination::Tetradic,
        Combination::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Combination::Complementary => "Complementary",
            Combination::Monochromatic => "Monochromatic",
            Combination::Analogous => "Analogous",
            Combination::Triadic => "Triadic",
            Combination::Tetradic => "Tetradic",
            Combination::Random => "Random",
        }
    }
}

/// Generated colors with one alias per color naming its role. Random
/// palettes carry no aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub colors: Vec<String>,
    pub aliases: Vec<String>,
}

const MIN_RANDOM: usize = 2;
const MAX_RANDOM: usize = 10;

/// Generate a palette. Without a base color a random one is picked.
pub fn generate<R: Rng>(combination: Combination, base: Option<Color>, rng: &mut R) -> Generated {
    let base = base.unwrap_or_else(|| random_color(rng));

    let (colors, aliases): (Vec<Color>, Vec<&str>) = match combination {
        Combination::Complementary => (vec![base, base.complement()], vec!["Base", "Complimentary Color"]),
        Combination::Monochromatic => (
            vec![
                base.lighten(20.0),
                base.lighten(10.0),
                base,
                base.darken(10.0),
                base.darken(20.0),
            ],
            vec!["Lightest", "Lighter", "Base", "Darker", "Darkest"],
        ),
        Combination::Analogous => (
            vec![base.rotate_hue(-25.0), base, base.rotate_hue(25.0)],
            vec!["Analogous East", "Base", "Analogous West"],
        ),
        Combination::Triadic => (
            vec![base, base.rotate_hue(120.0), base.rotate_hue(240.0)],
            vec!["Base", "Triadic Second", "Triadic Third"],
        ),
        Combination::Tetradic => (
            vec![
                base,
                base.rotate_hue(90.0),
                base.rotate_hue(180.0),
                base.rotate_hue(270.0),
            ],
            vec!["Base", "Tetradic Second", "Tetradic Third", "Tetradic Fourth"],
        ),
        Combination::Random => {
            let count = rng.gen_range(MIN_RANDOM..=MAX_RANDOM);
            let colors = (0..count).map(|_| random_color(rng)).collect();
            (colors, Vec::new())
        }
    };

    Generated {
        colors: colors.into_iter().map(Color::to_hex).collect(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

pub fn random_color<R: Rng>(rng: &mut R) -> Color {
    Color::new(rng.gen(), rng.gen(), rng.gen())
}
