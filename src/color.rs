use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::{DecadeBucket, Season};

// ---------------------------------------------------------------------------
// Fixed chart palettes
// ---------------------------------------------------------------------------

/// Default bar fill for the time/correlation/distance charts.
pub const BAR_FILL: Color32 = Color32::from_rgb(0x31, 0x82, 0xBD);

/// Season slice colours (DJF, MAM, JJA, SON).
pub fn season_color(season: Season) -> Color32 {
    match season {
        Season::Djf => Color32::from_rgb(0x9D, 0xD8, 0xD3),
        Season::Mam => Color32::from_rgb(0xFF, 0xE5, 0x45),
        Season::Jja => Color32::from_rgb(0xA9, 0xDB, 0x66),
        Season::Son => Color32::from_rgb(0xFF, 0xAD, 0x5D),
    }
}

/// Two-tone decade palette ("Melting Glaciers"): the first four archive
/// decades in the darker shade, the recent four in the lighter one.
pub fn decade_color(decade: DecadeBucket) -> Color32 {
    match decade {
        DecadeBucket::Y1948To1955
        | DecadeBucket::Y1956To1965
        | DecadeBucket::Y1966To1975
        | DecadeBucket::Y1976To1985 => Color32::from_rgb(0x67, 0x73, 0x9F),
        _ => Color32::from_rgb(0xB1, 0xCE, 0xF5),
    }
}

// ---------------------------------------------------------------------------
// Selection variants
// ---------------------------------------------------------------------------

fn shift(color: Color32, lightness: f32, saturation: f32) -> Color32 {
    let rgb = Srgb::new(
        color.r() as f32 / 255.0,
        color.g() as f32 / 255.0,
        color.b() as f32 / 255.0,
    );
    let mut hsl: Hsl = rgb.into_color();
    hsl.lightness = (hsl.lightness + lightness).clamp(0.0, 1.0);
    hsl.saturation = (hsl.saturation + saturation).clamp(0.0, 1.0);
    let out: Srgb = hsl.into_color();
    Color32::from_rgb(
        (out.red * 255.0) as u8,
        (out.green * 255.0) as u8,
        (out.blue * 255.0) as u8,
    )
}

/// Brighter variant for a selected chart element.
pub fn highlight(color: Color32) -> Color32 {
    shift(color, 0.12, 0.10)
}

/// Washed-out variant for elements outside the current selection.
pub fn faded(color: Color32) -> Color32 {
    shift(color, 0.22, -0.35)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_stay_distinct_from_the_base() {
        for season in Season::ALL {
            let base = season_color(season);
            assert_ne!(highlight(base), faded(base));
        }
    }
}
