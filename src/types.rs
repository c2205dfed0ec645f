use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved position. `x` is the longitude, `y` the latitude, as in `geo`.
pub type Coordinate = Point<f64>;

pub fn coordinate(latitude: f64, longitude: f64) -> Coordinate {
    Point::new(longitude, latitude)
}

/// One sheet row that made it through extraction with both coordinates present.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub position: Coordinate,
    pub label: String, // popup and tooltip text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    #[default]
    Blue,
    Red,
    Green,
    Purple,
    Orange,
    DarkBlue,
    CadetBlue,
    Pink,
}

impl MarkerColor {
    pub const ALL: [MarkerColor; 8] = [
        MarkerColor::Blue,
        MarkerColor::Red,
        MarkerColor::Green,
        MarkerColor::Purple,
        MarkerColor::Orange,
        MarkerColor::DarkBlue,
        MarkerColor::CadetBlue,
        MarkerColor::Pink,
    ];

    /// Name understood both by CSS and by the awesome-markers plugin.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerColor::Blue => "blue",
            MarkerColor::Red => "red",
            MarkerColor::Green => "green",
            MarkerColor::Purple => "purple",
            MarkerColor::Orange => "orange",
            MarkerColor::DarkBlue => "darkblue",
            MarkerColor::CadetBlue => "cadetblue",
            MarkerColor::Pink => "pink",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarkerColor::Blue => "Bleu",
            MarkerColor::Red => "Rouge",
            MarkerColor::Green => "Vert",
            MarkerColor::Purple => "Violet",
            MarkerColor::Orange => "Orange",
            MarkerColor::DarkBlue => "Bleu Foncé",
            MarkerColor::CadetBlue => "Bleu Cadet",
            MarkerColor::Pink => "Rose",
        }
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerIcon {
    #[default]
    Info,
    Cloud,
    Flag,
    Star,
    Leaf,
    Globe,
    Home,
    University,
    Building,
    User,
    MapPin,
}

impl MarkerIcon {
    pub const ALL: [MarkerIcon; 11] = [
        MarkerIcon::Info,
        MarkerIcon::Cloud,
        MarkerIcon::Flag,
        MarkerIcon::Star,
        MarkerIcon::Leaf,
        MarkerIcon::Globe,
        MarkerIcon::Home,
        MarkerIcon::University,
        MarkerIcon::Building,
        MarkerIcon::User,
        MarkerIcon::MapPin,
    ];

    /// Font Awesome glyph name, used with the `fa` prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerIcon::Info => "info",
            MarkerIcon::Cloud => "cloud",
            MarkerIcon::Flag => "flag",
            MarkerIcon::Star => "star",
            MarkerIcon::Leaf => "leaf",
            MarkerIcon::Globe => "globe",
            MarkerIcon::Home => "home",
            MarkerIcon::University => "university",
            MarkerIcon::Building => "building",
            MarkerIcon::User => "user",
            MarkerIcon::MapPin => "map-pin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarkerIcon::Info => "Info",
            MarkerIcon::Cloud => "Nuage",
            MarkerIcon::Flag => "Drapeau",
            MarkerIcon::Star => "Étoile",
            MarkerIcon::Leaf => "Feuille",
            MarkerIcon::Globe => "Globe",
            MarkerIcon::Home => "Maison",
            MarkerIcon::University => "Université",
            MarkerIcon::Building => "Bâtiment",
            MarkerIcon::User => "Personne",
            MarkerIcon::MapPin => "Épingle",
        }
    }
}

impl fmt::Display for MarkerIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color and glyph shared by every marker of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleChoice {
    pub color: MarkerColor,
    pub icon: MarkerIcon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileStyle {
    #[default]
    #[serde(rename = "openstreetmap")]
    OpenStreetMap,
    CartodbPositron,
    CartodbDarkMatter,
}

impl TileStyle {
    pub fn url(self) -> &'static str {
        match self {
            TileStyle::OpenStreetMap => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            TileStyle::CartodbPositron => {
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
            }
            TileStyle::CartodbDarkMatter => {
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png"
            }
        }
    }

    pub fn attribution(self) -> &'static str {
        match self {
            TileStyle::OpenStreetMap => {
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
            }
            TileStyle::CartodbPositron | TileStyle::CartodbDarkMatter => {
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>"
            }
        }
    }
}

/// Named map framing: a center and a zoom level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Region {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

pub const DEFAULT_REGION: &str = "National";

// (name, latitude, longitude, zoom). National must stay first.
const BUILTIN_REGIONS: [(&str, f64, f64, u8); 14] = [
    (DEFAULT_REGION, 46.603354, 1.888334, 6),
    ("Auvergne-Rhône-Alpes", 45.4473, 4.3859, 8),
    ("Bourgogne-Franche-Comté", 47.2805, 4.9994, 8),
    ("Bretagne", 48.2020, -2.9326, 8),
    ("Centre-Val de Loire", 47.7516, 1.6751, 8),
    ("Corse", 42.0396, 9.0129, 8),
    ("Grand Est", 48.6998, 6.1878, 8),
    ("Hauts-de-France", 50.4801, 2.7937, 8),
    ("Île-de-France", 48.8499, 2.6370, 9),
    ("Normandie", 49.1829, 0.3707, 8),
    ("Nouvelle-Aquitaine", 45.7087, 0.6269, 7),
    ("Occitanie", 43.8927, 3.2828, 7),
    ("Pays de la Loire", 47.7633, -0.3300, 8),
    ("Provence-Alpes-Côte d'Azur", 43.9352, 6.0679, 8),
];

pub fn builtin_regions() -> Vec<Region> {
    BUILTIN_REGIONS
        .iter()
        .map(|&(name, latitude, longitude, zoom)| Region {
            name: name.to_string(),
            latitude,
            longitude,
            zoom,
        })
        .collect()
}

/// Fixed framing for one generation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapContext {
    pub center: Coordinate,
    pub zoom: u8,
    pub tiles: Option<TileStyle>,
}

impl MapContext {
    pub fn for_region(region: &Region, tiles: Option<TileStyle>) -> Self {
        Self {
            center: coordinate(region.latitude, region.longitude),
            zoom: region.zoom,
            tiles,
        }
    }
}

impl Default for MapContext {
    fn default() -> Self {
        let (_, latitude, longitude, zoom) = BUILTIN_REGIONS[0];
        Self {
            center: coordinate(latitude, longitude),
            zoom,
            tiles: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_first_catalog_entries() {
        assert_eq!(MarkerColor::default(), MarkerColor::ALL[0]);
        assert_eq!(MarkerIcon::default(), MarkerIcon::ALL[0]);
        assert_eq!(builtin_regions()[0].name, DEFAULT_REGION);
    }

    #[test]
    fn test_national_context_is_centered_on_france() {
        let context = MapContext::default();
        assert_eq!(context.zoom, 6);
        assert!((context.center.y() - 46.603354).abs() < 1e-9);
        assert!((context.center.x() - 1.888334).abs() < 1e-9);
    }

    #[test]
    fn test_style_names_deserialize() {
        let style: StyleChoice =
            toml::from_str("color = \"cadetblue\"\nicon = \"map-pin\"").unwrap();
        assert_eq!(style.color, MarkerColor::CadetBlue);
        assert_eq!(style.icon, MarkerIcon::MapPin);

        let partial: StyleChoice = toml::from_str("icon = \"star\"").unwrap();
        assert_eq!(partial.color, MarkerColor::Blue);
    }
}
