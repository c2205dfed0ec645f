use crate::data::{Cell, Sheet};
use crate::error::SheetValidationError;
use crate::geocode::{Diagnostics, GeocodeResolver, Geocoder};
use crate::types::{coordinate, Coordinate, Row};
use tracing::debug;

pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const PLACE: &str = "Ville";

/// Where a sheet's coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Direct { latitude: usize, longitude: usize },
    Lookup { place: usize },
}

impl CoordinateSource {
    /// Explicit columns win over place names, whatever else the sheet holds.
    pub fn detect(sheet: &Sheet) -> Result<Self, SheetValidationError> {
        if let (Some(latitude), Some(longitude)) =
            (sheet.column_index(LATITUDE), sheet.column_index(LONGITUDE))
        {
            return Ok(CoordinateSource::Direct {
                latitude,
                longitude,
            });
        }
        if let Some(place) = sheet.column_index(PLACE) {
            return Ok(CoordinateSource::Lookup { place });
        }
        Err(SheetValidationError {
            sheet: sheet.name.clone(),
        })
    }
}

/// Rows of one sheet with resolved coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRows {
    pub source: CoordinateSource,
    pub rows: Vec<Row>,
    pub dropped: usize, // rows without a usable coordinate
}

pub fn extract_sheet<G: Geocoder, D: Diagnostics>(
    sheet: &Sheet,
    resolver: &GeocodeResolver<G, D>,
) -> Result<SheetRows, SheetValidationError> {
    let source = CoordinateSource::detect(sheet)?;
    let label_col = sheet.column_index(&sheet.name);
    debug!("Sheet '{}': {:?}, label column {:?}", sheet.name, source, label_col);

    let mut rows = Vec::new();
    let mut dropped = 0;

    for row in &sheet.rows {
        let position = match source {
            CoordinateSource::Direct {
                latitude,
                longitude,
            } => direct_position(&sheet.cell(row, latitude), &sheet.cell(row, longitude)),
            CoordinateSource::Lookup { place } => {
                let place = sheet.cell(row, place);
                if place.is_empty() {
                    None
                } else {
                    resolver.resolve(&place.to_text()).coordinate()
                }
            }
        };

        let Some(position) = position else {
            dropped += 1;
            continue;
        };

        let label = label_col
            .map(|i| sheet.cell(row, i).to_text())
            .unwrap_or_default();
        rows.push(Row { position, label });
    }

    Ok(SheetRows {
        source,
        rows,
        dropped,
    })
}

fn direct_position(latitude: &Cell, longitude: &Cell) -> Option<Coordinate> {
    Some(coordinate(latitude.as_f64()?, longitude.as_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::testing::{no_delay, StubGeocoder};

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_mode_never_geocodes() {
        let sheet = Sheet::new(
            "Schools",
            columns(&["Latitude", "Longitude", "Ville", "Schools"]),
            vec![vec![
                Cell::Number(48.85),
                Cell::Number(2.35),
                text("Paris"),
                text("Lycée A"),
            ]],
        );
        let stub = StubGeocoder::new().with_place("Paris", 1.0, 1.0);
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let extracted = extract_sheet(&sheet, &resolver).unwrap();
        assert!(matches!(extracted.source, CoordinateSource::Direct { .. }));
        assert_eq!(
            extracted.rows,
            vec![Row {
                position: coordinate(48.85, 2.35),
                label: "Lycée A".to_string(),
            }]
        );
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn test_lookup_mode_uses_resolver() {
        let sheet = Sheet::new(
            "Museums",
            columns(&["Ville", "Museums"]),
            vec![
                vec![text("Lyon"), text("Louvre Lyon")],
                vec![text("Nowhere"), text("Lost")],
                vec![Cell::Empty, text("Blank")],
            ],
        );
        let stub = StubGeocoder::new().with_place("Lyon", 45.75, 4.85);
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let extracted = extract_sheet(&sheet, &resolver).unwrap();
        assert_eq!(extracted.rows.len(), 1);
        assert_eq!(extracted.rows[0].position, coordinate(45.75, 4.85));
        assert_eq!(extracted.rows[0].label, "Louvre Lyon");
        assert_eq!(extracted.dropped, 2);
        assert_eq!(stub.calls(), vec!["Lyon", "Nowhere"]);
    }

    #[test]
    fn test_missing_columns_is_validation_error() {
        let sheet = Sheet::new("Bad", columns(&["Name"]), vec![vec![text("x")]]);
        let stub = StubGeocoder::new();
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let err = extract_sheet(&sheet, &resolver).unwrap_err();
        assert_eq!(err.sheet, "Bad");
        let message = err.to_string();
        assert!(message.contains("'Bad'"));
        for column in [LATITUDE, LONGITUDE, PLACE] {
            assert!(message.contains(column));
        }
    }

    #[test]
    fn test_only_latitude_falls_back_to_lookup() {
        let sheet = Sheet::new(
            "Mixed",
            columns(&["Latitude", "Ville", "Mixed"]),
            vec![vec![Cell::Number(10.0), text("Lyon"), text("A")]],
        );
        let stub = StubGeocoder::new().with_place("Lyon", 45.75, 4.85);
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let extracted = extract_sheet(&sheet, &resolver).unwrap();
        assert!(matches!(extracted.source, CoordinateSource::Lookup { .. }));
        assert_eq!(extracted.rows[0].position, coordinate(45.75, 4.85));
    }

    #[test]
    fn test_zero_is_a_valid_coordinate() {
        let sheet = Sheet::new(
            "Null Island",
            columns(&["Latitude", "Longitude", "Null Island"]),
            vec![
                vec![Cell::Number(0.0), Cell::Number(0.0), text("origin")],
                vec![Cell::Empty, Cell::Number(3.0), text("half")],
                vec![text("n/a"), Cell::Number(3.0), text("junk")],
            ],
        );
        let stub = StubGeocoder::new();
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let extracted = extract_sheet(&sheet, &resolver).unwrap();
        assert_eq!(extracted.rows.len(), 1);
        assert_eq!(extracted.rows[0].position, coordinate(0.0, 0.0));
        assert_eq!(extracted.dropped, 2);
    }

    #[test]
    fn test_missing_label_column_gives_empty_label() {
        let sheet = Sheet::new(
            "Points",
            columns(&["Latitude", "Longitude", "Name"]),
            vec![vec![Cell::Number(1.0), Cell::Number(2.0), text("ignored")]],
        );
        let stub = StubGeocoder::new();
        let resolver = GeocodeResolver::new(&stub, no_delay(3));

        let extracted = extract_sheet(&sheet, &resolver).unwrap();
        assert_eq!(extracted.rows[0].label, "");
    }
}
