use crate::data::Workbook;
use crate::error::SheetValidationError;
use crate::geocode::{Diagnostics, GeocodeResolver, Geocoder};
use crate::processing::{extract_sheet, CoordinateSource};
use crate::render::{assemble, MapDocument, SheetLayer};
use crate::types::{MapContext, StyleChoice};
use std::collections::HashMap;
use tracing::{error, info};

/// Everything chosen before a generation pass; immutable during it.
#[derive(Debug, Clone, Default)]
pub struct GenerationPlan {
    pub context: MapContext,
    pub styles: HashMap<String, StyleChoice>,
}

impl GenerationPlan {
    /// Style for `sheet`, falling back to the first catalog entries.
    pub fn style_for(&self, sheet: &str) -> StyleChoice {
        self.styles.get(sheet).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub sheet: String,
    pub source: CoordinateSource,
    pub placed: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub document: MapDocument,
    pub errors: Vec<SheetValidationError>,
    pub reports: Vec<SheetReport>,
}

/// Extracts every sheet in declared order and assembles the valid ones.
/// A bad sheet is reported and skipped; the run always completes.
pub fn run<G: Geocoder, D: Diagnostics>(
    workbook: &Workbook,
    plan: &GenerationPlan,
    resolver: &GeocodeResolver<G, D>,
) -> PipelineOutput {
    let mut layers = Vec::new();
    let mut errors = Vec::new();
    let mut reports = Vec::new();

    for sheet in &workbook.sheets {
        match extract_sheet(sheet, resolver) {
            Ok(extracted) => {
                info!(
                    "Sheet '{}': {} markers placed, {} rows dropped",
                    sheet.name,
                    extracted.rows.len(),
                    extracted.dropped
                );
                reports.push(SheetReport {
                    sheet: sheet.name.clone(),
                    source: extracted.source,
                    placed: extracted.rows.len(),
                    dropped: extracted.dropped,
                });
                layers.push(SheetLayer {
                    sheet: sheet.name.clone(),
                    rows: extracted.rows,
                    style: plan.style_for(&sheet.name),
                });
            }
            Err(e) => {
                error!("{}", e);
                errors.push(e);
            }
        }
    }

    PipelineOutput {
        document: assemble(&plan.context, layers),
        errors,
        reports,
    }
}
