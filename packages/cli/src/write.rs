//! Output writers for merged metric rows.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use geo::MultiPolygon;
use serde_json::{Value, json};
use thiserror::Error;
use urban_metrics_geometry::convert::{multipolygon_to_geojson, point_to_geojson};
use urban_metrics_models::UrbanCenterMetrics;

/// Metric columns, in output order.
const METRIC_COLUMNS: [&str; 9] = [
    "hull_geom",
    "compactness",
    "total_population",
    "cell_count",
    "ghs_density",
    "ghs_wt_density",
    "density_gradient_slope",
    "density_gradient_intercept",
    "density_gradient_center",
];

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `GeoJSON` `FeatureCollection`.
    Geojson,
    /// CSV with geometries as `GeoJSON` strings.
    Csv,
}

impl OutputFormat {
    /// Guesses the format from a file extension, defaulting to `GeoJSON`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Geojson,
        }
    }
}

/// Writes rows to `path` in the given format.
///
/// # Errors
///
/// * If the file cannot be created or written
/// * If serialization fails
pub fn write_rows(
    rows: &[UrbanCenterMetrics],
    path: &Path,
    format: OutputFormat,
) -> Result<(), WriteError> {
    let io_error = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Geojson => write_geojson(rows, &mut writer)?,
        OutputFormat::Csv => write_csv(rows, &mut writer)?,
    }

    writer.flush().map_err(io_error)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Attributes with these names would shadow a written column and are
/// dropped.
fn is_output_column(name: &str) -> bool {
    name == "id" || name == "geometry" || METRIC_COLUMNS.contains(&name)
}

fn multipolygon_value(geometry: Option<&MultiPolygon<f64>>) -> Result<Value, serde_json::Error> {
    geometry.map_or(Ok(Value::Null), |g| serde_json::to_value(multipolygon_to_geojson(g)))
}

/// The urban center footprint as a `GeoJSON` value.
fn footprint(row: &UrbanCenterMetrics) -> Result<Value, serde_json::Error> {
    multipolygon_value(row.geometry.as_ref())
}

/// Metric columns of one row as JSON values (`null` when missing).
fn metric_values(row: &UrbanCenterMetrics) -> Result<[Value; 9], serde_json::Error> {
    Ok([
        multipolygon_value(row.hull.as_ref())?,
        json!(row.compactness),
        json!(row.total_population),
        json!(row.cell_count),
        json!(row.mean_density),
        json!(row.weighted_density),
        json!(row.density_gradient_slope),
        json!(row.density_gradient_intercept),
        row.density_gradient_center
            .as_ref()
            .map(|p| serde_json::to_value(point_to_geojson(p)))
            .transpose()?
            .unwrap_or(Value::Null),
    ])
}

/// Writes a `FeatureCollection` whose feature geometry is the urban
/// center footprint.
///
/// # Errors
///
/// * If serialization or the underlying writer fails
pub fn write_geojson(rows: &[UrbanCenterMetrics], writer: impl Write) -> Result<(), WriteError> {
    let features = rows
        .iter()
        .map(|row| {
            let mut properties = serde_json::Map::new();
            properties.insert("id".to_string(), serde_json::to_value(&row.id)?);
            if let Some(attributes) = &row.attributes {
                properties.extend(
                    attributes
                        .iter()
                        .filter(|(name, _)| !is_output_column(name))
                        .map(|(name, value)| (name.clone(), value.clone())),
                );
            }
            for (column, value) in METRIC_COLUMNS.iter().zip(metric_values(row)?) {
                properties.insert((*column).to_string(), value);
            }

            Ok(json!({
                "type": "Feature",
                "geometry": footprint(row)?,
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_writer(writer, &collection)?;
    Ok(())
}

/// Writes one CSV row per urban center. Attribute columns are the union
/// of attribute names across rows; the footprint goes in `geometry`.
///
/// # Errors
///
/// * If serialization or the underlying writer fails
pub fn write_csv(rows: &[UrbanCenterMetrics], writer: impl Write) -> Result<(), WriteError> {
    let attribute_columns: BTreeSet<&str> = rows
        .iter()
        .filter_map(|row| row.attributes.as_ref())
        .flat_map(|attributes| attributes.keys().map(String::as_str))
        .filter(|name| !is_output_column(name))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);

    let header = std::iter::once("id")
        .chain(attribute_columns.iter().copied())
        .chain(std::iter::once("geometry"))
        .chain(METRIC_COLUMNS);
    csv.write_record(header)?;

    for row in rows {
        let mut record = vec![row.id.to_string()];
        record.extend(attribute_columns.iter().map(|column| {
            row.attributes
                .as_ref()
                .and_then(|attributes| attributes.get(*column))
                .map_or_else(String::new, csv_field)
        }));
        record.push(csv_field(&footprint(row)?));
        record.extend(metric_values(row)?.iter().map(csv_field));
        csv.write_record(&record)?;
    }

    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Strings unquoted, `null` empty, everything else as JSON text.
fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
