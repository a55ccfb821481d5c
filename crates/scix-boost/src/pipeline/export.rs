use std::io::Write;

use super::repository::StoredBoostFactors;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unable to write CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to flush CSV export: {0}")]
    Io(#[from] std::io::Error),
}

pub fn csv_header(disciplines: &[String]) -> Vec<String> {
    let mut header: Vec<String> = [
        "bibcode",
        "scix_id",
        "created",
        "doctype_boost",
        "refereed_boost",
        "recency_boost",
        "boost_factor",
    ]
    .iter()
    .map(|column| column.to_string())
    .collect();
    header.extend(disciplines.iter().map(|name| format!("{name}_weight")));
    header.extend(disciplines.iter().map(|name| format!("{name}_final_boost")));
    header
}

/// Writes one row per stored record and returns the row count.
///
/// Discipline columns follow `disciplines`; a row scored without one of them
/// leaves the cell empty.
pub fn write_csv<W: Write>(
    writer: W,
    disciplines: &[String],
    rows: &[StoredBoostFactors],
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(csv_header(disciplines))?;

    for row in rows {
        let factors = &row.factors;
        let mut cells = vec![
            row.id.bibcode.clone().unwrap_or_default(),
            row.id.scix_id.clone().unwrap_or_default(),
            row.created.to_rfc3339(),
            factors.doctype_boost.to_string(),
            factors.refereed_boost.to_string(),
            factors.recency_boost.to_string(),
            factors.boost_factor.to_string(),
        ];
        cells.extend(disciplines.iter().map(|name| optional_cell(factors.weight(name))));
        cells.extend(
            disciplines
                .iter()
                .map(|name| optional_cell(factors.final_boost(name))),
        );
        csv_writer.write_record(&cells)?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
