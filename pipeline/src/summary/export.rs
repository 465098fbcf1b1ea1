//! Write a dataset back out as delimited text.

use csv::WriterBuilder;

use crate::models::Dataset;

/// Serialize `dataset` with a `Time` column holding the original timestamp
/// text followed by one column per published parameter. Missing values are
/// written as empty cells.
pub fn export_csv(dataset: &Dataset, delimiter: u8) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(Vec::new());

    let mut header = vec!["Time".to_string()];
    header.extend(dataset.parameters.iter().cloned());
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row = vec![record.original_time.clone()];
        row.extend(
            dataset
                .parameters
                .iter()
                .map(|p| record.value(p).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
