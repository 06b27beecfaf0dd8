use std::io::Write;

use crate::confidence::ConfidenceSummary;
use crate::error::ExportError;

pub(crate) fn export_summary_to_csv_impl<W: Write>(
    summary: &ConfidenceSummary,
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "entry",
        "n",
        "mean",
        "std",
        "se",
        "confidence",
        "ci_low",
        "ci_high",
    ])?;

    for (name, entry) in summary {
        let [low, high] = entry.confidence_interval;
        wtr.write_record([
            name.clone(),
            entry.n.to_string(),
            entry.mean.to_string(),
            entry.std.to_string(),
            entry.se.to_string(),
            entry.confidence.to_string(),
            low.to_string(),
            high.to_string(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
