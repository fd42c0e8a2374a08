//! HTML extraction for METAR report pages
//!
//! The METAR form page has no stable structure to parse, so the table rows are
//! isolated by plain text slicing on the row delimiter.

use thiserror::Error;

/// Text present on every genuine METAR report page
pub const REPORT_MARKER: &str = "Output produced by METARs form";

/// Delimiter that starts every table row on the report page
pub const ROW_DELIMITER: &str = "<TR VALIGN=";

/// Opening tag of the table handed to the page renderer
pub const TABLE_OPEN: &str =
    "<TABLE style=\"border-spacing: 5px;border-collapse: inherit;line-height: 1.3;\">";

/// Segments preceding the report rows: the page header and the form's header row
const HEADER_SEGMENTS: usize = 2;

/// Errors that can occur when extracting the report table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The body is not a METAR report page
    #[error("Response is not a METAR report page (marker not found)")]
    MissingMarker,

    /// The page had no rows after the header
    #[error("METAR report page contains no report rows")]
    NoRows,
}

/// Extracts the report rows from a METAR form page into a styled table
///
/// Splits `body` on [`ROW_DELIMITER`], drops the first two segments and
/// re-joins the rest, each segment prefixed with the delimiter again, after
/// [`TABLE_OPEN`]. The closing markup comes from the page itself.
///
/// # Returns
/// * `Ok(String)` - The table HTML
/// * `Err(ExtractError)` - If the marker is missing or no rows remain
pub fn extract_metar_table(body: &str) -> Result<String, ExtractError> {
    if !body.contains(REPORT_MARKER) {
        return Err(ExtractError::MissingMarker);
    }

    let rows: Vec<&str> = body.split(ROW_DELIMITER).skip(HEADER_SEGMENTS).collect();
    if rows.is_empty() {
        return Err(ExtractError::NoRows);
    }

    let mut html = String::with_capacity(TABLE_OPEN.len() + body.len());
    html.push_str(TABLE_OPEN);
    for row in rows {
        html.push_str(ROW_DELIMITER);
        html.push_str(row);
    }

    Ok(html)
}
