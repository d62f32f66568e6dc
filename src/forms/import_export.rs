use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use calamine::{Data, Reader, open_workbook_auto};
use thiserror::Error;

use crate::domain::types::is_valid_asin;

/// Header of the identifier column.
///
/// Headers are trimmed and compared ignoring ASCII case, so `ASIN` and `Asin`
/// match too. When no header matches the first column is used.
pub const ASIN_COLUMN: &str = "asin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
    /// Identifiers separated by commas or whitespace.
    Txt,
}

impl UploadFormat {
    /// Picks the format from the file extension, then the content type.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let file_name = file_name.unwrap_or_default().to_ascii_lowercase();
        match file_name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("xlsx") => return Some(Self::Xlsx),
            Some("csv") => return Some(Self::Csv),
            Some("txt") => return Some(Self::Txt),
            _ => {}
        }
        match content_type {
            Some("text/csv" | "application/csv") => Some(Self::Csv),
            Some("text/plain") => Some(Self::Txt),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => {
                Some(Self::Xlsx)
            }
            _ => None,
        }
    }
}

#[derive(MultipartForm)]
pub struct UploadAsinsForm {
    #[multipart(limit = "5MB")]
    pub file: TempFile,
}

#[derive(Debug, Error)]
pub enum UploadParseError {
    #[error("uploaded file is missing")]
    MissingFile,
    #[error("unsupported file format, use CSV, TXT or XLSX")]
    UnsupportedFormat,
    #[error("failed to read uploaded file")]
    ReadFailed,
    #[error("uploaded file is not valid UTF-8")]
    InvalidEncoding,
    #[error("failed to parse CSV")]
    CsvParseFailed,
    #[error("failed to parse XLSX")]
    XlsxParseFailed,
    #[error("uploaded file has no worksheet")]
    XlsxMissingSheet,
}

impl From<std::io::Error> for UploadParseError {
    fn from(_: std::io::Error) -> Self {
        Self::ReadFailed
    }
}

impl From<csv::Error> for UploadParseError {
    fn from(_: csv::Error) -> Self {
        Self::CsvParseFailed
    }
}

impl From<calamine::Error> for UploadParseError {
    fn from(_: calamine::Error) -> Self {
        Self::XlsxParseFailed
    }
}

impl UploadAsinsForm {
    /// Extracts the de-duplicated, valid identifiers contained in the upload.
    pub fn parse(&mut self) -> Result<Vec<String>, UploadParseError> {
        if self.file.file_name.is_none() {
            return Err(UploadParseError::MissingFile);
        }

        let content_type = self
            .file
            .content_type
            .as_ref()
            .map(|mime| mime.essence_str().to_string());
        let format = UploadFormat::detect(self.file.file_name.as_deref(), content_type.as_deref())
            .ok_or(UploadParseError::UnsupportedFormat)?;

        match format {
            UploadFormat::Xlsx => parse_xlsx(self.file.file.path()),
            UploadFormat::Csv | UploadFormat::Txt => {
                let file = self.file.file.as_file_mut();
                file.seek(SeekFrom::Start(0))?;
                let mut content = Vec::new();
                file.read_to_end(&mut content)?;
                parse_text_upload(format, &content)
            }
        }
    }
}

/// Parses CSV or TXT content. XLSX must go through [`parse_xlsx`].
pub fn parse_text_upload(
    format: UploadFormat,
    content: &[u8],
) -> Result<Vec<String>, UploadParseError> {
    match format {
        UploadFormat::Csv => parse_csv(content),
        UploadFormat::Xlsx => Err(UploadParseError::XlsxParseFailed),
        UploadFormat::Txt => {
            let text = std::str::from_utf8(content).map_err(|_| UploadParseError::InvalidEncoding)?;
            Ok(collect_asins(
                text.split(|c: char| c == ',' || c.is_whitespace())
                    .map(str::to_string),
            ))
        }
    }
}

fn parse_csv(content: &[u8]) -> Result<Vec<String>, UploadParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let column = asin_column(&headers);

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column) {
            values.push(value.to_string());
        }
    }

    Ok(collect_asins(values))
}

/// Reads the identifier column of the first worksheet.
pub fn parse_xlsx(path: &Path) -> Result<Vec<String>, UploadParseError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(UploadParseError::XlsxMissingSheet)??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_row.iter().map(cell_to_string).collect::<Vec<_>>();
    let column = asin_column(&headers);

    Ok(collect_asins(
        rows.filter_map(|row| row.get(column).map(cell_to_string)),
    ))
}

/// Index of the identifier column for the given header row.
pub fn asin_column(headers: &[String]) -> usize {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(ASIN_COLUMN))
        .unwrap_or(0)
}

/// Trims and upper-cases candidates, keeping valid identifiers once each in
/// first-seen order.
pub fn collect_asins<I>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|candidate| candidate.trim().to_ascii_uppercase())
        .filter(|candidate| is_valid_asin(candidate))
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn detects_formats() {
        assert_eq!(UploadFormat::detect(Some("list.CSV"), None), Some(UploadFormat::Csv));
        assert_eq!(
            UploadFormat::detect(Some("export"), Some("text/csv")),
            Some(UploadFormat::Csv)
        );
        assert_eq!(UploadFormat::detect(Some("list.xlsx"), None), Some(UploadFormat::Xlsx));
        assert_eq!(UploadFormat::detect(Some("list.txt"), None), Some(UploadFormat::Txt));
        assert_eq!(UploadFormat::detect(Some("photo.png"), Some("image/png")), None);
        assert_eq!(UploadFormat::detect(None, None), None);
    }

    #[test]
    fn identifier_column_matches_ignoring_case() {
        assert_eq!(asin_column(&headers(&["title", "asin", "ASIN"])), 1);
        assert_eq!(asin_column(&headers(&["title", " Asin "])), 1);
        assert_eq!(asin_column(&headers(&["title", "aSiN"])), 1);
        assert_eq!(asin_column(&headers(&["code", "title"])), 0);
        assert_eq!(asin_column(&[]), 0);
    }

    #[test]
    fn parses_csv_by_alias_column() {
        let content = b"title,ASIN\nEcho Dot,b08n5wrwnw\nKindle, B0B1VQ1ZQY \nbad,123\n";
        let asins = parse_text_upload(UploadFormat::Csv, content).unwrap();
        assert_eq!(asins, ["B08N5WRWNW", "B0B1VQ1ZQY"]);
    }

    #[test]
    fn parses_csv_first_column_fallback() {
        let content = b"code,title\nB08N5WRWNW,Echo\nB08N5WRWNW,Echo again\nB09B8V1LZ3\n";
        let asins = parse_text_upload(UploadFormat::Csv, content).unwrap();
        assert_eq!(asins, ["B08N5WRWNW", "B09B8V1LZ3"]);
    }

    #[test]
    fn parses_txt_on_commas_and_whitespace() {
        let content = b"B08N5WRWNW, b0b1vq1zqy\n\nB09B8V1LZ3\tB08N5WRWNW  NOTANASIN";
        let asins = parse_text_upload(UploadFormat::Txt, content).unwrap();
        assert_eq!(asins, ["B08N5WRWNW", "B0B1VQ1ZQY", "B09B8V1LZ3"]);
    }

    #[test]
    fn rejects_non_utf8_text() {
        let err = parse_text_upload(UploadFormat::Txt, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, UploadParseError::InvalidEncoding));
    }

    #[test]
    fn parses_xlsx_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asins.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "title").unwrap();
        worksheet.write_string(0, 1, "asin").unwrap();
        worksheet.write_string(1, 0, "Echo").unwrap();
        worksheet.write_string(1, 1, "B08N5WRWNW").unwrap();
        worksheet.write_string(2, 0, "Kindle").unwrap();
        worksheet.write_string(2, 1, "b0b1vq1zqy").unwrap();
        workbook.save(&path).unwrap();

        let asins = parse_xlsx(&path).unwrap();

        assert_eq!(asins, ["B08N5WRWNW", "B0B1VQ1ZQY"]);
    }
}
