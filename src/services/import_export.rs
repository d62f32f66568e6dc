use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use thiserror::Error;

use crate::domain::product::{BatchOutcome, ProductResult};
use crate::domain::types::Price;
use crate::keepa::ProductApi;
use crate::services::batches::{BatchOptions, Pacer};
use crate::services::products::lookup_products;

use super::{ServiceError, ServiceResult};

/// Column headers of the results export.
pub const EXPORT_HEADERS: [&str; 6] = [
    "ASIN",
    "Product Title",
    "Main BSR",
    "Main Category",
    "Price",
    "Availability",
];

const NOT_AVAILABLE: &str = "N/A";

/// File formats offered by the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = ExportError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Rendered export ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export format: {0}")]
    InvalidFormat(String),
    #[error("failed to write CSV export")]
    Csv(#[from] csv::Error),
    #[error("failed to write XLSX export")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for ExportError {
    fn from(err: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        Self::Csv(err.into_error().into())
    }
}

/// Looks up the identifiers extracted from an uploaded file.
///
/// `candidates` must already be de-duplicated, upper-cased valid identifiers.
/// An empty list is a form error; a list over the limit is rejected before any
/// Keepa call.
pub async fn lookup_uploaded<A, P>(
    candidates: Vec<String>,
    api: &A,
    pacer: &P,
    options: &BatchOptions,
) -> ServiceResult<BatchOutcome>
where
    A: ProductApi + ?Sized,
    P: Pacer + ?Sized,
{
    if candidates.is_empty() {
        return Err(ServiceError::Form(
            "No valid ASINs found in the file".to_string(),
        ));
    }

    log::info!("Found {} valid ASINs in upload", candidates.len());

    lookup_products(&candidates, api, pacer, options).await
}

/// Renders lookup results as a downloadable table dated `date`.
pub fn export_products(
    products: &[ProductResult],
    format: ExportFormat,
    date: NaiveDate,
) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => write_csv(products)?,
        ExportFormat::Xlsx => write_xlsx(products)?,
    };
    Ok(ExportFile {
        file_name: format!(
            "amazon_bsr_results_{}.{}",
            date.format("%Y-%m-%d"),
            format.extension()
        ),
        content_type: format.content_type(),
        bytes,
    })
}

/// Core business logic for the export endpoint: validates the requested
/// format and renders the products dated today.
pub fn download_products(format: &str, products: &[ProductResult]) -> ServiceResult<ExportFile> {
    let format = ExportFormat::try_from(format)?;
    let today = chrono::Utc::now().date_naive();
    export_products(products, format, today).map_err(|e| {
        log::error!("Failed to render export: {e}");
        ServiceError::from(e)
    })
}

/// One export line; `None` cells render as `N/A`.
struct ExportRow<'a> {
    asin: &'a str,
    title: &'a str,
    main_rank: Option<&'a str>,
    main_category: Option<&'a str>,
    price: Option<Price>,
    availability: &'static str,
}

impl<'a> From<&'a ProductResult> for ExportRow<'a> {
    fn from(product: &'a ProductResult) -> Self {
        let main = product.main_ranking();
        Self {
            asin: &product.asin,
            title: &product.title,
            main_rank: main.map(|r| r.rank.as_str()),
            main_category: main.map(|r| r.category.as_str()),
            price: product.price,
            availability: product.availability.label(),
        }
    }
}

fn write_csv(products: &[ProductResult]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(EXPORT_HEADERS)?;
    for row in products.iter().map(ExportRow::from) {
        let price = row
            .price
            .map_or_else(|| NOT_AVAILABLE.to_string(), |price| format!("${price}"));
        writer.write_record([
            row.asin,
            neutralize_formula(row.title).as_str(),
            row.main_rank.unwrap_or(NOT_AVAILABLE),
            neutralize_formula(row.main_category.unwrap_or(NOT_AVAILABLE)).as_str(),
            price.as_str(),
            row.availability,
        ])?;
    }
    Ok(writer.into_inner()?)
}

/// Writes ranks and prices as numbers so spreadsheets can sort them.
fn write_xlsx(products: &[ProductResult]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let rank_format = Format::new().set_num_format("#,##0");
    let price_format = Format::new().set_num_format("$#,##0.00");
    let worksheet = workbook.add_worksheet();

    for (col, title) in (0u16..).zip(EXPORT_HEADERS) {
        worksheet.write_string_with_format(0, col, title, &header)?;
    }

    for (row_idx, row) in (1u32..).zip(products.iter().map(ExportRow::from)) {
        worksheet.write_string(row_idx, 0, row.asin)?;
        worksheet.write_string(row_idx, 1, row.title)?;
        match row.main_rank.and_then(parse_rank) {
            Some(rank) => worksheet.write_number_with_format(row_idx, 2, rank, &rank_format)?,
            None => worksheet.write_string(row_idx, 2, NOT_AVAILABLE)?,
        };
        worksheet.write_string(row_idx, 3, row.main_category.unwrap_or(NOT_AVAILABLE))?;
        match row.price {
            Some(price) => worksheet.write_number_with_format(
                row_idx,
                4,
                price.cents() as f64 / 100.0,
                &price_format,
            )?,
            None => worksheet.write_string(row_idx, 4, NOT_AVAILABLE)?,
        };
        worksheet.write_string(row_idx, 5, row.availability)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Reads back a rank formatted with thousands separators.
fn parse_rank(rank: &str) -> Option<f64> {
    rank.replace(',', "").parse::<u64>().ok().map(|rank| rank as f64)
}

/// Prefixes free-text cells that a spreadsheet would evaluate as a formula.
fn neutralize_formula(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}
