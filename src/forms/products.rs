use serde::Deserialize;

use crate::domain::product::ProductResult;

/// JSON body of `POST /api/products`.
///
/// `ids` is accepted as an alias of `asins`. A missing list is treated as an
/// empty request by the service layer.
#[derive(Debug, Deserialize)]
pub struct LookupProductsForm {
    #[serde(default, alias = "ids")]
    pub asins: Vec<String>,
}

/// JSON body of `POST /api/export`.
#[derive(Debug, Deserialize)]
pub struct ExportProductsForm {
    #[serde(default)]
    pub products: Vec<ProductResult>,
}

/// Query parameters of `POST /api/export`.
#[derive(Debug, Deserialize)]
pub struct ExportQueryParams {
    #[serde(default = "default_download_format")]
    pub format: String,
}

fn default_download_format() -> String {
    "csv".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ids_alias() {
        let form: LookupProductsForm =
            serde_json::from_str(r#"{"ids": ["B08N5WRWNW"]}"#).unwrap();
        assert_eq!(form.asins, ["B08N5WRWNW"]);
    }

    #[test]
    fn missing_list_is_empty() {
        let form: LookupProductsForm = serde_json::from_str("{}").unwrap();
        assert!(form.asins.is_empty());
    }
}
