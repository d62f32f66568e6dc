use crate::domain::product::{BatchOutcome, ProductResult, QuotaSnapshot, SingleLookup};
use crate::domain::types::{Asin, is_valid_asin};
use crate::keepa::{ApiError, ProductApi, ProductQuery};
use crate::models::keepa::ProductResponse;
use crate::services::batches::{BatchOptions, BatchPlan, Pacer};
use crate::services::normalize::normalize_product;

use super::{ServiceError, ServiceResult};

/// Looks up a single product.
///
/// The identifier is validated before any network activity. Exactly one Keepa
/// call is made; an empty product list is reported as
/// [`ServiceError::NotFound`] and Keepa failures are classified by
/// [`classify_api_error`].
pub async fn lookup_product<A>(asin: &str, api: &A) -> ServiceResult<SingleLookup>
where
    A: ProductApi + ?Sized,
{
    let asin = Asin::new(asin)?;

    log::info!("Fetching data for ASIN: {asin}");

    let response = match api.fetch_products(ProductQuery::single(&asin)).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("Keepa lookup for {asin} failed: {e}");
            return Err(classify_api_error(e));
        }
    };

    let quota = quota_of(&response);
    let raw = match response.products.and_then(|products| products.into_iter().next()) {
        Some(raw) => raw,
        None => return Err(ServiceError::NotFound),
    };

    Ok(SingleLookup {
        product: normalize_product(raw),
        quota,
    })
}

/// Looks up many products in sequential, paced batches.
///
/// The whole request is rejected up front when it is empty, exceeds
/// `options.max_asins` or contains any malformed identifier. Once validation
/// passes the run never fails: a batch whose call fails contributes no
/// results, its identifiers are reported in [`BatchOutcome::unresolved`] and
/// the remaining batches still run.
pub async fn lookup_products<A, P>(
    asins: &[String],
    api: &A,
    pacer: &P,
    options: &BatchOptions,
) -> ServiceResult<BatchOutcome>
where
    A: ProductApi + ?Sized,
    P: Pacer + ?Sized,
{
    let asins = validate_asins(asins, options.max_asins)?;

    let plan = BatchPlan::new(&asins, options.batch_size, options.pacing);
    log::info!(
        "Fetching data for {} ASINs in {} batches",
        asins.len(),
        plan.total()
    );

    let mut outcome = BatchOutcome::default();
    for job in plan {
        let report = run_batch(api, job.items).await;
        match report {
            BatchReport::Completed { products, quota } => {
                outcome.results.extend(products);
                outcome.quota = quota;
            }
            BatchReport::Failed { error } => {
                log::error!(
                    "Batch {}/{} ({} ASINs) failed: {error}",
                    job.index + 1,
                    job.total,
                    job.items.len()
                );
                if let ApiError::RateLimited(quota) = error {
                    outcome.quota = quota;
                }
                outcome.unresolved.extend_from_slice(job.items);
            }
        }

        if let Some(pause) = job.pause_after {
            pacer.pause(pause).await;
        }
    }

    log::info!(
        "Batch lookup finished: {} products, {} unresolved ASINs",
        outcome.results.len(),
        outcome.unresolved.len()
    );

    Ok(outcome)
}

/// Outcome of one batch call.
#[derive(Debug)]
enum BatchReport {
    Completed {
        products: Vec<ProductResult>,
        quota: QuotaSnapshot,
    },
    Failed {
        error: ApiError,
    },
}

async fn run_batch<A>(api: &A, asins: &[Asin]) -> BatchReport
where
    A: ProductApi + ?Sized,
{
    match api.fetch_products(ProductQuery::batch(asins)).await {
        Ok(response) => {
            let quota = quota_of(&response);
            let products = response
                .products
                .unwrap_or_default()
                .into_iter()
                .map(normalize_product)
                .collect();
            BatchReport::Completed { products, quota }
        }
        Err(error) => BatchReport::Failed { error },
    }
}

/// Checks format and count of a batch request before any network activity.
///
/// All malformed identifiers are reported together, in request order, even
/// when the request is also over the count limit.
pub fn validate_asins(asins: &[String], max_asins: usize) -> ServiceResult<Vec<Asin>> {
    if asins.is_empty() {
        return Err(ServiceError::EmptyRequest);
    }

    let invalid: Vec<String> = asins
        .iter()
        .filter(|asin| !is_valid_asin(asin))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(ServiceError::InvalidFormat(invalid));
    }

    if asins.len() > max_asins {
        return Err(ServiceError::CountExceeded {
            found: asins.len(),
            max: max_asins,
        });
    }

    asins
        .iter()
        .map(|asin| Asin::new(asin.as_str()).map_err(ServiceError::from))
        .collect()
}

/// Maps a Keepa failure onto the service error taxonomy.
pub fn classify_api_error(error: ApiError) -> ServiceError {
    match error {
        ApiError::RateLimited(quota) => ServiceError::QuotaExceeded(quota),
        ApiError::Timeout => ServiceError::Timeout,
        ApiError::Status(_) | ApiError::Transport(_) | ApiError::Decode(_) => {
            ServiceError::Upstream
        }
    }
}

fn quota_of(response: &ProductResponse) -> QuotaSnapshot {
    QuotaSnapshot {
        tokens_left: response.tokens_left.unwrap_or(0),
        refill_in: response.refill_in.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::keepa::test::TestProductApi;
    use crate::services::batches::RecordingPacer;

    fn asins(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("B{i:09}")).collect()
    }

    #[tokio::test]
    async fn single_lookup_returns_product_and_quota() {
        let api = TestProductApi::new();

        let lookup = lookup_product("B08N5WRWNW", &api).await.unwrap();

        assert_eq!(lookup.product.asin, "B08N5WRWNW");
        assert_eq!(lookup.product.rankings[0].rank, "4,200");
        assert_eq!(lookup.quota.tokens_left, 999);
        assert_eq!(lookup.quota.refill_in, 60);
        assert_eq!(api.calls(), vec![vec!["B08N5WRWNW".to_string()]]);
    }

    #[tokio::test]
    async fn single_lookup_rejects_invalid_format_without_calling() {
        let api = TestProductApi::new();

        let err = lookup_product("b08n5wrwnw", &api).await.unwrap_err();

        assert_eq!(err, ServiceError::InvalidFormat(vec!["b08n5wrwnw".into()]));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn single_lookup_reports_missing_product() {
        let api = TestProductApi::new().missing("B08N5WRWNW");
        let err = lookup_product("B08N5WRWNW", &api).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[tokio::test]
    async fn single_lookup_classifies_upstream_errors() {
        let quota = QuotaSnapshot {
            tokens_left: 0,
            refill_in: 42,
        };
        let cases = [
            (ApiError::RateLimited(quota), ServiceError::QuotaExceeded(quota)),
            (ApiError::Timeout, ServiceError::Timeout),
            (ApiError::Status(400), ServiceError::Upstream),
            (ApiError::Status(503), ServiceError::Upstream),
            (ApiError::Transport("reset".into()), ServiceError::Upstream),
            (ApiError::Decode("eof".into()), ServiceError::Upstream),
        ];
        for (api_error, expected) in cases {
            let api = TestProductApi::new().fail_call(0, api_error);
            assert_eq!(lookup_product("B08N5WRWNW", &api).await.unwrap_err(), expected);
        }
    }

    #[tokio::test]
    async fn batch_lookup_rejects_too_many_asins_without_calling() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();

        let err = lookup_products(&asins(101), &api, &pacer, &BatchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::CountExceeded { found: 101, max: 100 });
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_lookup_reports_format_before_count() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();
        let mut request = asins(150);
        request[3] = "INVALID".to_string();

        let err = lookup_products(&request, &api, &pacer, &BatchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::InvalidFormat(vec!["INVALID".into()]));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_lookup_accepts_exactly_the_limit() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();

        let outcome = lookup_products(&asins(100), &api, &pacer, &BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 100);
        assert_eq!(api.calls().len(), 5);
        assert_eq!(pacer.pauses().len(), 4);
    }

    #[tokio::test]
    async fn batch_lookup_lists_every_invalid_asin() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();
        let request = vec![
            "B08N5WRWNW".to_string(),
            "INVALIDID".to_string(),
            "b0b1vq1zqy".to_string(),
        ];

        let err = lookup_products(&request, &api, &pacer, &BatchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::InvalidFormat(vec!["INVALIDID".into(), "b0b1vq1zqy".into()])
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn batch_lookup_rejects_empty_request() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();
        let err = lookup_products(&[], &api, &pacer, &BatchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::EmptyRequest);
    }

    #[tokio::test]
    async fn failed_batch_is_contained() {
        let api =
            TestProductApi::new().fail_call(1, ApiError::Transport("connection reset".into()));
        let pacer = RecordingPacer::new();
        let request = asins(45);

        let outcome = lookup_products(&request, &api, &pacer, &BatchOptions::default())
            .await
            .unwrap();

        let sizes: Vec<usize> = api.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, [20, 20, 5]);
        let returned: Vec<&str> = outcome.results.iter().map(|p| p.asin.as_str()).collect();
        let expected: Vec<&str> = request[..20]
            .iter()
            .chain(&request[40..])
            .map(String::as_str)
            .collect();
        assert_eq!(returned, expected);
        assert_eq!(outcome.quota.tokens_left, 997);
        assert_eq!(outcome.unresolved.len(), 20);
        assert_eq!(outcome.unresolved[0], request[20].as_str());
        assert_eq!(pacer.pauses(), [Duration::from_secs(1), Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn rate_limited_batch_updates_quota() {
        let quota = QuotaSnapshot {
            tokens_left: 0,
            refill_in: 30,
        };
        let api = TestProductApi::new().fail_call(1, ApiError::RateLimited(quota));
        let pacer = RecordingPacer::new();

        let outcome = lookup_products(&asins(40), &api, &pacer, &BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 20);
        assert_eq!(outcome.quota, quota);
    }

    #[tokio::test]
    async fn batch_lookup_honours_custom_options() {
        let api = TestProductApi::new();
        let pacer = RecordingPacer::new();
        let options = BatchOptions {
            batch_size: std::num::NonZeroUsize::new(3).unwrap(),
            max_asins: 10,
            pacing: Duration::ZERO,
        };

        let outcome = lookup_products(&asins(7), &api, &pacer, &options)
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 7);
        let sizes: Vec<usize> = api.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, [3, 3, 1]);
        assert_eq!(pacer.pauses(), [Duration::ZERO, Duration::ZERO]);
    }
}
