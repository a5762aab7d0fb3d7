//! Company fundamentals workflow.

use tracing::{error, info};

use crate::context::CollectorContext;
use crate::error::Result;
use crate::modules::endpoint_fetch::{fetch_endpoint, FetchRequest};
use crate::stats::CollectionStats;

/// Endpoints fetched by the fundamentals run, with their sub-endpoints.
pub const FUNDAMENTAL_ENDPOINTS: &[(&str, &[&str])] = &[
    ("profile", &[]),
    (
        "financials",
        &[
            "bs_annual",
            "bs_quarterly",
            "cf_annual",
            "cf_quarterly",
            "ic_annual",
            "ic_quarterly",
        ],
    ),
    ("recommendation", &[]),
    ("price-target", &[]),
    ("revenue-estimate", &[]),
    ("ebitda-estimate", &[]),
    ("ebit-estimate", &[]),
    ("eps-estimate", &[]),
];

/// One request per endpoint / sub-endpoint, in run order.
pub fn fundamental_requests() -> Vec<FetchRequest> {
    FUNDAMENTAL_ENDPOINTS
        .iter()
        .flat_map(|(endpoint, subs)| {
            if subs.is_empty() {
                vec![FetchRequest::new(*endpoint)]
            } else {
                subs.iter()
                    .map(|sub| FetchRequest::new(*endpoint).sub_endpoint(*sub))
                    .collect()
            }
        })
        .collect()
}

/// Fetch every fundamentals endpoint. A failing endpoint is logged and
/// skipped unless the failure is a configuration error.
pub async fn collect_fundamentals(
    ctx: &CollectorContext,
    tickers: &[String],
) -> Result<CollectionStats> {
    let requests = fundamental_requests();
    let mut stats = CollectionStats::new();

    for (step, request) in requests.iter().enumerate() {
        info!(
            step = step + 1,
            of = requests.len(),
            endpoint = %request.endpoint,
            sub_endpoint = ?request.sub_endpoint,
            "Fetching endpoint"
        );

        match fetch_endpoint(ctx, request, tickers).await {
            Ok(endpoint_stats) => stats.merge(&endpoint_stats),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                stats.errors += 1;
                error!(endpoint = %request.endpoint, error = %e, "Endpoint failed");
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fundamental_requests() {
        let requests = fundamental_requests();
        assert_eq!(requests.len(), 13);
        assert_eq!(requests[0].endpoint, "profile");
        assert_eq!(requests[1].sub_endpoint.as_deref(), Some("bs_annual"));
        assert_eq!(requests[6].sub_endpoint.as_deref(), Some("ic_quarterly"));
        assert_eq!(requests[12].endpoint, "eps-estimate");
    }
}
