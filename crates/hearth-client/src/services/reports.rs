use chrono::{NaiveDate, SecondsFormat};
use hearth_core::{ReportData, ReportPeriod};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct ReportService<'a> {
    pub(crate) client: &'a ApiClient,
}

/// Midnight UTC of `date` as the backend expects it
fn iso_start_of_day(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn report_query(period: ReportPeriod, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<(&'static str, String)> {
    let mut query = vec![("period", period.as_str().to_string())];
    if let Some(start) = start {
        query.push(("startDate", iso_start_of_day(start)));
    }
    if let Some(end) = end {
        query.push(("endDate", iso_start_of_day(end)));
    }
    query
}

impl ReportService<'_> {
    /// `GET /reports` for `period`, optionally bounded
    pub async fn generate(
        &self,
        period: ReportPeriod,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReportData, ClientError> {
        self.client
            .get_with_query("/reports", &report_query(period, start, end))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::test_support::serve;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_report_query() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let query = report_query(ReportPeriod::Quarterly, start, None);
        assert_eq!(
            query,
            vec![
                ("period", "QUARTERLY".to_string()),
                ("startDate", "2024-01-01T00:00:00.000Z".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_passes_query() {
        let router = Router::new().route(
            "/api/reports",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "success": true,
                    "data": {
                        "period": params.get("period").cloned().unwrap_or_default(),
                        "startDate": params.get("startDate").cloned().unwrap_or_default(),
                        "endDate": params.get("endDate").cloned().unwrap_or_default(),
                        "totalIncome": 100,
                        "totalExpense": 40,
                        "balance": 60,
                        "transactions": [],
                        "byCategory": {}
                    }
                }))
            }),
        );
        let client = ApiClient::new(serve(router).await, SessionContext::new());

        let report = client
            .reports()
            .generate(
                ReportPeriod::Monthly,
                NaiveDate::from_ymd_opt(2024, 5, 1),
                NaiveDate::from_ymd_opt(2024, 5, 31),
            )
            .await
            .unwrap();

        assert_eq!(report.period, ReportPeriod::Monthly);
        assert_eq!(report.start_date, "2024-05-01T00:00:00.000Z");
        assert_eq!(report.end_date, "2024-05-31T00:00:00.000Z");
        assert!(report.top_expenses().is_empty());
    }
}
