use std::net::SocketAddr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::error;

use crate::{
    config::AnalysisConfig,
    sections::{self, deep_dive::DeepDiveQuery, Section, SectionError},
    store::DataStore,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: DataStore,
    pub analysis: AnalysisConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(introduction))
        .route("/introduction", get(introduction))
        .route("/overview", get(overview))
        .route("/deep-dive", get(deep_dive))
        .route("/conclusions", get(conclusions))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dashboard listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn introduction() -> Response {
    render_page(Section::Introduction, sections::introduction::render).await
}

async fn overview(State(state): State<AppState>) -> Response {
    render_page(Section::Overview, move || {
        sections::overview::render(&state.store, &state.analysis)
    })
    .await
}

async fn deep_dive(
    State(state): State<AppState>,
    query: Result<Query<DeepDiveQuery>, QueryRejection>,
) -> Response {
    let query = query_or_default(query);
    render_page(Section::DeepDive, move || {
        sections::deep_dive::render(&state.store, &state.analysis, &query)
    })
    .await
}

/// A query string that does not deserialize is treated as no filters at all.
fn query_or_default<E: std::fmt::Display>(query: Result<Query<DeepDiveQuery>, E>) -> DeepDiveQuery {
    match query {
        Ok(Query(q)) => q,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring deep dive query");
            DeepDiveQuery::default()
        }
    }
}

async fn conclusions() -> Response {
    render_page(Section::Conclusions, sections::conclusions::render).await
}

/// Every view recomputes from the full tables; that work runs on the blocking pool.
async fn render_page<F>(section: Section, render: F) -> Response
where
    F: FnOnce() -> Result<String, SectionError> + Send + 'static,
{
    metrics::counter!("dashboard_page_views_total", "section" => section.slug()).increment(1);

    match tokio::task::spawn_blocking(render).await {
        Ok(Ok(html)) => Html(html).into_response(),
        Ok(Err(e)) => {
            error!(section = section.slug(), error = %e, "template render error");
            error_page(section)
        }
        Err(e) => {
            error!(section = section.slug(), error = %e, "render task failed");
            error_page(section)
        }
    }
}

fn error_page(section: Section) -> Response {
    let body = format!("<h1>Error rendering {}</h1>", section.title());
    (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_client::domain::{CapacityRecord, ConsumptionRecord};
    use time::macros::datetime;

    fn state() -> AppState {
        let consumption = vec![
            ConsumptionRecord {
                ts: datetime!(2012-01-01 00:00),
                electricity_mw: 1_000.0,
                gas_mw: 400.0,
                total_mw: 1_400.0,
            },
            ConsumptionRecord {
                ts: datetime!(2012-01-01 12:00),
                electricity_mw: 3_000.0,
                gas_mw: 600.0,
                total_mw: 3_600.0,
            },
        ];
        let capacity = vec![CapacityRecord {
            year: 2012,
            wind_capacity_mw: Some(100.0),
            solar_capacity_mw: Some(50.0),
        }];
        AppState {
            store: DataStore::from_tables(consumption, capacity),
            analysis: AnalysisConfig::default(),
        }
    }

    async fn body(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn static_sections_render() {
        let resp = introduction().await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("<h1>Introduction</h1>"));

        let resp = conclusions().await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("<h1>Conclusions</h1>"));
    }

    #[tokio::test]
    async fn overview_renders_from_state() {
        let resp = overview(State(state())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("Showing 2 of 2 rows"));
    }

    #[tokio::test]
    async fn deep_dive_without_query_uses_defaults() {
        let resp = deep_dive(State(state()), Ok(Query(DeepDiveQuery::default()))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body(resp).await;
        assert!(html.contains("4,000"));
        assert!(html.contains("value=\"2012-01-01\""));
    }

    #[tokio::test]
    async fn deep_dive_applies_filters() {
        let query = DeepDiveQuery {
            applied: Some("1".into()),
            gas: Some("on".into()),
            ..DeepDiveQuery::default()
        };
        let resp = deep_dive(State(state()), Ok(Query(query))).await;
        let html = body(resp).await;
        assert!(html.contains("name=\"gas\" checked"));
        assert!(!html.contains("name=\"electricity\" checked"));
    }

    #[test]
    fn unreadable_query_falls_back_to_defaults() {
        let rejected: Result<Query<DeepDiveQuery>, &str> = Err("duplicate field `start`");
        let query = query_or_default(rejected);
        assert!(query.start.is_none());
        assert!(query.applied.is_none());

        let filters = query.filters(None);
        assert_eq!(filters.variables.len(), 3);
    }
}
