//! Demo server: the adapter over an in-memory record store.
//!
//! Run from repo root:
//! `RECORD_BRIDGE_API_DEFINITION=demos/api-definition.json cargo run --example server`

use record_bridge::{
    adapter_routes_with_limit, common_routes_with_state, load_from_path, resolve, AppState, InMemoryStore,
    ResolvedModel, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Register every resource type and report with the in-memory store so the API is usable out of the box.
fn seed(store: &InMemoryStore, model: &ResolvedModel) {
    for r in &model.resources {
        store.register_type(&r.module, &r.business_object);
    }
    for report in model.reports.values() {
        let Some(resource) = model.resources.iter().find(|r| r.business_object == report.business_object) else {
            continue;
        };
        let columns: Vec<(&str, &str)> = resource
            .mapper
            .fields()
            .iter()
            .map(|f| (f.exposed.as_str(), f.internal.as_str()))
            .collect();
        store.register_query(&report.query_name, &report.module, &report.business_object, &columns);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("record_bridge=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let definition = load_from_path(&settings.api_definition).await?;
    let model = resolve(&definition)?;

    let store = InMemoryStore::with_next_id(100_000);
    seed(&store, &model);

    let mut state = AppState::new(model, Arc::new(store));
    if let Some(path) = &settings.openapi {
        let text = tokio::fs::read_to_string(path).await?;
        state = state.with_openapi(serde_json::from_str(&text)?);
    }

    let app = common_routes_with_state(state.clone()).merge(adapter_routes_with_limit(state, settings.body_limit));
    let listener = TcpListener::bind(&settings.bind).await?;
    let addr = listener.local_addr()?;
    tracing::info!("record bridge listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
