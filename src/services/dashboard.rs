use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::client::{ReqwestTransport, Transport};
use crate::config::Config;
use crate::models::cache::{CacheStore, Payload};
use crate::services::fresh_data::FreshDataGate;
use crate::utils::display::DisplayFormatter;

/// How many records the asset and billing tables show.
const TABLE_ROWS: usize = 10;

/// Terminal rendition of the dashboard's asset and billing panels.
pub struct DashboardService<T> {
    assets: FreshDataGate<T>,
    billing: FreshDataGate<T>,
    display: DisplayFormatter,
}

impl DashboardService<ReqwestTransport> {
    pub fn new(config: &Config) -> Self {
        let transport = ReqwestTransport::new();
        Self::with_gates(
            FreshDataGate::new(
                config.assets_url.as_str(),
                Arc::new(CacheStore::new(config.cache_ttl)),
                transport.clone(),
            ),
            FreshDataGate::new(
                config.billing_url.as_str(),
                Arc::new(CacheStore::new(config.cache_ttl)),
                transport,
            ),
        )
    }
}

impl<T: Transport> DashboardService<T> {
    pub fn with_gates(assets: FreshDataGate<T>, billing: FreshDataGate<T>) -> Self {
        Self {
            assets,
            billing,
            display: DisplayFormatter::new(),
        }
    }

    pub fn assets_gate(&self) -> &FreshDataGate<T> {
        &self.assets
    }

    pub fn billing_gate(&self) -> &FreshDataGate<T> {
        &self.billing
    }

    /// Fresh data if the fetch works, otherwise whatever was stored last.
    async fn load(&self, gate: &FreshDataGate<T>, label: &str) -> Option<Payload> {
        match gate.fetch_or_serve().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!("Failed to fetch {} from {}: {}", label, gate.endpoint(), e);
                let stale = gate.cached();
                if stale.is_some() {
                    warn!("Showing stale {} data", label);
                }
                stale
            }
        }
    }

    pub async fn render_assets(&self) -> String {
        let loaded = self.load(&self.assets, "assets").await;
        let mut output = vec![self
            .display
            .format_header("Fleet Assets", Some(self.assets.state()))];
        match loaded {
            Some(assets) => {
                let rows: Vec<Vec<String>> = assets
                    .iter()
                    .take(TABLE_ROWS)
                    .map(|asset| {
                        vec![
                            self.display.format_field(asset, "id"),
                            self.display.format_field(asset, "name"),
                            self.display.format_field(asset, "status"),
                        ]
                    })
                    .collect();
                output.push(self.display.format_table(&["ID", "Name", "Status"], &rows));
                output.push(format!("{} assets", assets.len()));
            }
            None => output.push(self.display.format_metric_card("Assets", None)),
        }
        output.join("\n")
    }

    pub async fn render_billing(&self) -> String {
        let loaded = self.load(&self.billing, "billing").await;
        let mut output = vec![self
            .display
            .format_header("Billing", Some(self.billing.state()))];
        match loaded {
            Some(invoices) => {
                let rows: Vec<Vec<String>> = invoices
                    .iter()
                    .take(TABLE_ROWS)
                    .map(|invoice| {
                        let amount = amount_of(invoice)
                            .map(|a| self.display.format_currency(a))
                            .unwrap_or_else(|| self.display.format_field(invoice, "amount"));
                        vec![
                            self.display.format_field(invoice, "id"),
                            self.display.format_field(invoice, "description"),
                            amount,
                        ]
                    })
                    .collect();
                output.push(
                    self.display
                        .format_table(&["ID", "Description", "Amount"], &rows),
                );
                output.push(format!(
                    "Total: {}",
                    self.display.format_currency(billing_total(&invoices))
                ));
            }
            None => output.push(self.display.format_metric_card("Billing total", None)),
        }
        output.join("\n")
    }

    /// Headline metric cards. Each card falls back to `--` on its own.
    pub async fn render_summary(&self) -> String {
        let (assets, billing) = tokio::join!(
            self.load(&self.assets, "assets"),
            self.load(&self.billing, "billing")
        );

        let mut output = vec![self.display.format_header("TRAXOVO Summary", None)];
        output.push(self.display.format_metric_card(
            "Total assets",
            assets.as_ref().map(|a| a.len().to_string()),
        ));
        output.push(self.display.format_metric_card(
            "Active assets",
            assets.as_ref().map(|a| active_count(a).to_string()),
        ));
        output.push(self.display.format_metric_card(
            "Billing total",
            billing
                .as_ref()
                .map(|b| self.display.format_currency(billing_total(b))),
        ));
        output.join("\n")
    }

    /// Cache state of each gate. Never triggers a fetch.
    pub fn render_status(&self) -> String {
        let rows: Vec<Vec<String>> = [("assets", &self.assets), ("billing", &self.billing)]
            .into_iter()
            .map(|(label, gate)| {
                let age = gate.store().get().map(|(_, age)| age);
                vec![
                    label.to_string(),
                    self.display.format_state(gate.state()),
                    self.display.format_age(age),
                    gate.endpoint().to_string(),
                ]
            })
            .collect();

        format!(
            "{}\n{}",
            self.display.format_header("Cache", None),
            self.display
                .format_table(&["Feed", "State", "Fetched", "Endpoint"], &rows)
        )
    }
}

impl<T: Transport + 'static> DashboardService<T> {
    /// Poll both feeds on a fixed interval for the life of the process.
    /// Fresh gates answer from cache, so this never adds more than one
    /// request per TTL window per feed.
    pub fn spawn_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        info!("Refreshing dashboard feeds every {:?}", every);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                for gate in [&self.assets, &self.billing] {
                    match gate.fetch_or_serve().await {
                        Ok(payload) => {
                            debug!("Refreshed {} ({} records)", gate.endpoint(), payload.len())
                        }
                        Err(e) => warn!("Background refresh of {} failed: {}", gate.endpoint(), e),
                    }
                }
            }
        })
    }
}

fn active_count(assets: &[Value]) -> usize {
    assets
        .iter()
        .filter(|asset| {
            asset
                .get("status")
                .and_then(|s| s.as_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("active"))
        })
        .count()
}

/// Amounts may arrive as numbers or numeric strings.
fn amount_of(record: &Value) -> Option<f64> {
    match record.get("amount")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

fn billing_total(records: &[Value]) -> f64 {
    records.iter().filter_map(amount_of).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::FetchFailed;
    use crate::models::cache::DEFAULT_TTL;
    use crate::utils::clock::ManualClock;
    use crate::utils::display::PLACEHOLDER;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers by URL; a missing entry is a 500.
    #[derive(Default)]
    struct RoutedTransport {
        routes: Mutex<HashMap<String, Value>>,
    }

    impl RoutedTransport {
        fn route(&self, url: &str, body: Value) {
            self.routes.lock().unwrap().insert(url.to_string(), body);
        }

        fn clear(&self) {
            self.routes.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn get_json(&self, url: &str) -> Result<Value, FetchFailed> {
            self.routes
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| FetchFailed::Http {
                    status: 500,
                    url: url.to_string(),
                })
        }
    }

    const ASSETS: &str = "http://fleet.local/api/assets";
    const BILLING: &str = "http://fleet.local/api/billing";

    fn service() -> (
        DashboardService<Arc<RoutedTransport>>,
        Arc<RoutedTransport>,
        Arc<ManualClock>,
    ) {
        colored::control::set_override(false);
        let clock = Arc::new(ManualClock::new());
        let transport = Arc::new(RoutedTransport::default());
        let gate = |url: &str| {
            FreshDataGate::new(
                url,
                Arc::new(CacheStore::with_clock(DEFAULT_TTL, clock.clone())),
                transport.clone(),
            )
        };
        let service = DashboardService::with_gates(gate(ASSETS), gate(BILLING));
        (service, transport, clock)
    }

    #[test]
    fn counts_active_assets_case_insensitively() {
        let assets = vec![
            json!({"status": "Active"}),
            json!({"status": "active"}),
            json!({"status": "maintenance"}),
            json!({"id": 4}),
        ];
        assert_eq!(active_count(&assets), 2);
    }

    #[test]
    fn sums_numeric_and_string_amounts() {
        let records = vec![
            json!({"amount": 100.5}),
            json!({"amount": "$49.50"}),
            json!({"amount": "n/a"}),
            json!({"description": "no amount"}),
        ];
        assert_eq!(billing_total(&records), 150.0);
    }

    #[tokio::test]
    async fn summary_shows_placeholders_when_nothing_loaded() {
        let (service, _, _) = service();
        let summary = service.render_summary().await;
        assert!(summary.contains("Total assets"));
        assert_eq!(summary.matches(PLACEHOLDER).count(), 3);
    }

    #[tokio::test]
    async fn summary_renders_metrics() {
        let (service, transport, _) = service();
        transport.route(
            ASSETS,
            json!({"assets": [{"id": 1, "status": "active"}, {"id": 2, "status": "idle"}]}),
        );
        transport.route(BILLING, json!({"data": [{"amount": 20}, {"amount": 5.25}]}));

        let summary = service.render_summary().await;
        assert!(summary.contains("$25.25"));
        assert!(!summary.contains(PLACEHOLDER));
    }

    #[tokio::test]
    async fn stale_data_keeps_rendering_after_failure() {
        let (service, transport, clock) = service();
        transport.route(ASSETS, json!([{"id": 7, "name": "Excavator 7", "status": "active"}]));
        assert!(service.render_assets().await.contains("Excavator 7"));

        transport.clear();
        clock.advance_ms(45_000);

        let rendered = service.render_assets().await;
        assert!(rendered.contains("Excavator 7"));
        assert!(rendered.contains("1 assets"));
    }

    #[tokio::test]
    async fn asset_table_is_capped_but_count_is_not() {
        let (service, transport, _) = service();
        let assets: Vec<Value> = (1..=15)
            .map(|n| json!({"id": n, "name": format!("unit-{}", n), "status": "active"}))
            .collect();
        transport.route(ASSETS, json!({ "assets": assets }));

        let rendered = service.render_assets().await;
        assert_eq!(rendered.lines().filter(|l| l.contains("unit-")).count(), TABLE_ROWS);
        assert!(rendered.contains("unit-10"));
        assert!(!rendered.contains("unit-11"));
        assert!(!rendered.contains("unit-15"));
        assert!(rendered.contains("15 assets"));
        assert!(rendered.contains("[fresh]"));
    }

    #[tokio::test]
    async fn billing_rows_format_each_kind_of_amount() {
        let (service, transport, _) = service();
        transport.route(
            BILLING,
            json!([
                {"id": 1, "description": "Fuel", "amount": 120.5},
                {"id": 2, "description": "Tolls", "amount": "$49.50"},
                {"id": 3, "description": "Pending", "amount": "n/a"},
                {"id": 4, "description": "Unbilled"}
            ]),
        );

        let rendered = service.render_billing().await;
        let line = |needle: &str| {
            rendered
                .lines()
                .find(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("no row for {}", needle))
                .to_string()
        };
        assert!(line("Fuel").contains("$120.50"));
        assert!(line("Tolls").contains("$49.50"));
        assert!(line("Pending").contains("n/a"));
        assert!(line("Unbilled").contains(PLACEHOLDER));
        assert!(rendered.contains("Total: $170.00"));
    }

    #[tokio::test]
    async fn billing_without_data_shows_placeholder() {
        let (service, _, _) = service();
        let rendered = service.render_billing().await;
        assert!(rendered.contains("Billing total"));
        assert!(rendered.contains(PLACEHOLDER));
    }

    #[tokio::test]
    async fn status_reports_each_feed_without_fetching() {
        let (service, transport, clock) = service();
        transport.route(BILLING, json!([]));
        service.render_billing().await;
        clock.advance_ms(31_000);

        let status = service.render_status();
        assert!(status.contains("empty"));
        assert!(status.contains("stale"));
        assert!(status.contains("31s ago"));
        assert_eq!(service.assets_gate().state(), crate::models::cache::CacheState::Empty);
    }

    #[tokio::test]
    async fn background_refresh_respects_the_ttl() {
        let (service, transport, _) = service();
        transport.route(ASSETS, json!([{"id": 1}]));
        transport.route(BILLING, json!([]));
        let service = Arc::new(service);

        let handle = service.clone().spawn_refresh(Duration::from_secs(5));
        while service.billing_gate().cached().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(service.assets_gate().cached().unwrap().len(), 1);
        assert!(service.billing_gate().store().is_fresh());
    }
}
