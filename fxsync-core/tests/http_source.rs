//! HTTP rate source status handling against a local mock of the currency API.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fxsync_core::source::{BreakerState, CircuitBreaker};
use fxsync_core::{CurrencyCode, HttpRateSource, RateDate, RateSource, SourceConfig, SourceError};

const PREFIX: &str = "/currency-api";

/// Mock server plus the runtime that drives its setup calls.
struct Api {
    server: MockServer,
    rt: Runtime,
}

impl Api {
    fn start() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn requests(&self) -> usize {
        self.rt
            .block_on(self.server.received_requests())
            .map_or(0, |r| r.len())
    }

    fn config(&self) -> SourceConfig {
        config_for(format!("{}{PREFIX}", self.server.uri()))
    }
}

fn config_for(base_url: String) -> SourceConfig {
    SourceConfig {
        base_url,
        timeout_secs: 5,
        max_retries: 2,
        retry_base_delay_ms: 0,
        ..SourceConfig::default()
    }
}

fn breaker(threshold: u32) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(Duration::from_secs(60), threshold))
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("usd").unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
}

fn usd_path() -> String {
    format!("{PREFIX}@2024.3.2/v1/currencies/usd.json")
}

fn rates_body() -> serde_json::Value {
    serde_json::json!({ "date": "2024-03-02", "usd": { "eur": 0.92, "jpy": 150.1 } })
}

// =============================================================================
// Success
// =============================================================================

#[test]
fn dated_request_decodes_payload() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(rates_body())),
    );
    let source = HttpRateSource::new(&api.config(), breaker(3)).unwrap();

    let rates = source.daily_rates(&usd(), RateDate::On(day())).unwrap();
    assert_eq!(rates.date, Some(day()));
    assert_eq!(rates.rate(&CurrencyCode::new("eur").unwrap()), Some(0.92));
    assert!(source.is_available());
}

#[test]
fn catalog_comes_from_latest_package() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(format!("{PREFIX}@latest/v1/currencies.json")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "usd": "US Dollar", "eur": "Euro" })),
            ),
    );
    let source = HttpRateSource::new(&api.config(), breaker(3)).unwrap();

    let catalog = source.currencies().unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.name(&usd()), Some("US Dollar"));
}

// =============================================================================
// Missing day
// =============================================================================

#[test]
fn non_success_status_is_no_data_without_retry() {
    for status in [404u16, 500] {
        let api = Api::start();
        api.mount(
            Mock::given(method("GET"))
                .and(path(usd_path()))
                .respond_with(ResponseTemplate::new(status)),
        );
        let cb = breaker(1);
        let source = HttpRateSource::new(&api.config(), cb.clone()).unwrap();

        let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
        match err {
            SourceError::NoData { base, date } => {
                assert_eq!(base, "usd");
                assert_eq!(date, RateDate::On(day()));
            }
            other => panic!("status {status}: expected NoData, got {other:?}"),
        }
        assert_eq!(api.requests(), 1, "status {status} must not be retried");
        // A missing day never counts against the breaker.
        assert_eq!(cb.state(), BreakerState::Closed);
    }
}

#[test]
fn unavailable_catalog_is_format_change() {
    let api = Api::start();
    api.mount(Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)));
    let source = HttpRateSource::new(&api.config(), breaker(3)).unwrap();

    let err = source.currencies().unwrap_err();
    assert!(matches!(err, SourceError::ResponseFormatChanged(_)), "{err:?}");
}

#[test]
fn undecodable_body_is_format_change() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>")),
    );
    let source = HttpRateSource::new(&api.config(), breaker(3)).unwrap();

    let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(matches!(err, SourceError::ResponseFormatChanged(_)), "{err:?}");
    assert!(!err.is_no_data());
}

// =============================================================================
// Rate limiting and bans
// =============================================================================

#[test]
fn rate_limit_is_retried_until_success() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1),
    );
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(rates_body())),
    );
    let source = HttpRateSource::new(&api.config(), breaker(3)).unwrap();

    assert!(source.daily_rates(&usd(), RateDate::On(day())).is_ok());
    assert_eq!(api.requests(), 2);
}

#[test]
fn persistent_rate_limit_exhausts_retries() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7")),
    );
    let source = HttpRateSource::new(&api.config(), breaker(10)).unwrap();

    let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(
        matches!(err, SourceError::RateLimited { retry_after_secs: 7 }),
        "{err:?}"
    );
    // First attempt plus max_retries.
    assert_eq!(api.requests(), 3);
}

#[test]
fn rate_limit_counts_as_breaker_failure() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(429)),
    );
    let config = SourceConfig {
        max_retries: 5,
        ..api.config()
    };
    let cb = breaker(2);
    let source = HttpRateSource::new(&config, cb.clone()).unwrap();

    let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(matches!(err, SourceError::CircuitBreakerTripped), "{err:?}");
    assert_eq!(api.requests(), 2);
    assert!(matches!(cb.state(), BreakerState::Open { .. }));
}

#[test]
fn forbidden_trips_breaker_and_stops_requests() {
    let api = Api::start();
    api.mount(
        Mock::given(method("GET"))
            .and(path(usd_path()))
            .respond_with(ResponseTemplate::new(403)),
    );
    let cb = breaker(3);
    let source = HttpRateSource::new(&api.config(), cb.clone()).unwrap();

    let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(matches!(err, SourceError::CircuitBreakerTripped));
    assert!(!source.is_available());
    assert!(cb.remaining_cooldown() > Duration::ZERO);

    let again = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(matches!(again, SourceError::CircuitBreakerTripped));
    assert_eq!(api.requests(), 1);
}

// =============================================================================
// Transport failures
// =============================================================================

#[test]
fn refused_connection_retries_then_reports_unreachable() {
    // Nothing listens on port 1.
    let config = config_for("http://127.0.0.1:1/currency-api".into());
    let cb = breaker(3);
    let source = HttpRateSource::new(&config, cb.clone()).unwrap();

    let err = source.daily_rates(&usd(), RateDate::On(day())).unwrap_err();
    assert!(matches!(err, SourceError::NetworkUnreachable(_)), "{err:?}");
    // Three failed attempts reach the threshold.
    assert!(!cb.is_allowed());
}
