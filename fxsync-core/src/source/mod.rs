//! Remote rate source: trait, HTTP client, circuit breaker, fixtures, health checks.

pub mod circuit_breaker;
pub mod fixture;
pub mod health;
pub mod http;
pub mod provider;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use fixture::FixtureSource;
pub use health::{check_source, CheckResult, CheckStatus, HealthReport};
pub use http::HttpRateSource;
pub use provider::{DailyRates, RateDate, RateSource, SourceError};
