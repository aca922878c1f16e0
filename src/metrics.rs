//! Optional observability: OpenTelemetry metrics (`metrics` feature) and
//! `tracing` spans (`tracing` feature).

#[cfg(feature = "metrics")]
pub use otel::{RowmapMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Registry, TextEncoder};

    pub static METRICS: Lazy<RowmapMetrics> = Lazy::new(RowmapMetrics::init);

    pub struct RowmapMetrics {
        /// Registry the Prometheus exporter writes into
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub cache_misses: Counter<u64>,
    }

    impl RowmapMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let mut builder = SdkMeterProvider::builder();
            match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => builder = builder.with_reader(exporter),
                Err(err) => log::warn!("failed to build prometheus exporter: {err}"),
            }
            let provider = builder.build();
            let meter = provider.meter("rowmap");

            let queries_total = meter
                .u64_counter("rowmap_queries_total")
                .with_description("Total queries executed")
                .build();

            let query_errors = meter
                .u64_counter("rowmap_query_errors_total")
                .with_description("Queries that failed in the executor")
                .build();

            let query_duration = meter
                .f64_histogram("rowmap_query_duration_seconds")
                .with_description("Duration of queries")
                .build();

            let cache_misses = meter
                .u64_counter("rowmap_mapping_cache_misses_total")
                .with_description("Column mappings resolved because no cached entry existed")
                .build();

            Self {
                registry,
                provider,
                queries_total,
                query_errors,
                query_duration,
                cache_misses,
            }
        }

        pub fn record_query(&self, elapsed: std::time::Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors.add(1, &[]);
        }

        pub fn record_cache_miss(&self) {
            self.cache_misses.add(1, &[]);
        }

        /// Current metrics in the Prometheus text exposition format.
        pub fn render(&self) -> String {
            match TextEncoder::new().encode_to_string(&self.registry.gather()) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("failed to encode metrics: {err}");
                    String::new()
                }
            }
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span around one executor round-trip.
    pub fn execute_query_span(query: &str) -> Span {
        tracing::info_span!("rowmap.execute_query", db.statement = %query)
    }

    /// Span around composing and running a paginated listing.
    pub fn paginate_span(table: &str, page: u64, size: u64) -> Span {
        tracing::info_span!("rowmap.paginate", db.table = %table, page, size)
    }
}
