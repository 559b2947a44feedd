use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Write};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// One log record in JSON form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    /// ISO 8601 timestamp
    pub timestamp: String,
    pub level: String,
    /// Emitting module
    pub target: String,
    pub message: String,
    /// Remaining event fields
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
}

/// Process information attached to JSON records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub app_version: String,
    pub hostname: String,
    pub pid: u32,
    pub thread_id: String,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            thread_id: format!("{:?}", std::thread::current().id()),
        }
    }
}

/// Layer writing one JSON line per event to stderr
pub struct JsonFormatter {
    include_context: bool,
}

impl<S> Layer<S> for JsonFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let level = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN",
            Level::INFO => "INFO",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };

        let entry = StructuredLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            level: level.to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            context: self.include_context.then(ExecutionContext::default),
        };

        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(io::stderr(), "{}", json);
        }
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: HashMap<String, Value>,
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(format!("{:?}", value)),
            );
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields.insert(field.name().to_string(), Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), Value::Bool(value));
    }
}

/// Logging setup
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is not set
    pub level: Level,
    pub json_output: bool,
    /// ANSI colours for the human format
    pub color_output: bool,
    /// Attach `ExecutionContext` to JSON records
    pub include_context: bool,
    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_output: false,
            color_output: true,
            include_context: true,
            include_line_numbers: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    /// Level derived from a `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        self
    }
}

/// Install the global tracing subscriber.
pub fn init_structured_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    if config.json_output {
        let json_layer = JsonFormatter {
            include_context: config.include_context,
        };

        let subscriber = Registry::default().with(env_filter).with(json_layer);

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_line_number(config.include_line_numbers)
            .with_ansi(config.color_output)
            .with_span_events(FmtSpan::CLOSE);

        let subscriber = Registry::default().with(env_filter).with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Logs the duration and outcome of a named operation
pub struct OperationTimer {
    start: std::time::Instant,
    operation_name: String,
    fields: HashMap<String, Value>,
}

impl OperationTimer {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation_name: operation_name.into(),
            fields: HashMap::new(),
        }
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn finish(self) {
        let duration_ms = self.elapsed_ms();

        tracing::info!(
            operation = %self.operation_name,
            duration_ms = duration_ms,
            success = true,
            fields = ?self.fields,
            "Operation completed"
        );
    }

    pub fn finish_with_result<T>(self, result: Result<T, impl std::fmt::Display>) {
        let duration_ms = self.elapsed_ms();

        match result {
            Ok(_) => {
                tracing::info!(
                    operation = %self.operation_name,
                    duration_ms = duration_ms,
                    success = true,
                    fields = ?self.fields,
                    "Operation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation = %self.operation_name,
                    duration_ms = duration_ms,
                    success = false,
                    error = %e,
                    fields = ?self.fields,
                    "Operation failed"
                );
            }
        }
    }
}
