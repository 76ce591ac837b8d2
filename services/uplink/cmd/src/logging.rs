use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// ANSI color codes for console output
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_BRIGHT_YELLOW: &str = "\x1b[93m";
const COLOR_BRIGHT_RED: &str = "\x1b[91m";
const COLOR_BRIGHT_GRAY: &str = "\x1b[90m";

/// Column widths for alignment
const SERVICE_NAME_WIDTH: usize = 20;
const LOG_LEVEL_WIDTH: usize = 7; // +2 for icons

/// Custom formatter with a fixed-width component column
pub struct UplinkLogFormatter {
    service_name: String,
    color_enabled: bool,
}

impl UplinkLogFormatter {
    pub fn new(service_name: String) -> Self {
        let color_enabled = is_terminal();
        Self {
            service_name,
            color_enabled,
        }
    }

    /// Derive the component column from the event target. Targets from
    /// workspace crates show up as `uplink_sched::scheduler`; strip the
    /// crate prefix and keep the top-level module.
    fn component_from_target(target: &str) -> Option<&str> {
        let crate_name = target.split("::").next()?;
        crate_name.strip_prefix("uplink_")
    }

    /// Format service name with fixed width
    fn format_service_name(&self, target: &str) -> String {
        let name = if let Some(comp) = Self::component_from_target(target) {
            format!("uplink-{}", comp)
        } else {
            self.service_name.clone()
        };

        if name.len() > SERVICE_NAME_WIDTH {
            // Truncate long service names
            format!("{}…", &name[..SERVICE_NAME_WIDTH - 1])
        } else {
            // Pad short names
            format!("{:<width$}", name, width = SERVICE_NAME_WIDTH)
        }
    }

    /// Format log level with visual indicators
    fn format_log_level(&self, level: &tracing::Level) -> String {
        let level_str = match *level {
            tracing::Level::ERROR => "✗ ERROR",
            tracing::Level::WARN => "⚠ WARN",
            tracing::Level::INFO => "ℹ INFO",
            tracing::Level::DEBUG => "◦ DEBUG",
            tracing::Level::TRACE => "◦ TRACE",
        };

        format!("{:<width$}", level_str, width = LOG_LEVEL_WIDTH + 2) // +2 for icon
    }

    fn get_color_for_level(&self, level: &tracing::Level) -> &'static str {
        if !self.color_enabled {
            return "";
        }

        match *level {
            tracing::Level::ERROR => COLOR_BRIGHT_RED,
            tracing::Level::WARN => COLOR_BRIGHT_YELLOW,
            tracing::Level::INFO => COLOR_GREEN,
            tracing::Level::DEBUG => COLOR_BRIGHT_GRAY,
            tracing::Level::TRACE => COLOR_BRIGHT_GRAY,
        }
    }
}

impl<S, N> FormatEvent<S, N> for UplinkLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now();
        let timestamp = now.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let level = event.metadata().level();

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let formatted_service = self.format_service_name(event.metadata().target());
        let formatted_level = self.format_log_level(level);

        let color = self.get_color_for_level(level);
        let reset_color = if self.color_enabled { COLOR_RESET } else { "" };
        let cyan_color = if self.color_enabled { COLOR_CYAN } else { "" };

        // [timestamp] [service_name] [log_level] message key=value ...
        write!(
            writer,
            "{}[{}] [{}] [{}{}{}] ",
            cyan_color, timestamp, formatted_service, color, formatted_level, reset_color
        )?;

        write!(writer, "{}", visitor.message)?;
        if !visitor.fields.is_empty() {
            write!(writer, " {}", visitor.fields.join(" "))?;
        }
        writeln!(writer, "{}", reset_color)?;

        Ok(())
    }
}

/// Visitor to extract the message and remaining fields from the event
struct FieldVisitor {
    message: String,
    fields: Vec<String>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
            fields: Vec::new(),
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                self.message = format!("{:?}", value);
                // Remove quotes from debug formatting
                if self.message.starts_with('"') && self.message.ends_with('"') {
                    self.message = self.message[1..self.message.len() - 1].to_string();
                }
            }
            name => {
                self.fields.push(format!("{}={:?}", name, value));
            }
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => {
                self.message = value.to_string();
            }
            name => {
                self.fields.push(format!("{}={}", name, value));
            }
        }
    }
}

/// Check if we're outputting to a terminal (for color support)
fn is_terminal() -> bool {
    if std::env::var("TERM").unwrap_or_default() == "dumb" {
        return false;
    }

    std::env::var("TERM").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_from_target() {
        assert_eq!(
            UplinkLogFormatter::component_from_target("uplink_sched::scheduler"),
            Some("sched")
        );
        assert_eq!(
            UplinkLogFormatter::component_from_target("uplink_session"),
            Some("session")
        );
        assert_eq!(
            UplinkLogFormatter::component_from_target("hyper::client"),
            None
        );
    }

    #[test]
    fn test_service_name_padding() {
        let formatter = UplinkLogFormatter {
            service_name: "uplink".to_string(),
            color_enabled: false,
        };
        let padded = formatter.format_service_name("uplink_wire::request");
        assert_eq!(padded.len(), SERVICE_NAME_WIDTH);
        assert!(padded.starts_with("uplink-wire"));
    }
}
