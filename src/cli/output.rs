use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::OutputFormat;

pub trait Formatter {
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Reachability of one upstream as seen from this host.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamStatus {
    pub name: &'static str,
    pub target: String,
    pub configured: bool,
    /// `None` when no connection attempt was made.
    pub connected: Option<bool>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub upstreams: Vec<UpstreamStatus>,
}

impl StatusInfo {
    pub fn all_healthy(&self) -> bool {
        self.upstreams
            .iter()
            .all(|u| u.configured && u.connected != Some(false))
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        for upstream in &status.upstreams {
            let state = match (upstream.configured, upstream.connected) {
                (false, _) => "[NOT CONFIGURED]",
                (true, Some(true)) => "[CONNECTED]",
                (true, Some(false)) => "[DISCONNECTED]",
                (true, None) => "[CONFIGURED]",
            };
            writeln!(output, "{:<10} {}", format!("{}:", upstream.name), state).unwrap();
            writeln!(output, "  Target:  {}", upstream.target).unwrap();
            if let Some(ref detail) = upstream.detail {
                writeln!(output, "  Detail:  {}", detail).unwrap();
            }
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Formatter for JsonFormatter {
    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
