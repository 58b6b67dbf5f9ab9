//! Capture file naming
//!
//! A template such as `{serial}_{datetime}_{counter}_{L_R}` is validated once
//! and rendered per frame. Spaces and dots of the rendered name become `_`
//! and `.png` is appended.

use chrono::{Local, TimeZone};
use contracts::ContractError;

/// Extension appended to every rendered name
pub const IMAGE_EXTENSION: &str = "png";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Serial,
    Datetime,
    Counter,
    SideLabel,
}

/// Parsed naming template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NameTemplate {
    /// Parse and validate a template
    pub fn parse(format: &str) -> Result<Self, ContractError> {
        config_loader::validate_name_format(format)?;

        let mut segments = Vec::new();
        let mut rest = format;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            // 已校验，括号必然闭合
            let close = after.find('}').unwrap_or(after.len());
            segments.push(match &after[..close] {
                "serial" => Segment::Serial,
                "datetime" => Segment::Datetime,
                "counter" => Segment::Counter,
                _ => Segment::SideLabel,
            });
            rest = after.get(close + 1..).unwrap_or("");
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// File stem for one frame (local time), sanitized, without extension
    pub fn render(&self, serial: &str, timestamp_us: u64, counter: u64, side_label: &str) -> String {
        self.render_in(&Local, serial, timestamp_us, counter, side_label)
    }

    /// File stem rendered with an explicit time zone
    pub fn render_in<Tz>(
        &self,
        tz: &Tz,
        serial: &str,
        timestamp_us: u64,
        counter: u64,
        side_label: &str,
    ) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name = String::with_capacity(self.source.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Serial => name.push_str(serial),
                Segment::Datetime => name.push_str(&format_timestamp(tz, timestamp_us)),
                Segment::Counter => name.push_str(&counter.to_string()),
                Segment::SideLabel => name.push_str(side_label),
            }
        }
        sanitize(&name)
    }

    /// Full file name (`<stem>.png`)
    pub fn file_name(&self, serial: &str, timestamp_us: u64, counter: u64, side_label: &str) -> String {
        format!(
            "{}.{IMAGE_EXTENSION}",
            self.render(serial, timestamp_us, counter, side_label)
        )
    }
}

/// `YYYY-MM-DD HH:MM:SS.ffffff` of a microsecond timestamp
pub fn format_timestamp<Tz>(tz: &Tz, timestamp_us: u64) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let micros = i64::try_from(timestamp_us).unwrap_or(i64::MAX);
    match tz.timestamp_micros(micros).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => timestamp_us.to_string(),
    }
}

fn sanitize(name: &str) -> String {
    name.replace([' ', '.'], "_")
}
