use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::format::TEMPLATE_TIMESTAMP;

pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{dt}-PID{pid}.csv";
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

pub struct MonitorConfig {
    pub interval: Duration,
    /// Stop after this many records; `None` runs until the process exits.
    pub max_samples: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_samples: None,
        }
    }
}

/// Expands `{dt}` and `{pid}` in an output file name template.
/// `{{` and `}}` stand for literal braces.
pub fn render_output_path(template: &str, started: &DateTime<Local>, pid: u32) -> Result<PathBuf> {
    let invalid = |reason: String| Error::Template {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(invalid("unclosed '{'".to_string())),
                        Some(c) => key.push(c),
                    }
                }
                match key.as_str() {
                    "dt" => out.push_str(&started.format(TEMPLATE_TIMESTAMP).to_string()),
                    "pid" => out.push_str(&pid.to_string()),
                    _ => return Err(invalid(format!("unknown placeholder {{{}}}", key))),
                }
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(invalid("single '}' encountered".to_string())),
            _ => out.push(ch),
        }
    }

    if out.is_empty() {
        return Err(invalid("empty file name".to_string()));
    }
    Ok(PathBuf::from(out))
}
