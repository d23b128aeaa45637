//! Append-only CSV log of computed routes

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{map_io_err, RouterResult};
use crate::reinforcement::route::Route;

/// Header row written to new or empty log files
pub const ROUTE_LOG_HEADER: &str = "Timestamp,Start Point,End Point,Optimal Route,Number of Steps";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct RouteLog {
    path: PathBuf,
}

impl RouteLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `route`, writing the header first if the file is new
    pub fn append(&self, route: &Route, start: &str, end: &str) -> RouterResult<()> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_io_err(&self.path))?;

        let mut content = String::new();
        if needs_header {
            content.push_str(ROUTE_LOG_HEADER);
            content.push('\n');
        }
        content.push_str(&format_row(
            &Local::now().format(TIMESTAMP_FORMAT).to_string(),
            start,
            end,
            route,
        ));
        content.push('\n');

        file.write_all(content.as_bytes())
            .map_err(map_io_err(&self.path))?;
        debug!(path = %self.path.display(), "route appended to log");
        Ok(())
    }
}

fn format_row(timestamp: &str, start: &str, end: &str, route: &Route) -> String {
    [
        escape_field(timestamp),
        escape_field(start),
        escape_field(end),
        escape_field(&route.to_string()),
        route.step_count().to_string(),
    ]
    .join(",")
}

/// Quote a CSV field when it contains a separator, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
