//! Prometheus text exposition format.
//!
//! Renders the samples of one collection pass into the text format
//! (version 0.0.4) scraped by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::collector::Sample;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render samples into Prometheus text format.
///
/// Each sample gets its own `# HELP` and `# TYPE` header; a pass never
/// emits the same metric twice.
pub fn render_prometheus(samples: &[Sample<'_>]) -> String {
    let mut out = String::new();

    for sample in samples {
        let d = sample.descriptor;
        let _ = writeln!(out, "# HELP {} {}", d.name(), escape_help(d.help()));
        let _ = writeln!(out, "# TYPE {} {}", d.name(), d.kind());
        let _ = writeln!(out, "{} {}", d.name(), format_value(sample.value));
    }

    out
}

/// Help text may not contain raw backslashes or newlines.
fn escape_help(help: &str) -> String {
    help.replace('\\', r"\\").replace('\n', r"\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
