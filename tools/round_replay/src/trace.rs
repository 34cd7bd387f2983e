use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{bail, Context, Result};
use oromotor::{engine::types::TonguePosition, RawSample};

pub const HEADER: &str = "ms,detecting,open_ratio,protrusion,roundness,elevation,x";

/// Reads a tracker capture. Empty cells are channels the tracker did not
/// report on that frame.
pub fn parse_trace(path: &Path) -> Result<Vec<RawSample>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line =
            line_result.with_context(|| format!("failed to read {}:{line_no}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == HEADER {
            continue;
        }
        let sample = parse_line(trimmed)
            .with_context(|| format!("{}:{line_no} invalid trace line", path.display()))?;
        if let Some(previous) = out.last().map(|s: &RawSample| s.now_ms) {
            if sample.now_ms < previous {
                bail!(
                    "{}:{line_no} timestamp {} goes backwards",
                    path.display(),
                    sample.now_ms
                );
            }
        }
        out.push(sample);
    }
    Ok(out)
}

pub fn parse_line(line: &str) -> Result<RawSample> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 7 {
        bail!("expected 7 columns, found {}", parts.len());
    }

    let now_ms = parts[0]
        .parse::<u64>()
        .with_context(|| format!("invalid ms `{}`", parts[0]))?;
    let detecting = match parts[1] {
        "1" | "true" => true,
        "0" | "false" => false,
        other => bail!("invalid detecting flag `{other}`"),
    };
    let open_ratio = optional(parts[2], "open_ratio")?.unwrap_or(0.0);
    let tongue_elevation = optional(parts[5], "elevation")?;
    let tongue_x = optional(parts[6], "x")?;
    let tongue_seen = tongue_elevation.is_some() || tongue_x.is_some();

    Ok(RawSample {
        now_ms,
        detecting,
        open_ratio,
        is_open: open_ratio > 0.0,
        protrusion: optional(parts[3], "protrusion")?,
        roundness: optional(parts[4], "roundness")?,
        tongue_elevation,
        tongue_position: tongue_x.map(|x| TonguePosition { x, y: 0.5 }),
        tongue_visible: tongue_seen.then_some(true),
    })
}

fn optional(cell: &str, column: &str) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value = cell
        .parse::<f64>()
        .with_context(|| format!("invalid {column} `{cell}`"))?;
    Ok(Some(value))
}
