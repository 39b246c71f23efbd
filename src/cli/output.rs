//! Output formatting for CLI commands.

use std::fmt::Write;

use crate::cli::args::{OutputFormat, ShardStatArgs};
use crate::error::Result;
use crate::report::{FieldReport, GroupReport, NodeReport};

/// Print a report in the requested format.
pub fn output_report(report: &NodeReport, args: &ShardStatArgs) -> Result<()> {
    let rendered = match args.output_format {
        OutputFormat::Human => render_human(report),
        OutputFormat::Json => render_json(report, args.pretty)?,
    };
    println!("{rendered}");
    Ok(())
}

/// Render a report as JSON.
pub fn render_json(report: &NodeReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

/// Render a report as text.
pub fn render_human(report: &NodeReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Indices directory: {}", report.indices_dir);
    let _ = writeln!(
        out,
        "Corpus size: {} ({} bytes)",
        format_bytes(report.corpus_bytes),
        format_count(report.corpus_bytes)
    );
    match report.sample_size {
        Some(n) => {
            let _ = writeln!(
                out,
                "Stored fields: sampled, first {} documents per segment",
                format_count(n)
            );
        }
        None => {
            let _ = writeln!(out, "Stored fields: exact");
        }
    }

    for group in &report.groups {
        out.push('\n');
        write_group(&mut out, group);
    }

    if !report.unreferenced.is_empty() {
        let _ = writeln!(out, "\nUnreferenced directories:");
        for dir in &report.unreferenced {
            let _ = writeln!(out, "  {}  {}", dir.directory_id, format_bytes(dir.bytes));
        }
    }

    out
}

fn write_group(out: &mut String, group: &GroupReport) {
    let _ = writeln!(out, "== {} ==", group.name);

    let _ = writeln!(out, "Shards:");
    for shard in &group.shards {
        let _ = writeln!(
            out,
            "  {} [{}]  docs {}  deleted {}  index {}  translog {}  {} bytes/doc",
            shard.name,
            shard.directory_id,
            format_count(shard.docs),
            format_count(shard.deleted_docs),
            format_bytes(shard.index_bytes),
            format_bytes(shard.translog_bytes),
            format_count(shard.bytes_per_doc)
        );
    }

    let _ = writeln!(
        out,
        "Totals: docs {}  deleted {}  segments {}  index {}  translog {}  {:.2}% of corpus",
        format_count(group.docs),
        format_count(group.deleted_docs),
        format_count(group.segments),
        format_bytes(group.index_bytes),
        format_bytes(group.translog_bytes),
        group.percentage_of_corpus
    );
    let _ = writeln!(
        out,
        "Calculated total: {} ({} bytes)",
        format_bytes(group.calculated_total_bytes),
        format_count(group.calculated_total_bytes)
    );

    if group.fields.is_empty() {
        return;
    }
    let _ = writeln!(out, "Fields:");
    for field in &group.fields {
        write_field(out, field);
    }
}

fn write_field(out: &mut String, field: &FieldReport) {
    let _ = writeln!(
        out,
        "  {}  {}  total {} ({:.2}%)  stored {}",
        field.name,
        field.index_options,
        format_count(field.total_bytes),
        field.percentage,
        format_count(field.stored_bytes)
    );
    if field.term_count > 0 {
        let _ = writeln!(
            out,
            "      terms {} ({:.2} bytes/term)  index {}  term {}  suffix {}  uncompressed suffix {}  stats {}  other {}",
            format_count(field.term_count),
            field.bytes_per_term,
            format_count(field.index_bytes),
            format_count(field.term_bytes),
            format_count(field.block_suffix_bytes),
            format_count(field.uncompressed_block_suffix_bytes),
            format_count(field.block_stats_bytes),
            format_count(field.block_other_bytes)
        );
    }
    if let Some(sample) = &field.sample {
        let _ = writeln!(out, "      sample: {sample}");
    }
}

/// Format a count with thousands separators.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }
    formatted
}

/// Format bytes into human-readable format.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    if unit_index == 0 {
        format!("{bytes} {unit}")
    } else {
        format!("{size:.1} {unit}")
    }
}
