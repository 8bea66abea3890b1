// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text output for each subcommand.
//!
//! Renderers write to any [`Write`] so they can be checked without a
//! terminal.

use std::io::{self, Write};

use comfy_table::{presets::UTF8_FULL, Table};
use otdr_app_core::{
    DistanceDisplay, LinkSummary, Notice, NoticeKind, RecordError, TraceFormat, TraceRecord,
};
use otdr_sor::{BlockKind, ChecksumStatus, OtdrFile, Trace};

fn table<H: Into<comfy_table::Row>>(header: H) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

/// Checksum status with its value, e.g. `valid (0x1a2b)`.
pub fn checksum_label(status: ChecksumStatus) -> String {
    match status {
        ChecksumStatus::Valid { value } => format!("valid ({value:#06x})"),
        ChecksumStatus::Mismatch { declared, computed } => {
            format!("mismatch (declared {declared:#06x}, computed {computed:#06x})")
        }
        ChecksumStatus::Absent => "absent".to_string(),
    }
}

/// Link summary panel followed by file-level facts.
pub fn inspect_table<W: Write>(
    out: &mut W,
    name: &str,
    file: &OtdrFile,
    summary: &LinkSummary,
) -> io::Result<()> {
    let mut t = table(vec!["Field", "Value"]);
    t.add_row(vec!["File".to_string(), name.to_string()]);
    t.add_row(vec![
        "Format".to_string(),
        format!("{:?} (map revision {})", file.version(), file.map_revision()),
    ]);
    for (label, value) in summary.rows() {
        t.add_row(vec![label.to_string(), value]);
    }
    t.add_row(vec!["Traces".to_string(), file.traces().len().to_string()]);
    t.add_row(vec!["Blocks".to_string(), file.directory().len().to_string()]);
    t.add_row(vec!["Checksum".to_string(), checksum_label(file.checksum())]);
    writeln!(out, "{t}")
}

/// One line per notice. Warnings (checksum mismatches) are dropped when
/// `warn_on_checksum` is off.
pub fn notices<W: Write>(
    out: &mut W,
    notices: &[Notice],
    warn_on_checksum: bool,
) -> io::Result<()> {
    for notice in notices {
        if notice.kind == NoticeKind::Warn && !warn_on_checksum {
            continue;
        }
        match &notice.body {
            Some(body) => writeln!(out, "{}: {} ({body})", notice.kind.label(), notice.title)?,
            None => writeln!(out, "{}: {}", notice.kind.label(), notice.title)?,
        }
    }
    Ok(())
}

/// Block directory in file order.
pub fn blocks_table<W: Write>(out: &mut W, file: &OtdrFile) -> io::Result<()> {
    let mut t = table(vec!["#", "Block", "Revision", "Offset", "Length", "Kind"]);
    for (i, entry) in file.directory().iter().enumerate() {
        let kind = if entry.id.kind() == BlockKind::Unknown {
            "opaque"
        } else {
            "known"
        };
        t.add_row(vec![
            (i + 1).to_string(),
            entry.id.to_string(),
            entry.revision.to_string(),
            entry.offset.to_string(),
            entry.length.to_string(),
            kind.to_string(),
        ]);
    }
    writeln!(out, "{t}")
}

/// Key events with distances in `display` units.
pub fn events_table<W: Write>(
    out: &mut W,
    file: &OtdrFile,
    display: DistanceDisplay,
) -> io::Result<()> {
    let mut t = table(vec![
        "#",
        "Type",
        "Code",
        "Distance",
        "Splice loss (dB)",
        "Reflectance (dB)",
        "Slope (dB/km)",
        "Cumulative (dB)",
        "Comment",
    ]);
    for event in &file.key_events().events {
        t.add_row(vec![
            event.number.to_string(),
            event.kind.label().to_string(),
            event.code.clone(),
            display.format(event.distance_m),
            format!("{:.3}", event.splice_loss_db),
            format!("{:.3}", event.reflectance_db),
            format!("{:.3}", event.slope_db_per_km),
            format!("{:.3}", event.cumulative_loss_db),
            event.comment.clone(),
        ]);
    }
    writeln!(out, "{t}")
}

/// `distance_m`/`power_db` header, then every `stride`-th sample.
pub fn trace_lines<W: Write>(
    out: &mut W,
    trace: &Trace,
    stride: usize,
    format: TraceFormat,
) -> io::Result<()> {
    let sep = format.separator();
    writeln!(out, "distance_m{sep}power_db")?;
    for (distance, power) in trace.downsample(stride) {
        writeln!(out, "{distance:.4}{sep}{power:.4}")?;
    }
    Ok(())
}

/// One row per input file; failures keep their position.
pub fn batch_table<W: Write>(
    out: &mut W,
    rows: &[(String, Result<TraceRecord, RecordError>)],
    display: DistanceDisplay,
) -> io::Result<()> {
    let mut t = table(vec![
        "File",
        "Type",
        "Wavelength",
        "Traces",
        "Events",
        "Length",
        "Loss",
        "Checksum",
        "Status",
    ]);
    for (name, outcome) in rows {
        match outcome {
            Ok(record) => {
                let file = record.file();
                let summary = LinkSummary::from_file(&file, display);
                t.add_row(vec![
                    name.clone(),
                    record.file_type(),
                    record.wavelength_label(),
                    file.traces().len().to_string(),
                    file.key_events().len().to_string(),
                    summary.length_label(),
                    summary.end_to_end_loss.label(),
                    file.checksum().label().to_string(),
                    "ok".to_string(),
                ]);
            }
            Err(err) => {
                let mut row = vec![name.clone()];
                row.extend(std::iter::repeat_n("-".to_string(), 7));
                row.push(format!("error: {err}"));
                t.add_row(row);
            }
        }
    }
    writeln!(out, "{t}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use otdr_dry_tests::two_wavelength_file;
    use otdr_sor::decode;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn inspect_shows_summary_and_checksum() {
        let file = decode(&two_wavelength_file()).unwrap();
        let summary = LinkSummary::from_file(&file, DistanceDisplay::Kilometers);
        let text = render(|out| inspect_table(out, "span.sor", &file, &summary));
        assert!(text.contains("F012/CABLE-07"));
        assert!(text.contains("1310nm, 1550nm"));
        assert!(text.contains("valid (0x"));
        assert!(text.contains("V2 (map revision 200)"));
    }

    #[test]
    fn blocks_mark_vendor_blocks_opaque() {
        let file = decode(&two_wavelength_file()).unwrap();
        let text = render(|out| blocks_table(out, &file));
        let vendor = text.lines().find(|l| l.contains("AcmeTrace")).unwrap();
        assert!(vendor.contains("opaque"));
        let general = text.lines().find(|l| l.contains("GenParams")).unwrap();
        assert!(general.contains("known"));
    }

    #[test]
    fn trace_lines_use_separator() {
        let trace = Trace::new(1550.0, 100, 0.5, vec![1.0, 1.5, 2.0, 2.5]);
        let csv = render(|out| trace_lines(out, &trace, 2, TraceFormat::Csv));
        assert_eq!(csv, "distance_m,power_db\n0.0000,1.0000\n1.0000,2.0000\n");
        let tsv = render(|out| trace_lines(out, &trace, 3, TraceFormat::Tsv));
        assert_eq!(tsv, "distance_m\tpower_db\n0.0000\t1.0000\n1.5000\t2.5000\n");
    }

    #[test]
    fn checksum_warnings_can_be_muted() {
        let notes = vec![
            Notice {
                kind: NoticeKind::Warn,
                title: "checksum mismatch".into(),
                body: None,
            },
            Notice {
                kind: NoticeKind::Info,
                title: "vendor blocks preserved".into(),
                body: Some("AcmeTrace".into()),
            },
        ];
        let loud = render(|out| notices(out, &notes, true));
        assert!(loud.contains("warn: checksum mismatch"));
        let quiet = render(|out| notices(out, &notes, false));
        assert_eq!(quiet, "info: vendor blocks preserved (AcmeTrace)\n");
    }

    #[test]
    fn batch_rows_keep_failures() {
        let rows = vec![
            (
                "good.sor".to_string(),
                TraceRecord::from_bytes("good.sor", &two_wavelength_file()),
            ),
            (
                "bad.sor".to_string(),
                TraceRecord::from_bytes("bad.sor", b"garbage"),
            ),
        ];
        let text = render(|out| batch_table(out, &rows, DistanceDisplay::Kilometers));
        let good = text.lines().find(|l| l.contains("good.sor")).unwrap();
        assert!(good.contains("ok"));
        let bad = text.lines().find(|l| l.contains("bad.sor")).unwrap();
        assert!(bad.contains("error"));
    }
}
