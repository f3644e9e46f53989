// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line formatting for data changes, receive errors and the exit summary.

use crate::config::OutputFormat;
use colored::*;
use sacn::{DataPacket, MetricsSnapshot, ReceiveError};
use serde::Serialize;

/// Leading slots shown in text output.
const PREVIEW_SLOTS: usize = 16;

#[derive(Debug, Serialize)]
struct DataLine<'a> {
    timestamp: &'a str,
    universe: u16,
    cid: String,
    source: &'a str,
    priority: u8,
    sequence: u8,
    slots: usize,
    data: &'a [u8],
}

#[derive(Debug, Serialize)]
struct ErrorLine<'a> {
    timestamp: &'a str,
    universe: u16,
    error: String,
}

#[derive(Debug, Serialize)]
struct SummaryLine {
    datagrams_received: u64,
    bytes_received: u64,
    datagrams_invalid: u64,
    packets_unmatched: u64,
    data_emitted: u64,
    data_unchanged: u64,
    packets_dropped: u64,
    queue_overflows: u64,
    sequence_rejected: u64,
    conflicts: u64,
    timeouts: u64,
}

impl From<&MetricsSnapshot> for SummaryLine {
    fn from(m: &MetricsSnapshot) -> Self {
        Self {
            datagrams_received: m.datagrams_received,
            bytes_received: m.bytes_received,
            datagrams_invalid: m.datagrams_invalid,
            packets_unmatched: m.packets_unmatched,
            data_emitted: m.data_emitted,
            data_unchanged: m.data_unchanged,
            packets_dropped: m.packets_dropped,
            queue_overflows: m.queue_overflows,
            sequence_rejected: m.sequence_rejected,
            conflicts: m.conflicts,
            timeouts: m.timeouts,
        }
    }
}

/// Format one data change.
pub fn format_data(packet: &DataPacket, format: OutputFormat, timestamp: &str) -> String {
    match format {
        OutputFormat::Text => {
            let preview: Vec<String> = packet
                .data()
                .iter()
                .take(PREVIEW_SLOTS)
                .map(|slot| format!("{:3}", slot))
                .collect();
            let suffix = if packet.data().len() > PREVIEW_SLOTS {
                " ..."
            } else {
                ""
            };
            format!(
                "{} {} {} prio={} seq={} slots={} [{}{}]",
                format!("[{}]", timestamp).dimmed(),
                format!("u{}", packet.universe()).cyan().bold(),
                packet.cid().to_string().yellow(),
                packet.priority(),
                packet.sequence(),
                packet.data().len(),
                preview.join(" "),
                suffix
            )
        }
        OutputFormat::Json => to_json(&DataLine {
            timestamp,
            universe: packet.universe(),
            cid: packet.cid().to_string(),
            source: packet.source_name(),
            priority: packet.priority(),
            sequence: packet.sequence(),
            slots: packet.data().len(),
            data: packet.data(),
        }),
    }
}

/// Format one receive error.
pub fn format_error(err: &ReceiveError, format: OutputFormat, timestamp: &str) -> String {
    match format {
        OutputFormat::Text => format!(
            "{} {} {}",
            format!("[{}]", timestamp).dimmed(),
            format!("u{}", err.universe).cyan().bold(),
            err.kind.to_string().red()
        ),
        OutputFormat::Json => to_json(&ErrorLine {
            timestamp,
            universe: err.universe,
            error: err.kind.to_string(),
        }),
    }
}

/// Format the exit summary.
pub fn format_summary(metrics: &MetricsSnapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "received={} invalid={} unmatched={} emitted={} unchanged={} dropped={} \
             overflows={} stale={} conflicts={} timeouts={}",
            metrics.datagrams_received,
            metrics.datagrams_invalid,
            metrics.packets_unmatched,
            metrics.data_emitted,
            metrics.data_unchanged,
            metrics.packets_dropped,
            metrics.queue_overflows,
            metrics.sequence_rejected,
            metrics.conflicts,
            metrics.timeouts
        ),
        OutputFormat::Json => to_json(&SummaryLine::from(metrics)),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
}
