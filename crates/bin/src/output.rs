//! Output formatting helpers for human-readable and JSON output.

use serde::Serialize;
use seqtree::{GroupKey, Node, RecordId};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// What a command did, printed once its transaction has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Report {
    /// A record was created or moved and now sits here.
    Placed {
        id: RecordId,
        group: GroupKey,
        sequence: i64,
    },
    Deleted {
        id: RecordId,
    },
    Listed {
        group: GroupKey,
        members: Vec<Member>,
    },
    Checked {
        groups: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: RecordId,
    pub sequence: i64,
}

impl Report {
    pub fn placed(node: &Node) -> Self {
        Report::Placed {
            id: node.id,
            group: node.group,
            sequence: node.sequence.unwrap_or_default(),
        }
    }
}

/// Print a report in the requested format.
pub fn print_report(report: &Report, format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Human => match report {
            Report::Placed {
                id,
                group,
                sequence,
            } => println!("Record {id} is at {sequence} in group {group}"),
            Report::Deleted { id } => println!("Deleted record {id}"),
            Report::Listed { group, members } => {
                if members.is_empty() {
                    println!("Group {group} is empty.");
                    return Ok(());
                }
                let rows: Vec<Vec<String>> = members
                    .iter()
                    .map(|member| vec![member.sequence.to_string(), member.id.to_string()])
                    .collect();
                print_table(&["SEQUENCE", "ID"], &rows);
            }
            Report::Checked { groups } => println!("All {groups} groups are contiguous"),
        },
    }
    Ok(())
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Column width is the widest of the header and every cell
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    println!("{}", format_row(headers.iter().copied(), &widths));
    for row in rows {
        println!("{}", format_row(row.iter().map(String::as_str), &widths));
    }
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
}
