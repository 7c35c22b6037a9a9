use serde_json::{Value, json};

use crate::db::SegmentRow;
use crate::error::{ContaError, ErrorResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Human,
}

pub fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap());
}

pub fn print_error(err: &ContaError, mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            let resp = ErrorResponse::from(err);
            eprintln!("{}", serde_json::to_string(&resp).unwrap());
        }
        OutputMode::Human => {
            eprintln!("error: {err}");
        }
    }
}

pub fn print_ids(ids: &[String], mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&json!({ "ids": ids })),
        OutputMode::Human => {
            for id in ids {
                println!("{id}");
            }
        }
    }
}

pub fn print_raw_values(values: &[i64], mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&json!({ "values": values })),
        OutputMode::Human => {
            for value in values {
                println!("{value}");
            }
        }
    }
}

pub fn print_current(segment: &str, value: Option<i64>, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(&json!({ "segment": segment, "value": value })),
        OutputMode::Human => match value {
            Some(v) => println!("{segment}: {v}"),
            None => println!("{segment}: (no counter)"),
        },
    }
}

pub fn print_segment_list(rows: &[SegmentRow], mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            print_json(&serde_json::to_value(rows).unwrap());
        }
        OutputMode::Human => {
            if rows.is_empty() {
                println!("(no segments)");
            } else {
                for row in rows {
                    println!("{}: {}", row.segment, row.value);
                }
            }
        }
    }
}
