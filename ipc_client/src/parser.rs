//! Decoders for `akavecli` console output.
//!
//! The CLI does not commit to an output grammar: some commands print JSON,
//! most print `Prefix: Key=Value, Key=Value` lines, and bucket creation has
//! changed wording across releases. Every decoder is tolerant. Tokens that do
//! not decode are skipped, and [`parse`] only fails when a command's output
//! has none of the shape it expects.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IpcError, Result};

pub const BUCKET_PREFIX: &str = "Bucket:";
pub const BUCKET_DELETED_PREFIX: &str = "Bucket deleted:";
pub const FILE_PREFIX: &str = "File:";
/// Printed by `file upload` on success. The CLI writes it to stderr.
pub const UPLOAD_SUCCESS_MARKER: &str = "File uploaded successfully:";

static CREATED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bucket created|created bucket").unwrap());
static LABELLED_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)\s*[:=]\s*([^,\n]+)").unwrap());
static CREATED_PHRASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)bucket\s+created").unwrap());
static NAME_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)name\s*[:=]\s*([^,\n]+)").unwrap());

/// Selects the decoder applied to a command's combined output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    CreateBucket,
    ListBuckets,
    ViewBucket,
    DeleteBucket,
    ListFiles,
    FileInfo,
    UploadFile,
    DownloadFile,
    /// Returns the text unchanged.
    Passthrough,
}

/// Key/value attributes of one bucket or file, e.g. `Name`, `Created`,
/// `Size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("Name")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Structured result of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    /// The whole output was JSON.
    Json(Value),
    Record(Record),
    Records(Vec<Record>),
    /// Output returned as-is (downloads, pass-through).
    Text(String),
    /// The command succeeded but its output could not be decoded.
    Raw { raw: String },
}

impl CommandOutput {
    pub fn raw(text: &str) -> Self {
        Self::Raw {
            raw: text.to_string(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }
}

/// Decode `text` with the decoder for `kind`.
///
/// Output that parses as JSON as a whole is returned verbatim regardless of
/// `kind`; the CLI reports some errors that way.
pub fn parse(text: &str, kind: ParserKind) -> Result<CommandOutput> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(CommandOutput::Json(value));
    }

    match kind {
        ParserKind::CreateBucket => Ok(parse_bucket_creation(text)),
        ParserKind::ListBuckets => Ok(CommandOutput::Records(parse_prefixed_lines(
            text,
            BUCKET_PREFIX,
        ))),
        ParserKind::ViewBucket => {
            parse_single(text, BUCKET_PREFIX, "Unexpected output format for bucket view")
        }
        ParserKind::DeleteBucket => parse_bucket_deletion(text),
        ParserKind::ListFiles => Ok(CommandOutput::Records(parse_prefixed_lines(
            text,
            FILE_PREFIX,
        ))),
        ParserKind::FileInfo => {
            parse_single(text, FILE_PREFIX, "Unexpected output format for file info")
        }
        ParserKind::UploadFile => parse_file_upload(text),
        ParserKind::DownloadFile | ParserKind::Passthrough => {
            Ok(CommandOutput::Text(text.to_string()))
        }
    }
}

fn parse_bucket_creation(text: &str) -> CommandOutput {
    embedded_json(text)
        .or_else(|| labelled_pairs(text))
        .or_else(|| created_phrase(text))
        .unwrap_or_else(|| CommandOutput::raw(text))
}

/// JSON object or array surrounded by other console output.
fn embedded_json(text: &str) -> Option<CommandOutput> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .map(CommandOutput::Json)
}

/// `Name=demo, Created=...` or `Name: demo, Created: ...` on the success
/// line. Only the text after the success phrase is scanned, so the phrase's
/// own colon is not taken for a pair.
fn labelled_pairs(text: &str) -> Option<CommandOutput> {
    let line = text
        .lines()
        .find_map(|line| CREATED_LINE.find(line).map(|m| &line[m.end()..]))
        .map(|rest| rest.trim_start().trim_start_matches(':'))
        .unwrap_or(text);

    let mut record = Record::new();
    for caps in LABELLED_PAIR.captures_iter(line) {
        let key = caps[1].trim();
        let value = caps[2].trim();
        let value = value.strip_prefix('"').unwrap_or(value);
        let value = value.strip_suffix('"').unwrap_or(value);
        if !key.is_empty() {
            record.insert(key, value);
        }
    }

    if !record.contains_key("Name") {
        let name = record.get("name")?.to_string();
        record.insert("Name", name);
    }
    Some(CommandOutput::Record(record))
}

fn created_phrase(text: &str) -> Option<CommandOutput> {
    if !CREATED_PHRASE.is_match(text) {
        return None;
    }
    let name = NAME_FRAGMENT
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Some(CommandOutput::Record(Record::from_iter([("Name", name)])))
}

fn parse_prefixed_lines(text: &str, prefix: &str) -> Vec<Record> {
    text.lines()
        .filter_map(|line| line.strip_prefix(prefix))
        .map(decode_pairs)
        .collect()
}

fn parse_single(text: &str, prefix: &str, error: &str) -> Result<CommandOutput> {
    let rest = text
        .strip_prefix(prefix)
        .ok_or_else(|| IpcError::parse(error))?;
    Ok(CommandOutput::Record(decode_pairs(rest)))
}

fn parse_bucket_deletion(text: &str) -> Result<CommandOutput> {
    let rest = text
        .strip_prefix(BUCKET_DELETED_PREFIX)
        .ok_or_else(|| IpcError::parse("Unexpected output format for bucket deletion"))?;
    let parts: Vec<&str> = rest.trim().split('=').collect();
    match parts.as_slice() {
        [key, value] if key.trim() == "Name" => Ok(CommandOutput::Record(Record::from_iter([(
            "Name",
            value.trim(),
        )]))),
        _ => Err(IpcError::parse("Invalid bucket deletion output format")),
    }
}

fn parse_file_upload(text: &str) -> Result<CommandOutput> {
    let line = text
        .lines()
        .find(|line| line.contains(UPLOAD_SUCCESS_MARKER))
        .ok_or_else(|| IpcError::parse(format!("File upload failed: {}", text)))?;
    let start = line.find(UPLOAD_SUCCESS_MARKER).unwrap_or(0) + UPLOAD_SUCCESS_MARKER.len();
    Ok(CommandOutput::Record(decode_pairs(line[start..].trim())))
}

/// Decode `Key=Value, Key=Value`. Segments that are not exactly one
/// `key=value` pair are dropped.
fn decode_pairs(text: &str) -> Record {
    let mut record = Record::new();
    for segment in text.split(", ") {
        let mut parts = segment.split('=');
        if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            let key = key.trim();
            if !key.is_empty() {
                record.insert(key, value.trim());
            }
        }
    }
    record
}
