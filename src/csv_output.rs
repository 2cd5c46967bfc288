//! Delimited report output
//!
//! One header row, then one row per output record. Numeric cells are plain
//! integer milliseconds, left blank when zero. Fields are quoted only when
//! they contain the delimiter, a double quote or a line break.

use crate::category::CategoryTable;
use crate::record::OutputRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Field separator for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Tab-separated (default)
    #[default]
    Tab,
    /// Comma-separated
    Comma,
    /// ASCII unit separator (0x1F)
    Ascii,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
            Delimiter::Ascii => '\x1f',
        }
    }
}

/// Report formatter bound to a delimiter and a category column set
#[derive(Debug, Clone)]
pub struct CsvReport {
    delimiter: char,
    /// (field name, column header) per category, in column order
    categories: Vec<(String, String)>,
}

impl CsvReport {
    pub fn new(delimiter: Delimiter, table: &CategoryTable) -> Self {
        Self {
            delimiter: delimiter.as_char(),
            categories: table
                .categories()
                .iter()
                .map(|c| (c.name.clone(), c.column.clone()))
                .collect(),
        }
    }

    fn join(&self, fields: Vec<String>) -> String {
        let mut separator = [0u8; 4];
        fields.join(&*self.delimiter.encode_utf8(&mut separator))
    }

    /// Header row (without line terminator)
    pub fn header(&self) -> String {
        let mut fields: Vec<String> = ["File", "Tier(s)", "Exclusive", "Total"]
            .iter()
            .map(|s| self.escape_field(s))
            .collect();
        fields.extend(self.categories.iter().map(|(_, column)| self.escape_field(column)));
        self.join(fields)
    }

    /// Escape a field (quote when it contains the delimiter, quotes or newlines)
    fn escape_field(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn blank_zero(value: i64) -> String {
        if value == 0 {
            String::new()
        } else {
            value.to_string()
        }
    }

    /// Format a record as one row (without line terminator)
    pub fn format_record(&self, record: &OutputRecord) -> String {
        let mut fields = vec![
            self.escape_field(&record.file_id),
            self.escape_field(&record.label),
            Self::blank_zero(record.exclusive),
            Self::blank_zero(record.total),
        ];
        fields.extend(
            self.categories
                .iter()
                .map(|(name, _)| Self::blank_zero(record.category(name))),
        );
        self.join(fields)
    }

    pub fn write_header<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.header())
    }

    pub fn write_record<W: Write>(&self, writer: &mut W, record: &OutputRecord) -> io::Result<()> {
        writeln!(writer, "{}", self.format_record(record))
    }
}
