use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::format::{self, FILE_DATE, FILE_TIME};
use crate::monitor::Sample;

const DELIMITER: char = ';';

const CONSOLE_HEADER: [&str; 6] = [
    "Time",
    "CPU",
    "Virtual Mem",
    "Used Mem",
    "Network Sent",
    "Network Recv",
];

const FILE_HEADER: [&str; 7] = [
    "Date",
    "Time",
    "CPU, MHz",
    "Virtual Mem, bytes",
    "Used Mem, bytes",
    "Network Sent, bytes",
    "Network Recv, bytes",
];

/// Where records go: a console table or an append-only delimited file.
pub enum Exporter<W: Write> {
    Console(W),
    File(CsvFile),
}

impl<W: Write> Exporter<W> {
    pub fn write_header(&mut self, process_name: &str) -> Result<()> {
        match self {
            Exporter::Console(out) => {
                writeln!(out, "Process name: {}", process_name).map_err(Error::Console)?;
                writeln!(out, "{}", format::table_row(&CONSOLE_HEADER)).map_err(Error::Console)?;
                out.flush().map_err(Error::Console)
            }
            Exporter::File(file) => file.append_row(&FILE_HEADER),
        }
    }

    pub fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        match self {
            Exporter::Console(out) => {
                writeln!(out, "{}", console_row(sample)).map_err(Error::Console)?;
                out.flush().map_err(Error::Console)
            }
            Exporter::File(file) => file.append_row(&file_fields(sample)),
        }
    }
}

/// Delimited file that is opened, appended to and closed for every row.
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_row<S: AsRef<str>>(&self, fields: &[S]) -> Result<()> {
        let mut line = String::new();
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                line.push(DELIMITER);
            }
            line.push_str(&csv_escape(field.as_ref()));
        }
        line.push('\n');

        let mut file = open_append(&self.path)?;
        file.write_all(line.as_bytes()).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn console_row(sample: &Sample) -> String {
    format::table_row(&[
        format::console_timestamp(&sample.timestamp),
        format::cpu_mhz(sample.cpu_mhz),
        format::get_size(sample.virtual_mem as f64),
        format::get_size(sample.used_mem as f64),
        format::get_size(sample.net_sent as f64),
        format::get_size(sample.net_recv as f64),
    ])
}

fn file_fields(sample: &Sample) -> [String; 7] {
    [
        sample.timestamp.format(FILE_DATE).to_string(),
        sample.timestamp.format(FILE_TIME).to_string(),
        format!("{:.2}", sample.cpu_mhz),
        sample.virtual_mem.to_string(),
        sample.used_mem.to_string(),
        sample.net_sent.to_string(),
        sample.net_recv.to_string(),
    ]
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn csv_escape(value: &str) -> String {
    if value.contains(DELIMITER) || value.contains('"') || value.contains(['\n', '\r']) {
        let escaped = value.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}
