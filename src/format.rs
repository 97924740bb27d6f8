use chrono::{DateTime, Local};

const UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];
const COLUMN_WIDTH: usize = 15;

pub const CONSOLE_TIMESTAMP: &str = "%d.%m.%Y %H:%M:%S";
pub const FILE_DATE: &str = "%d.%m.%Y";
pub const FILE_TIME: &str = "%H:%M:%S";
pub const TEMPLATE_TIMESTAMP: &str = "%Y-%m-%dT%H-%M-%S";

/// Renders a byte count with the largest binary prefix that keeps the value
/// below 1024. Petabytes is the ceiling.
pub fn get_size(bytes: f64) -> String {
    let mut value = bytes;
    for (idx, unit) in UNITS.iter().enumerate() {
        if value < 1024.0 || idx == UNITS.len() - 1 {
            return format!("{:.2} {}B", value, unit);
        }
        value /= 1024.0;
    }
    unreachable!("loop returns on the last unit")
}

/// Right-justifies every field in a 15 character column.
pub fn table_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = String::with_capacity(fields.len() * COLUMN_WIDTH);
    for field in fields {
        line.push_str(&format!("{:>width$}", field.as_ref(), width = COLUMN_WIDTH));
    }
    line
}

pub fn cpu_mhz(mhz: f64) -> String {
    format!("{:.2} MHz", mhz)
}

pub fn console_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(CONSOLE_TIMESTAMP).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn get_size_scales_by_1024() {
        assert_eq!(get_size(0.0), "0.00 B");
        assert_eq!(get_size(1023.0), "1023.00 B");
        assert_eq!(get_size(1024.0), "1.00 KB");
        assert_eq!(get_size(1536.0), "1.50 KB");
        assert_eq!(get_size(3.0 * 1024.0 * 1024.0 * 1024.0), "3.00 GB");
    }

    #[test]
    fn get_size_stops_at_petabytes() {
        assert_eq!(get_size(1024f64.powi(5)), "1.00 PB");
        assert_eq!(get_size(1024f64.powi(6)), "1024.00 PB");
        assert_eq!(get_size(2.0 * 1024f64.powi(7)), "2097152.00 PB");
    }

    #[test]
    fn get_size_is_repeatable() {
        assert_eq!(get_size(123456.0), get_size(123456.0));
    }

    #[test]
    fn table_row_right_aligns_each_column() {
        let row = table_row(&["a", "b"]);
        assert_eq!(row.len(), 30);
        assert_eq!(row, format!("{}a{}b", " ".repeat(14), " ".repeat(14)));
        assert_eq!(row, table_row(&["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn table_row_does_not_truncate_wide_fields() {
        let wide = "x".repeat(20);
        assert_eq!(table_row(&[wide.as_str()]), wide);
    }

    #[test]
    fn console_timestamp_is_day_first() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(console_timestamp(&ts), "09.03.2024 07:05:01");
        assert_eq!(cpu_mhz(1234.5), "1234.50 MHz");
    }
}
