use chrono::Duration;
use chrono::NaiveDate;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as "1"/"0"
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Maps built-in Excel number format IDs to date/time cell types.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Classifies a custom number format code by the date/time tokens outside
    /// quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            _ => Self::Number,
        }
    }
}

/// Converts Excel error codes to their literal form.
pub(crate) fn to_error_value(value: u8) -> &'static str {
    match value {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// A single non-empty cell with its position, type and raw value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value; for shared strings this is the index into the string table
    pub(crate) value: String,
}

impl Cell {
    /// Renders the cell as text. Integral numbers drop their fraction, serial
    /// dates become ISO strings and shared strings are resolved; a value that
    /// does not parse as its declared type is returned raw.
    pub(crate) fn text(&self, shared_strings: &[String]) -> String {
        match self.kind {
            CellType::Empty | CellType::Error => String::new(),
            CellType::Boolean => if self.value == "1" { "true" } else { "false" }.to_owned(),
            CellType::Number => to_number_string(&self.value),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false).unwrap_or_else(|| self.value.to_owned()),
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true).unwrap_or_else(|| self.value.to_owned()),
            CellType::NumberDate1900 => to_date_string(&self.value, false).unwrap_or_else(|| self.value.to_owned()),
            CellType::NumberDate1904 => to_date_string(&self.value, true).unwrap_or_else(|| self.value.to_owned()),
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value).unwrap_or_else(|| self.value.to_owned()),
            CellType::IsoDateTime => self.value.replace('T', " "),
            CellType::InlineString => self.value.to_owned(),
            CellType::SharedString => self.value
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Drops the fractional part of integral numbers ("123456.0" -> "123456").
fn to_number_string(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 => {
            (number as i64).to_string()
        }
        Ok(number) if number.is_finite() => number.to_string(),
        _ => value.to_owned(),
    }
}

/// Converts an Excel serial day number to an ISO date.
/// Serial 60 is the fictitious 1900-02-29 of the Lotus 1-2-3 leap year bug.
fn to_date_string(value: &str, is_1904: bool) -> Option<String> {
    let days = value.parse::<f64>().ok()?.trunc() as i64;
    let duration = Duration::try_days(
        days + if is_1904 {
            1462
        } else if days < 60 {
            1
        } else {
            0
        },
    )?;
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(duration)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional part of a serial number to a time of day.
fn to_time_string(value: &str) -> Option<String> {
    let factor = value.parse::<f64>().ok()?.fract();
    let mut milliseconds = (factor * 86_400_000f64).round() as i64;
    let millis = milliseconds % 1_000; milliseconds /= 1_000;
    let seconds = milliseconds % 60; milliseconds /= 60;
    let minutes = milliseconds % 60; milliseconds /= 60;
    let hours = milliseconds;
    Some(if millis > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    })
}

fn to_datetime_string(value: &str, is_1904: bool) -> Option<String> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Some(format!("{date} {time}"))
}
