//! Global settings block.
//!
//! Five optional directives rendered as one prefix clause, always in the
//! order payload format, timeout, maxsize, date, bbox:
//!
//! ```text
//! [out:json][timeout:60][maxsize:1073741824][date:2020-01-01T00:00:00Z][bbox:...];
//! ```
//!
//! An empty block renders as the empty string.

use crate::error::{Error, Result};
use crate::filter::BoundingBox;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Payload format the endpoint assumes when none is requested.
pub const DEFAULT_FORMAT: PayloadFormat = PayloadFormat::Xml;

/// Timeout in seconds the endpoint assumes when none is requested.
pub const DEFAULT_TIMEOUT: u32 = 180;

/// Largest memory allowance a request may ask for (2 GiB).
pub const MAXSIZE_LIMIT: u64 = 2 * 1_073_741_824;

/// Response payload format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `xml`
    Xml,
    /// `json`
    Json,
    /// `csv(...)`
    Csv(CsvFormat),
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Xml => write!(f, "xml"),
            PayloadFormat::Json => write!(f, "json"),
            PayloadFormat::Csv(csv) => write!(f, "{}", csv),
        }
    }
}

/// Column layout for CSV output: `csv(name,::id;false;"|")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CsvFormatRepr")]
pub struct CsvFormat {
    fields: Vec<String>,
    header: bool,
    separator: Option<char>,
}

#[derive(Deserialize)]
struct CsvFormatRepr {
    fields: Vec<String>,
    #[serde(default = "default_header")]
    header: bool,
    #[serde(default)]
    separator: Option<char>,
}

fn default_header() -> bool {
    true
}

impl TryFrom<CsvFormatRepr> for CsvFormat {
    type Error = Error;

    fn try_from(repr: CsvFormatRepr) -> Result<Self> {
        let csv = CsvFormat::new(repr.fields)?.with_header(repr.header);
        Ok(match repr.separator {
            Some(sep) => csv.with_separator(sep)?,
            None => csv,
        })
    }
}

impl CsvFormat {
    /// CSV output with the given columns and a header line.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.iter().any(|f| f.is_empty()) {
            return Err(Error::InvalidArgument(
                "CSV output needs at least one non-empty field".to_string(),
            ));
        }
        Ok(Self {
            fields,
            header: true,
            separator: None,
        })
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Column separator. Quotes and line breaks cannot appear inside the
    /// quoted separator literal.
    pub fn with_separator(mut self, separator: char) -> Result<Self> {
        if matches!(separator, '"' | '\\' | '\n' | '\r') {
            return Err(Error::InvalidArgument(format!(
                "CSV separator {:?} cannot be written in a quoted literal",
                separator
            )));
        }
        self.separator = Some(separator);
        Ok(self)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn header(&self) -> bool {
        self.header
    }

    pub fn separator(&self) -> Option<char> {
        self.separator
    }
}

impl fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "csv({}", self.fields.join(","))?;
        match self.separator {
            Some(sep) => write!(f, ";{};\"{}\"", self.header, sep)?,
            None if !self.header => write!(f, ";false")?,
            None => {}
        }
        write!(f, ")")
    }
}

/// Point in time for the `[date:...]` directive.
///
/// Stored as wall-clock time. Zoned inputs keep their local fields and
/// are rendered with a `Z` suffix without conversion to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryDate(NaiveDateTime);

impl QueryDate {
    /// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`, or RFC 3339 text.
    pub fn parse(text: &str) -> Result<Self> {
        if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
            return Ok(zoned.into());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self(naive));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self)
            .ok_or_else(|| Error::InvalidArgument(format!("Cannot parse date '{}'", text)))
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for QueryDate {
    fn from(naive: NaiveDateTime) -> Self {
        Self(naive)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for QueryDate {
    fn from(zoned: DateTime<Tz>) -> Self {
        let offset = zoned.offset().fix().local_minus_utc();
        if offset != 0 {
            warn!(
                offset_seconds = offset,
                "date has a non-UTC offset; rendering local time with a Z suffix"
            );
        }
        Self(zoned.naive_local())
    }
}

impl TryFrom<String> for QueryDate {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<QueryDate> for String {
    fn from(date: QueryDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for QueryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Z", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Global directives prefixed to a program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuerySettingsRepr")]
pub struct QuerySettings {
    payload_format: Option<PayloadFormat>,
    timeout: Option<u32>,
    maxsize: Option<u64>,
    date: Option<QueryDate>,
    bbox: Option<BoundingBox>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct QuerySettingsRepr {
    payload_format: Option<PayloadFormat>,
    timeout: Option<u32>,
    maxsize: Option<u64>,
    date: Option<QueryDate>,
    bbox: Option<BoundingBox>,
}

impl TryFrom<QuerySettingsRepr> for QuerySettings {
    type Error = Error;

    fn try_from(repr: QuerySettingsRepr) -> Result<Self> {
        let mut settings = QuerySettings {
            payload_format: repr.payload_format,
            timeout: repr.timeout,
            date: repr.date,
            bbox: repr.bbox,
            maxsize: None,
        };
        settings.set_maxsize(repr.maxsize)?;
        Ok(settings)
    }
}

impl QuerySettings {
    /// Settings with no directive set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload_format(&self) -> Option<&PayloadFormat> {
        self.payload_format.as_ref()
    }

    pub fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    pub fn maxsize(&self) -> Option<u64> {
        self.maxsize
    }

    pub fn date(&self) -> Option<QueryDate> {
        self.date
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    pub fn set_payload_format(&mut self, format: Option<PayloadFormat>) {
        self.payload_format = format;
    }

    /// Timeout in seconds.
    pub fn set_timeout(&mut self, timeout: Option<u32>) {
        self.timeout = timeout;
    }

    /// Memory allowance in bytes, at most [`MAXSIZE_LIMIT`].
    pub fn set_maxsize(&mut self, maxsize: Option<u64>) -> Result<()> {
        if let Some(size) = maxsize {
            if size > MAXSIZE_LIMIT {
                return Err(Error::InvalidArgument(format!(
                    "maxsize {} exceeds limit {}",
                    size, MAXSIZE_LIMIT
                )));
            }
        }
        self.maxsize = maxsize;
        Ok(())
    }

    pub fn set_date(&mut self, date: Option<QueryDate>) {
        self.date = date;
    }

    pub fn set_bbox(&mut self, bbox: Option<BoundingBox>) {
        self.bbox = bbox;
    }

    pub fn with_payload_format(mut self, format: PayloadFormat) -> Self {
        self.payload_format = Some(format);
        self
    }

    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_maxsize(mut self, maxsize: u64) -> Result<Self> {
        self.set_maxsize(Some(maxsize))?;
        Ok(self)
    }

    pub fn with_date(mut self, date: impl Into<QueryDate>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Whether no directive is set.
    pub fn is_empty(&self) -> bool {
        self.payload_format.is_none()
            && self.timeout.is_none()
            && self.maxsize.is_none()
            && self.date.is_none()
            && self.bbox.is_none()
    }
}

impl fmt::Display for QuerySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref format) = self.payload_format {
            write!(f, "[out:{}]", format)?;
        }
        if let Some(timeout) = self.timeout {
            write!(f, "[timeout:{}]", timeout)?;
        }
        if let Some(maxsize) = self.maxsize {
            write!(f, "[maxsize:{}]", maxsize)?;
        }
        if let Some(date) = self.date {
            write!(f, "[date:{}]", date)?;
        }
        if let Some(ref bbox) = self.bbox {
            write!(f, "[bbox:{}]", bbox)?;
        }
        if !self.is_empty() {
            write!(f, ";")?;
        }
        Ok(())
    }
}
