//! # Datatype Registry
//!
//! Fields, flags, and `matches` constraints name their datatype by string.
//! The model resolves those names through the [`DataTypeRegistry`] trait;
//! the resolved [`DataTypeAdapter`] parses lexical values (typed defaults)
//! into [`AtomicValue`]s.
//!
//! [`BuiltinDataTypes`] registers every standard Metaschema datatype plus
//! the legacy aliases older modules still use.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose;
use base64::Engine as _;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use url::Url;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::qname::QName;

/// Datatype applied to fields and flags that do not declare one.
pub const DEFAULT_DATA_TYPE: &str = "string";

/// A parsed atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    String(String),
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Date(NaiveDate),
    /// A date with an explicit offset, kept lexically.
    DateWithTimezone(String),
    DateTime(NaiveDateTime),
    DateTimeWithTimezone(DateTime<FixedOffset>),
    Duration(String),
    Uri(Url),
    UriReference(String),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Decoded bytes.
    Base64(Vec<u8>),
}

/// Parses lexical values of one datatype.
pub trait DataTypeAdapter: fmt::Debug + Send + Sync {
    /// Preferred datatype name.
    fn name(&self) -> &str;

    /// Parse `lexical` into an atomic value.
    fn parse(&self, lexical: &str) -> CoreResult<AtomicValue>;
}

/// Name → adapter lookup.
pub trait DataTypeRegistry: fmt::Debug + Send + Sync {
    /// Adapter registered under `name`, if any.
    fn lookup(&self, name: &str) -> Option<Arc<dyn DataTypeAdapter>>;

    /// Adapter registered under `name`, or `UnrecognizedDataType`.
    fn resolve(&self, name: &str) -> CoreResult<Arc<dyn DataTypeAdapter>> {
        self.lookup(name)
            .ok_or_else(|| CoreError::UnrecognizedDataType {
                name: name.to_string(),
            })
    }

    /// Resolve a declared datatype, falling back to [`DEFAULT_DATA_TYPE`].
    fn resolve_or_default(&self, name: Option<&str>) -> CoreResult<Arc<dyn DataTypeAdapter>> {
        self.resolve(name.unwrap_or(DEFAULT_DATA_TYPE))
    }
}

/// The standard Metaschema datatypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinDataType {
    String,
    Token,
    Base64,
    Boolean,
    Date,
    DateWithTimezone,
    DateTime,
    DateTimeWithTimezone,
    DayTimeDuration,
    YearMonthDuration,
    Decimal,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    EmailAddress,
    Hostname,
    IpV4Address,
    IpV6Address,
    Uri,
    UriReference,
    Uuid,
    MarkupLine,
    MarkupMultiline,
    NcName,
}

impl BuiltinDataType {
    /// All builtin datatypes.
    pub fn all() -> &'static [BuiltinDataType] {
        &[
            Self::String,
            Self::Token,
            Self::Base64,
            Self::Boolean,
            Self::Date,
            Self::DateWithTimezone,
            Self::DateTime,
            Self::DateTimeWithTimezone,
            Self::DayTimeDuration,
            Self::YearMonthDuration,
            Self::Decimal,
            Self::Integer,
            Self::NonNegativeInteger,
            Self::PositiveInteger,
            Self::EmailAddress,
            Self::Hostname,
            Self::IpV4Address,
            Self::IpV6Address,
            Self::Uri,
            Self::UriReference,
            Self::Uuid,
            Self::MarkupLine,
            Self::MarkupMultiline,
            Self::NcName,
        ]
    }

    /// The datatype name as written in modules.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Token => "token",
            Self::Base64 => "base64",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateWithTimezone => "date-with-timezone",
            Self::DateTime => "date-time",
            Self::DateTimeWithTimezone => "date-time-with-timezone",
            Self::DayTimeDuration => "day-time-duration",
            Self::YearMonthDuration => "year-month-duration",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::NonNegativeInteger => "non-negative-integer",
            Self::PositiveInteger => "positive-integer",
            Self::EmailAddress => "email-address",
            Self::Hostname => "hostname",
            Self::IpV4Address => "ip-v4-address",
            Self::IpV6Address => "ip-v6-address",
            Self::Uri => "uri",
            Self::UriReference => "uri-reference",
            Self::Uuid => "uuid",
            Self::MarkupLine => "markup-line",
            Self::MarkupMultiline => "markup-multiline",
            Self::NcName => "ncname",
        }
    }

    /// Legacy names that resolve to this datatype.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::DateTime => &["dateTime"],
            Self::DateTimeWithTimezone => &["dateTime-with-timezone"],
            Self::EmailAddress => &["email"],
            Self::NonNegativeInteger => &["nonNegativeInteger"],
            Self::PositiveInteger => &["positiveInteger"],
            Self::Base64 => &["base64Binary"],
            _ => &[],
        }
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> CoreError {
        CoreError::InvalidValue {
            datatype: self.as_str().to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_integer(&self, value: &str) -> CoreResult<BigInt> {
        // BigInt also accepts `_` separators, which are not lexically valid.
        let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.invalid(value, "not an integer"));
        }
        BigInt::from_str(value).map_err(|e| self.invalid(value, e.to_string()))
    }

    fn parse_decimal(&self, value: &str) -> CoreResult<BigDecimal> {
        // No exponent form and no `_` separators.
        if value.contains(['e', 'E', '_']) {
            return Err(self.invalid(value, "not a decimal"));
        }
        BigDecimal::from_str(value).map_err(|e| self.invalid(value, e.to_string()))
    }

    fn parse_date(&self, value: &str) -> CoreResult<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| self.invalid(value, e.to_string()))
    }
}

impl fmt::Display for BuiltinDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataTypeAdapter for BuiltinDataType {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn parse(&self, lexical: &str) -> CoreResult<AtomicValue> {
        let value = lexical.trim();
        match self {
            Self::String | Self::MarkupLine | Self::MarkupMultiline => {
                Ok(AtomicValue::String(lexical.to_string()))
            }
            Self::Token => {
                if value.is_empty() || value.contains(['\t', '\n', '\r']) || value.contains("  ") {
                    return Err(self.invalid(lexical, "not a normalized token"));
                }
                Ok(AtomicValue::String(value.to_string()))
            }
            Self::NcName => {
                if !QName::is_ncname(value) {
                    return Err(self.invalid(lexical, "not a non-colonized name"));
                }
                Ok(AtomicValue::String(value.to_string()))
            }
            Self::Base64 => {
                let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                general_purpose::STANDARD
                    .decode(compact)
                    .map(AtomicValue::Base64)
                    .map_err(|e| self.invalid(lexical, e.to_string()))
            }
            Self::Boolean => match value {
                "true" | "1" => Ok(AtomicValue::Boolean(true)),
                "false" | "0" => Ok(AtomicValue::Boolean(false)),
                _ => Err(self.invalid(lexical, "expected true, false, 1, or 0")),
            },
            Self::Integer => self.parse_integer(value).map(AtomicValue::Integer),
            Self::NonNegativeInteger => match self.parse_integer(value)? {
                n if n.sign() != Sign::Minus => Ok(AtomicValue::Integer(n)),
                _ => Err(self.invalid(lexical, "must be >= 0")),
            },
            Self::PositiveInteger => match self.parse_integer(value)? {
                n if n.sign() == Sign::Plus => Ok(AtomicValue::Integer(n)),
                _ => Err(self.invalid(lexical, "must be >= 1")),
            },
            Self::Decimal => self.parse_decimal(value).map(AtomicValue::Decimal),
            Self::Date => {
                let (date, _) = split_timezone(value);
                self.parse_date(date).map(AtomicValue::Date)
            }
            Self::DateWithTimezone => {
                let (date, tz) = split_timezone(value);
                if tz.is_none() {
                    return Err(self.invalid(lexical, "timezone required"));
                }
                self.parse_date(date)?;
                Ok(AtomicValue::DateWithTimezone(value.to_string()))
            }
            Self::DateTime => match DateTime::parse_from_rfc3339(value) {
                Ok(dt) => Ok(AtomicValue::DateTimeWithTimezone(dt)),
                Err(_) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(AtomicValue::DateTime)
                    .map_err(|e| self.invalid(lexical, e.to_string())),
            },
            Self::DateTimeWithTimezone => DateTime::parse_from_rfc3339(value)
                .map(AtomicValue::DateTimeWithTimezone)
                .map_err(|e| self.invalid(lexical, e.to_string())),
            Self::DayTimeDuration => {
                if !is_duration(value, DurationKind::DayTime) {
                    return Err(self.invalid(lexical, "not a day-time duration"));
                }
                Ok(AtomicValue::Duration(value.to_string()))
            }
            Self::YearMonthDuration => {
                if !is_duration(value, DurationKind::YearMonth) {
                    return Err(self.invalid(lexical, "not a year-month duration"));
                }
                Ok(AtomicValue::Duration(value.to_string()))
            }
            Self::EmailAddress => {
                let valid = match value.split_once('@') {
                    Some((local, domain)) => {
                        !local.is_empty()
                            && is_hostname(domain)
                            && !local.contains(char::is_whitespace)
                            && !domain.contains('@')
                    }
                    None => false,
                };
                if !valid {
                    return Err(self.invalid(lexical, "not an email address"));
                }
                Ok(AtomicValue::String(value.to_string()))
            }
            Self::Hostname => {
                if !is_hostname(value) {
                    return Err(self.invalid(lexical, "not a hostname"));
                }
                Ok(AtomicValue::String(value.to_string()))
            }
            Self::IpV4Address => value
                .parse::<Ipv4Addr>()
                .map(AtomicValue::Ipv4)
                .map_err(|e| self.invalid(lexical, e.to_string())),
            Self::IpV6Address => value
                .parse::<Ipv6Addr>()
                .map(AtomicValue::Ipv6)
                .map_err(|e| self.invalid(lexical, e.to_string())),
            Self::Uri => Url::parse(value)
                .map(AtomicValue::Uri)
                .map_err(|e| self.invalid(lexical, e.to_string())),
            Self::UriReference => {
                if value.contains(char::is_whitespace) {
                    return Err(self.invalid(lexical, "whitespace in URI reference"));
                }
                let base = Url::parse("http://base.invalid/")
                    .map_err(|e| self.invalid(lexical, e.to_string()))?;
                Url::options()
                    .base_url(Some(&base))
                    .parse(value)
                    .map_err(|e| self.invalid(lexical, e.to_string()))?;
                Ok(AtomicValue::UriReference(value.to_string()))
            }
            Self::Uuid => Uuid::parse_str(value)
                .map(AtomicValue::Uuid)
                .map_err(|e| self.invalid(lexical, e.to_string())),
        }
    }
}

/// Split a trailing `Z` or `±hh:mm` offset off a date.
fn split_timezone(value: &str) -> (&str, Option<&str>) {
    if let Some(date) = value.strip_suffix('Z') {
        return (date, Some("Z"));
    }
    if value.len() > 6 {
        let at = value.len() - 6;
        if value.is_char_boundary(at) {
            let (date, tz) = value.split_at(at);
            let b = tz.as_bytes();
            if (b[0] == b'+' || b[0] == b'-') && b[3] == b':' {
                return (date, Some(tz));
            }
        }
    }
    (value, None)
}

fn is_hostname(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 253
        && value.trim_end_matches('.').split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DurationKind {
    DayTime,
    YearMonth,
}

/// Check an ISO 8601 duration restricted to the given designators.
fn is_duration(value: &str, kind: DurationKind) -> bool {
    let body = value.strip_prefix('-').unwrap_or(value);
    let Some(body) = body.strip_prefix('P') else {
        return false;
    };
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (body, None),
    };
    let (date_units, time_units): (&[char], &[char]) = match kind {
        DurationKind::DayTime => (&['D'], &['H', 'M', 'S']),
        DurationKind::YearMonth => (&['Y', 'M'], &[]),
    };
    let Some(mut components) = duration_components(date_part, date_units, false) else {
        return false;
    };
    if let Some(time) = time_part {
        match duration_components(time, time_units, true) {
            Some(n) if n > 0 => components += n,
            _ => return false,
        }
    }
    components > 0
}

/// Count `<number><unit>` components, units in the given order.
fn duration_components(text: &str, units: &[char], allow_fraction_last: bool) -> Option<usize> {
    let mut count = 0;
    let mut next_unit = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        let (number, tail) = rest.split_at(end);
        let unit = tail.chars().next()?;
        let position = units[next_unit..].iter().position(|u| *u == unit)? + next_unit;
        let is_last = position + 1 == units.len();
        let fraction_ok = allow_fraction_last && is_last;
        if number.is_empty()
            || (!fraction_ok && number.contains('.'))
            || BigDecimal::from_str(number).is_err()
        {
            return None;
        }
        count += 1;
        next_unit = position + 1;
        rest = &tail[unit.len_utf8()..];
    }
    Some(count)
}

/// Registry of the builtin datatypes and their legacy aliases.
#[derive(Debug, Clone)]
pub struct BuiltinDataTypes {
    adapters: HashMap<&'static str, Arc<dyn DataTypeAdapter>>,
}

impl BuiltinDataTypes {
    pub fn new() -> Self {
        let mut adapters: HashMap<&'static str, Arc<dyn DataTypeAdapter>> = HashMap::new();
        for dt in BuiltinDataType::all() {
            let adapter: Arc<dyn DataTypeAdapter> = Arc::new(*dt);
            adapters.insert(dt.as_str(), Arc::clone(&adapter));
            for alias in dt.aliases() {
                adapters.insert(alias, Arc::clone(&adapter));
            }
        }
        Self { adapters }
    }

    /// Register an additional adapter, replacing any existing entry.
    pub fn register(&mut self, name: &'static str, adapter: Arc<dyn DataTypeAdapter>) {
        if self.adapters.insert(name, adapter).is_some() {
            tracing::debug!(datatype = name, "replaced registered data type adapter");
        }
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinDataTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTypeRegistry for BuiltinDataTypes {
    fn lookup(&self, name: &str) -> Option<Arc<dyn DataTypeAdapter>> {
        self.adapters.get(name).cloned()
    }
}
