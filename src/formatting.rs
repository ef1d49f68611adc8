use serde::Serialize;

pub const PLACEHOLDER: &str = "-";

const COMPACT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];
const LONG_COMPACT_THRESHOLD: f64 = 1_000_000.0;

/// Display rule bound to a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Compact notation, three significant digits.
    CompactNumber,
    /// Value on a 0..100 scale shown as a whole percentage.
    Percent,
    /// Seconds shown as minutes and seconds.
    ShortDuration,
    /// Grouped digits, compact from one million.
    LongNumber,
}

impl ValueFormat {
    #[must_use]
    pub fn apply(self, value: f64) -> String {
        if !value.is_finite() {
            return PLACEHOLDER.to_string();
        }
        match self {
            Self::CompactNumber => format_compact(value, Precision::Significant(3)),
            Self::Percent => format_percent(value),
            Self::ShortDuration => format_short_duration(value),
            Self::LongNumber => format_long_number(value),
        }
    }

    /// Same as [`ValueFormat::apply`] with a `+` in front of positive values.
    /// A change that rounds to zero gets no sign.
    #[must_use]
    pub fn apply_signed(self, value: f64) -> String {
        let formatted = self.apply(value);
        if value > 0.0 && shows_nonzero(&formatted) {
            format!("+{formatted}")
        } else {
            formatted
        }
    }
}

fn shows_nonzero(formatted: &str) -> bool {
    formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0')
}

#[derive(Clone, Copy)]
enum Precision {
    Significant(i32),
    Fraction(i32),
}

impl Precision {
    fn round(self, value: f64) -> f64 {
        match self {
            Self::Significant(digits) => round_significant(value, digits),
            Self::Fraction(digits) => round_fraction(value, digits),
        }
    }
}

fn format_compact(value: f64, precision: Precision) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let mut scaled = value.abs();
    let mut tier = 0;
    while tier < COMPACT_SUFFIXES.len() - 1 && precision.round(scaled) >= 1000.0 {
        scaled /= 1000.0;
        tier += 1;
    }
    let rounded = normalize_zero(precision.round(scaled));
    format!("{sign}{rounded}{}", COMPACT_SUFFIXES[tier])
}

fn format_percent(value: f64) -> String {
    let rounded = normalize_zero(value.round());
    format!("{rounded}%")
}

fn format_short_duration(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let seconds = value.abs().trunc();
    let minutes = (seconds / 60.0).trunc();
    let remainder = seconds - minutes * 60.0;

    let mut parts = Vec::with_capacity(2);
    if minutes > 0.0 {
        parts.push(format!("{minutes}m"));
    }
    if remainder > 0.0 {
        parts.push(format!("{remainder}s"));
    }
    if parts.is_empty() {
        return "0s".to_string();
    }
    format!("{sign}{}", parts.join(" "))
}

fn format_long_number(value: f64) -> String {
    if value.abs() >= LONG_COMPACT_THRESHOLD {
        return format_compact(value, Precision::Fraction(1));
    }
    let rounded = normalize_zero(round_fraction(value, 2));
    let sign = if rounded < 0.0 { "-" } else { "" };
    let text = rounded.abs().to_string();
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let grouped = group_thousands(integer);
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && idx % 3 == offset {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = value.abs().log10().floor() as i32;
    let exponent = digits - 1 - magnitude;
    if exponent >= 0 {
        let factor = 10_f64.powi(exponent);
        (value * factor).round() / factor
    } else {
        let factor = 10_f64.powi(-exponent);
        (value / factor).round() * factor
    }
}

fn round_fraction(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    (value * factor).round() / factor
}

// -0 would otherwise print as "-0".
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
