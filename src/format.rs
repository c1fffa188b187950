//! Presentation strings for values and category labels.
//!
//! Format strings look like `"<type>[:<decimals>]"` with type one of
//! `number`, `currency` or `percentage`. Percentages are NOT multiplied by
//! 100: callers pass already-scaled values (`85`, not `0.85`).

use crate::data::parse_finite;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map, opt, rest},
    sequence::{delimited, preceded},
    IResult,
};

const MAX_DECIMALS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Number,
    Currency,
    Percentage,
}

impl FormatKind {
    fn default_decimals(self) -> usize {
        match self {
            FormatKind::Number | FormatKind::Currency => 0,
            FormatKind::Percentage => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFormat {
    pub kind: FormatKind,
    pub decimals: usize,
}

impl ValueFormat {
    /// Parse a format string. Unknown types read as `number`; bad decimals use the type default.
    pub fn parse(input: &str) -> ValueFormat {
        let (kind, decimals) = match all_consuming(format_spec)(input) {
            Ok((_, parsed)) => parsed,
            Err(_) => (FormatKind::Number, None),
        };
        ValueFormat {
            kind,
            decimals: decimals
                .map(|d| d.min(MAX_DECIMALS))
                .unwrap_or_else(|| kind.default_decimals()),
        }
    }

    pub fn apply(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        match self.kind {
            FormatKind::Number => group_fixed(value, self.decimals),
            FormatKind::Currency => {
                let text = group_fixed(value.abs(), self.decimals);
                if value < 0.0 && !is_zero_text(&text) {
                    format!("-${}", text)
                } else {
                    format!("${}", text)
                }
            }
            FormatKind::Percentage => {
                let (negative, int_part, frac_part) = fixed_digits(value, self.decimals);
                let mut out = String::new();
                if negative {
                    out.push('-');
                }
                out.push_str(&int_part);
                if !frac_part.is_empty() {
                    out.push('.');
                    out.push_str(&frac_part);
                }
                out.push('%');
                out
            }
        }
    }
}

fn format_spec(input: &str) -> IResult<&str, (FormatKind, Option<usize>)> {
    let (input, kind) = delimited(space0, format_kind, space0)(input)?;
    let (input, decimals) = opt(preceded(
        char(':'),
        alt((
            map(all_consuming(delimited(space0, digit1, space0)), |d: &str| {
                d.parse::<usize>().ok()
            }),
            map(rest, |_| None),
        )),
    ))(input)?;
    Ok((input, (kind, decimals.flatten())))
}

fn format_kind(input: &str) -> IResult<&str, FormatKind> {
    alt((
        map(tag("currency"), |_| FormatKind::Currency),
        map(tag("percentage"), |_| FormatKind::Percentage),
        map(tag("number"), |_| FormatKind::Number),
        map(take_while1(|c: char| c.is_alphanumeric() || c == '_'), |_| FormatKind::Number),
    ))(input)
}

/// Format a series value. Without a format string, values are grouped with at
/// most two fraction digits.
pub fn format_value(value: f64, format: Option<&str>) -> String {
    match format {
        Some(spec) => ValueFormat::parse(spec).apply(value),
        None if value.is_finite() => group_trimmed(value, 2),
        None => value.to_string(),
    }
}

/// Tidy numeric-looking category labels (e.g. averages used as categories).
/// Only labels above 100 in magnitude that carry a decimal point are touched.
pub fn format_category_label(label: &str) -> String {
    match parse_finite(label) {
        Some(value) if value.abs() > 100.0 && label.contains('.') => group_trimmed(value, 2),
        _ => label.to_string(),
    }
}

/// Grouped thousands with exactly `decimals` fraction digits.
pub fn group_fixed(value: f64, decimals: usize) -> String {
    let (negative, int_part, frac_part) = fixed_digits(value, decimals);
    assemble(negative, &int_part, &frac_part)
}

/// Grouped thousands with up to `max_decimals` fraction digits, trailing zeros dropped.
pub fn group_trimmed(value: f64, max_decimals: usize) -> String {
    let (negative, int_part, frac_part) = fixed_digits(value, max_decimals);
    assemble(negative, &int_part, frac_part.trim_end_matches('0'))
}

fn assemble(negative: bool, int_part: &str, frac_part: &str) -> String {
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Round half away from zero to `decimals` places and split into digit strings.
/// The sign is dropped when the rounded value is zero.
fn fixed_digits(value: f64, decimals: usize) -> (bool, String, String) {
    let factor = 10f64.powi(decimals as i32);
    let scaled = (value.abs() * factor).round();
    if !scaled.is_finite() {
        // Too large to scale; at this magnitude there is no fractional part to round.
        let text = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
        return (value < 0.0, int_part.to_string(), frac_part.to_string());
    }
    let mut digits = format!("{:.0}", scaled);
    if digits.len() <= decimals {
        digits = format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits);
    }
    let split = digits.len() - decimals;
    let negative = value < 0.0 && scaled != 0.0;
    (negative, digits[..split].to_string(), digits[split..].to_string())
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn is_zero_text(text: &str) -> bool {
    text.chars().all(|c| c == '0' || c == '.' || c == ',')
}
