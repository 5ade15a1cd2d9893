//! Parser for `nix-support/hydra-metrics` lines: `name value [unit]`.

use super::BuildMetric;

const FIELD_SEPARATORS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Parse one metrics line. Fields are separated by runs of space, tab,
/// newline or carriage return. Lines with fewer than two fields yield `None`.
pub fn parse_metric_line(line: &str) -> Option<BuildMetric> {
  let mut fields = line.split(FIELD_SEPARATORS).filter(|f| !f.is_empty());
  let name = fields.next()?;
  let value = fields.next()?;
  let unit = fields.next().unwrap_or_default();

  Some(BuildMetric {
    name: name.to_string(),
    value: parse_leading_f64(value),
    unit: unit.to_string(),
  })
}

/// Lenient number parsing with C `atof` rules: the longest numeric prefix of
/// `s`, or 0.0 if there is none. `"12.5ms"` reads as 12.5, `"0x10"` as 16 and
/// `"infx"` as infinity.
pub fn parse_leading_f64(s: &str) -> f64 {
  if let Ok(v) = s.parse::<f64>() {
    return v;
  }

  let (sign, rest) = match s.as_bytes().first() {
    Some(b'-') => (-1.0, &s[1..]),
    Some(b'+') => (1.0, &s[1..]),
    _ => (1.0, s),
  };

  if starts_with_ignore_case(rest, "inf") {
    return sign * f64::INFINITY;
  }
  if starts_with_ignore_case(rest, "nan") {
    return f64::NAN;
  }

  if let Some(v) = parse_hex_prefix(rest) {
    return sign * v;
  }

  sign * parse_decimal_prefix(rest)
}

fn starts_with_ignore_case(s: &str, word: &str) -> bool {
  s.as_bytes()
    .get(..word.len())
    .is_some_and(|p| p.eq_ignore_ascii_case(word.as_bytes()))
}

fn parse_decimal_prefix(s: &str) -> f64 {
  let bytes = s.as_bytes();
  let mut end = 0;
  while end < bytes.len() && bytes[end].is_ascii_digit() {
    end += 1;
  }
  if end < bytes.len() && bytes[end] == b'.' {
    end += 1;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
      end += 1;
    }
  }
  if !s[..end].bytes().any(|b| b.is_ascii_digit()) {
    return 0.0;
  }

  // An exponent only counts if at least one digit follows it.
  if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
    let mut exp_end = end + 1;
    if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
      exp_end += 1;
    }
    let exp_digits = exp_end;
    while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
      exp_end += 1;
    }
    if exp_end > exp_digits {
      end = exp_end;
    }
  }

  s[..end].parse().unwrap_or(0.0)
}

/// `0x` hex mantissa with optional fraction and binary `p` exponent. `None`
/// when no hex digit follows the prefix, in which case the leading `0` is
/// all that parses.
fn parse_hex_prefix(s: &str) -> Option<f64> {
  let bytes = s.as_bytes();
  if bytes.len() < 3 || bytes[0] != b'0' || !matches!(bytes[1], b'x' | b'X') {
    return None;
  }

  let hex_digit = |b: u8| (b as char).to_digit(16).map(f64::from);
  let mut end = 2;
  let mut mantissa = 0.0;
  let mut digits = 0;
  let mut frac_digits = 0i32;
  while let Some(d) = bytes.get(end).copied().and_then(hex_digit) {
    mantissa = mantissa * 16.0 + d;
    digits += 1;
    end += 1;
  }
  if bytes.get(end) == Some(&b'.') {
    end += 1;
    while let Some(d) = bytes.get(end).copied().and_then(hex_digit) {
      mantissa = mantissa * 16.0 + d;
      digits += 1;
      frac_digits = frac_digits.saturating_add(1);
      end += 1;
    }
  }
  if digits == 0 {
    return None;
  }

  let mut exp = 0i32;
  if matches!(bytes.get(end), Some(b'p' | b'P')) {
    let mut exp_end = end + 1;
    let negative = bytes.get(exp_end) == Some(&b'-');
    if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
      exp_end += 1;
    }
    let exp_digits = exp_end;
    let mut value = 0i32;
    while let Some(b) = bytes.get(exp_end).filter(|b| b.is_ascii_digit()) {
      value = value.saturating_mul(10).saturating_add(i32::from(b - b'0'));
      exp_end += 1;
    }
    if exp_end > exp_digits {
      exp = if negative { -value } else { value };
    }
  }

  Some(mantissa * 2f64.powi(exp.saturating_sub(frac_digits.saturating_mul(4))))
}
