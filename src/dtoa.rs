//! Double-to-decimal formatting.
//!
//! `{:e}` on an `f64` yields the shortest digit sequence that reparses to
//! the same bit pattern; this module repositions those digits into the
//! plain decimal form text encoders need, and replays a parser-recorded
//! precision hint so an unmodified value re-encodes with the digits of its
//! source literal.

/// Formats a finite double. `precision` is the significant-digit count to
/// reproduce, or 0 for the shortest round-trip form.
pub(crate) fn format_double(value: f64, precision: u8) -> String {
    debug_assert!(value.is_finite());
    let scientific = if precision == 0 {
        format!("{value:e}")
    } else {
        format!("{:.*e}", precision as usize - 1, value)
    };

    let (mantissa, exp) = match scientific.split_once('e') {
        Some(parts) => parts,
        // `{:e}` always produces an exponent marker.
        None => (scientific.as_str(), "0"),
    };
    let exp: i64 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let mut digits = String::with_capacity(mantissa.len());
    for c in mantissa.chars() {
        if c != '.' {
            digits.push(c);
        }
    }

    let mut out = String::with_capacity(digits.len() + 8);
    out.push_str(sign);
    let len = digits.len() as i64;
    if (-5..=15).contains(&exp) {
        if exp >= len - 1 {
            out.push_str(&digits);
            for _ in 0..(exp - (len - 1)) {
                out.push('0');
            }
            // keep the value double-typed on reparse
            out.push_str(".0");
        } else if exp >= 0 {
            let split = (exp + 1) as usize;
            out.push_str(&digits[..split]);
            out.push('.');
            out.push_str(&digits[split..]);
        } else {
            out.push_str("0.");
            for _ in 0..(-exp - 1) {
                out.push('0');
            }
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push_str(itoa::Buffer::new().format(exp));
    }
    out
}

/// Counts the significant digits of a number literal, capped at 17 (the
/// most an `f64` can need). This becomes the precision hint carried on
/// parsed doubles.
pub(crate) fn significant_digits(lexeme: &str) -> u8 {
    let mantissa = lexeme
        .split_once(['e', 'E'])
        .map_or(lexeme, |(mantissa, _)| mantissa);
    let mut count = 0usize;
    let mut seen_nonzero = false;
    for c in mantissa.chars() {
        if c.is_ascii_digit() {
            if c != '0' {
                seen_nonzero = true;
            }
            if seen_nonzero {
                count += 1;
            }
        }
    }
    if count == 0 {
        // all zeros, e.g. "0.000"
        count = 1;
    }
    count.min(17) as u8
}
