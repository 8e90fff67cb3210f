use crate::error::CalcError;

/// 先頭の空白を読み飛ばし、そこから始まる最長の10進数表記を切り出す。
///
/// 符号、整数部、`.` 以降の小数部、指数部（`e`/`E` の後に数字がある場合のみ）を読む。
/// 整数部・小数部のどちらにも数字がなければ `None`。
fn leading_number(raw: &str) -> Option<&str> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }

    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

/// クエリパラメータ1つを有限の数値として解釈する。
///
/// 先頭の数値部分だけを読むので `12abc` は 12 になる。
/// 未指定・数値で始まらない・無限大になる値はすべて `InvalidNumberFormat`。
pub fn parse_operand(raw: Option<&str>) -> Result<f64, CalcError> {
    let value = raw
        .and_then(leading_number)
        .ok_or(CalcError::InvalidNumberFormat)?
        .parse::<f64>()
        .map_err(|_| CalcError::InvalidNumberFormat)?;

    // "1e400" のような桁あふれ
    if !value.is_finite() {
        return Err(CalcError::InvalidNumberFormat);
    }

    Ok(value)
}

pub fn validate_numbers(n1: Option<&str>, n2: Option<&str>) -> Result<(f64, f64), CalcError> {
    Ok((parse_operand(n1)?, parse_operand(n2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_valid_numbers() {
        assert_eq!(parse_operand(Some("2")).unwrap(), 2.0);
        assert_eq!(parse_operand(Some("-3.5")).unwrap(), -3.5);
        assert_eq!(parse_operand(Some(" 10 ")).unwrap(), 10.0);
        assert_eq!(parse_operand(Some("1e3")).unwrap(), 1000.0);
        assert_eq!(parse_operand(Some("2.5E-1")).unwrap(), 0.25);
        assert_eq!(parse_operand(Some("-.5")).unwrap(), -0.5);
        assert_eq!(parse_operand(Some("5.")).unwrap(), 5.0);
        assert_ok!(parse_operand(Some(".5")));
    }

    #[test]
    fn test_parse_leading_number_only() {
        let cases = vec![
            ("12abc", 12.0),
            ("1.5px", 1.5),
            ("1,2", 1.0),
            ("0x10", 0.0),
            ("3e", 3.0),
            ("3e+", 3.0),
            ("4.2.1", 4.2),
            ("\t7 8", 7.0),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_operand(Some(input)).unwrap(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        let inputs = vec!["abc", "", "   ", "-", "+", ".", "-.e5", "e5", "px1"];

        for input in inputs {
            let err = assert_err!(parse_operand(Some(input)));
            assert_eq!(err, CalcError::InvalidNumberFormat, "input: {:?}", input);
        }
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        for input in ["NaN", "inf", "-inf", "Infinity", "1e400", "-1e400abc"] {
            assert_eq!(
                parse_operand(Some(input)),
                Err(CalcError::InvalidNumberFormat),
                "input: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(parse_operand(None), Err(CalcError::InvalidNumberFormat));
        assert_eq!(
            validate_numbers(Some("1"), None),
            Err(CalcError::InvalidNumberFormat)
        );
        assert_eq!(
            validate_numbers(None, Some("1")),
            Err(CalcError::InvalidNumberFormat)
        );
    }

    #[test]
    fn test_validate_numbers() {
        assert_eq!(validate_numbers(Some("4"), Some("0.25")).unwrap(), (4.0, 0.25));
    }
}
