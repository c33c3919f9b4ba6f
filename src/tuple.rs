use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    String,
    Boolean,
}

// Runtime value of a cell, a literal or an intermediate WHERE result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Whether `text` is an optional sign followed by one or more ASCII digits.
pub fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(Value::String("Child1".into()).to_string(), "Child1");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_is_integer_text() {
        assert!(is_integer_text("0"));
        assert!(is_integer_text("-12"));
        assert!(is_integer_text("+7"));
        assert!(!is_integer_text(""));
        assert!(!is_integer_text("-"));
        assert!(!is_integer_text("1-2"));
        assert!(!is_integer_text("+-1"));
        assert!(!is_integer_text("12a"));
    }

    #[test]
    fn test_integer_round_trip_through_text() {
        for n in [i64::MIN, -1, 0, 1, i64::MAX] {
            let text = Value::Integer(n).to_string();
            assert!(is_integer_text(&text));
            assert_eq!(text.parse::<i64>().unwrap(), n);
        }
    }
}
