//! The Solidity type system as seen by the decoder.

use std::fmt;

use crate::error::AbiError;

/// A parsed Solidity parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// 20-byte address.
    Address,
    /// Boolean.
    Bool,
    /// Unsigned integer. Width in bits.
    Uint(usize),
    /// Signed two's-complement integer. Width in bits.
    Int(usize),
    /// Fixed-size byte array (`bytes1` … `bytes32`). Length in bytes.
    FixedBytes(usize),
    /// Variable-length byte array.
    Bytes,
    /// UTF-8 string.
    String,
    /// Dynamically-sized array.
    Array(Box<ParamType>),
    /// Fixed-size array.
    FixedArray(Box<ParamType>, usize),
    /// Tuple of component types.
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parses a canonical Solidity type string, e.g. `"uint256"`,
    /// `"address[]"`, `"(uint256,address)[3]"`.
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AbiError::UnknownType(s.to_string()));
        }

        // Array suffixes resolve from the right: "uint8[2][]" is a
        // dynamic array of "uint8[2]".
        if let Some(rest) = s.strip_suffix(']') {
            let open = rest
                .rfind('[')
                .ok_or_else(|| AbiError::UnknownType(s.to_string()))?;
            let elem = Self::parse(&rest[..open])?;
            let size = rest[open + 1..].trim();
            return if size.is_empty() {
                Ok(ParamType::Array(Box::new(elem)))
            } else {
                let n: usize = size
                    .parse()
                    .map_err(|_| AbiError::UnknownType(s.to_string()))?;
                Ok(ParamType::FixedArray(Box::new(elem), n))
            };
        }

        if let Some(inner) = s.strip_prefix('(') {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| AbiError::UnknownType(s.to_string()))?;
            if inner.trim().is_empty() {
                return Ok(ParamType::Tuple(Vec::new()));
            }
            let components = split_top_level(inner)
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ParamType::Tuple(components));
        }

        match s {
            "address" => Ok(ParamType::Address),
            "bool" => Ok(ParamType::Bool),
            "string" => Ok(ParamType::String),
            "bytes" => Ok(ParamType::Bytes),
            "uint" => Ok(ParamType::Uint(256)),
            "int" => Ok(ParamType::Int(256)),
            _ => {
                if let Some(bits) = s.strip_prefix("uint") {
                    let bits = parse_width(bits, 256).ok_or_else(|| AbiError::UnknownType(s.to_string()))?;
                    Ok(ParamType::Uint(bits))
                } else if let Some(bits) = s.strip_prefix("int") {
                    let bits = parse_width(bits, 256).ok_or_else(|| AbiError::UnknownType(s.to_string()))?;
                    Ok(ParamType::Int(bits))
                } else if let Some(len) = s.strip_prefix("bytes") {
                    let len = parse_width(len, 32).ok_or_else(|| AbiError::UnknownType(s.to_string()))?;
                    Ok(ParamType::FixedBytes(len))
                } else {
                    Err(AbiError::UnknownType(s.to_string()))
                }
            }
        }
    }

    /// Whether values of this type live in the tail of the ABI encoding.
    ///
    /// `string`, `bytes` and `T[]` are dynamic; tuples are treated as
    /// dynamic wholesale; `T[N]` is dynamic iff `T` is.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Bytes | ParamType::Array(_) | ParamType::Tuple(_) => {
                true
            }
            ParamType::FixedArray(elem, _) => elem.is_dynamic(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::FixedBytes(len) => write!(f, "bytes{len}"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::String => write!(f, "string"),
            ParamType::Array(elem) => write!(f, "{elem}[]"),
            ParamType::FixedArray(elem, n) => write!(f, "{elem}[{n}]"),
            ParamType::Tuple(components) => {
                write!(f, "(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn parse_width(s: &str, max: usize) -> Option<usize> {
    let n: usize = s.parse().ok()?;
    (n > 0 && n <= max).then_some(n)
}

/// Splits on commas at parenthesis depth zero.
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elementary_types() {
        assert_eq!(ParamType::parse("address").unwrap(), ParamType::Address);
        assert_eq!(ParamType::parse("bool").unwrap(), ParamType::Bool);
        assert_eq!(ParamType::parse("uint256").unwrap(), ParamType::Uint(256));
        assert_eq!(ParamType::parse("uint").unwrap(), ParamType::Uint(256));
        assert_eq!(ParamType::parse("int24").unwrap(), ParamType::Int(24));
        assert_eq!(ParamType::parse("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(ParamType::parse("bytes").unwrap(), ParamType::Bytes);
        assert_eq!(ParamType::parse("string").unwrap(), ParamType::String);
    }

    #[test]
    fn parses_arrays_from_the_right() {
        assert_eq!(
            ParamType::parse("uint8[2][]").unwrap(),
            ParamType::Array(Box::new(ParamType::FixedArray(
                Box::new(ParamType::Uint(8)),
                2
            )))
        );
        assert_eq!(
            ParamType::parse("address[3]").unwrap(),
            ParamType::FixedArray(Box::new(ParamType::Address), 3)
        );
    }

    #[test]
    fn parses_tuples() {
        assert_eq!(
            ParamType::parse("(uint256,address)").unwrap(),
            ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Address])
        );
        assert_eq!(
            ParamType::parse("(uint256,(bool,string))[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Uint(256),
                ParamType::Tuple(vec![ParamType::Bool, ParamType::String]),
            ])))
        );
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(ParamType::parse("uint7x").is_err());
        assert!(ParamType::parse("bytes33").is_err());
        assert!(ParamType::parse("uint0").is_err());
        assert!(ParamType::parse("frob").is_err());
        assert!(ParamType::parse("").is_err());
    }

    #[test]
    fn display_is_canonical_fixed_point() {
        for s in [
            "address",
            "uint256",
            "int24",
            "bytes32",
            "string",
            "bytes",
            "address[]",
            "uint8[2][]",
            "(uint256,address)",
            "(uint256,(bool,string))[3]",
        ] {
            let parsed = ParamType::parse(s).unwrap();
            assert_eq!(parsed.to_string(), s);
            assert_eq!(ParamType::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn dynamic_classification() {
        assert!(ParamType::parse("string").unwrap().is_dynamic());
        assert!(ParamType::parse("bytes").unwrap().is_dynamic());
        assert!(ParamType::parse("uint256[]").unwrap().is_dynamic());
        assert!(ParamType::parse("(uint256,address)").unwrap().is_dynamic());
        assert!(ParamType::parse("string[2]").unwrap().is_dynamic());

        assert!(!ParamType::parse("uint256").unwrap().is_dynamic());
        assert!(!ParamType::parse("bytes32").unwrap().is_dynamic());
        assert!(!ParamType::parse("address[4]").unwrap().is_dynamic());
    }
}
