//! Colon-delimited resolver settings parsing.

use crate::error::{Error, Result};

/// Parse an integer field with automatic base detection, accepting the
/// `0x`/`0o`/`0b` prefixes alongside plain decimal.
pub(crate) fn parse_int(field: &str) -> Result<u64> {
    let s = field.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o") {
        (oct, 8)
    } else if let Some(bin) = s.strip_prefix("0b") {
        (bin, 2)
    } else {
        (s, 10)
    };
    u64::from_str_radix(digits, radix)
        .map_err(|e| Error::InvalidSettings(format!("bad numeric field '{field}': {e}")))
}

/// Walks the colon-delimited fields of a settings string, carrying the
/// resolver name so parse errors identify their variant.
pub(crate) struct Fields<'a> {
    kind: &'static str,
    iter: std::str::Split<'a, char>,
}

impl<'a> Fields<'a> {
    pub fn new(kind: &'static str, settings: &'a str) -> Self {
        Self {
            kind,
            iter: settings.split(':'),
        }
    }

    pub fn required(&mut self, name: &str) -> Result<&'a str> {
        match self.iter.next() {
            Some(field) if !field.is_empty() => Ok(field),
            _ => Err(Error::InvalidSettings(format!(
                "{}: missing field '{}'",
                self.kind, name
            ))),
        }
    }

    pub fn required_int(&mut self, name: &str) -> Result<u64> {
        parse_int(self.required(name)?)
    }

    /// Next field if present and non-empty. An empty field skips an
    /// optional slot, as in `0xfc::0xfe` (no flags, but an offset pointer).
    pub fn optional(&mut self) -> Option<&'a str> {
        match self.iter.next() {
            Some("") | None => None,
            Some(field) => Some(field),
        }
    }

    pub fn optional_int(&mut self) -> Result<Option<u64>> {
        self.optional().map(parse_int).transpose()
    }

    pub fn finish(mut self) -> Result<()> {
        match self.iter.next() {
            Some(extra) => Err(Error::InvalidSettings(format!(
                "{}: unexpected trailing field '{}'",
                self.kind, extra
            ))),
            None => Ok(()),
        }
    }
}

/// Single-character mode flags. Unknown characters are rejected rather than
/// ignored, so a typo in a settings string fails loudly at startup.
#[derive(Debug)]
pub(crate) struct FlagSet(String);

impl FlagSet {
    pub fn parse(kind: &'static str, field: Option<&str>, allowed: &str) -> Result<Self> {
        let field = field.unwrap_or("");
        if let Some(bad) = field.chars().find(|c| !allowed.contains(*c)) {
            return Err(Error::InvalidSettings(format!(
                "{kind}: unknown flag '{bad}' (allowed: {allowed})"
            )));
        }
        Ok(Self(field.to_owned()))
    }

    pub fn has(&self, flag: char) -> bool {
        self.0.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_auto_base() {
        assert_eq!(parse_int("0x10").unwrap(), 0x10);
        assert_eq!(parse_int("0X66ec").unwrap(), 0x66EC);
        assert_eq!(parse_int("16").unwrap(), 16);
        assert_eq!(parse_int("0o17").unwrap(), 0o17);
        assert_eq!(parse_int("0b101").unwrap(), 5);
        assert!(parse_int("zz").is_err());
        assert!(parse_int("0xgg").is_err());
    }

    #[test]
    fn test_fields_walks_optional_slots() {
        let mut fields = Fields::new("word", "0xfc::0xfe");
        assert_eq!(fields.required_int("pointer").unwrap(), 0xFC);
        assert_eq!(fields.optional(), None);
        assert_eq!(fields.optional_int().unwrap(), Some(0xFE));
        fields.finish().unwrap();
    }

    #[test]
    fn test_fields_rejects_trailing_garbage() {
        let mut fields = Fields::new("word", "0xfc:b:0xfe:junk");
        fields.required("pointer").unwrap();
        fields.optional();
        fields.optional();
        assert!(fields.finish().is_err());
    }

    #[test]
    fn test_missing_required_field_names_variant() {
        let mut fields = Fields::new("hilo", "0x324");
        fields.required("high pointer").unwrap();
        let err = fields.required("low pointer").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("hilo"));
        assert!(msg.contains("low pointer"));
    }

    #[test]
    fn test_flag_set_rejects_unknown() {
        assert!(FlagSet::parse("table", Some("wWd"), "wWdoh").is_ok());
        let err = FlagSet::parse("table", Some("wx"), "wWdoh").unwrap_err();
        assert!(err.to_string().contains('x'));
    }
}
