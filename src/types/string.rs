use super::common::{check_length, mismatch};
use super::{Input, TypeDef};
use crate::resolve::ResolutionContext;
use crate::schema::{MemberDef, TypeName};
use crate::{Error, ErrorCode, Result, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$")
        .expect("url pattern is valid")
});

/// `string`, `email` and `url`.
pub struct StringDef {
    name: TypeName,
}

impl StringDef {
    pub fn new(name: TypeName) -> Self {
        StringDef { name }
    }

    fn format(&self) -> Option<(&'static Regex, &'static str)> {
        match self.name {
            TypeName::Email => Some((&EMAIL, "an email address")),
            TypeName::Url => Some((&URL, "a url")),
            _ => None,
        }
    }
}

impl TypeDef for StringDef {
    fn name(&self) -> TypeName {
        self.name
    }

    fn validate(
        &self,
        input: Input<'_>,
        def: &MemberDef,
        _ctx: &mut ResolutionContext<'_>,
    ) -> Result<Value> {
        let Some((Value::String(s), _)) = input.scalar() else {
            return Err(mismatch("a string", &input, def));
        };

        if let Some((format, what)) = self.format() {
            if !format.is_match(s) {
                return Err(Error::validation(
                    ErrorCode::PatternMismatch,
                    format!("'{}' expects {}, found '{}'", def.path, what, s),
                    input.range(),
                ));
            }
        }

        check_length(def, &input, s.chars().count())?;

        if let Some(pattern) = &def.pattern {
            if !pattern.is_match(s) {
                return Err(Error::validation(
                    ErrorCode::PatternMismatch,
                    format!(
                        "'{}' does not match the pattern {} for '{}'",
                        s,
                        pattern.as_str(),
                        def.path
                    ),
                    input.range(),
                ));
            }
        }

        Ok(Value::String(s.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert!(EMAIL.is_match("ann@example.com"));
        assert!(!EMAIL.is_match("ann@example"));
        assert!(!EMAIL.is_match("not an email"));
        assert!(URL.is_match("https://example.com/a?b=c"));
        assert!(!URL.is_match("example.com"));
    }
}
