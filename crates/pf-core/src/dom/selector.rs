//! Compound CSS selectors for the in-memory page
//!
//! Supports a single compound selector: optional tag, optional `#id`, any
//! number of `.class` parts and `[attr]`, `[attr=value]` or `[attr^=value]`
//! tests. Combinators are not supported.

/// Attribute test inside `[...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatch {
    Exists(String),
    Equals(String, String),
    Prefix(String, String),
}

impl AttributeMatch {
    fn parse(body: &str) -> Option<Self> {
        let parsed = if let Some((name, value)) = body.split_once("^=") {
            AttributeMatch::Prefix(name.trim().to_string(), unquote(value))
        } else if let Some((name, value)) = body.split_once('=') {
            AttributeMatch::Equals(name.trim().to_string(), unquote(value))
        } else {
            AttributeMatch::Exists(body.trim().to_string())
        };

        if parsed.name().is_empty() {
            None
        } else {
            Some(parsed)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AttributeMatch::Exists(name)
            | AttributeMatch::Equals(name, _)
            | AttributeMatch::Prefix(name, _) => name,
        }
    }

    fn matches(&self, actual: Option<&str>) -> bool {
        match (self, actual) {
            (AttributeMatch::Exists(_), Some(_)) => true,
            (AttributeMatch::Equals(_, expected), Some(actual)) => actual == expected,
            (AttributeMatch::Prefix(_, prefix), Some(actual)) => actual.starts_with(prefix.as_str()),
            (_, None) => false,
        }
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
        .to_string()
}

/// A parsed compound selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeMatch>,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '#' | '.' | '[')
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c == ']')
}

impl Selector {
    /// Parse a compound selector, `None` when it is empty or unsupported
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let mut selector = Selector::default();
        let tag_len = input.find(is_delimiter).unwrap_or(input.len());
        if tag_len > 0 {
            let tag = &input[..tag_len];
            if !valid_name(tag) {
                return None;
            }
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        let mut rest = &input[tag_len..];
        while let Some(lead) = rest.chars().next() {
            match lead {
                '#' | '.' => {
                    let body = &rest[1..];
                    let len = body.find(is_delimiter).unwrap_or(body.len());
                    let name = &body[..len];
                    if !valid_name(name) {
                        return None;
                    }
                    if lead == '#' {
                        selector.id = Some(name.to_string());
                    } else {
                        selector.classes.push(name.to_string());
                    }
                    rest = &body[len..];
                }
                '[' => {
                    let end = rest.find(']')?;
                    selector.attributes.push(AttributeMatch::parse(&rest[1..end])?);
                    rest = &rest[end + 1..];
                }
                _ => return None,
            }
        }

        Some(selector)
    }

    /// Test a node described by its tag, classes and an attribute lookup
    pub fn matches<'a>(
        &self,
        tag: &str,
        classes: &[String],
        attribute: impl Fn(&str) -> Option<&'a str>,
    ) -> bool {
        if let Some(expected) = &self.tag {
            if expected != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| classes.contains(class)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|test| test.matches(attribute(test.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse(r#"button.primary[type="submit"]"#).unwrap();
        assert_eq!(sel.tag.as_deref(), Some("button"));
        assert_eq!(sel.classes, vec!["primary".to_string()]);
        assert_eq!(
            sel.attributes,
            vec![AttributeMatch::Equals("type".into(), "submit".into())]
        );
    }

    #[test]
    fn test_prefix_attribute() {
        let sel = Selector::parse(r##"a[href^="#"]"##).unwrap();
        let classes: Vec<String> = Vec::new();
        assert!(sel.matches("a", &classes, |name| (name == "href").then_some("#about")));
        assert!(!sel.matches("a", &classes, |name| (name == "href").then_some("/blog")));
        assert!(!sel.matches("a", &classes, |_| None));
    }

    #[test]
    fn test_rejects_combinators() {
        assert!(Selector::parse("nav a").is_none());
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("div > p").is_none());
    }

    #[test]
    fn test_id_and_class_matching() {
        let sel = Selector::parse("#navbar.fixed").unwrap();
        let classes = vec!["fixed".to_string(), "top-0".to_string()];
        assert!(sel.matches("nav", &classes, |name| (name == "id").then_some("navbar")));
        assert!(!sel.matches("nav", &classes, |name| (name == "id").then_some("footer")));
    }
}
