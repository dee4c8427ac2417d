/// A parsed `x-for` expression: `item [, index] in source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForBinding {
    pub item: String,
    pub index: Option<String>,
    pub source: String,
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Splits a leading run of word characters off `input`.
fn take_word(input: &str) -> Option<(&str, &str)> {
    let end = input
        .char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map_or(input.len(), |(i, _)| i);
    if end == 0 {
        None
    } else {
        Some(input.split_at(end))
    }
}

/// Consumes at least one whitespace character.
fn take_whitespace(input: &str) -> Option<&str> {
    let trimmed = input.trim_start();
    if trimmed.len() == input.len() {
        None
    } else {
        Some(trimmed)
    }
}

impl ForBinding {
    /// Parses `name [, name2] in name3`. Names are runs of ASCII letters,
    /// digits and `_`; `in` must be surrounded by whitespace and nothing
    /// may precede or follow the expression.
    pub fn parse(expression: &str) -> Option<Self> {
        let (item, rest) = take_word(expression)?;

        let (index, rest) = match rest.trim_start().strip_prefix(',') {
            Some(after_comma) => {
                let (index, rest) = take_word(after_comma.trim_start())?;
                (Some(index.to_string()), rest)
            }
            None => (None, rest),
        };

        let rest = take_whitespace(rest)?.strip_prefix("in")?;
        let rest = take_whitespace(rest)?;
        let (source, rest) = take_word(rest)?;
        if !rest.is_empty() {
            return None;
        }

        Some(Self {
            item: item.to_string(),
            index,
            source: source.to_string(),
        })
    }

    /// Context name the index is bound to inside the template.
    pub fn index_name<'a>(&'a self, default: &'a str) -> &'a str {
        self.index.as_deref().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(item: &str, index: Option<&str>, source: &str) -> ForBinding {
        ForBinding {
            item: item.to_string(),
            index: index.map(str::to_string),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_parse_item_only() {
        assert_eq!(
            ForBinding::parse("user in users"),
            Some(binding("user", None, "users"))
        );
        assert_eq!(
            ForBinding::parse("user   in\tusers"),
            Some(binding("user", None, "users"))
        );
    }

    #[test]
    fn test_parse_with_index() {
        assert_eq!(
            ForBinding::parse("item, i in items"),
            Some(binding("item", Some("i"), "items"))
        );
        assert_eq!(
            ForBinding::parse("item ,i in items"),
            Some(binding("item", Some("i"), "items"))
        );
        assert_eq!(
            ForBinding::parse("item,i in items"),
            Some(binding("item", Some("i"), "items"))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "users",
            "user of users",
            "user in",
            "user in users extra",
            " user in users",
            "user in users ",
            "user.name in users",
            "user in state.users",
            "userin users",
            "user inusers",
            "item, in items",
        ] {
            assert_eq!(ForBinding::parse(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_index_name_falls_back() {
        let plain = ForBinding::parse("x in xs").unwrap();
        assert_eq!(plain.index_name("index"), "index");
        let named = ForBinding::parse("x, n in xs").unwrap();
        assert_eq!(named.index_name("index"), "n");
    }
}
