//! Query string parser.
//!
//! Turns text typed into a search box, such as
//! `leetcode company:google "hard problem" order:fsrs`, into a
//! [`ParsedQuery`]. Parsing never fails: anything that is not a
//! `key:value` pair is a plain tag.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field an item list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    UpdatedAt,
    CreatedAt,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort directive taken from an `order:` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Order {
    Field {
        field: OrderField,
        direction: Direction,
    },
    /// Ascending retrievability: items closest to being forgotten first.
    Urgency,
}

impl Order {
    /// Map an `order:` value. Unknown values fall back to most recently
    /// updated first.
    pub fn from_value(value: &str) -> Self {
        match value {
            "recent" => Order::Field {
                field: OrderField::UpdatedAt,
                direction: Direction::Desc,
            },
            "newest" => Order::Field {
                field: OrderField::CreatedAt,
                direction: Direction::Desc,
            },
            "oldest" => Order::Field {
                field: OrderField::CreatedAt,
                direction: Direction::Asc,
            },
            "score" => Order::Field {
                field: OrderField::Score,
                direction: Direction::Desc,
            },
            "fsrs" => Order::Urgency,
            _ => Order::Field {
                field: OrderField::UpdatedAt,
                direction: Direction::Desc,
            },
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Urgency => write!(f, "urgency"),
            Order::Field { field, direction } => {
                let field = match field {
                    OrderField::UpdatedAt => "updatedAt",
                    OrderField::CreatedAt => "createdAt",
                    OrderField::Score => "score",
                };
                let direction = match direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                write!(f, "{field} {direction}")
            }
        }
    }
}

/// Structured form of a query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Lowercase free-text tokens, in the order they were typed.
    pub tags: Vec<String>,
    /// Lowercase operator key to lowercase values, in the order they were typed.
    pub ops: BTreeMap<String, Vec<String>>,
    /// Sort directive from the last `order:` token.
    pub order: Option<Order>,
}

impl ParsedQuery {
    pub fn parse(raw: &str) -> Self {
        parse_query(Some(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.ops.is_empty() && self.order.is_none()
    }

    /// Values given for `key`, empty if the key never appeared.
    pub fn values(&self, key: &str) -> &[String] {
        self.ops.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse a raw query. `None`, empty and whitespace-only input give an empty
/// query.
pub fn parse_query(raw: Option<&str>) -> ParsedQuery {
    let mut query = ParsedQuery::default();

    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return query;
    };

    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    for token in tokenize(decoded.trim()) {
        match split_key_value(&token) {
            Some((key, value)) => {
                let key = key.to_lowercase();
                let value = value.to_lowercase();
                if key == "order" {
                    query.order = Some(Order::from_value(&value));
                } else {
                    query.ops.entry(key).or_default().push(value);
                }
            }
            None => {
                query
                    .tags
                    .extend(token.split_whitespace().map(str::to_lowercase));
            }
        }
    }

    query
}

/// Split on whitespace outside double quotes. Quotes are dropped and an
/// unterminated quote runs to the end of the input.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// `key:value` with a non-empty key free of whitespace. The value may be
/// empty and may itself contain colons.
fn split_key_value(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once(':')?;
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return None;
    }
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_query() {
        assert!(parse_query(None).is_empty());
        assert!(parse_query(Some("")).is_empty());
        assert!(parse_query(Some("   \t ")).is_empty());
    }

    #[test]
    fn tags_and_ops_partition_tokens() {
        let q = ParsedQuery::parse(r#"leetcode company:google "hard problem""#);
        assert_eq!(q.tags, vec!["leetcode", "hard", "problem"]);
        assert_eq!(q.ops.len(), 1);
        assert_eq!(q.values("company"), ["google"]);
        assert!(q.order.is_none());
    }

    #[test]
    fn quotes_protect_spaces_in_operator_values() {
        let q = ParsedQuery::parse(r#"company:"Jane Street" graphs"#);
        assert_eq!(q.values("company"), ["jane street"]);
        assert_eq!(q.tags, vec!["graphs"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        let q = ParsedQuery::parse(r#"topic:"dynamic programming"#);
        assert_eq!(q.values("topic"), ["dynamic programming"]);
    }

    #[test]
    fn last_order_wins() {
        let q = ParsedQuery::parse("order:newest order:oldest");
        assert_eq!(
            q.order,
            Some(Order::Field {
                field: OrderField::CreatedAt,
                direction: Direction::Asc,
            })
        );
        assert!(q.ops.is_empty());
    }

    #[test]
    fn unknown_order_falls_back_to_recent() {
        let q = ParsedQuery::parse("order:bogus");
        assert_eq!(q.order, Some(Order::from_value("recent")));
    }

    #[test]
    fn order_table() {
        assert_eq!(ParsedQuery::parse("order:FSRS").order, Some(Order::Urgency));
        assert_eq!(
            ParsedQuery::parse("order:score").order,
            Some(Order::Field {
                field: OrderField::Score,
                direction: Direction::Desc,
            })
        );
        assert_eq!(
            ParsedQuery::parse("order:newest").order.unwrap().to_string(),
            "createdAt desc"
        );
    }

    #[test]
    fn empty_key_is_a_tag() {
        let q = ParsedQuery::parse(":foo");
        assert_eq!(q.tags, vec![":foo"]);
        assert!(q.ops.is_empty());
    }

    #[test]
    fn repeated_keys_keep_every_value() {
        let q = ParsedQuery::parse("Topic:Graphs topic:dp topic:graphs");
        assert_eq!(q.values("topic"), ["graphs", "dp", "graphs"]);
    }

    #[test]
    fn values_may_contain_colons_or_be_empty() {
        let q = ParsedQuery::parse("source:http://x company:");
        assert_eq!(q.values("source"), ["http://x"]);
        assert_eq!(q.values("company"), [""]);
    }

    #[test]
    fn url_encoded_input_is_decoded() {
        let q = ParsedQuery::parse("is%3Adue%20Arrays");
        assert_eq!(q.values("is"), ["due"]);
        assert_eq!(q.tags, vec!["arrays"]);
    }

    #[test]
    fn parser_is_total() {
        for raw in [":", "::", ": :", "\"", "\"\"", "%", "%zz", "a:b:c", "order:", "  :x:  "] {
            let _ = ParsedQuery::parse(raw);
        }
        let q = ParsedQuery::parse("::");
        assert_eq!(q.tags, vec!["::"]);
    }
}
