use std::cmp::Ordering;
use std::fmt;

/// Comparison operators a condition column can name in its `#Operator` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

/// Mutations an action column can name in its `#Operator` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionOp {
    Set,
    Increase,
    Decrease,
}

impl ConditionOp {
    /// Look up an operator phrase as written in a rule table.
    ///
    /// Names match ASCII case-insensitively; the symbolic forms
    /// `==`, `!=`, `>`, `>=`, `<` and `<=` are accepted as well.
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim();
        let op = match phrase {
            "==" | "=" => Self::Equals,
            "!=" | "<>" => Self::NotEquals,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterThanOrEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessThanOrEqual,
            _ => {
                return [
                    Self::Equals,
                    Self::NotEquals,
                    Self::GreaterThan,
                    Self::GreaterThanOrEqual,
                    Self::LessThan,
                    Self::LessThanOrEqual,
                    Self::Contains,
                    Self::NotContains,
                    Self::StartsWith,
                    Self::EndsWith,
                ]
                .into_iter()
                .find(|op| op.name().eq_ignore_ascii_case(phrase));
            }
        };
        Some(op)
    }

    /// The canonical table spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "NotEquals",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
        }
    }

    /// Whether `fact <op> literal` holds given how the fact value orders
    /// against the literal. Text-only operators never accept an ordering.
    pub(crate) fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Equals => ord == Ordering::Equal,
            Self::NotEquals => ord != Ordering::Equal,
            Self::GreaterThan => ord == Ordering::Greater,
            Self::GreaterThanOrEqual => ord != Ordering::Less,
            Self::LessThan => ord == Ordering::Less,
            Self::LessThanOrEqual => ord != Ordering::Greater,
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith => false,
        }
    }

    pub(crate) fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Contains | Self::NotContains | Self::StartsWith | Self::EndsWith
        )
    }
}

impl ActionOp {
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let phrase = phrase.trim();
        [Self::Set, Self::Increase, Self::Decrease]
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(phrase))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Set => "Set",
            Self::Increase => "Increase",
            Self::Decrease => "Decrease",
        }
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ActionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
