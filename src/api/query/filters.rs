//! OData `$filter` expressions
//!
//! String literals are always quoted and escaped here; callers never splice
//! raw user input into a filter.

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    // Comparison operators
    Eq(String, FilterValue),
    Ne(String, FilterValue),
    Gt(String, FilterValue),
    Ge(String, FilterValue),
    Lt(String, FilterValue),
    Le(String, FilterValue),

    // String functions
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),

    // Logical operators
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Guid(String),
    Null,
}

/// How a name search matches; exactly one mode applies per query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    #[default]
    StartsWith,
    Contains,
}

impl NameMatch {
    pub fn from_contains_flag(contains: bool) -> Self {
        if contains {
            NameMatch::Contains
        } else {
            NameMatch::StartsWith
        }
    }

    pub fn filter(self, field: impl Into<String>, value: impl Into<String>) -> Filter {
        match self {
            NameMatch::StartsWith => Filter::starts_with(field, value),
            NameMatch::Contains => Filter::contains(field, value),
        }
    }

    /// Phrase used in user-facing messages
    pub fn describe(self) -> &'static str {
        match self {
            NameMatch::StartsWith => "starting with",
            NameMatch::Contains => "containing",
        }
    }
}

pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Gt(field.into(), value.into())
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Ge(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    pub fn le(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Le(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains(field.into(), value.into())
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::StartsWith(field.into(), value.into())
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::EndsWith(field.into(), value.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// `self and other`, flattening into an existing conjunction
    pub fn and_also(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Open records only
    pub fn active() -> Self {
        Self::eq("statecode", 0)
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!("{} eq {}", field, value.to_odata_string()),
            Filter::Ne(field, value) => format!("{} ne {}", field, value.to_odata_string()),
            Filter::Gt(field, value) => format!("{} gt {}", field, value.to_odata_string()),
            Filter::Ge(field, value) => format!("{} ge {}", field, value.to_odata_string()),
            Filter::Lt(field, value) => format!("{} lt {}", field, value.to_odata_string()),
            Filter::Le(field, value) => format!("{} le {}", field, value.to_odata_string()),

            Filter::Contains(field, value) => {
                format!("contains({},'{}')", field, escape_literal(value))
            }
            Filter::StartsWith(field, value) => {
                format!("startswith({},'{}')", field, escape_literal(value))
            }
            Filter::EndsWith(field, value) => {
                format!("endswith({},'{}')", field, escape_literal(value))
            }

            Filter::And(filters) => join(filters, "and"),
            Filter::Or(filters) => join(filters, "or"),
            Filter::Not(filter) => format!("not ({})", filter.to_odata_string()),
        }
    }
}

// Children of the other connective are parenthesised; same-connective
// children are associative and render flat.
fn join(filters: &[Filter], op: &str) -> String {
    filters
        .iter()
        .map(|f| match (f, op) {
            (Filter::Or(_), "and") | (Filter::And(_), "or") => format!("({})", f.to_odata_string()),
            _ => f.to_odata_string(),
        })
        .collect::<Vec<_>>()
        .join(&format!(" {} ", op))
}

impl FilterValue {
    pub fn guid(value: impl Into<String>) -> Self {
        FilterValue::Guid(value.into())
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            FilterValue::String(s) => format!("'{}'", escape_literal(s)),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Decimal(n) => n.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Guid(g) => g.clone(),
            FilterValue::Null => "null".to_string(),
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Decimal(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value as i64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_filters() {
        assert_eq!(Filter::eq("statecode", 0).to_odata_string(), "statecode eq 0");
        assert_eq!(Filter::ne("fullname", "Jane").to_odata_string(), "fullname ne 'Jane'");
        assert_eq!(Filter::gt("estimatedvalue", 1000.5).to_odata_string(), "estimatedvalue gt 1000.5");
        assert_eq!(
            Filter::eq("_parentaccountid_value", FilterValue::guid("6f1d0a3e-8a2b-4c1d-9e0f-123456789abc"))
                .to_odata_string(),
            "_parentaccountid_value eq 6f1d0a3e-8a2b-4c1d-9e0f-123456789abc"
        );
        assert_eq!(Filter::eq("description", FilterValue::Null).to_odata_string(), "description eq null");
    }

    #[test]
    fn test_string_functions_have_no_space_after_comma() {
        assert_eq!(Filter::contains("name", "Cloud").to_odata_string(), "contains(name,'Cloud')");
        assert_eq!(Filter::starts_with("name", "Con").to_odata_string(), "startswith(name,'Con')");
        assert_eq!(Filter::ends_with("emailaddress1", ".com").to_odata_string(), "endswith(emailaddress1,'.com')");
    }

    #[test]
    fn test_flat_conjunction() {
        let filter = Filter::contains("name", "Cloud").and_also(Filter::active());
        assert_eq!(filter.to_odata_string(), "contains(name,'Cloud') and statecode eq 0");

        let won = Filter::and(vec![Filter::eq("statecode", 1), Filter::eq("statuscode", 3)]);
        assert_eq!(won.to_odata_string(), "statecode eq 1 and statuscode eq 3");
    }

    #[test]
    fn test_and_also_flattens() {
        let filter = Filter::eq("a", 1).and_also(Filter::eq("b", 2)).and_also(Filter::eq("c", 3));
        assert_eq!(filter, Filter::and(vec![Filter::eq("a", 1), Filter::eq("b", 2), Filter::eq("c", 3)]));
    }

    #[test]
    fn test_mixed_nesting_is_parenthesised() {
        let filter = Filter::and(vec![
            Filter::active(),
            Filter::or(vec![Filter::contains("firstname", "Jo"), Filter::contains("lastname", "Smith")]),
        ]);
        assert_eq!(
            filter.to_odata_string(),
            "statecode eq 0 and (contains(firstname,'Jo') or contains(lastname,'Smith'))"
        );

        let negated = Filter::not(Filter::eq("statecode", 2));
        assert_eq!(negated.to_odata_string(), "not (statecode eq 2)");
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(Filter::contains("name", "O'Brien").to_odata_string(), "contains(name,'O''Brien')");
        assert_eq!(Filter::eq("name", "it's").to_odata_string(), "name eq 'it''s'");
    }

    #[test]
    fn test_name_match_modes() {
        assert_eq!(NameMatch::default(), NameMatch::StartsWith);
        assert_eq!(NameMatch::from_contains_flag(true), NameMatch::Contains);
        assert_eq!(
            NameMatch::Contains.filter("name", "x").to_odata_string(),
            "contains(name,'x')"
        );
        assert_eq!(NameMatch::StartsWith.describe(), "starting with");
    }
}
