use dynamics_crm::api::{Filter, FilterValue, NameMatch, OrderBy, QueryBuilder};

fn decoded(builder: QueryBuilder) -> String {
    let url = builder.build().to_relative_url();
    urlencoding::decode(&url).unwrap().into_owned()
}

#[test]
fn test_name_search_with_state_filter() {
    let url = decoded(
        QueryBuilder::collection("opportunities")
            .name_match("name", "Cloud", NameMatch::Contains)
            .active_only()
            .top(5)
            .newest_first(),
    );

    assert_eq!(
        url,
        "opportunities?$filter=contains(name,'Cloud') and statecode eq 0&$top=5&$orderby=createdon desc"
    );
}

#[test]
fn test_starts_with_is_default_match() {
    let url = decoded(
        QueryBuilder::collection("accounts")
            .name_match("name", "Cont", NameMatch::default())
            .top(10)
            .select(&["name", "_ownerid_value"]),
    );

    assert_eq!(url, "accounts?$filter=startswith(name,'Cont')&$top=10&$select=name,_ownerid_value");
}

#[test]
fn test_mixed_connectives_are_grouped() {
    let either = Filter::or(vec![
        Filter::eq("statecode", FilterValue::Integer(1)),
        Filter::eq("statecode", FilterValue::Integer(2)),
    ]);
    let url = decoded(
        QueryBuilder::collection("opportunities")
            .filter(Filter::gt("estimatedvalue", FilterValue::Decimal(1000.5)))
            .filter(either)
            .orderby(OrderBy::asc("name")),
    );

    assert_eq!(
        url,
        "opportunities?$filter=estimatedvalue gt 1000.5 and (statecode eq 1 or statecode eq 2)&$orderby=name asc"
    );
}

#[test]
fn test_related_collection_path() {
    let url = decoded(
        QueryBuilder::related("accounts", "6f1d0a3e-8a2b-4c1d-9e0f-123456789abc", "opportunity_customer_accounts")
            .orderby(OrderBy::desc("estimatedclosedate"))
            .top(20),
    );

    assert_eq!(
        url,
        "accounts(6f1d0a3e-8a2b-4c1d-9e0f-123456789abc)/opportunity_customer_accounts\
         ?$top=20&$orderby=estimatedclosedate desc"
    );
}

#[test]
fn test_literals_are_escaped_and_values_encoded() {
    let query = QueryBuilder::collection("accounts")
        .name_match("name", "Ben & Jerry's", NameMatch::Contains)
        .build();
    let url = query.to_relative_url();

    assert!(url.contains("%26"));
    assert!(!url.contains(' '));
    assert_eq!(
        urlencoding::decode(&url).unwrap(),
        "accounts?$filter=contains(name,'Ben & Jerry''s')"
    );
}
