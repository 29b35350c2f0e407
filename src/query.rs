const EVENT_PLACEHOLDER: &str = "$EVENT_ID";

const PROFILE_QUERY: &str = r#"
{
  user {
    login
    firstName
    lastName
    auditRatio
    totalUp
    totalDown
    transactions(
      where: { type: { _eq: "xp" }, eventId: { _eq: $EVENT_ID } }
      order_by: { createdAt: asc }
    ) {
      amount
      type
      createdAt
      object {
        name
        type
      }
    }
    skills: transactions(
      where: { type: { _like: "skill_%" } }
      distinct_on: type
      order_by: [{ type: asc }, { amount: desc }]
    ) {
      type
      amount
    }
    progresses(
      where: { eventId: { _eq: $EVENT_ID }, grade: { _is_null: false } }
    ) {
      grade
    }
    results(where: { eventId: { _eq: $EVENT_ID } }) {
      grade
      type
    }
  }
}
"#;

/// The dashboard's one query, scoped to a single event.
pub fn profile_query(event_id: i64) -> String {
    PROFILE_QUERY.replace(EVENT_PLACEHOLDER, &event_id.to_string())
}
