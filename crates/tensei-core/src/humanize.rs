use chrono::TimeDelta;

/// Render a duration as whole hours and minutes, e.g. `1 hour, 5 minutes`.
///
/// Seconds are truncated. A zero segment is omitted, so anything under a
/// minute (or negative) renders as the empty string.
pub fn humanize_duration(duration: TimeDelta) -> String {
  let hours = duration.num_hours();
  let minutes = duration.num_minutes() - hours * 60;

  let mut parts = Vec::with_capacity(2);
  match hours {
    1 => parts.push("1 hour".to_string()),
    h if h > 1 => parts.push(format!("{h} hours")),
    _ => {}
  }
  match minutes {
    1 => parts.push("1 minute".to_string()),
    m if m > 1 => parts.push(format!("{m} minutes")),
    _ => {}
  }
  parts.join(", ")
}
