//! Plain-text views of visitors, administrators and notifications.

use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone, Utc};
use logbook_core::{Admin, Level, Notification, Visitor, VisitorFilter, VisitorStats};

const TIMESTAMP_FORMAT: &str = "%b %d, %Y %-I:%M %p";

pub fn notification(note: &Notification) -> String {
    match note.level {
        Level::Success => format!("✓ {}", note.text),
        Level::Error => format!("✗ {}", note.text),
    }
}

fn timestamp<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}

pub fn visitor_card<Tz: TimeZone>(visitor: &Visitor, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let status = if visitor.is_active() { "Active" } else { "Signed Out" };
    let mut out = String::new();
    let _ = writeln!(out, "#{} {} [{}]", visitor.id, visitor.full_name(), status);
    match visitor.sex() {
        Some(sex) => {
            let _ = writeln!(out, "    {sex}, {} years old", visitor.age);
        }
        None => {
            let _ = writeln!(out, "    {} years old", visitor.age);
        }
    }
    let _ = writeln!(out, "    Contact: {}", visitor.contact_number);
    let _ = writeln!(out, "    Purpose: {}", visitor.purpose_of_visit);
    let _ = writeln!(out, "    Signed in: {}", timestamp(&visitor.created_at, tz));
    if let Some(time_out) = &visitor.time_out {
        let _ = writeln!(out, "    Signed out: {}", timestamp(time_out, tz));
    }
    out
}

pub fn stats(stats: &VisitorStats, admins: Option<usize>) -> String {
    let mut line = format!(
        "Total visitors: {}  |  Currently active: {}  |  Signed out: {}",
        stats.total, stats.active, stats.signed_out
    );
    if let Some(admins) = admins {
        let _ = write!(line, "  |  Administrators: {admins}");
    }
    line.push('\n');
    line
}

/// Heading, per-status badge counts and cards for the filtered visitors,
/// or the empty-state text when nothing matches.
pub fn visitor_list<Tz: TimeZone>(heading: &str, visitors: &[Visitor], filter: &VisitorFilter, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let shown = filter.apply(visitors);
    let mut out = String::new();
    let _ = write!(out, "{heading} ({})", shown.len());
    if !shown.is_empty() {
        let counts = VisitorStats::collect(shown.iter().copied());
        let _ = write!(out, "  [{} Active, {} Signed Out]", counts.active, counts.signed_out);
    }
    out.push('\n');

    if shown.is_empty() {
        if filter.is_unrestricted() {
            out.push_str("No visitors yet\nVisitors will appear here once they sign in\n");
        } else {
            out.push_str("No matching visitors found\nTry adjusting your search or filter criteria\n");
        }
        return out;
    }

    for visitor in shown {
        out.push('\n');
        out.push_str(&visitor_card(visitor, tz));
    }
    out
}

pub fn admin_list(admins: &[Admin]) -> String {
    let mut out = String::from("Administrators:\n");
    for admin in admins {
        let _ = writeln!(out, "  - {} <{}>", admin.name, admin.email);
    }
    out
}
