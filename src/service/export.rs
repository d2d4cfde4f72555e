//! CSV export helpers
//!
//! Fields are quoted per RFC 4180 and rows end with CRLF.

use chrono::{DateTime, Utc};

use crate::data::{SecurityEvent, User};

pub const USER_CSV_HEADER: [&str; 9] = [
    "id",
    "email",
    "display_name",
    "provider",
    "role",
    "is_active",
    "is_premium",
    "created_at",
    "last_login_at",
];

pub const SECURITY_EVENT_CSV_HEADER: [&str; 7] = [
    "id",
    "event_type",
    "severity",
    "actor_email",
    "ip_address",
    "description",
    "created_at",
];

/// Quote a field when it contains a delimiter, quote or line break
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

pub fn users_csv(users: &[User]) -> String {
    let mut out = String::new();
    push_row(&mut out, &USER_CSV_HEADER);
    for user in users {
        push_row(
            &mut out,
            &[
                user.id.clone(),
                user.email.clone(),
                user.display_name.clone().unwrap_or_default(),
                user.provider.clone(),
                user.role.clone(),
                user.is_active.to_string(),
                user.is_premium.to_string(),
                user.created_at.to_rfc3339(),
                timestamp(user.last_login_at),
            ],
        );
    }
    out
}

pub fn security_events_csv(events: &[SecurityEvent]) -> String {
    let mut out = String::new();
    push_row(&mut out, &SECURITY_EVENT_CSV_HEADER);
    for event in events {
        push_row(
            &mut out,
            &[
                event.id.clone(),
                event.event_type.clone(),
                event.severity.clone(),
                event.actor_email.clone().unwrap_or_default(),
                event.ip_address.clone().unwrap_or_default(),
                event.description.clone(),
                event.created_at.to_rfc3339(),
            ],
        );
    }
    out
}

/// `Content-Disposition` value for a download named `{stem}-{date}.{ext}`
pub fn attachment_disposition(stem: &str, ext: &str, now: DateTime<Utc>) -> String {
    format!(
        "attachment; filename=\"{}-{}.{}\"",
        stem,
        now.format("%Y-%m-%d"),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_fields_are_left_alone() {
        assert_eq!(escape_field("jo@x.com"), "jo@x.com");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(escape_field("Doe, Jo"), "\"Doe, Jo\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn users_csv_has_header_and_rows() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let users = vec![User {
            id: "uid-1".to_string(),
            email: "jo@x.com".to_string(),
            display_name: Some("Doe, Jo".to_string()),
            provider: "google".to_string(),
            is_active: true,
            is_premium: false,
            role: "user".to_string(),
            created_at: created,
            last_login_at: None,
        }];

        let csv = users_csv(&users);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "id,email,display_name,provider,role,is_active,is_premium,created_at,last_login_at"
        );
        assert_eq!(
            lines[1],
            "uid-1,jo@x.com,\"Doe, Jo\",google,user,true,false,2024-05-01T12:00:00+00:00,"
        );
        assert_eq!(lines[2], "");
    }

    #[test]
    fn disposition_names_the_file_by_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            attachment_disposition("users", "csv", now),
            "attachment; filename=\"users-2024-05-01.csv\""
        );
    }
}
