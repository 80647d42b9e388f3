use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::comment::Comment;
use crate::models::supporter::{Package, Supporter};

/// Supporter badge shown next to a comment author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub package: Package,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<Package> for Badge {
    fn from(package: Package) -> Self {
        Badge {
            package,
            label: package.label(),
            color: package.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub badge: Option<Badge>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Attach badges to comments whose author email belongs to a current
/// supporter. An email with several live subscriptions gets the highest tier.
pub fn annotate(comments: Vec<Comment>, supporters: &[Supporter], now: NaiveDateTime) -> Vec<BadgedComment> {
    let mut tiers: HashMap<String, Package> = HashMap::new();
    for s in supporters.iter().filter(|s| s.active && !s.is_expired(now)) {
        let key = normalize_email(&s.email);
        if key.is_empty() {
            continue;
        }
        tiers
            .entry(key)
            .and_modify(|p| *p = (*p).max(s.package))
            .or_insert(s.package);
    }

    comments
        .into_iter()
        .map(|comment| {
            let badge = tiers
                .get(&normalize_email(&comment.author_email))
                .copied()
                .map(Badge::from);
            BadgedComment { comment, badge }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comment::CommentTarget;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn comment(id: i64, email: &str) -> Comment {
        Comment {
            id,
            target: CommentTarget::Article(1),
            author_name: format!("Okur {}", id),
            author_email: email.to_string(),
            body: "Elinize sağlık".to_string(),
            approved: true,
            created_at: now(),
        }
    }

    fn supporter(email: &str, package: Package, days_left: i64, active: bool) -> Supporter {
        Supporter {
            id: 0,
            name: "Destekçi".to_string(),
            email: email.to_string(),
            package,
            starts_at: now() - Duration::days(10),
            ends_at: now() + Duration::days(days_left),
            active,
        }
    }

    #[test]
    fn matches_email_case_insensitively() {
        let supporters = vec![supporter("ali@example.com", Package::Gonul, 5, true)];
        let out = annotate(vec![comment(1, "  ALI@Example.com "), comment(2, "veli@example.com")], &supporters, now());
        assert_eq!(out[0].badge.as_ref().map(|b| b.package), Some(Package::Gonul));
        assert_eq!(out[0].badge.as_ref().map(|b| b.color), Some("green"));
        assert!(out[1].badge.is_none());
    }

    #[test]
    fn expired_and_inactive_supporters_get_nothing() {
        let supporters = vec![
            supporter("eski@example.com", Package::Sponsor, -1, true),
            supporter("pasif@example.com", Package::Okur, 20, false),
        ];
        let out = annotate(vec![comment(1, "eski@example.com"), comment(2, "pasif@example.com")], &supporters, now());
        assert!(out.iter().all(|c| c.badge.is_none()));
    }

    #[test]
    fn highest_tier_wins() {
        let supporters = vec![
            supporter("ayse@example.com", Package::Okur, 10, true),
            supporter("ayse@example.com", Package::Sponsor, 3, true),
            supporter("ayse@example.com", Package::Gonul, 30, true),
        ];
        let out = annotate(vec![comment(1, "ayse@example.com")], &supporters, now());
        let badge = out[0].badge.clone().unwrap();
        assert_eq!(badge.package, Package::Sponsor);
        assert_eq!(badge.label, "Sponsor (1.000 TL)");
    }

    #[test]
    fn blank_emails_never_match() {
        let supporters = vec![supporter("  ", Package::Okur, 10, true)];
        let out = annotate(vec![comment(1, "")], &supporters, now());
        assert!(out[0].badge.is_none());
    }

    #[test]
    fn serializes_flat() {
        let supporters = vec![supporter("a@b.c", Package::Okur, 10, true)];
        let out = annotate(vec![comment(9, "a@b.c")], &supporters, now());
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["badge"]["package"], "okur");
        assert_eq!(json["badge"]["label"], "Okur Desteği (250 TL)");
    }
}
