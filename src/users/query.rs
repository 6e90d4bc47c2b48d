//! Turns listing query strings into a directory filter, sort and page window.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::repo_types::{Role, User};
use crate::dates::{parse_date, DateRange};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;
pub const DEFAULT_SUGGESTIONS: i64 = 8;
pub const MAX_SUGGESTIONS: i64 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    Teacher,
    Student,
}

impl RoleFilter {
    pub fn role(self) -> Option<Role> {
        match self {
            RoleFilter::All => None,
            RoleFilter::Admin => Some(Role::Admin),
            RoleFilter::Teacher => Some(Role::Teacher),
            RoleFilter::Student => Some(Role::Student),
        }
    }
}

/// Which field(s) a keyword targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    Name,
    Email,
    Any,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    #[default]
    StartsWith,
    Contains,
}

/// Case-insensitive keyword pattern with every metacharacter escaped.
///
/// `pattern` is handed to Postgres `~*` as is, `regex` evaluates the same
/// pattern in process.
#[derive(Debug, Clone)]
pub struct KeywordMatch {
    pattern: String,
    regex: Regex,
    scope: SearchScope,
}

impl KeywordMatch {
    /// `None` when the trimmed keyword is empty.
    pub fn new(keyword: &str, scope: SearchScope, mode: MatchMode) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        let safe = regex::escape(keyword);
        let pattern = match mode {
            MatchMode::StartsWith => format!("^{}", safe),
            MatchMode::Contains => safe,
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            pattern,
            regex,
            scope,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn matches(&self, name: &str, email: &str) -> bool {
        match self.scope {
            SearchScope::Name => self.regex.is_match(name),
            SearchScope::Email => self.regex.is_match(email),
            SearchScope::Any => self.regex.is_match(name) || self.regex.is_match(email),
        }
    }
}

/// Directory-level filter. Every set condition must hold.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub keyword: Option<KeywordMatch>,
    pub created: DateRange,
}

impl UserFilter {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn created_within(mut self, range: DateRange) -> Self {
        self.created = range;
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |r| user.role == r)
            && self
                .keyword
                .as_ref()
                .map_or(true, |k| k.matches(&user.name, &user.email))
            && self.created.contains(user.created_at)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Email,
    Role,
    LastLoginAt,
}

impl SortField {
    /// Unknown names fall back to `createdAt`.
    fn parse(s: &str) -> Self {
        match s {
            "updatedAt" => SortField::UpdatedAt,
            "name" => SortField::Name,
            "email" => SortField::Email,
            "role" => SortField::Role,
            "lastLoginAt" => SortField::LastLoginAt,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::Role => "role",
            SortField::LastLoginAt => "last_login_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::newest_first()
    }
}

impl SortSpec {
    pub fn newest_first() -> Self {
        Self {
            field: SortField::CreatedAt,
            ascending: false,
        }
    }

    /// `"field:dir"`; any direction other than `asc` sorts descending.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.splitn(2, ':');
        let field = SortField::parse(parts.next().unwrap_or_default());
        let ascending = parts.next() == Some("asc");
        Self { field, ascending }
    }
}

/// `GET /users` query string. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub role: Option<RoleFilter>,
    pub q: Option<String>,
    pub scope: Option<SearchScope>,
    pub mode: Option<MatchMode>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: UserFilter,
    pub sort: SortSpec,
    pub page: i64,
    pub limit: i64,
}

impl ListQuery {
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl From<&ListParams> for ListQuery {
    fn from(p: &ListParams) -> Self {
        let keyword = p.q.as_deref().and_then(|q| {
            KeywordMatch::new(q, p.scope.unwrap_or_default(), p.mode.unwrap_or_default())
        });
        let filter = UserFilter {
            role: p.role.unwrap_or_default().role(),
            keyword,
            created: DateRange {
                start: parse_date(p.start.as_deref()),
                end: parse_date(p.end.as_deref()),
            },
        };
        Self {
            filter,
            sort: p.sort.as_deref().map(SortSpec::parse).unwrap_or_default(),
            page: p.page.unwrap_or(1).max(1),
            limit: p
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// `GET /users/suggestions` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
    pub scope: Option<SearchScope>,
    pub mode: Option<MatchMode>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SuggestQuery {
    pub keyword: KeywordMatch,
    pub limit: i64,
}

impl SuggestQuery {
    /// `None` when there is no keyword to match.
    pub fn from_params(p: &SuggestParams) -> Option<Self> {
        let keyword = KeywordMatch::new(
            p.q.as_deref()?,
            p.scope.unwrap_or_default(),
            p.mode.unwrap_or_default(),
        )?;
        Some(Self {
            keyword,
            limit: p
                .limit
                .unwrap_or(DEFAULT_SUGGESTIONS)
                .clamp(1, MAX_SUGGESTIONS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::sample_user;

    fn keyword(q: &str, scope: SearchScope, mode: MatchMode) -> KeywordMatch {
        KeywordMatch::new(q, scope, mode).expect("non-empty keyword")
    }

    #[test]
    fn starts_with_only_matches_prefix() {
        let k = keyword("ann", SearchScope::Name, MatchMode::StartsWith);
        assert!(k.matches("Annika Berg", "x@y.z"));
        assert!(k.matches("ANN", "x@y.z"));
        assert!(!k.matches("Joanna", "x@y.z"));
        assert_eq!(k.pattern(), "^ann");
    }

    #[test]
    fn contains_matches_anywhere() {
        let k = keyword("ann", SearchScope::Name, MatchMode::Contains);
        assert!(k.matches("Joanna", "x@y.z"));
        assert!(k.matches("Annika", "x@y.z"));
        assert!(!k.matches("Bob", "ann@y.z"));
    }

    #[test]
    fn scope_selects_fields() {
        let email = keyword("ann", SearchScope::Email, MatchMode::StartsWith);
        assert!(email.matches("Bob", "ann@school.test"));
        assert!(!email.matches("Ann", "bob@school.test"));

        let any = keyword("ann", SearchScope::Any, MatchMode::StartsWith);
        assert!(any.matches("Ann", "bob@school.test"));
        assert!(any.matches("Bob", "ann@school.test"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let k = keyword("a.b+(c)", SearchScope::Name, MatchMode::Contains);
        assert!(k.matches("xa.b+(c)y", ""));
        assert!(!k.matches("axbbc", ""));
    }

    #[test]
    fn blank_keyword_is_no_filter() {
        assert!(KeywordMatch::new("   ", SearchScope::Name, MatchMode::Contains).is_none());
        let q = ListQuery::from(&ListParams {
            q: Some("  ".into()),
            ..Default::default()
        });
        assert!(q.filter.keyword.is_none());
    }

    #[test]
    fn defaults_apply() {
        let q = ListQuery::from(&ListParams::default());
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(q.skip(), 0);
        assert_eq!(q.sort, SortSpec::newest_first());
        assert!(q.filter.role.is_none());
        assert!(q.filter.created.is_unbounded());
    }

    #[test]
    fn limit_and_page_are_clamped() {
        let q = ListQuery::from(&ListParams {
            limit: Some(999),
            page: Some(3),
            ..Default::default()
        });
        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.skip(), 100);

        let q = ListQuery::from(&ListParams {
            limit: Some(0),
            page: Some(-4),
            ..Default::default()
        });
        assert_eq!(q.limit, 1);
        assert_eq!(q.page, 1);
    }

    #[test]
    fn role_all_is_unrestricted() {
        let q = ListQuery::from(&ListParams {
            role: Some(RoleFilter::All),
            ..Default::default()
        });
        assert!(q.filter.role.is_none());

        let q = ListQuery::from(&ListParams {
            role: Some(RoleFilter::Teacher),
            ..Default::default()
        });
        assert_eq!(q.filter.role, Some(Role::Teacher));
    }

    #[test]
    fn unparseable_dates_are_ignored() {
        let q = ListQuery::from(&ListParams {
            start: Some("yesterday".into()),
            end: Some("2024-05-07".into()),
            ..Default::default()
        });
        assert!(q.filter.created.start.is_none());
        assert!(q.filter.created.end.is_some());
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(
            SortSpec::parse("name:asc"),
            SortSpec {
                field: SortField::Name,
                ascending: true
            }
        );
        assert_eq!(
            SortSpec::parse("email:sideways"),
            SortSpec {
                field: SortField::Email,
                ascending: false
            }
        );
        assert!(!SortSpec::parse("email").ascending);
        assert_eq!(
            SortSpec::parse("password_hash;drop:asc").field,
            SortField::CreatedAt
        );
    }

    #[test]
    fn filter_combines_conditions() {
        let filter = UserFilter {
            role: Some(Role::Student),
            keyword: KeywordMatch::new("ann", SearchScope::Name, MatchMode::StartsWith),
            created: DateRange::default(),
        };
        assert!(filter.matches(&sample_user("Anna", "a@s.t", Role::Student)));
        assert!(!filter.matches(&sample_user("Anna", "a@s.t", Role::Teacher)));
        assert!(!filter.matches(&sample_user("Hanna", "a@s.t", Role::Student)));
    }

    #[test]
    fn suggestions_need_a_keyword_and_cap_limit() {
        assert!(SuggestQuery::from_params(&SuggestParams::default()).is_none());
        let s = SuggestQuery::from_params(&SuggestParams {
            q: Some("an".into()),
            limit: Some(100),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.limit, MAX_SUGGESTIONS);
        let s = SuggestQuery::from_params(&SuggestParams {
            q: Some("an".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.limit, DEFAULT_SUGGESTIONS);
    }
}
