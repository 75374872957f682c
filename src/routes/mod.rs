//! Page route table.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Route {
    Home,
    About,
    Events,
    EventDetail { slug: String },
    Gallery,
    GetInvolved,
    GoogleCallback,
    LinkedinCallback,
    Sponsorship,
    SponsorshipSuccess,
    Contact,
    Admin,
    NotFound,
}

impl Route {
    /// Map a request path to a page. Trailing slashes are ignored.
    pub fn resolve(path: &str) -> Self {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["about"] => Route::About,
            ["events"] => Route::Events,
            ["events", slug] => Route::EventDetail {
                slug: (*slug).to_string(),
            },
            ["gallery"] => Route::Gallery,
            ["get-involved"] => Route::GetInvolved,
            ["google-callback"] => Route::GoogleCallback,
            ["linkedin-callback"] => Route::LinkedinCallback,
            ["sponsorship"] => Route::Sponsorship,
            ["sponsorship", "success"] => Route::SponsorshipSuccess,
            ["contact"] => Route::Contact,
            ["admin"] => Route::Admin,
            _ => Route::NotFound,
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Admin)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::About => "About",
            Route::Events | Route::EventDetail { .. } => "Events",
            Route::Gallery => "Gallery",
            Route::GetInvolved => "Get Involved",
            Route::GoogleCallback | Route::LinkedinCallback => "Signing in",
            Route::Sponsorship => "Sponsorship",
            Route::SponsorshipSuccess => "Thank you",
            Route::Contact => "Contact",
            Route::Admin => "Admin",
            Route::NotFound => "Page not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(Route::resolve("/"), Route::Home);
        assert_eq!(Route::resolve(""), Route::Home);
        assert_eq!(Route::resolve("/about/"), Route::About);
        assert_eq!(
            Route::resolve("/events/rust-meetup?ref=home"),
            Route::EventDetail {
                slug: "rust-meetup".to_string()
            }
        );
        assert_eq!(Route::resolve("/sponsorship/success"), Route::SponsorshipSuccess);
        assert_eq!(Route::resolve("/google-callback#access_token=x"), Route::GoogleCallback);
        assert_eq!(Route::resolve("/events/a/b"), Route::NotFound);
        assert_eq!(Route::resolve("/nope"), Route::NotFound);
    }

    #[test]
    fn test_only_admin_is_gated() {
        assert!(Route::resolve("/admin").requires_admin());
        assert!(!Route::resolve("/events").requires_admin());
        assert!(!Route::resolve("/linkedin-callback").requires_admin());
    }
}
