//! Connection context passed explicitly to every backend client.

/// Role of the signed-in user as far as the editor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Regular annotator; editing requires a held lock
    #[default]
    Annotator,
    /// Administrator; the editor lets them edit without a held lock
    Admin,
}

impl Role {
    /// Parse the backend's role string (`"admin"`, anything else is an annotator).
    pub fn from_backend(role: &str) -> Self {
        if role.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Annotator
        }
    }

    /// Whether this role may edit without holding the item lock.
    pub fn bypasses_lock_gate(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Everything a client needs to reach the backend on behalf of one user.
///
/// Token refresh is handled elsewhere; a new `Session` is built when the
/// token changes.
#[derive(Debug, Clone)]
pub struct Session {
    /// HTTP base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// WebSocket base URL, e.g. `ws://localhost:8000`
    pub ws_url: String,
    /// Bearer token, if signed in
    pub token: Option<String>,
    /// Identity sent with lock requests
    pub owner: String,
    /// Role of the signed-in user
    pub role: Role,
}

impl Session {
    /// Create a session; the WebSocket URL is derived from the HTTP URL.
    pub fn new(base_url: impl Into<String>, owner: impl Into<String>) -> Self {
        let base_url = trim_base(base_url.into());
        let ws_url = derive_ws_url(&base_url);
        Self {
            base_url,
            ws_url,
            token: None,
            owner: owner.into(),
            role: Role::default(),
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the user's role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Override the WebSocket base URL.
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = trim_base(ws_url.into());
        self
    }

    /// Absolute HTTP URL for a route starting with `/`.
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// Absolute WebSocket URL for a route starting with `/`.
    pub fn ws_route(&self, route: &str) -> String {
        format!("{}{}", self.ws_url, route)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// `http://` becomes `ws://`, `https://` becomes `wss://`.
fn derive_ws_url(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_is_derived_from_base() {
        let s = Session::new("https://labels.example.com/", "alice");
        assert_eq!(s.base_url, "https://labels.example.com");
        assert_eq!(s.ws_url, "wss://labels.example.com");
        assert_eq!(s.ws_route("/ws/jobs/3"), "wss://labels.example.com/ws/jobs/3");
    }

    #[test]
    fn plain_http_maps_to_ws() {
        let s = Session::new("http://localhost:8000", "bob");
        assert_eq!(s.ws_url, "ws://localhost:8000");
        assert_eq!(s.url("/api/jobs/1"), "http://localhost:8000/api/jobs/1");
    }

    #[test]
    fn admin_role_bypasses_gate() {
        assert!(Role::from_backend("ADMIN").bypasses_lock_gate());
        assert!(!Role::from_backend("annotator").bypasses_lock_gate());
    }
}
