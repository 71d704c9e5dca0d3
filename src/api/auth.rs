use std::sync::{
    RwLock,
    atomic::{AtomicBool, Ordering},
};

/// Credential accessor shared by the API client and the app shell.
///
/// The token is set on login and cleared on logout or on a 401. A 401 also
/// raises `login_required`, which the app turns into a navigation to the
/// login page. While the login page itself is showing, 401s are left to that
/// page to report so we never bounce the user back onto the page they are on.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: RwLock<Option<String>>,
    on_login_view: AtomicBool,
    login_required: AtomicBool,
}

impl AuthSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
            on_login_view: AtomicBool::new(false),
            login_required: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: String) {
        self.write_token(Some(token));
        self.login_required.store(false, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.write_token(None);
    }

    pub fn set_on_login_view(&self, on_login_view: bool) {
        self.on_login_view.store(on_login_view, Ordering::SeqCst);
    }

    /// Returns true when a redirect to the login page was requested.
    pub fn handle_unauthorized(&self) -> bool {
        if self.on_login_view.load(Ordering::SeqCst) {
            log::debug!("401 while on the login view, leaving credentials alone");
            return false;
        }

        log::info!("session expired, clearing credentials and redirecting to login");
        self.clear();
        self.login_required.store(true, Ordering::SeqCst);
        true
    }

    /// Consumes a pending redirect request.
    pub fn take_login_required(&self) -> bool {
        self.login_required.swap(false, Ordering::SeqCst)
    }

    fn write_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}
