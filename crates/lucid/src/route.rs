//! Navigation guard: which view may be shown for the current session.

use std::fmt;

use lucid_protocol::ServerAddress;
use lucid_session::{NavigationIntent, Session};
use tokio::sync::watch;

/// The views a host can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    /// The key-value browser.
    Kv,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "Home"),
            Self::Login => write!(f, "Login"),
            Self::Kv => write!(f, "Kv"),
        }
    }
}

/// Tracks the current view and redirects navigation that the session
/// doesn't allow.
///
/// - logged out: every target except `Login` lands on `Login`
/// - logged in: `Login` lands on `Home`, everything else is allowed
#[derive(Debug)]
pub struct RouteGuard {
    session: watch::Receiver<Session>,
    current: Route,
    login_reason: Option<String>,
}

impl RouteGuard {
    /// Starts on `Home`, redirected if the session requires it.
    pub fn new(session: watch::Receiver<Session>) -> Self {
        let current = Self::resolve(session.borrow().is_logged_in(), Route::Home);
        Self {
            session,
            current,
            login_reason: None,
        }
    }

    /// Where a navigation to `target` actually lands.
    pub fn resolve(is_logged_in: bool, target: Route) -> Route {
        match (is_logged_in, target) {
            (false, _) => Route::Login,
            (true, Route::Login) => Route::Home,
            (true, target) => target,
        }
    }

    /// Navigates to `target` (or wherever the guard redirects it) and
    /// returns the route actually shown.
    pub fn navigate(&mut self, target: Route) -> Route {
        let is_logged_in = self.session.borrow().is_logged_in();
        let landed = Self::resolve(is_logged_in, target);
        if landed != target {
            tracing::debug!(%target, %landed, "navigation redirected");
        }
        if landed != Route::Login {
            self.login_reason = None;
        }
        self.current = landed;
        landed
    }

    /// Follows an intent queued by the session store.
    pub fn apply(&mut self, intent: NavigationIntent) -> Route {
        match intent {
            NavigationIntent::Home => self.navigate(Route::Home),
            NavigationIntent::Login { reason } => {
                let landed = self.navigate(Route::Login);
                if landed == Route::Login {
                    self.login_reason = reason;
                }
                landed
            }
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Why the login view is showing, when a forced logout put it there.
    pub fn login_reason(&self) -> Option<&str> {
        self.login_reason.as_deref()
    }

    /// The address to pre-fill on the login view: the remembered one, if any.
    pub fn login_prefill(session: &Session) -> Option<ServerAddress> {
        if session.remember_endpoint() {
            session.current_address().cloned()
        } else {
            None
        }
    }
}
