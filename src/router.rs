//! Client-seitige Routen
//!
//! Zwei Screens: `/` (Landing) und `/homepage` (Home). Die Pfade werden
//! ohne Beachtung der Groß-/Kleinschreibung verglichen, damit `/HomePage`
//! aus dem Call-to-Action ebenfalls auflöst.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No route for path: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Landing,
    Home,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Home => "/homepage",
        }
    }

    /// Löst einen Pfad zu einer Route auf
    pub fn from_path(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');

        if normalized.is_empty() {
            return Ok(Route::Landing);
        }

        if normalized.eq_ignore_ascii_case(Route::Home.path()) {
            return Ok(Route::Home);
        }

        Err(RouteError::NotFound(trimmed.to_string()))
    }
}

/// Ergebnis einer Navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Route,
    pub to: Route,
}

impl Transition {
    pub fn leaves(&self, route: Route) -> bool {
        self.from == route && self.to != route
    }

    pub fn enters(&self, route: Route) -> bool {
        self.to == route && self.from != route
    }
}

/// Merkt sich den aktuellen Screen
#[derive(Debug)]
pub struct Router {
    current: Route,
}

impl Router {
    pub fn new() -> Self {
        Self {
            current: Route::Landing,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, path: &str) -> Result<Transition, RouteError> {
        let to = Route::from_path(path)?;
        let transition = Transition {
            from: self.current,
            to,
        };
        self.current = to;
        tracing::info!("Navigate {:?} -> {:?}", transition.from, transition.to);
        Ok(transition)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::from_path("/").unwrap(), Route::Landing);
        assert_eq!(Route::from_path("").unwrap(), Route::Landing);
        assert_eq!(Route::from_path("/homepage").unwrap(), Route::Home);
        assert_eq!(Route::from_path("/HomePage").unwrap(), Route::Home);
        assert_eq!(Route::from_path("/homepage/").unwrap(), Route::Home);
        assert_eq!(
            Route::from_path("/settings"),
            Err(RouteError::NotFound("/settings".to_string()))
        );
    }

    #[test]
    fn test_navigation_transitions() {
        let mut router = Router::new();
        assert_eq!(router.current(), Route::Landing);

        let t = router.navigate("/HomePage").unwrap();
        assert!(t.enters(Route::Home));
        assert_eq!(router.current(), Route::Home);

        let t = router.navigate("/homepage").unwrap();
        assert!(!t.enters(Route::Home));
        assert!(!t.leaves(Route::Home));

        let t = router.navigate("/").unwrap();
        assert!(t.leaves(Route::Home));

        assert!(router.navigate("/nowhere").is_err());
        assert_eq!(router.current(), Route::Landing);
    }
}
