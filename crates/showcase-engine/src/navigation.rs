use std::sync::Mutex;

use showcase_contracts::api::Route;

/// Capability to move the client to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Remembers every route it was sent to.
#[derive(Debug, Default)]
pub struct NavigationLog {
    visited: Mutex<Vec<Route>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Route> {
        self.visited().last().copied()
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, route: Route) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use showcase_contracts::api::Route;

    use super::{NavigationLog, Navigator};

    #[test]
    fn log_keeps_routes_in_order() {
        let log = NavigationLog::new();
        assert_eq!(log.last(), None);
        log.navigate(Route::CreatePost);
        log.navigate(Route::Home);
        assert_eq!(log.visited(), vec![Route::CreatePost, Route::Home]);
        assert_eq!(log.last(), Some(Route::Home));
    }
}
