//! Interactive explorer session
//!
//! Holds the current query and its visible window for the single local
//! user, plus the free-text debouncer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::pagination::Pager;
use crate::query::QuerySpec;

/// Default free-text debounce delay
pub const DEBOUNCE_MS: u64 = 140;

/// Current query plus visible window
#[derive(Debug, Clone)]
pub struct ExplorerSession {
    spec: QuerySpec,
    pager: Pager,
}

impl ExplorerSession {
    pub fn new(page_increment: usize) -> Self {
        Self {
            spec: QuerySpec::default(),
            pager: Pager::new(page_increment),
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Replace the whole query; the window resets only on a real change
    pub fn set_spec(&mut self, spec: QuerySpec) -> bool {
        if spec == self.spec {
            return false;
        }
        self.spec = spec;
        self.pager.reset();
        true
    }

    /// Replace everything except the free text
    pub fn set_structured(&mut self, spec: QuerySpec) -> bool {
        let text = self.spec.text.clone();
        self.set_spec(QuerySpec { text, ..spec })
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let spec = QuerySpec {
            text: text.into(),
            ..self.spec.clone()
        };
        self.set_spec(spec)
    }

    pub fn show_more(&mut self) -> usize {
        self.pager.show_more()
    }
}

/// Cancellation-only debouncer
///
/// Every call to `settle` waits the full delay and then reports whether it
/// is still the latest call. Superseded callers must not run their query.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay; `true` when no newer call arrived meanwhile
    pub async fn settle(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ListMode, SortKey};
    use std::sync::Arc;

    #[test]
    fn test_unchanged_spec_keeps_window() {
        let mut session = ExplorerSession::new(10);
        session.show_more();

        assert!(!session.set_spec(QuerySpec::default()));
        assert_eq!(session.pager().visible(), 20);
    }

    #[test]
    fn test_any_spec_change_resets_window() {
        let mut session = ExplorerSession::new(10);

        session.show_more();
        assert!(session.set_text("maps"));
        assert_eq!(session.pager().visible(), 10);

        session.show_more();
        let spec = QuerySpec {
            mode: ListMode::Favorites,
            ..session.spec().clone()
        };
        assert!(session.set_spec(spec));
        assert_eq!(session.pager().visible(), 10);

        session.show_more();
        let spec = QuerySpec {
            sort: Some(SortKey::Oldest),
            shuffle_seed: Some(7),
            ..session.spec().clone()
        };
        assert!(session.set_spec(spec));
        assert_eq!(session.pager().visible(), 10);
    }

    #[test]
    fn test_set_structured_keeps_text() {
        let mut session = ExplorerSession::new(10);
        session.set_text("trains");

        session.set_structured(QuerySpec {
            owner: Some("Rail Essays".to_string()),
            ..Default::default()
        });

        assert_eq!(session.spec().text, "trains");
        assert_eq!(session.spec().owner.as_deref(), Some("Rail Essays"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_call_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(140));
        assert!(debouncer.settle().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_call_does_not_settle() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(140)));

        let first = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.settle().await })
        };

        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
    }
}
