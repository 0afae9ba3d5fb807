use crate::types::NavigationIntent;

/// Applies navigation intents in the hosting dashboard.
///
/// Implementations navigate to `intent.path` and store the highlight ids for
/// the destination view to pick up.
pub trait Navigator: Send + Sync {
    fn navigate(&self, intent: &NavigationIntent);
}

impl<F> Navigator for F
where
    F: Fn(&NavigationIntent) + Send + Sync,
{
    fn navigate(&self, intent: &NavigationIntent) {
        self(intent)
    }
}
