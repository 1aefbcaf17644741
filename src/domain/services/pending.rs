use tokio::sync::watch;

/// Runs `release` against the watched state when dropped, so a controller's
/// pending flag is cleared on success, on failure and when the in-flight
/// future is dropped.
pub struct PendingGuard<'a, T, F>
where
    F: FnOnce(&mut T),
{
    state: &'a watch::Sender<T>,
    release: Option<F>,
}

impl<'a, T, F> PendingGuard<'a, T, F>
where
    F: FnOnce(&mut T),
{
    pub fn new(state: &'a watch::Sender<T>, release: F) -> PendingGuard<'a, T, F> {
        return PendingGuard {
            state,
            release: Some(release),
        };
    }
}

impl<'a, T, F> Drop for PendingGuard<'a, T, F>
where
    F: FnOnce(&mut T),
{
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            self.state.send_modify(release);
        }
    }
}
