/// Hook called after every comparison a check makes.
///
/// Returning `Some(action)` asks the running check to act on it, and `None`
/// leaves the check alone. Any `FnMut(&E) -> Option<A>` closure is an
/// observer, and `()` observes nothing.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
