use crate::foundation::error::VitrineResult;

/// A resource with a single release operation.
///
/// `close` must tolerate being called on an already-closed resource, but owners in this crate
/// call it at most once per assigned value.
pub trait Closeable: Send {
    /// Release the underlying resource.
    fn close(&mut self) -> VitrineResult<()>;
}

impl<T: Closeable + ?Sized> Closeable for Box<T> {
    fn close(&mut self) -> VitrineResult<()> {
        (**self).close()
    }
}

/// Owned, type-erased closeable (fetch results, generic resources).
pub type BoxCloseable = Box<dyn Closeable>;

/// Closeable that runs a callback the first time it is closed.
pub struct CloseFn<F: FnOnce() -> VitrineResult<()> + Send> {
    on_close: Option<F>,
}

impl<F: FnOnce() -> VitrineResult<()> + Send> CloseFn<F> {
    /// Wrap `on_close`.
    pub fn new(on_close: F) -> Self {
        Self {
            on_close: Some(on_close),
        }
    }
}

impl<F: FnOnce() -> VitrineResult<()> + Send> Closeable for CloseFn<F> {
    fn close(&mut self) -> VitrineResult<()> {
        match self.on_close.take() {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}

impl<F: FnOnce() -> VitrineResult<()> + Send> std::fmt::Debug for CloseFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseFn")
            .field("closed", &self.on_close.is_none())
            .finish()
    }
}

/// Close `resource`, logging and discarding any failure.
pub(crate) fn close_quietly<T: Closeable + ?Sized>(slot: &'static str, resource: &mut T) {
    if let Err(err) = resource.close() {
        tracing::warn!(slot, error = %err, "resource close failed; ignoring");
    }
}
