pub(crate) mod closeable;
pub(crate) mod scheduler;
pub(crate) mod slot;
pub(crate) mod trigger;
