pub(crate) mod image_handle;
pub(crate) mod listener;
pub(crate) mod pool;
pub(crate) mod request;
