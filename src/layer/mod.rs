pub(crate) mod image_layer;
pub(crate) mod model;
pub(crate) mod stack;
