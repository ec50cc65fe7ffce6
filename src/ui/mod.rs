pub mod layout;
pub mod modern;
pub mod pipe;
pub mod styles;
