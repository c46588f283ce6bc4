pub mod fiscal;
pub mod forward_return;
pub mod screening;
