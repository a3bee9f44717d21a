mod behavior;
mod component;
mod error;
mod event;

pub use behavior::{Attachment, Behavior, HandlerSpec};
pub use component::Component;
pub use error::ComponentError;
pub use event::{Event, EventBus, Handler};
