//! Event registry commands

mod change_event_id;
mod create_event;
mod delete_event;
mod list_events;
mod rename_event;
mod select_event;

pub use change_event_id::ChangeEventIdCommand;
pub use create_event::CreateEventCommand;
pub use delete_event::DeleteEventCommand;
pub use list_events::ListEventsCommand;
pub use rename_event::RenameEventCommand;
pub use select_event::SelectEventCommand;
