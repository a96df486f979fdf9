pub mod listing;
pub mod record;
pub mod selector;
pub mod slug;
