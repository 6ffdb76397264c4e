pub mod custom_id;
pub mod discord;
pub mod duration;
pub mod options;
pub mod reply;
