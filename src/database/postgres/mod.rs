pub mod giveaway;
pub mod permissions;
