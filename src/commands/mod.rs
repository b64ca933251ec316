pub mod embed;
pub mod giveaway;
pub mod utilities;
