mod auction_world;
mod steps;

pub use auction_world::{AuctionSystem, AuctionWorld};
