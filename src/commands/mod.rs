pub mod node;
pub mod show;
pub mod verify;
