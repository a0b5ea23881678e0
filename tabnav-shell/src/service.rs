pub mod main;
pub mod navigation;
pub mod restore;
pub mod snapshot;
pub mod view;
