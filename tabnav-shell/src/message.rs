pub mod main;
pub mod profile;
pub mod snapshot;
pub mod tabs;
pub mod view;
