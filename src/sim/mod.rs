pub mod assets;
pub mod event;
pub mod game;
pub mod input;
pub mod level;
pub mod step;
pub mod world;
