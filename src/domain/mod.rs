pub mod action;
pub mod animation;
pub mod collision;
pub mod entity;
pub mod image;
pub mod physics;
pub mod sprite;
pub mod tile;
