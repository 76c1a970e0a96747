// Interactive raster canvas: region selection, live filters, shape drawing
// and region artifacts over a software-rendered window.

pub mod app;
pub mod artifacts;
pub mod camera;
pub mod canvas;
pub mod cli;
pub mod detect;
pub mod display;
pub mod error;
pub mod filters;
pub mod mapper;
pub mod mode;
pub mod raster;
pub mod settings;
pub mod sink;
pub mod source;
pub mod tools;
pub mod types;
pub mod widget;

pub use error::Error;
