//! shadebox: an interactive 3D scene sandbox.
//!
//! Opens a window with a lit default scene (ground, three boxes and four
//! lights), lets the user drag boxes and the spotlight marker across the
//! ground, orbit the camera, and tweak light parameters from a panel.

mod app;
mod assets;
mod config;
mod interaction;
mod render;
mod scene;
mod ui;

fn main() -> Result<(), app::AppError> {
    app::run()
}
