use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::Overrides;

#[derive(Debug, Parser)]
#[command(name = "roi-canvas", version, about = "Interactive region-of-interest tools for images and cameras")]
pub struct CliArgs {
    /// Settings file (defaults to ./roi-canvas.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory that saved images and data files go to
    #[arg(short = 'o', long = "output-dir", global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub tool: ToolCommand,
}

#[derive(Debug, Subcommand)]
pub enum ToolCommand {
    /// Live camera preview with filter buttons
    Camera {
        /// Camera device index
        #[arg(long = "camera-index", value_name = "N")]
        index: Option<u32>,
        /// Requested capture width
        #[arg(long)]
        width: Option<u32>,
        /// Requested capture height
        #[arg(long)]
        height: Option<u32>,
    },
    /// Select a region of an image, augment it, save derived artifacts
    Label {
        image: PathBuf,
    },
    /// Draw rectangles, circles and text on a blank canvas
    Draw {
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
        /// Text stamped by the text tool
        #[arg(long)]
        text: Option<String>,
    },
    /// Crop one region out of an image and record its coordinates
    Crop {
        image: PathBuf,
    },
}

impl CliArgs {
    pub fn overrides(&self) -> Overrides {
        let mut o = Overrides {
            output_dir: self.output_dir.clone(),
            ..Overrides::default()
        };
        match &self.tool {
            ToolCommand::Camera { index, width, height } => {
                o.camera_index = *index;
                o.camera_width = *width;
                o.camera_height = *height;
            }
            ToolCommand::Draw { width, height, text } => {
                o.canvas_width = *width;
                o.canvas_height = *height;
                o.text = text.clone();
            }
            ToolCommand::Label { .. } | ToolCommand::Crop { .. } => {}
        }
        o
    }
}
