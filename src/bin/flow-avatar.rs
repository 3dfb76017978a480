use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use flow_avatar::{
    ViewerConfig, init_logging, inspect_model,
    resources::load_model_gltf,
    run_viewer,
    skin::{ReqwestClient, SkinPipeline, probe_handle},
    status::LogStatus,
};

#[derive(Parser, Debug)]
#[command(version, about = "Minecraft avatar viewer")]
struct Cli {
    /// TOML file overriding the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the viewer window (default)
    Run {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Resolve a player handle and print what the services return
    Probe { handle: String },
    /// Load a model and print its meshes and materials
    Inspect {
        model: String,
        /// Apply this player's skin before printing
        #[arg(short, long)]
        skin: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    match cli.command.unwrap_or(Command::Run {
        username: None,
        model: None,
    }) {
        Command::Run { username, model } => {
            if let Some(username) = username {
                config.skin.username = username;
            }
            if let Some(model) = model {
                config.model.path = model;
            }
            run_viewer(config)
        }
        Command::Probe { handle } => {
            let runtime = tokio::runtime::Runtime::new()?;
            let http = ReqwestClient::default();
            let report = runtime.block_on(probe_handle(&http, &config.skin.endpoints, &handle));
            print!("{report}");
            match report.error {
                Some(err) => bail!(err),
                None => Ok(()),
            }
        }
        Command::Inspect { model, skin } => {
            let runtime = tokio::runtime::Runtime::new()?;
            let mut scene = runtime.block_on(load_model_gltf(&model, None))?;
            if let Some(handle) = skin {
                let pipeline = SkinPipeline::new(ReqwestClient::default())
                    .with_endpoints(config.skin.endpoints.clone())
                    .with_settings(config.skin.settings.clone());
                let mut status = LogStatus::default();
                runtime.block_on(pipeline.apply_skin(&mut scene, &handle, &mut status));
            }
            print!("{}", inspect_model(&scene));
            Ok(())
        }
    }
}
