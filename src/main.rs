use clap::{Parser, Subcommand};
use hue_scenes::{report, Group, Hue, Light, Scene, SceneFilter, REQUEST_TIMEOUT};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hue-scenes")]
#[command(about = "List and recall the scenes of a Hue bridge", long_about = None)]
struct Cli {
    /// JSON file holding the bridge address (`server`) and API token (`user`)
    #[arg(short, long, global = true, default_value = "./config.js")]
    config: PathBuf,

    /// Per-request timeout in seconds
    #[arg(
        short,
        long,
        global = true,
        default_value_t = REQUEST_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List scenes sorted by last update, active ones only unless --all is given
    Scenes {
        /// Only scenes whose name contains this text
        #[arg(short, long)]
        name: Option<String>,
        /// Include scenes whose lights are not all on
        #[arg(short, long)]
        all: bool,
        /// Only scenes updated before this epoch (seconds)
        #[arg(long)]
        before: Option<i64>,
        /// Only scenes updated after this epoch (seconds)
        #[arg(long)]
        after: Option<i64>,
    },

    /// List every light
    Lights,

    /// List every group and its lights
    Groups,

    /// Recall a scene on all lights
    Activate {
        /// Scene id
        id: String,
    },

    /// Delete a scene from the bridge
    Delete {
        /// Scene id
        id: String,
    },
}

async fn run(cli: Cli) -> hue_scenes::Result<()> {
    let hue = Hue::new(cli.config).with_timeout(Duration::from_secs(cli.timeout));
    let command = cli.command.unwrap_or(Commands::Scenes {
        name: None,
        all: false,
        before: None,
        after: None,
    });

    match command {
        Commands::Scenes {
            name,
            all,
            before,
            after,
        } => {
            let filter = SceneFilter {
                name,
                on: if all { None } else { Some(true) },
                updated_before: before,
                updated_after: after,
            };
            let scenes = Scene::sort_by_update_time(Scene::fetch_by(&hue, &filter).await?);
            print!("{}", report::scenes(&hue, &scenes).await?);
        }
        Commands::Lights => {
            print!("{}", report::lights(&*Light::fetch_all(&hue).await?));
        }
        Commands::Groups => {
            let groups: Vec<_> = Group::fetch_all(&hue).await?.values().cloned().collect();
            print!("{}", report::groups(&hue, &groups).await?);
        }
        Commands::Activate { id } => {
            let answer = Scene::fetch_one(&hue, &id).await?.activate(&hue).await?;
            println!("{answer}");
        }
        Commands::Delete { id } => {
            let answer = Scene::fetch_one(&hue, &id).await?.delete(&hue).await?;
            println!("{answer}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
