mod auth;
mod config;
mod error;
mod filter;
mod grouping;
mod i18n;
mod library;
mod lightbox;
mod minify;
mod pages;
mod photos;
mod processing;
mod render;
mod server;
mod store;
mod theme;
mod util;
mod zoom;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

const VERSION: &str = env!("GIT_VERSION");

#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = VERSION)]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
struct Args {
    /// Site directory (contains site.toml, data and public files)
    #[arg(short = 'C', long, default_value = ".", global = true)]
    directory: PathBuf,

    /// Path to site configuration file (relative to site directory)
    #[arg(short, long, default_value = "site.toml", global = true)]
    config: PathBuf,

    /// Logging verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the site (default if no command specified)
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Print the gallery sections in render order
    List,

    /// Optimize an image and add it to the library
    Add {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        series: Option<String>,
    },

    /// Change a photo's title, category or series
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        series: Option<String>,
    },

    /// Delete a photo and its stored image
    Remove { id: String },
}

impl Args {
    fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            }
        }
    }

    fn config_path(&self) -> PathBuf {
        self.directory.join(&self.config)
    }
}

fn init_tracing(level: Level) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    #[cfg(distribute)]
    {
        fmt().json().with_env_filter(filter).init();
    }

    #[cfg(not(distribute))]
    {
        fmt().pretty().with_env_filter(filter).init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_tracing(args.log_level());

    tracing::debug!(?args, "parsed arguments");

    let config_path = args.config_path();
    tracing::info!(path = %config_path.display(), "loading site config");
    let site = config::Site::load(&config_path)?;

    tracing::info!(
        title = %site.title,
        theme = %site.theme,
        data = %site.data.display(),
        uploads = %site.uploads.display(),
        "site configured"
    );

    let library = library::Library::for_site(&args.directory, &site);

    match args.command.unwrap_or(Command::Serve { port: 3000 }) {
        Command::Serve { port } => {
            let app = server::App::new(&args.directory, &site)?;
            server::serve(&app, port)?;
        }
        Command::List => {
            let photos = library.store().list_newest_first()?;
            let layout = grouping::GalleryLayout::build(&photos);
            if layout.is_empty() {
                println!("no photos");
            }

            for group in &layout.categories {
                print_group(group, &site.date_format);
            }
            if let Some(heading) = layout.series_heading() {
                println!("\n{}", heading);
                for group in &layout.series {
                    print_group(group, &site.date_format);
                }
            }
        }
        Command::Add {
            file,
            title,
            category,
            series,
        } => {
            let data = std::fs::read(&file)?;
            let photo = library.add(
                &data,
                library::NewPhoto {
                    title,
                    category,
                    series,
                },
            )?;
            println!("{}\t{}", photo.id, photo.url);
        }
        Command::Edit {
            id,
            title,
            category,
            series,
        } => {
            let photo = library.edit(
                &id,
                store::PhotoUpdate {
                    title,
                    category,
                    series,
                },
            )?;
            println!("{}\t{}", photo.id, photo.title);
        }
        Command::Remove { id } => {
            match library.remove(&id)? {
                Some(photo) => println!("removed {}\t{}", photo.id, photo.title),
                None => println!("removed {}", id),
            }
        }
    }

    Ok(())
}

fn print_group(group: &grouping::RenderGroup, date_format: &str) {
    println!("\n{} ({})", group.title, group.photos.len());
    for (i, photo) in group.photos.iter().enumerate() {
        println!(
            "  {:>3}  {:<14} {:<10} {}",
            group.start + i,
            photo.id,
            photo.display_date(date_format),
            photo.title
        );
    }
}
