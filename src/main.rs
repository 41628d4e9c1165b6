use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use portfolio_client::{
    CertificateFilters, ClientConfig, FilePart, FullListIndex, ImageGallery, ListState,
    LoginRequest, PortfolioClient, Project, ProjectFilters, RegisterRequest, ReviewDraft, SessionState,
    api::images::ADDITIONAL_IMAGES_FIELD,
};

#[derive(Parser)]
#[command(name = "portfolio", about = "Command-line client for the portfolio backend")]
struct Cli {
    /// Override PORTFOLIO_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session.
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the restored session.
    Whoami,
    Projects {
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    Certificates {
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        issuer: Option<String>,
    },
    Reviews {
        project_id: String,
    },
    /// Leave a review on a project.
    Review {
        project_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
    },
    UploadImages {
        project_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an image by its position in the full list (the main image is 0).
    RemoveImage {
        project_id: String,
        index: usize,
    },
    /// Move an image between two positions of the full list.
    ReorderImages {
        project_id: String,
        from: usize,
        to: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    let client =
        PortfolioClient::with_file_store(config).context("failed to open session storage")?;
    let session = client.session();

    match cli.command {
        Command::Login { email, password } => {
            let credentials = session
                .login(&LoginRequest::new(email, password))
                .await
                .context("login failed")?;
            println!(
                "signed in as {} ({})",
                credentials.user.name,
                credentials.user.role.as_str()
            );
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let credentials = session
                .register(&RegisterRequest {
                    name,
                    email,
                    password,
                })
                .await
                .context("registration failed")?;
            println!("registered {}", credentials.user.name);
        }
        Command::Logout => {
            session.logout();
            println!("signed out");
        }
        Command::Whoami => match session.init().await {
            SessionState::Authenticated(credentials) => {
                let user = credentials.user;
                println!("{} <{}>", user.name, user.email.as_deref().unwrap_or_default());
                println!("role: {}", user.role.as_str());
                println!("admin: {}", user.has_admin_rights());
            }
            _ => match session.last_error() {
                Some(message) => println!("not signed in ({message})"),
                None => println!("not signed in"),
            },
        },
        Command::Projects { featured, limit } => {
            let filters = ProjectFilters {
                featured: featured.then_some(true),
                limit,
                ..ProjectFilters::default()
            };
            let hook = client.use_projects(filters)?;
            let state = hook.settled().await;
            print_list(&state, |project| {
                format!("{}  {}  [{}]", project.id, project.title, project.technologies.join(", "))
            })?;
        }
        Command::Certificates { featured, issuer } => {
            let filters = CertificateFilters {
                featured: featured.then_some(true),
                issuer,
                ..CertificateFilters::default()
            };
            let hook = client.use_certificates(filters)?;
            let state = hook.settled().await;
            print_list(&state, |certificate| {
                format!("{}  {}  ({})", certificate.id, certificate.title, certificate.issuer)
            })?;
        }
        Command::Reviews { project_id } => {
            let hook = client.use_reviews(Some(project_id))?;
            let state = hook.list().settled().await;
            print_list(&state, |review| {
                format!("{}/5  {}: {}", review.rating, review.name, review.comment)
            })?;
        }
        Command::Review {
            project_id,
            name,
            rating,
            comment,
        } => {
            let review = client
                .reviews()
                .create(&ReviewDraft {
                    project_id,
                    name,
                    rating,
                    comment,
                })
                .await
                .context("could not submit review")?;
            println!("review {} saved", review.id);
        }
        Command::UploadImages { project_id, files } => {
            session.init().await;
            session.require_admin()?;
            let mut parts = Vec::with_capacity(files.len());
            for path in &files {
                let part = FilePart::from_path(ADDITIONAL_IMAGES_FIELD, path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                parts.push(part);
            }
            let gallery = client.project_gallery(project_id);
            gallery.upload(parts).await.context("upload failed")?;
            info!(count = files.len(), "images uploaded");
            print_gallery(&gallery);
        }
        Command::RemoveImage { project_id, index } => {
            session.init().await;
            session.require_admin()?;
            let gallery = client.project_gallery(project_id);
            gallery.load().await?;
            gallery
                .remove(FullListIndex::new(index))
                .await
                .context("could not remove image")?;
            print_gallery(&gallery);
        }
        Command::ReorderImages {
            project_id,
            from,
            to,
        } => {
            session.init().await;
            session.require_admin()?;
            let gallery = client.project_gallery(project_id);
            gallery.load().await?;
            let moved = gallery
                .reorder(FullListIndex::new(from), FullListIndex::new(to))
                .await
                .context("could not reorder images")?;
            if !moved {
                println!("order unchanged");
            }
            print_gallery(&gallery);
        }
    }

    Ok(())
}

fn print_list<T>(state: &ListState<T>, line: impl Fn(&T) -> String) -> Result<()> {
    if let Some(message) = &state.error {
        bail!("{message}");
    }
    for item in &state.items {
        println!("{}", line(item));
    }
    if let Some(pagination) = state.pagination {
        println!(
            "page {}/{} ({} total)",
            pagination.page, pagination.pages, pagination.total
        );
    }
    Ok(())
}

fn print_gallery(gallery: &ImageGallery<Project>) {
    println!("cover: {}", gallery.cover_image());
    let images = gallery.images();
    for (index, url) in images.combined().iter().enumerate() {
        println!("{index}: {url}");
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
