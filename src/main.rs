use clap::{Parser, Subcommand};
use folio::imaging::RustBackend;
use folio::{blog, config, feeds, manifest, output, server};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Build pipeline for a photo-blog portfolio")]
#[command(long_about = "\
Build pipeline for a photo-blog portfolio

Everything lives under one site root, which is also what gets published:

  public/
  ├── config.toml                  # Site config (optional)
  ├── images/                      # Source photographs (.jpg, .jpeg, .png)
  │   └── previews/                # Generated previews (preview_<name>)
  ├── images.json                  # Generated manifest; edit tags here
  ├── blog/
  │   ├── posts/                   # Markdown posts with --- front matter
  │   └── generated/               # Generated pages and posts.json
  ├── rss.xml, atom.xml            # Generated feeds
  └── sitemap.xml                  # Generated sitemap

Tags assigned in images.json are kept across rebuilds.
SITE_URL overrides site.base_url from config.toml.

Run 'folio gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = "public", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate previews and write the image manifest
    Images,
    /// Render markdown posts into HTML pages and posts.json
    Blog,
    /// Write RSS, Atom and sitemap documents
    Feeds,
    /// Run the full pipeline: images → blog → feeds
    Build,
    /// Serve the site root with a JSON image listing at /images
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site = config::load_config(&cli.root)?.with_env_overrides();
    run(cli.command, &cli.root, &site)
}

fn run(
    command: Command,
    root: &Path,
    site: &config::SiteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Images => run_images(root, site)?,
        Command::Blog => run_blog(root, site)?,
        Command::Feeds => run_feeds(root, site)?,
        Command::Build => {
            println!("==> Stage 1: Images in {}", root.display());
            run_images(root, site)?;

            println!("==> Stage 2: Blog");
            run_blog(root, site)?;

            println!("==> Stage 3: Feeds");
            run_feeds(root, site)?;

            println!("==> Build complete: {}", root.display());
        }
        Command::Serve { port } => {
            let options = server::ServeOptions {
                site_root: root.to_path_buf(),
                source_dir: config::site_path(root, &site.images.source_dir),
                url_prefix: site.images.source_dir.clone(),
                port: port.unwrap_or(site.server.port),
            };
            actix_web::rt::System::new().block_on(server::serve(options, RustBackend::new()))?;
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}

fn run_images(root: &Path, site: &config::SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&site.processing);
    let paths = manifest::ManifestPaths::from_site_config(site, root);
    let options = manifest::ManifestOptions::from_site_config(site, root);
    let records = manifest::build(&paths, &options, &RustBackend::new())?;
    output::print_manifest_output(&records);
    Ok(())
}

fn run_blog(root: &Path, site: &config::SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    let posts = blog::render(
        &config::site_path(root, &site.blog.posts_dir),
        &config::site_path(root, &site.blog.output_dir),
        &blog::BlogOptions::from_site_config(site),
    )?;
    output::print_blog_output(&posts);
    Ok(())
}

fn run_feeds(root: &Path, site: &config::SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    let posts_json = config::site_path(root, &site.blog.output_dir).join(blog::POSTS_JSON);
    let posts = feeds::read_posts(&posts_json);
    let documents = feeds::generate(&posts, root, &site.site)?;
    feeds::write(root, &documents)?;
    output::print_feeds_output(posts.len(), &documents);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down,
/// not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
