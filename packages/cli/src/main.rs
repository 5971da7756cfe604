//! Print the directory as the UI would show it.
//!
//! ```text
//! directory [--json] [--expand] [QUERY]
//! ```
//!
//! Loads users with their todos and posts from the configured backend, applies
//! `QUERY` as the search text and prints the visible rows.

use anyhow::Context as _;
use api::{HttpGateway, Settings};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use ui::{CompletionTone, Coordinator, DirectoryModel};

#[derive(Debug, Parser)]
#[command(name = "directory")]
#[command(about = "Print the user directory with todos and posts")]
struct Args {
    /// Print the render model as JSON
    #[arg(long)]
    json: bool,

    /// Expand every row to show its todos and posts
    #[arg(long)]
    expand: bool,

    /// Search text matched against names and emails
    #[arg(default_value = "")]
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = Settings::new().context("Failed to load settings")?;
    let gateway =
        HttpGateway::from_settings(&settings.gateway).context("Failed to build HTTP client")?;
    tracing::info!("Using backend {}", gateway.base_url());

    let coordinator = Coordinator::new(gateway).with_policy(settings.sync.policy);
    coordinator
        .load_all()
        .await
        .context("Failed to load the directory")?;

    let ids: Vec<_> = coordinator.with_store(|store| store.list_users().map(|u| u.id).collect());
    coordinator.with_view(|view| {
        view.set_search(args.query.as_str());
        if args.expand {
            for id in ids {
                view.toggle_expanded(id);
            }
        }
    });

    let model = coordinator.render();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        print_rows(&model);
    }
    Ok(())
}

fn print_rows(model: &DirectoryModel) {
    for row in &model.rows {
        let mark = match row.tone {
            CompletionTone::Complete => "done",
            CompletionTone::Incomplete => "open",
        };
        println!("{:>3}  {:<26} {:<28} [{}]", row.id, row.name, row.email, mark);

        let Some(nested) = &row.nested else { continue };
        for todo in &nested.todos {
            println!("       todo  {:<50} completed: {}", todo.title, todo.completed_label);
        }
        for post in &nested.posts {
            println!("       post  {:<50} {}", post.title, post.body);
        }
    }
    if model.rows.is_empty() {
        println!("No users match {:?}", model.search);
    }
}
