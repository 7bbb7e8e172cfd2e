use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ats_client::{ClientConfig, HttpJobGateway, JobGateway, SessionService};
use ats_core::{JobListQuery, JobRecord, JobStatus};
use ats_editor::{
    EditorContext, EditorPolicy, JobFormController, JobListSource, LoadOutcome, NavigationLog,
    PageSource, PagedList, SubmitOutcome, SubmitTarget, TracingNotifier,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "ats-cli")]
#[command(about = "ATS job postings dashboard and command-line tools")]
struct Cli {
    /// Backend API base URL (overrides ATS_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web dashboard.
    Serve,
    /// List job postings.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        status: Option<JobStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print one job posting.
    Show { id: i64 },
    /// Validate a job posting and mark it active.
    Publish { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => ats_web::serve(&config).await?,
        Commands::List {
            page,
            status,
            search,
        } => {
            let gateway = connect(&config)?;
            let filters = JobListQuery {
                status,
                search,
                ..JobListQuery::default()
            };
            let source: Arc<dyn PageSource<JobRecord>> =
                Arc::new(JobListSource::new(gateway, filters));
            let mut list = PagedList::new(source, 20);
            if !list.go_to_page(page).await {
                bail!(
                    "could not list jobs: {}",
                    list.error().unwrap_or("page out of range")
                );
            }
            for job in list.items() {
                println!(
                    "{:>6}  {:<8}  {:<40}  {}",
                    job.id,
                    job.status,
                    job.title,
                    job.location
                );
            }
            println!(
                "page {}/{} ({} jobs)",
                list.page(),
                list.total_pages(),
                list.total_count()
            );
        }
        Commands::Show { id } => {
            let gateway = connect(&config)?;
            let job = gateway
                .get_job(id)
                .await
                .with_context(|| format!("failed to fetch job {id}"))?;
            print_job(&job);
        }
        Commands::Publish { id } => {
            let gateway = connect(&config)?;
            let ctx = EditorContext::new(
                gateway,
                Arc::new(TracingNotifier),
                Arc::new(NavigationLog::new()),
            )
            .with_policy(EditorPolicy::from_env());
            let mut controller = JobFormController::new(ctx);
            if let LoadOutcome::Failed { error, .. } = controller.load(id).await {
                bail!("failed to load job {id}: {error}");
            }
            match controller.submit(SubmitTarget::Active).await {
                SubmitOutcome::Saved(job) => {
                    info!(job_id = job.id, "job published");
                    print_job(&job);
                }
                SubmitOutcome::Invalid => {
                    for (field, message) in controller.errors() {
                        eprintln!("  {field}: {message}");
                    }
                    bail!("job {id} is not ready to publish");
                }
                SubmitOutcome::Failed(error) => bail!("failed to publish job {id}: {error}"),
            }
        }
    }

    Ok(())
}

fn connect(config: &ClientConfig) -> Result<Arc<dyn JobGateway>> {
    let session = SessionService::from_config(config).context("failed to open the session store")?;
    let gateway = HttpJobGateway::new(config, Arc::new(session))?;
    Ok(Arc::new(gateway))
}

fn print_job(job: &JobRecord) {
    println!("#{} {} [{}]", job.id, job.title, job.status);
    println!("location: {}{}", job.location, if job.remote_allowed { " (remote)" } else { "" });
    println!("level: {}", job.experience_level);
    if let Some(salary) = job.salary_range_label() {
        println!("salary: {salary}");
    }
    if let Some(deadline) = &job.deadline {
        println!("deadline: {deadline}");
    }
    println!("applications: {}", job.applications_count);
    for item in job.requirement_items() {
        println!("  - {item}");
    }
}
