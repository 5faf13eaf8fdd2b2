use clap::Parser;
use tracing_subscriber::EnvFilter;

use aipr::llm::{create_question, PrPart};
use aipr::models::{NewPullRequest, PullRequestDraft};
use aipr::{AiConfig, Config, Dispatcher, GitHubClient, LocalRepo, Spinner};

#[derive(Parser, Debug)]
#[command(name = "aipr")]
#[command(version)]
#[command(about = "Generate a pull request title and description from the diff with the default branch")]
#[command(after_help = "ENVIRONMENT VARIABLES
  AIPR_PROVIDER          openai or anthropic (default: openai)
  OPENAI_API_KEY         Your OpenAI API key
  OPENAI_MODEL           The OpenAI model to use (default: gpt-4o)
  OPENAI_TEMPERATURE     Sampling temperature for OpenAI (default: 0.1)
  OPENAI_MAX_TOKENS      Maximum tokens for OpenAI (default: 450)
  ANTHROPIC_API_KEY      Your Anthropic API key
  ANTHROPIC_MODEL        The Anthropic model to use
  ANTHROPIC_TEMPERATURE  Sampling temperature for Anthropic (default: 0.1)
  ANTHROPIC_MAX_TOKENS   Maximum tokens for Anthropic (default: 450)
  GITHUB_TOKEN           Token for the GitHub API (or GH_TOKEN)")]
struct Args {
    /// Enable verbose output
    #[arg(long)]
    verbose: bool,

    /// Create a pull request on GitHub
    #[arg(long)]
    create: bool,

    /// Output only the title
    #[arg(long, conflicts_with_all = ["body", "create"])]
    title: bool,

    /// Output only the body
    #[arg(long, conflicts_with = "create")]
    body: bool,

    /// Write the title and description in Japanese
    #[arg(long, visible_alias = "japanise")]
    japanese: bool,

    /// AI provider to use, overriding AIPR_PROVIDER
    #[arg(long)]
    provider: Option<String>,

    /// Base branch to diff against (defaults to the repository's default branch)
    #[arg(long)]
    base: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.verbose { "aipr=debug" } else { "aipr=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(level.parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(provider) = args.provider.clone() {
        config.ai.provider = provider;
    }

    let repo = LocalRepo::current();
    let github = config
        .github_token
        .as_deref()
        .map(GitHubClient::new)
        .transpose()?;

    ensure_can_create(&args, github.as_ref())?;

    let base = resolve_base(&args, &repo, github.as_ref()).await?;

    let diff = {
        let _spinner = Spinner::started("Getting git diff");
        repo.diff_against(&base).await?
    };

    if diff.trim().is_empty() {
        println!("No changes against origin/{}", base);
        return Ok(());
    }

    let dispatcher = Dispatcher::new()?;
    let draft = generate(&dispatcher, &config.ai, &diff, &args).await?;

    if let Some(github) = github.as_ref().filter(|_| args.create) {
        let slug = repo.origin_slug().await?;
        let pull = NewPullRequest {
            title: draft.title.unwrap_or_default(),
            body: draft.body.unwrap_or_default(),
            head: repo.current_branch().await?,
            base,
        };

        let created = {
            let _spinner = Spinner::started("Creating pull request");
            github.create_pull_request(&slug, &pull).await?
        };

        println!("{}", created.number);
        if let Some(url) = created.html_url {
            println!("{}", url);
        }
        return Ok(());
    }

    print_draft(&draft);
    Ok(())
}

/// `--create` needs GitHub access; check before spending any model calls.
fn ensure_can_create(args: &Args, github: Option<&GitHubClient>) -> anyhow::Result<()> {
    if args.create && github.is_none() {
        anyhow::bail!("GITHUB_TOKEN (or GH_TOKEN) is required to create a pull request");
    }
    Ok(())
}

async fn resolve_base(
    args: &Args,
    repo: &LocalRepo,
    github: Option<&GitHubClient>,
) -> anyhow::Result<String> {
    if let Some(base) = &args.base {
        return Ok(base.clone());
    }

    let branch = match github {
        Some(github) => {
            let slug = repo.origin_slug().await?;
            github.get_default_branch(&slug).await?
        }
        None => {
            tracing::debug!("No GitHub token, reading default branch from origin/HEAD");
            repo.origin_head().await?
        }
    };

    tracing::debug!("Default branch: {}", branch);
    Ok(branch)
}

async fn generate(
    dispatcher: &Dispatcher,
    config: &AiConfig,
    diff: &str,
    args: &Args,
) -> anyhow::Result<PullRequestDraft> {
    let mut draft = PullRequestDraft::default();

    if !args.body {
        let prompt = create_question(PrPart::Title, diff, args.japanese);
        draft.title = Some(dispatcher.ask(config, &prompt, args.verbose).await?);
    }

    if !args.title {
        let prompt = create_question(PrPart::Body, diff, args.japanese);
        draft.body = Some(dispatcher.ask(config, &prompt, args.verbose).await?);
    }

    Ok(draft)
}

fn print_draft(draft: &PullRequestDraft) {
    if let Some(title) = &draft.title {
        println!("Generated Pull Request Title:");
        println!("{}", title);
    }

    if draft.title.is_some() && draft.body.is_some() {
        println!();
    }

    if let Some(body) = &draft.body {
        println!("Generated Pull Request Description:");
        println!("{}", body);
    }
}
