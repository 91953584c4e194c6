use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use mob_coauthors::git::{ConfigScope, Git};
use mob_coauthors::store::{AliasStore, GitConfigStore, Zone};
use mob_coauthors::{AliasScope, Config, Say, Terminal, trailers};

#[derive(Parser)]
#[command(name = "mob")]
#[command(about = "Hand over mob programming sessions with the right co-authors")]
struct Cli {
    /// Print debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Git config scope that remembers aliases
    #[arg(long, global = true, value_enum)]
    scope: Option<AliasScope>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage co-authors for the next commit, e.g. `jj, Jane Doe <jane@example.com> as jd`
    Coauthors {
        /// Co-author specification; words are joined with spaces
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        spec: Vec<String>,
    },

    /// Clear the co-authors staged for the next commit
    Clear,

    /// List remembered aliases
    Aliases,

    /// Append co-authors of the WIP commits to the pending squash message
    SquashTrailers,

    /// Print co-author trailers for the commits since the base branch
    Trailers {
        /// Base branch the WIP commits were started from
        #[arg(long)]
        base: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let git = Git::discover(&cwd).ok();
    let mut config = Config::load(git.as_ref().map(Git::root), |key| std::env::var(key).ok())
        .context("failed to load configuration")?;
    config.debug |= cli.debug;
    if let Some(scope) = cli.scope {
        config.alias_scope = scope;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if config.debug { Level::DEBUG } else { Level::WARN })
        .init();

    let mut say = Terminal;

    match cli.command {
        Command::Coauthors { spec } => {
            let mut store = alias_store(git, &cwd, &config)?;
            let coauthors = mob_coauthors::parse(&spec.join(" "))?;
            let coauthors = mob_coauthors::resolve(coauthors, &store)?;
            mob_coauthors::persist(&coauthors, &mut store, &mut say)?;
        }
        Command::Clear => {
            let mut store = alias_store(git, &cwd, &config)?;
            mob_coauthors::persist(&Default::default(), &mut store, &mut say)?;
        }
        Command::Aliases => {
            let store = alias_store(git, &cwd, &config)?;
            let aliases = store.aliases(Zone::Durable)?;
            if aliases.is_empty() {
                say.info("No aliases remembered yet");
            }
            for (alias, author) in aliases {
                println!("{alias} = {author}");
            }
        }
        Command::SquashTrailers => {
            let git = git.context("expecting the current working directory to be a git repository")?;
            let committer = git.user_identity()?;
            let path = git.squash_message_path()?;
            let appended = trailers::append_to_squash_message(&path, &committer)?;
            if appended.is_empty() {
                say.info("No co-authors found in WIP commits");
            } else {
                say.info(&format!(
                    "Added {} co-author(s) to {}",
                    appended.len(),
                    path.display()
                ));
            }
        }
        Command::Trailers { base } => {
            let git = git.context("expecting the current working directory to be a git repository")?;
            let base = base.unwrap_or(config.base_branch);
            let mut lines = vec![trailers::committer_line(&git.user_identity()?)];
            lines.extend(git.log_since(&base)?);
            let coauthors = trailers::collect_coauthors(&lines);
            if coauthors.is_empty() {
                say.warning(&format!("No co-authors found in commits since {base}"));
            } else {
                print!("{}", trailers::render_trailers(&coauthors));
            }
        }
        Command::Config => {
            for line in config.to_env_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// The git config store for the configured scope.
///
/// The global scope works outside a repository, the local scope does not.
fn alias_store(git: Option<Git>, cwd: &Path, config: &Config) -> anyhow::Result<GitConfigStore> {
    let scope = ConfigScope::from(config.alias_scope);
    let git = match (git, &scope) {
        (Some(git), _) => git,
        (None, ConfigScope::Global) => Git::at(cwd),
        (None, _) => anyhow::bail!(
            "expecting the current working directory to be a git repository to store aliases locally"
        ),
    };
    Ok(GitConfigStore::new(git, scope))
}
