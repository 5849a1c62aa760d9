use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use govmode_config::HostConfig;
use govmode_governance::{
    Clock, FixedClock, Governance, GovernanceEngine, Identity, ProposalId, ProposalView,
    SharedGovernance, StateStore, SystemClock,
};

mod output;

use output::{render_details, render_summary, ProposalReport};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State file, overriding the configuration
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Act as if the current Unix time were this value
    #[arg(long, global = true, value_name = "UNIX_SECS")]
    at: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new proposal
    Propose {
        /// Identity creating the proposal
        #[arg(long = "as", value_name = "IDENTITY")]
        caller: Identity,
        /// Proposal title
        #[arg(long)]
        title: String,
        /// Proposal body
        #[arg(long)]
        content: String,
        /// Voting duration in days
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
    },
    /// Vote on an open proposal
    #[command(group(ArgGroup::new("choice").required(true).args(["approve", "against"])))]
    Vote {
        /// Identity casting the vote
        #[arg(long = "as", value_name = "IDENTITY")]
        caller: Identity,
        /// Proposal ID
        #[arg(long)]
        proposal: ProposalId,
        /// Vote in favour
        #[arg(long = "for")]
        approve: bool,
        /// Vote against
        #[arg(long)]
        against: bool,
    },
    /// Show proposal details
    Show {
        /// Proposal ID
        #[arg(long)]
        proposal: ProposalId,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check whether an identity has voted
    HasVoted {
        /// Proposal ID
        #[arg(long)]
        proposal: ProposalId,
        /// Identity to check
        #[arg(long)]
        identity: Identity,
    },
    /// List all proposals
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// What a command produced
struct Outcome {
    output: String,
    mutated: bool,
}

impl Outcome {
    fn read(output: String) -> Self {
        Self {
            output,
            mutated: false,
        }
    }

    fn write(output: String) -> Self {
        Self {
            output,
            mutated: true,
        }
    }
}

async fn execute<C: Clock>(
    governance: &SharedGovernance<C>,
    clock: &dyn Clock,
    config: &HostConfig,
    command: Commands,
) -> Result<Outcome> {
    match command {
        Commands::Propose {
            caller,
            title,
            content,
            days,
        } => {
            let days = days.unwrap_or(config.default_duration_days);
            let id = governance
                .create_proposal(&caller, title, content, days)
                .await?;
            Ok(Outcome::write(id.to_string()))
        }
        Commands::Vote {
            caller,
            proposal,
            approve,
            ..
        } => {
            governance.vote(&caller, proposal, approve).await?;
            let view = governance.get_proposal_details(proposal).await?;
            Ok(Outcome::write(format!(
                "Voted {} proposal {} (for {}, against {})",
                if approve { "for" } else { "against" },
                proposal,
                view.for_votes,
                view.against_votes
            )))
        }
        Commands::Show { proposal, json } => {
            let view = governance.get_proposal_details(proposal).await?;
            let report = report(view, clock);
            let output = if json {
                serde_json::to_string_pretty(&report)?
            } else {
                render_details(&report)
            };
            Ok(Outcome::read(output))
        }
        Commands::HasVoted { proposal, identity } => {
            let voted = governance.check_has_voted(proposal, &identity).await?;
            Ok(Outcome::read(voted.to_string()))
        }
        Commands::List { json } => {
            let reports: Vec<ProposalReport> = governance
                .list_proposals()
                .await?
                .into_iter()
                .map(|view| report(view, clock))
                .collect();
            let output = if json {
                serde_json::to_string_pretty(&reports)?
            } else {
                reports
                    .iter()
                    .map(render_summary)
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            Ok(Outcome::read(output))
        }
    }
}

fn report(view: ProposalView, clock: &dyn Clock) -> ProposalReport {
    let status = view.status_at(clock.now());
    ProposalReport { view, status }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HostConfig::from_env(cli.config.as_deref())?;
    if let Some(state) = cli.state {
        config.state_file = state;
    }
    if let Some(at) = cli.at {
        config.fixed_time = Some(at);
    }

    // Initialize logging
    init_tracing(&config.log_level);
    debug!(?config, "Loaded configuration");

    let clock: Arc<dyn Clock> = match config.fixed_time {
        Some(time) => Arc::new(FixedClock(time)),
        None => Arc::new(SystemClock),
    };

    let store = StateStore::new(&config.state_file);
    let engine = match store
        .load()
        .await
        .with_context(|| format!("loading {}", store.path().display()))?
    {
        Some(state) => GovernanceEngine::restore(state, Arc::clone(&clock))?,
        None => GovernanceEngine::with_clock(Arc::clone(&clock)),
    };
    let governance = SharedGovernance::new(engine);

    let outcome = execute(&governance, clock.as_ref(), &config, cli.command).await?;
    if outcome.mutated {
        store
            .save(&governance.snapshot().await)
            .await
            .with_context(|| format!("saving {}", store.path().display()))?;
    }
    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmode_governance::{GovernanceError, SECONDS_PER_DAY};
    use tempfile::tempdir;

    const NOW: u64 = 1_700_000_000;

    fn command(args: &[&str]) -> Commands {
        let mut argv = vec!["govmode"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    fn governance() -> SharedGovernance<FixedClock> {
        SharedGovernance::new(GovernanceEngine::with_clock(FixedClock(NOW)))
    }

    async fn run(governance: &SharedGovernance<FixedClock>, args: &[&str]) -> Result<Outcome> {
        execute(governance, &FixedClock(NOW), &HostConfig::default(), command(args)).await
    }

    #[tokio::test]
    async fn test_propose_vote_and_query() {
        let governance = governance();

        let created = run(
            &governance,
            &[
                "propose",
                "--as",
                "member1",
                "--title",
                "Test Proposal",
                "--content",
                "This is a test proposal.",
            ],
        )
        .await
        .unwrap();
        assert_eq!(created.output, "1");
        assert!(created.mutated);

        let voted = run(&governance, &["vote", "--as", "member2", "--proposal", "1", "--for"])
            .await
            .unwrap();
        assert_eq!(voted.output, "Voted for proposal 1 (for 1, against 0)");

        let checked = run(
            &governance,
            &["has-voted", "--proposal", "1", "--identity", "member2"],
        )
        .await
        .unwrap();
        assert_eq!(checked.output, "true");
        assert!(!checked.mutated);

        let shown = run(&governance, &["show", "--proposal", "1", "--json"]).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&shown.output).unwrap();
        assert_eq!(json["title"], "Test Proposal");
        assert_eq!(json["creator"], "member1");
        assert_eq!(json["for_votes"], 1);
        assert_eq!(json["end_time"], NOW + 7 * SECONDS_PER_DAY);
        assert_eq!(json["status"], "Open");
    }

    #[tokio::test]
    async fn test_duplicate_vote_surfaces_engine_error() {
        let governance = governance();
        run(
            &governance,
            &["propose", "--as", "a", "--title", "T", "--content", "C", "--days", "1"],
        )
        .await
        .unwrap();
        run(&governance, &["vote", "--as", "b", "--proposal", "1", "--against"])
            .await
            .unwrap();

        let err = run(&governance, &["vote", "--as", "b", "--proposal", "1", "--for"])
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<GovernanceError>(),
            Some(GovernanceError::AlreadyVoted { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_days_rejected() {
        let governance = governance();
        let err = run(
            &governance,
            &["propose", "--as", "a", "--title", "T", "--content", "C", "--days", "-3"],
        )
        .await
        .err()
        .unwrap();
        assert_eq!(
            err.downcast_ref::<GovernanceError>(),
            Some(&GovernanceError::InvalidDuration(-3))
        );
    }

    #[test]
    fn test_vote_requires_exactly_one_choice() {
        let base = ["govmode", "vote", "--as", "a", "--proposal", "1"];
        assert!(Cli::try_parse_from(base).is_err());

        let mut both = base.to_vec();
        both.extend(["--for", "--against"]);
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn test_blank_identity_rejected_at_parse_time() {
        let argv = ["govmode", "has-voted", "--proposal", "1", "--identity", " "];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let governance = governance();
        run(&governance, &["propose", "--as", "a", "--title", "T", "--content", "C"])
            .await
            .unwrap();
        store.save(&governance.snapshot().await).await.unwrap();

        let state = store.load().await.unwrap().unwrap();
        let restored = SharedGovernance::new(
            GovernanceEngine::restore(state, FixedClock(NOW + 8 * SECONDS_PER_DAY)).unwrap(),
        );
        let err = restored
            .vote(&Identity::new("b").unwrap(), ProposalId(1), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::VotingClosed { .. }));

        let listed = execute(
            &restored,
            &FixedClock(NOW + 8 * SECONDS_PER_DAY),
            &HostConfig::default(),
            command(&["list"]),
        )
        .await
        .unwrap();
        assert_eq!(listed.output, "   1  closed   +0 -0  T");
    }

    #[tokio::test]
    async fn test_clock_before_start_reports_pending() {
        let governance = governance();
        run(&governance, &["propose", "--as", "a", "--title", "T", "--content", "C"])
            .await
            .unwrap();

        let earlier = FixedClock(NOW - 60);
        let shown = execute(
            &governance,
            &earlier,
            &HostConfig::default(),
            command(&["show", "--proposal", "1", "--json"]),
        )
        .await
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&shown.output).unwrap();
        assert_eq!(json["status"], "Pending");

        let restored = SharedGovernance::new(
            GovernanceEngine::restore(governance.snapshot().await, earlier).unwrap(),
        );
        let err = restored
            .vote(&Identity::new("b").unwrap(), ProposalId(1), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::VotingClosed { .. }));
    }
}
