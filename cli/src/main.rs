//! quorum — thin command-line surface over the governance ledger.
//!
//! Loads the whole state from a JSON file, applies one operation with the
//! wall clock as `now`, and writes the state back. The price feed is a
//! fixed quote supplied on the command line; a deployment would wire in a
//! real oracle client instead.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use quorum_governance::{AdmissionList, GovernanceState, MemoryVoucherLedger};
use quorum_ledger::constants::COIN;
use quorum_oracle::FixedPriceFeed;

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Quorum governance ledger")]
struct Cli {
    /// Path to the state file
    #[arg(short, long, value_name = "FILE", default_value = "quorum-state.json")]
    state: PathBuf,

    /// USD per token, 8 decimal places (default $1.00)
    #[arg(long, default_value_t = 100_000_000)]
    price: u64,

    #[command(subcommand)]
    command: Command,
}

/// Amounts are in base units (8 decimal places per token).
#[derive(Subcommand)]
enum Command {
    /// Mint tokens to an account
    Mint { to: String, amount: u64 },
    /// Transfer tokens between accounts
    Transfer {
        from: String,
        to: String,
        amount: u64,
    },
    /// Burn tokens from an account
    Burn { from: String, amount: u64 },
    /// Show an account's balance and locks
    Balance { account: String },
    /// Admit an account to the whitelist
    Admit { account: String },
    /// Point an account's voting power at a delegatee (self to clear)
    SetDelegate {
        delegator: String,
        delegatee: String,
    },
    /// Purge expired locks for an account
    ReleaseLocks { account: String },
    /// Apply for the chief executive role
    ApplyCeo { applicant: String },
    /// Endorse a CEO application (active endorsers only)
    EndorseCeo { endorser: String, id: u64 },
    /// Vote on an active CEO application
    VoteCeo {
        voter: String,
        id: u64,
        #[arg(long)]
        against: bool,
    },
    /// Defeat a pending CEO application past its deadline
    ExpireCeo { id: u64 },
    /// Settle an active CEO application past its deadline
    FinalizeCeo { id: u64 },
    /// Submit a funding request (caps in USD base units)
    SubmitRequest {
        proposer: String,
        title: String,
        soft_cap: u64,
        hard_cap: u64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        valuation: u64,
    },
    /// Endorse a funding request (active endorsers only)
    EndorseRequest { endorser: String, id: u64 },
    /// Vote on an active funding request
    VoteRequest {
        voter: String,
        id: u64,
        #[arg(long)]
        against: bool,
    },
    /// Defeat a pending funding request past its deadline
    ExpireRequest { id: u64 },
    /// Settle an active funding request past its deadline
    FinalizeRequest { id: u64 },
    /// Approve a succeeded funding request (chief executive only)
    ApproveRequest { caller: String, id: u64 },
    /// Mint project vouchers for an approved funding request
    ExecuteRequest { id: u64 },
    /// Claim the reward for a settled funding vote
    ClaimReward { account: String, id: u64 },
    /// Preview a reward without claiming it
    PendingReward { account: String, id: u64 },
    /// Register as an endorser candidate
    RegisterEndorser {
        account: String,
        name: String,
        #[arg(long, default_value = "")]
        manifesto: String,
    },
    /// Back an endorser candidate with the caller's balance
    VoteEndorser { voter: String, candidate: String },
    /// Claim a board seat, evicting the weakest member if the board is full
    Challenge { candidate: String },
    /// Print a summary of the ledger and both proposal books
    Status,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    governance: GovernanceState,
    admission: AdmissionList,
    vouchers: MemoryVoucherLedger,
}

fn load_state(path: &Path) -> Result<StateFile> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing state file {}", path.display()))
}

fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    let contents = serde_json::to_string_pretty(state)?;
    std::fs::write(path, contents)
        .with_context(|| format!("writing state file {}", path.display()))
}

fn fmt_amount(units: u64) -> String {
    format!("{}.{:08}", units / COIN, units % COIN)
}

fn run(cli: Cli, now: u64) -> Result<()> {
    let feed = FixedPriceFeed::new(cli.price, now);
    let mut file = load_state(&cli.state)?;
    let state = &mut file.governance;

    match cli.command {
        Command::Mint { to, amount } => {
            state.mint(&to, amount, now)?;
            println!("minted {} to {}", fmt_amount(amount), to);
        }
        Command::Transfer { from, to, amount } => {
            state.transfer(&from, &to, amount, now)?;
            println!("transferred {} from {} to {}", fmt_amount(amount), from, to);
        }
        Command::Burn { from, amount } => {
            state.burn(&from, amount, now)?;
            println!("burned {} from {}", fmt_amount(amount), from);
        }
        Command::Balance { account } => match state.ledger().account(&account) {
            Some(acc) => {
                println!("balance:  {}", fmt_amount(acc.balance));
                println!("age:      {}", acc.balance_age);
                println!(
                    "election: {} (until {})",
                    fmt_amount(acc.election_lock.amount),
                    acc.election_lock.unlock_time
                );
                println!(
                    "funding:  {} (until {})",
                    fmt_amount(acc.funding_lock.amount),
                    acc.funding_lock.unlock_time
                );
            }
            None => println!("balance:  0.00000000"),
        },
        Command::Admit { account } => {
            file.admission.admit(&account);
            println!("admitted {account}");
        }
        Command::SetDelegate {
            delegator,
            delegatee,
        } => {
            state.set_delegate(&delegator, &delegatee, now)?;
            println!("{delegator} now delegates to {delegatee}");
        }
        Command::ReleaseLocks { account } => {
            let released = state.release_expired_locks(&account, now)?;
            println!("released {}", fmt_amount(released));
        }
        Command::ApplyCeo { applicant } => {
            let id = state.apply_for_ceo(&applicant, now, &file.admission)?;
            println!("CEO application {id} submitted");
        }
        Command::EndorseCeo { endorser, id } => {
            state.endorse_ceo_application(&endorser, id, now)?;
            println!("endorsed CEO application {id}");
        }
        Command::VoteCeo { voter, id, against } => {
            state.vote_on_ceo_application(&voter, id, !against, now, &feed)?;
            println!("vote recorded on CEO application {id}");
        }
        Command::ExpireCeo { id } => {
            state.expire_ceo_application(id, now)?;
            println!("CEO application {id} defeated (no quorum)");
        }
        Command::FinalizeCeo { id } => {
            let passed = state.finalize_ceo_application(id, now)?;
            println!(
                "CEO application {id} {}",
                if passed { "succeeded" } else { "defeated" }
            );
        }
        Command::SubmitRequest {
            proposer,
            title,
            soft_cap,
            hard_cap,
            description,
            valuation,
        } => {
            let id = state.submit_funding_request(
                &proposer,
                title,
                description,
                valuation,
                soft_cap,
                hard_cap,
                now,
                &file.admission,
            )?;
            println!("funding request {id} submitted");
        }
        Command::EndorseRequest { endorser, id } => {
            state.endorse_funding_request(&endorser, id, now)?;
            println!("endorsed funding request {id}");
        }
        Command::VoteRequest { voter, id, against } => {
            state.vote_on_funding_request(&voter, id, !against, now, &feed)?;
            println!("vote recorded on funding request {id}");
        }
        Command::ExpireRequest { id } => {
            state.expire_funding_request(id, now)?;
            println!("funding request {id} defeated (no quorum)");
        }
        Command::FinalizeRequest { id } => {
            state.finalize_funding_request(id, now)?;
            let status = state.request(id).map(|r| r.status);
            println!("funding request {id} finalized: {status:?}");
        }
        Command::ApproveRequest { caller, id } => {
            state.approve_funding_request(&caller, id)?;
            println!("funding request {id} approved");
        }
        Command::ExecuteRequest { id } => {
            let raised = state.execute_funding_request(id, &mut file.vouchers)?;
            println!("funding request {id} executed, {} vouchers", fmt_amount(raised));
        }
        Command::ClaimReward { account, id } => {
            let tokens = state.claim_reward(&account, id, now, &feed)?;
            println!("paid {} to {}", fmt_amount(tokens), account);
        }
        Command::PendingReward { account, id } => {
            let tokens = state.pending_reward(&account, id, now, &feed)?;
            println!("pending reward: {}", fmt_amount(tokens));
        }
        Command::RegisterEndorser {
            account,
            name,
            manifesto,
        } => {
            state.register_endorser(&account, name, manifesto, now, &feed, &file.admission)?;
            println!("endorser candidate {account} registered");
        }
        Command::VoteEndorser { voter, candidate } => {
            state.vote_for_endorser(&voter, &candidate)?;
            println!("{voter} now backs {candidate}");
        }
        Command::Challenge { candidate } => match state.challenge_endorser(&candidate)? {
            Some(evicted) => println!("{candidate} seated, {evicted} evicted"),
            None => println!("{candidate} seated"),
        },
        Command::Status => {
            let ledger = state.ledger();
            println!("total supply:       {}", fmt_amount(ledger.total_supply()));
            println!("locked:             {}", fmt_amount(ledger.total_locked()));
            println!(
                "circulating:        {}",
                fmt_amount(ledger.circulating_supply())
            );
            println!("chief executive:    {}", state.ceo().unwrap_or("(none)"));
            println!(
                "endorser board:     {}",
                state.board().active_members().join(", ")
            );
            for app in state.applications() {
                println!(
                    "ceo application {}: {} by {} ({} for / {} against)",
                    app.id,
                    format!("{:?}", app.status).to_lowercase(),
                    app.applicant,
                    fmt_amount(app.votes_for),
                    fmt_amount(app.votes_against),
                );
            }
            for req in state.requests() {
                println!(
                    "funding request {}: {} by {} (raised {})",
                    req.id,
                    format!("{:?}", req.status).to_lowercase(),
                    req.proposer,
                    fmt_amount(req.raised_amount()),
                );
            }
        }
    }

    save_state(&cli.state, &file)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let now = Utc::now().timestamp() as u64;
    run(cli, now)
}
