#![deny(warnings)]

//! Headless game-master console: derive figures, import and export country
//! data, print the leaderboard and world KPIs, and advance the turn.

use anyhow::{bail, Context, Result};
use nation_console::actions::{self, NoticeKind};
use nation_console::format::{format_currency, format_number, BalanceLabel};
use nation_console::viewer::{self, ViewerMsg, ViewerState};
use nation_core::CountryRecord;
use nation_econ::{CountryDocument, TuningTable};
use nation_rank::{wpi_for, StabilityBand, VisibilityFilter, WpiWeights};
use persistence::{default_sqlite_url, ensure_parent_dir, init_db, Repository, SqliteStore};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: war1954 [--db URL] [--tuning FILE] [--weights unweighted|blended]
               [--filter todos|publicos|privados|com-jogadores|sem-jogadores]
               <derive FILE | import FILE | export | leaderboard | kpis | turn N --user UID | version>";

#[derive(Debug, Default)]
struct Args {
    db: Option<String>,
    tuning: Option<String>,
    weights: WpiWeights,
    filter: VisibilityFilter,
    user: Option<String>,
    command: Vec<String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--db" => out.db = it.next(),
            "--tuning" => out.tuning = it.next(),
            "--user" => out.user = it.next(),
            "--weights" => {
                let v = it.next().unwrap_or_default();
                out.weights = WpiWeights::parse(&v)
                    .with_context(|| format!("unknown weighting {v:?}"))?;
            }
            "--filter" => {
                let v = it.next().unwrap_or_default();
                out.filter = VisibilityFilter::parse(&v)
                    .with_context(|| format!("unknown filter {v:?}"))?;
            }
            _ => out.command.push(arg),
        }
    }
    Ok(out)
}

fn load_tuning(path: Option<&str>) -> Result<TuningTable> {
    match path {
        Some(p) => TuningTable::from_yaml_file(p).with_context(|| format!("loading tuning {p}")),
        None => Ok(TuningTable::default()),
    }
}

async fn open_repo(db: Option<&str>) -> Result<Repository<SqliteStore>> {
    let url = db.unwrap_or(default_sqlite_url());
    ensure_parent_dir(url).with_context(|| format!("creating directory for {url}"))?;
    let store = init_db(url).await.with_context(|| format!("opening {url}"))?;
    Ok(Repository::new(store))
}

fn derive_file(path: &str, tuning: &TuningTable, weights: WpiWeights) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let body: Value = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    let id = body.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
    let record =
        CountryRecord::from_document(&id, body).with_context(|| format!("reading country in {path}"))?;
    let wpi = wpi_for(&record, weights);
    let band = StabilityBand::from_score(record.economy.stability);
    let doc = CountryDocument::build(record, tuning);
    let d = doc.derived();
    let summary = json!({
        "id": doc.id(),
        "name": doc.record().name,
        "derived": d,
        "wpi": wpi,
        "stability": band,
        "food": BalanceLabel::of(d.food_balance),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn load_viewer(repo: &Repository<SqliteStore>, filter: VisibilityFilter) -> Result<ViewerState> {
    let (state, notice) = actions::load_site_data(repo, ViewerState::default()).await;
    if notice.kind == NoticeKind::Error {
        bail!("{notice}");
    }
    Ok(viewer::update(state, ViewerMsg::FilterChanged(filter)))
}

async fn run(args: Args) -> Result<()> {
    let tuning = load_tuning(args.tuning.as_deref())?;
    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["version"] => {
            println!(
                "war1954 {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("WAR1954_GIT_SHA"),
                env!("WAR1954_BUILD_DATE")
            );
        }
        ["derive", path] => derive_file(path, &tuning, args.weights)?,
        ["import", path] => {
            let repo = open_repo(args.db.as_deref()).await?;
            let docs = data_pipeline::build_documents(data_pipeline::load_seed(path)?, &tuning);
            for doc in &docs {
                repo.save_country(doc)
                    .await
                    .with_context(|| format!("saving {}", doc.id()))?;
            }
            info!(count = docs.len(), "import finished");
            println!("imported {} countries", docs.len());
        }
        ["export"] => {
            let repo = open_repo(args.db.as_deref()).await?;
            let records = repo.fetch_countries().await?;
            let docs = data_pipeline::build_documents(records, &tuning);
            println!("{}", data_pipeline::export_documents(&docs)?);
        }
        ["leaderboard"] => {
            let repo = open_repo(args.db.as_deref()).await?;
            let state = load_viewer(&repo, args.filter).await?;
            for (pos, row) in state.rows(args.weights).iter().enumerate() {
                println!(
                    "{:>3}. {} {:<24} WPI {:>3} | {:<8} | PIB {} | per capita {} | pop {}",
                    pos + 1,
                    row.flag,
                    row.name,
                    row.wpi,
                    row.stability.label(),
                    format_currency(row.gdp),
                    format_currency(row.gdp_per_capita),
                    format_number(row.population),
                );
            }
        }
        ["kpis"] => {
            let repo = open_repo(args.db.as_deref()).await?;
            let state = load_viewer(&repo, args.filter).await?;
            let k = state.kpis();
            println!(
                "turn {} | players {} | mean GDP {} | mean stability {}/100 | public countries {}",
                state.config().current_turn,
                k.active_players,
                format_currency(k.mean_gdp),
                k.mean_stability_rounded(),
                k.public_countries
            );
        }
        ["turn", n] => {
            let turn: u32 = n.parse().with_context(|| format!("invalid turn {n:?}"))?;
            let user = args.user.as_deref().context("turn requires --user UID")?;
            let repo = open_repo(args.db.as_deref()).await?;
            let (notice, _) = actions::set_turn(&repo, user, turn, chrono::Utc::now()).await;
            if !notice.is_success() {
                bail!("{notice}");
            }
            println!("{notice}");
        }
        _ => bail!("{USAGE}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(command = ?args.command, db = ?args.db, "starting war1954");
    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_and_command_split() {
        let a = args(&["--db", "sqlite::memory:", "turn", "5", "--user", "uid", "--weights", "blended"])
            .unwrap();
        assert_eq!(a.db.as_deref(), Some("sqlite::memory:"));
        assert_eq!(a.user.as_deref(), Some("uid"));
        assert_eq!(a.weights, WpiWeights::BLENDED);
        assert_eq!(a.command, vec!["turn", "5"]);
        assert_eq!(a.filter, VisibilityFilter::All);
    }

    #[test]
    fn bad_flag_values_are_errors() {
        assert!(args(&["--filter", "nope"]).is_err());
        assert!(args(&["--weights"]).is_err());
        assert_eq!(
            args(&["--filter", "sem-jogadores"]).unwrap().filter,
            VisibilityFilter::WithoutPlayer
        );
    }

    #[tokio::test]
    async fn turn_requires_a_narrator() {
        let a = args(&["--db", "sqlite::memory:", "--user", "ghost", "turn", "3"]).unwrap();
        assert!(run(a).await.is_err());
        assert!(run(args(&["bogus"]).unwrap()).await.is_err());
    }
}
