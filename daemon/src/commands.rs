//! One-shot subcommands exercising the rewards operations

use crate::session;
use crate::state::AppState;
use flowva_core::{Quest, Redeemable, RedeemStatus, UserStats};
use flowva_engine::{DayCell, DayState};
use flowva_networking::FlowvaClient;
use serde::Serialize;
use tracing::info;

/// `login <access-token>` — verify the token and save the session
pub async fn login(state: &AppState, token: Option<&str>) -> Result<(), String> {
    let token = token.ok_or("Usage: flowva-daemon login <access-token>")?;
    let config = session::resolve_backend_config(state).await?;

    let client = FlowvaClient::new(&config.url, &config.anon_key, token);
    let identity = client.verify_auth().await.map_err(|e| e.to_string())?;

    session::store(state, token, &identity.id).await?;
    session::save_backend_config(state, &config).await;
    state.catalog_cache.clear();
    info!("Session saved for user {}", identity.id);

    println!("Logged in as {} ({})", identity.display_name(), identity.id);
    Ok(())
}

/// `logout` — drop the saved session
pub async fn logout(state: &AppState) -> Result<(), String> {
    session::clear(state).await?;
    state.catalog_cache.clear();
    println!("Logged out.");
    Ok(())
}

/// Everything `status` shows, in one machine-readable payload
#[derive(Debug, Serialize)]
struct DashboardSnapshot {
    user_id: String,
    stats: UserStats,
    week: Vec<DayCell>,
    quests: Vec<Quest>,
    rewards: Vec<Redeemable>,
}

/// `status` — stats, the weekly tracker, and both catalogs
pub async fn status(state: &AppState, as_json: bool) -> Result<(), String> {
    let session = session::open(state).await?;
    let stats = flowva_engine::get_user_stats(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;
    let week = flowva_engine::streak_calendar(stats.streak);
    let quests = flowva_engine::list_quests(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;
    let rewards = flowva_engine::list_redeemables(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;

    if as_json {
        let snapshot = DashboardSnapshot {
            user_id: session.user_id,
            stats,
            week,
            quests,
            rewards,
        };
        let payload = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!("{}", payload);
        return Ok(());
    }

    println!("Signed in as {} ({})", stats.full_name, session.user_id);
    println!();
    println!("  Points:        {}", stats.total_points);
    println!("  Streak:        {} day(s)", stats.streak);
    println!("  Referrals:     {}", stats.referrals);
    println!("  Rank:          #{}", stats.rank);
    match stats.last_check_in {
        Some(ts) => println!("  Last check-in: {}", ts.to_rfc3339()),
        None => println!("  Last check-in: never"),
    }

    println!();
    println!("This week:");
    for cell in &week {
        let marker = match cell.state {
            DayState::Claimed => "[x]",
            DayState::Next => "[>]",
            DayState::Locked => "[ ]",
        };
        println!("  {} day {:<2} {:>5} pts", marker, cell.day, cell.points);
    }

    println!();
    println!("Quests:");
    for quest in &quests {
        println!(
            "  [{}] {} — {} pts ({})",
            quest.id,
            quest.title,
            quest.reward_amount,
            quest.status.as_str().to_lowercase()
        );
    }

    println!();
    println!("Rewards:");
    for item in &rewards {
        let label = match item.status {
            RedeemStatus::Unlocked => "unlocked",
            RedeemStatus::Locked => "locked",
            RedeemStatus::Coming => "coming soon",
        };
        println!("  [{}] {} — {} pts ({})", item.id, item.title, item.cost, label);
    }

    Ok(())
}

/// `check-in` — perform the daily check-in
pub async fn check_in(state: &AppState) -> Result<(), String> {
    let session = session::open(state).await?;
    let outcome = flowva_engine::perform_daily_check_in(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;

    if outcome.success {
        println!(
            "Checked in — day {} of your streak, +{} points (total: {})",
            outcome.new_streak, outcome.points_earned, outcome.total_points
        );
    } else {
        println!(
            "{}",
            outcome
                .message
                .unwrap_or_else(|| "Already checked in today.".to_string())
        );
    }
    Ok(())
}

/// `complete <quest-id>` — complete a quest from the catalog and claim its reward
pub async fn complete(state: &AppState, quest_id: Option<&str>) -> Result<(), String> {
    let quest_id = quest_id.ok_or("Usage: flowva-daemon complete <quest-id>")?;
    let session = session::open(state).await?;

    let catalog = flowva_engine::list_quests(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;
    let quest = catalog
        .iter()
        .find(|q| q.id == quest_id)
        .ok_or_else(|| format!("Unknown quest: {}", quest_id))?;

    let completion = flowva_engine::complete_quest(
        &session.client,
        &session.user_id,
        quest_id,
        quest.reward_amount,
    )
    .await
    .map_err(|e| e.to_string())?;

    println!(
        "Quest '{}' completed: +{} points (total: {})",
        quest.title, completion.points_awarded, completion.new_points
    );
    Ok(())
}

/// `redeem <reward-id>` — spend points on a reward from the catalog
pub async fn redeem(state: &AppState, reward_id: Option<&str>) -> Result<(), String> {
    let reward_id = reward_id.ok_or("Usage: flowva-daemon redeem <reward-id>")?;
    let session = session::open(state).await?;

    let catalog = flowva_engine::list_redeemables(&session.client, &session.user_id)
        .await
        .map_err(|e| e.to_string())?;
    let item = catalog
        .iter()
        .find(|r| r.id == reward_id)
        .ok_or_else(|| format!("Unknown reward: {}", reward_id))?;

    if item.status == RedeemStatus::Coming {
        return Err(format!("'{}' is not redeemable yet", item.title));
    }

    let redemption =
        flowva_engine::redeem_reward(&session.client, &session.user_id, reward_id, item.cost)
            .await
            .map_err(|e| e.to_string())?;

    println!(
        "Redeemed '{}' for {} points ({} left)",
        item.title, redemption.cost, redemption.new_points
    );
    Ok(())
}
