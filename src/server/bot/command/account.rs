use serenity::all::CreateCommand;

use crate::server::{
    bot::command::Invocation,
    error::AppError,
    model::user::RewardClaim,
    service::ledger::LedgerService,
    state::AppState,
};

pub fn balance_definition() -> CreateCommand {
    CreateCommand::new("balance").description("Show your credit balance")
}

pub fn daily_definition() -> CreateCommand {
    CreateCommand::new("daily").description("Claim your daily credits")
}

pub fn work_definition() -> CreateCommand {
    CreateCommand::new("work").description("Work for credits once an hour")
}

pub async fn balance(state: &AppState, invocation: &Invocation) -> Result<String, AppError> {
    let account = LedgerService::new(&state.db, state.audit.as_ref())
        .get_or_create(invocation.user_id)
        .await?;

    Ok(format!(
        "Balance: {} credits ({} tier)",
        account.balance, account.tier
    ))
}

pub async fn daily(state: &AppState, invocation: &Invocation) -> Result<String, AppError> {
    let claim = LedgerService::new(&state.db, state.audit.as_ref())
        .claim_daily(invocation.user_id, invocation.now)
        .await?;

    Ok(render_claim(&claim))
}

pub async fn work(state: &AppState, invocation: &Invocation) -> Result<String, AppError> {
    let claim = LedgerService::new(&state.db, state.audit.as_ref())
        .claim_work(invocation.user_id, invocation.now)
        .await?;

    Ok(render_claim(&claim))
}

fn render_claim(claim: &RewardClaim) -> String {
    format!(
        "{} reward: +{} credits. Balance: {}",
        claim.reward, claim.amount, claim.account.balance
    )
}
